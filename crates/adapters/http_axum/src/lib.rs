//! # stagehand-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the JSON API used by the rule builder (`/api/rules`,
//!   `/api/templates`, `/api/statistics`, `/api/notifications`)
//! - Accept events and live-state snapshots from the production-tool
//!   connection (`/api/events`, `/api/state`)
//! - Keep the engine's rule snapshot in step with the store after every
//!   mutation
//!
//! ## Dependency rule
//! Depends on `stagehand-app` (ports, services, engine) and `stagehand-domain`
//! (request/response types). Never leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
mod test_support;
