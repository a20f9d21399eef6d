//! # stagehand-domain
//!
//! Pure domain model for the stagehand automation rule engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Automation rules** (trigger → conditions → actions, plus cooldown
//!   and trigger accounting)
//! - Define **Events** delivered by the production tool and the automation bot
//! - Define the **Live state** snapshot conditions are evaluated against
//! - Define **Notifications** describing what fired and what failed
//! - Value coercion rules shared by trigger filters and condition operators
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod automation;
pub mod event;
pub mod notification;
pub mod state;
pub mod statistics;
pub mod template;
pub mod value;
