//! # stagehand-adapter-virtual
//!
//! Simulated counterparts of the two remote systems the engine talks to.
//!
//! | Component | Port | Behaviour |
//! |-----------|------|-----------|
//! | [`VirtualProductionTool`] | `ToolActionHandler`, `LiveStateSource` | Keeps scenes, sources, inputs and output state; publishes the events a real connection would emit |
//! | [`VirtualBot`] | `BotClient` | Records every action call; individual actions can be made to fail |
//!
//! ## Dependency rule
//!
//! Depends on `stagehand-app` (port traits) and `stagehand-domain` only.

mod bot;
mod studio;
mod tool;

pub use bot::{BotCall, VirtualBot};
pub use tool::VirtualProductionTool;
