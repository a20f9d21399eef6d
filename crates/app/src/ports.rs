//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod clients;
pub mod event_bus;
pub mod live_state;
pub mod notifier;
pub mod rule_repo;

pub use clients::{BotClient, ClientError, Disconnected, ToolActionHandler, ToolOutcome};
pub use event_bus::EventPublisher;
pub use live_state::LiveStateSource;
pub use notifier::Notifier;
pub use rule_repo::RuleRepository;
