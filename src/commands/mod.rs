//! Bundled commands

pub mod echo;
pub mod help;
pub mod stats;

pub use echo::EchoCommand;
pub use help::HelpCommand;
pub use stats::{StatsCollector, StatsCommand};

use crate::domain::entities::CommandRegistry;

/// Register the bundled commands. Order here is the order they are tried
/// and listed by `/help`.
pub fn register_defaults(registry: &mut CommandRegistry) {
    registry.register(HelpCommand::new());
    registry.register(EchoCommand::new());
    registry.register(StatsCollector::new());
    registry.register(StatsCommand::new());
}
