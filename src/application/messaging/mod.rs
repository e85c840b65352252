//! Message handling - Parsing, routing and concurrent dispatch of updates

pub mod dispatcher;
pub mod parser;
pub mod router;

pub use dispatcher::Dispatcher;
pub use parser::{parse_command, simple_command, ParsedCommand};
pub use router::{Invocation, RouteReport, Router};
