//! Application layer - The bot instance and update handling
//!
//! This layer contains:
//! - Services: The `Finch` bot instance and command initialization
//! - Errors: Domain-specific errors
//! - Messaging: Command parsing, routing, concurrent dispatch

pub mod errors;
pub mod services;
pub mod messaging;
