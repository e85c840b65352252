//! Domain layer - Core types shared by every other layer
//!
//! This layer contains:
//! - Entities: Updates, messages, users, help metadata and the command registry
//! - Traits: Abstractions for commands and messaging platforms

pub mod entities;
pub mod traits;
