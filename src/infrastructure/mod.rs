//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Runtime settings loading
//! - Storage: The JSON config store shared by commands
//! - Adapters: Platform integrations (Telegram, console)

pub mod config;
pub mod storage;
pub mod adapters;
