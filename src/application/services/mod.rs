//! Application services - The bot instance and its lifecycle

pub mod finch;

pub use finch::{Finch, InitSummary};
