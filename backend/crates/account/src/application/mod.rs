//! Application Layer
//!
//! Runtime configuration and the fixed response messages.

pub mod config;
pub mod messages;

// Re-exports
pub use config::AccountConfig;
