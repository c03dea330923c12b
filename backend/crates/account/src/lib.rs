//! Account (User Account API) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Session claim, records, collaborator traits
//! - `application/` - Configuration and response messages
//! - `infra/` - In-memory backend, log mailer, helpdesk SSO signer
//! - `presentation/` - HTTP handlers, DTOs, router, session middleware
//!
//! ## Features
//! - Signup, email verification, login (session token or helpdesk SSO)
//! - Password reset and change
//! - Profile, settings, username, login history (JSON or CSV)
//! - Affiliation count, balance, deposit addresses, withdrawal cancel
//! - HMAC API key management
//!
//! ## Error Model
//! - Collaborator errors answer their embedded status, 400 otherwise
//! - Login answers every failure with 403
//! - Unknown users are masked on verification lookup and reset requests

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AccountConfig;
pub use error::{AccountError, AccountResult};
pub use infra::memory::InMemoryExchange;
pub use presentation::router::account_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::claim::*;
    pub use crate::domain::model::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod router {
    pub use crate::presentation::router::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
