//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and middleware.

pub mod context;
pub mod dto;
pub mod export;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use context::{OperationLog, RequestContext};
pub use extract::{AccountJson, AccountQuery};
pub use handlers::AccountAppState;
pub use middleware::require_session_claim;
pub use router::account_router;
