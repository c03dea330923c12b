//! Domain Layer
//!
//! Session claim, pass-through records, value objects, and the collaborator
//! traits the dispatcher delegates to.

pub mod claim;
pub mod collaborator;
pub mod model;
pub mod value_object;

// Re-exports
pub use claim::{RoleFlags, SessionClaim};
pub use collaborator::{AccountBackend, Notifier, SecurityService, SsoSigner, UserService, WalletService};
