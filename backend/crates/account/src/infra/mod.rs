//! Infrastructure Layer
//!
//! Development implementations of the collaborator traits.

pub mod mailer;
pub mod memory;
pub mod sso;

pub use mailer::LogMailer;
pub use memory::{DevBackendConfig, InMemoryExchange};
pub use sso::{HmacSsoSigner, SsoConfig, SsoEndpoint};
