//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Request metadata extraction (client IP, origin, user agent, correlation id)
//! - Cryptographic utilities (SHA-256, HMAC, Base64, hex)
//! - Password hashing (Argon2id, NIST SP 800-63B compliant)

pub mod client;
pub mod crypto;
pub mod password;
