//! Value Object Module

pub mod email;
pub mod sso_service;
