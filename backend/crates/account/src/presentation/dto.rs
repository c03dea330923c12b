//! API DTOs (Data Transfer Objects)
//!
//! Field names follow the public REST contract (snake_case, except
//! `callbackUrl`).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::model::{LoginQuery, SortOrder};

// ============================================================================
// Common
// ============================================================================

/// `{message}` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Sign Up / Verification
// ============================================================================

/// Sign up request
#[derive(Clone, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub captcha: Option<String>,
    pub referral: Option<String>,
}

impl fmt::Debug for SignUpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignUpRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("referral", &self.referral)
            .finish()
    }
}

/// GET /verify query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyQuery {
    pub email: Option<String>,
    pub verification_code: Option<String>,
    #[serde(default)]
    pub resend: bool,
}

/// Verification lookup response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResponse {
    pub email: String,
    pub verification_code: String,
    pub message: String,
}

/// POST /verify body
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub verification_code: String,
}

// ============================================================================
// Login
// ============================================================================

/// Login request
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub otp_code: Option<String>,
    pub captcha: Option<String>,
    /// Third-party service to sign a callback URL for instead of issuing a token
    pub service: Option<String>,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("service", &self.service)
            .finish()
    }
}

/// Session token issued on login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Login through a third-party service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceLoginResponse {
    pub service: String,
    #[serde(rename = "callbackUrl")]
    pub callback_url: String,
}

// ============================================================================
// Passwords
// ============================================================================

/// GET /reset-password query
#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordQuery {
    pub email: String,
    pub captcha: Option<String>,
}

/// POST /reset-password body
#[derive(Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub code: String,
    pub new_password: String,
}

impl fmt::Debug for ResetPasswordRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResetPasswordRequest")
            .field("code", &self.code)
            .field("new_password", &"[REDACTED]")
            .finish()
    }
}

/// Change password request
#[derive(Clone, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

impl fmt::Debug for ChangePasswordRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangePasswordRequest")
            .field("old_password", &"[REDACTED]")
            .field("new_password", &"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Profile
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct UsernameRequest {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

/// GET /user/logins query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginsQuery {
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub order_by: Option<String>,
    pub order: Option<SortOrder>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub format: Option<String>,
}

impl LoginsQuery {
    /// Whether the history should be exported as CSV
    ///
    /// Any value except an empty one, `false` or `0` asks for the export.
    pub fn export_requested(&self) -> bool {
        self.format
            .as_deref()
            .map(str::trim)
            .is_some_and(|f| !f.is_empty() && f != "false" && f != "0")
    }

    /// Split into the collaborator query and the export flag
    pub fn into_parts(self) -> (LoginQuery, bool) {
        let export = self.export_requested();
        let query = LoginQuery {
            limit: self.limit,
            page: self.page,
            order_by: self.order_by,
            order: self.order,
            start_date: self.start_date,
            end_date: self.end_date,
        };
        (query, export)
    }
}

// ============================================================================
// Wallet
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CryptoQuery {
    pub crypto: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelWithdrawalRequest {
    pub transaction_id: String,
}

// ============================================================================
// HMAC tokens
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTokenRequest {
    pub name: String,
    pub otp_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteTokenRequest {
    pub token_id: i64,
    pub otp_code: Option<String>,
}
