//! Pass-through records
//!
//! Shapes returned by the collaborators. The dispatcher serializes them as
//! they come, with one exception: the profile endpoint never echoes
//! `UserRecord::password`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use platform::client::ClientMeta;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::claim::{RoleFlags, SessionClaim};

/// Free-form user settings (notification, interface, language, ...)
pub type UserSettings = Map<String, Value>;

/// Aggregated trading stats; owned and shaped by the collaborator
pub type UserStats = Value;

// ============================================================================
// Users
// ============================================================================

/// User record as returned by the user collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub username: Option<String>,
    pub network_id: i64,
    pub verification_level: u8,
    pub email_verified: bool,
    pub activated: bool,
    pub affiliation_code: Option<String>,
    pub roles: RoleFlags,
    pub settings: UserSettings,
    pub created_at: DateTime<Utc>,
    /// Stored credential hash, present only when the collaborator leaks it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UserRecord {
    /// Claim a session token is issued for
    pub fn claim(&self) -> SessionClaim {
        SessionClaim {
            id: self.id,
            email: self.email.clone(),
            network_id: self.network_id,
            roles: self.roles,
        }
    }

    /// Drop the credential hash before the record leaves the service
    pub fn without_password(mut self) -> Self {
        self.password = None;
        self
    }
}

/// New account data
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub referral: Option<String>,
}

/// Pending email-verification code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCode {
    pub email: String,
    pub code: String,
    pub verified: bool,
}

/// Credentials and transport metadata of one login attempt
#[derive(Debug, Clone)]
pub struct LoginAttempt {
    pub email: String,
    pub password: String,
    pub otp_code: Option<String>,
    pub captcha: Option<String>,
    pub client: ClientMeta,
}

// ============================================================================
// Login history
// ============================================================================

/// Sort direction for paged queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Paging and filter parameters of the login-history query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginQuery {
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub order_by: Option<String>,
    pub order: Option<SortOrder>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// One recorded login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRecord {
    pub id: i64,
    pub user_id: i64,
    pub ip: Option<String>,
    pub device: Option<String>,
    pub domain: Option<String>,
    pub origin: Option<String>,
    pub referer: Option<String>,
    pub status: bool,
    pub timestamp: DateTime<Utc>,
}

/// A page of login records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginPage {
    pub count: u64,
    pub data: Vec<LoginRecord>,
}

// ============================================================================
// Wallet
// ============================================================================

/// Holdings of one asset
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetBalance {
    pub balance: f64,
    pub available: f64,
}

/// Balances of one user, keyed by coin symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub user_id: i64,
    pub updated_at: DateTime<Utc>,
    pub assets: BTreeMap<String, AssetBalance>,
}

/// Deposit address generated for a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoAddress {
    pub currency: String,
    pub address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub transaction_id: String,
    pub user_id: i64,
    pub currency: String,
    pub amount: f64,
    pub status: WithdrawalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// HMAC API tokens
// ============================================================================

/// API key as listed to its owner (secret never included)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HmacToken {
    pub id: i64,
    pub name: String,
    pub api_key: String,
    pub active: bool,
    pub created: DateTime<Utc>,
    pub last_used: Option<DateTime<Utc>>,
}

/// Freshly created API key; the secret is shown this once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedHmacToken {
    #[serde(flatten)]
    pub token: HmacToken,
    pub secret: String,
}

// ============================================================================
// Mail
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MailKind {
    /// Verification code after signup or on resend
    Signup,
    /// New-login alert
    Login,
    /// Password-reset code
    ResetPassword,
}

/// Mail handed to the notifier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mail {
    pub kind: MailKind,
    pub to: String,
    pub data: Value,
    /// Public domain used to build links inside the template
    pub domain: Option<String>,
}
