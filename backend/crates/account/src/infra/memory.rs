//! In-memory Backend
//!
//! Single-process implementation of the user, security and wallet services
//! for local runs and tests. All state sits behind one `RwLock` and is lost
//! on restart.

use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use kernel::error::kind::ErrorKind;
use platform::crypto::{
    from_base64url, hmac_sha256, random_bytes, to_base64url, to_hex, verify_hmac_sha256,
};
use platform::password::{ClearTextPassword, HashedPassword, PasswordPolicyError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::claim::{RoleFlags, SessionClaim};
use crate::domain::collaborator::{Notifier, SecurityService, UserService, WalletService};
use crate::domain::model::{
    AssetBalance, Balance, CreatedHmacToken, CryptoAddress, HmacToken, LoginAttempt, LoginPage,
    LoginQuery, LoginRecord, Mail, MailKind, NewUser, SortOrder, UserRecord, UserSettings,
    UserStats, VerificationCode, Withdrawal, WithdrawalStatus,
};
use crate::domain::value_object::email::Email;
use crate::error::{AccountError, AccountResult};

/// Failed logins before the account locks
pub const MAX_FAILED_LOGINS: u32 = 5;

/// Largest login-history page
pub const MAX_LOGIN_PAGE: u32 = 50;

/// API keys per user
pub const MAX_HMAC_TOKENS: usize = 5;

const NETWORK_ID_OFFSET: i64 = 10_000;

/// Development backend configuration
#[derive(Clone)]
pub struct DevBackendConfig {
    /// Lowercase symbols of listed coins
    pub supported_coins: Vec<String>,
    /// HMAC key for session tokens
    pub token_secret: Vec<u8>,
    pub token_ttl: Duration,
    pub reset_code_ttl: Duration,
    /// Reject captcha-protected calls that carry no captcha
    pub captcha_required: bool,
}

impl fmt::Debug for DevBackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DevBackendConfig")
            .field("supported_coins", &self.supported_coins)
            .field("token_secret", &"[REDACTED]")
            .field("token_ttl", &self.token_ttl)
            .field("reset_code_ttl", &self.reset_code_ttl)
            .field("captcha_required", &self.captcha_required)
            .finish()
    }
}

impl DevBackendConfig {
    /// Defaults for local runs; the token secret is random per process
    pub fn development() -> Self {
        Self {
            supported_coins: ["btc", "eth", "usdt", "xht"].map(String::from).to_vec(),
            token_secret: random_bytes(32),
            token_ttl: Duration::hours(24),
            reset_code_ttl: Duration::hours(1),
            captcha_required: false,
        }
    }

    /// Read `SUPPORTED_COINS` (comma separated) and `TOKEN_SECRET`
    pub fn from_env() -> Self {
        let mut config = Self::development();

        if let Ok(coins) = env::var("SUPPORTED_COINS") {
            let coins: Vec<String> = coins
                .split(',')
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty())
                .collect();
            if !coins.is_empty() {
                config.supported_coins = coins;
            }
        }

        match env::var("TOKEN_SECRET") {
            Ok(secret) if !secret.is_empty() => config.token_secret = secret.into_bytes(),
            _ => tracing::warn!("TOKEN_SECRET not set; session tokens will not survive a restart"),
        }

        config
    }
}

// ============================================================================
// State
// ============================================================================

struct StoredUser {
    record: UserRecord,
    failed_logins: u32,
    referred_by: Option<i64>,
}

struct ResetCode {
    user_id: i64,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct Store {
    next_user_id: i64,
    next_login_id: i64,
    next_token_id: i64,
    users: BTreeMap<i64, StoredUser>,
    /// Keyed by code
    verification_codes: HashMap<String, VerificationCode>,
    reset_codes: HashMap<String, ResetCode>,
    logins: Vec<LoginRecord>,
    balances: HashMap<i64, BTreeMap<String, AssetBalance>>,
    addresses: HashMap<(i64, String), String>,
    withdrawals: HashMap<String, Withdrawal>,
    hmac_tokens: HashMap<i64, Vec<HmacToken>>,
}

impl Store {
    fn find_by_email(&self, email: &str) -> Option<&StoredUser> {
        self.users.values().find(|u| u.record.email == email)
    }

    fn find_by_email_mut(&mut self, email: &str) -> Option<&mut StoredUser> {
        self.users.values_mut().find(|u| u.record.email == email)
    }

    fn user(&self, id: i64) -> AccountResult<&StoredUser> {
        self.users.get(&id).ok_or(AccountError::UserNotFound)
    }

    fn user_mut(&mut self, id: i64) -> AccountResult<&mut StoredUser> {
        self.users.get_mut(&id).ok_or(AccountError::UserNotFound)
    }

    fn referrer(&self, affiliation_code: &str) -> Option<i64> {
        self.users
            .values()
            .find(|u| u.record.affiliation_code.as_deref() == Some(affiliation_code))
            .map(|u| u.record.id)
    }

    /// Insert an unverified user and its verification code
    fn insert_user(
        &mut self,
        email: &str,
        password: &HashedPassword,
        referred_by: Option<i64>,
    ) -> (UserRecord, String) {
        self.next_user_id += 1;
        let id = self.next_user_id;

        let record = UserRecord {
            id,
            email: email.to_string(),
            username: None,
            network_id: NETWORK_ID_OFFSET + id,
            verification_level: 1,
            email_verified: false,
            activated: true,
            affiliation_code: Some(to_hex(&random_bytes(4)).to_uppercase()),
            roles: RoleFlags::default(),
            settings: default_settings(),
            created_at: Utc::now(),
            password: Some(password.as_phc_string().to_string()),
        };

        let code = Uuid::new_v4().to_string();
        self.verification_codes.insert(
            code.clone(),
            VerificationCode {
                email: email.to_string(),
                code: code.clone(),
                verified: false,
            },
        );
        self.users.insert(
            id,
            StoredUser {
                record: record.clone(),
                failed_logins: 0,
                referred_by,
            },
        );

        (record, code)
    }

    fn push_login(&mut self, user_id: i64, attempt: &LoginAttempt, status: bool) {
        self.next_login_id += 1;
        self.logins.push(LoginRecord {
            id: self.next_login_id,
            user_id,
            ip: attempt.client.ip.clone(),
            device: attempt.client.user_agent.clone(),
            domain: attempt.client.domain.clone(),
            origin: attempt.client.origin.clone(),
            referer: attempt.client.referer.clone(),
            status,
            timestamp: Utc::now(),
        });
    }
}

#[derive(Serialize, Deserialize)]
struct TokenPayload {
    #[serde(flatten)]
    claim: SessionClaim,
    ip: Option<String>,
    iat: i64,
    exp: i64,
}

fn default_settings() -> UserSettings {
    let mut settings = UserSettings::new();
    settings.insert("language".to_string(), json!("en"));
    settings.insert(
        "notification".to_string(),
        json!({
            "popup_order_confirmation": true,
            "popup_order_completed": true,
        }),
    );
    settings
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn policy_error(err: PasswordPolicyError) -> AccountError {
    AccountError::Validation(vec![err.to_string()])
}

fn account_locked() -> AccountError {
    AccountError::rejected_with(
        ErrorKind::TooManyRequests,
        "Too many failed login attempts. Account is locked",
    )
}

fn internal(err: impl fmt::Display) -> AccountError {
    AccountError::Internal(err.to_string())
}

fn password_matches(phc: Option<&str>, candidate: &str) -> bool {
    phc.and_then(|phc| HashedPassword::from_phc_string(phc).ok())
        .is_some_and(|hash| hash.verify(&ClearTextPassword::for_verification(candidate)))
}

fn valid_username(username: &str) -> bool {
    (3..=15).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

// ============================================================================
// Backend
// ============================================================================

/// In-memory exchange backend
#[derive(Clone)]
pub struct InMemoryExchange {
    store: Arc<RwLock<Store>>,
    config: Arc<DevBackendConfig>,
    notifier: Arc<dyn Notifier>,
}

impl InMemoryExchange {
    pub fn new(config: DevBackendConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store: Arc::new(RwLock::new(Store::default())),
            config: Arc::new(config),
            notifier,
        }
    }

    /// Create an account that can log in immediately
    pub async fn register_verified(&self, email: &str, password: &str) -> AccountResult<UserRecord> {
        let (record, code) = self.create_user(email, password, None).await?;

        let mut store = self.store.write().await;
        if let Some(entry) = store.verification_codes.get_mut(&code) {
            entry.verified = true;
        }
        let user = store.user_mut(record.id)?;
        user.record.email_verified = true;

        Ok(user.record.clone().without_password())
    }

    /// Credit a balance
    pub async fn deposit(&self, user_id: i64, currency: &str, amount: f64) -> AccountResult<()> {
        let mut store = self.store.write().await;
        store.user(user_id)?;

        let asset = store
            .balances
            .entry(user_id)
            .or_default()
            .entry(currency.to_lowercase())
            .or_default();
        asset.balance += amount;
        asset.available += amount;
        Ok(())
    }

    /// Place a pending withdrawal, holding the amount
    pub async fn record_withdrawal(
        &self,
        user_id: i64,
        currency: &str,
        amount: f64,
    ) -> AccountResult<Withdrawal> {
        let currency = currency.to_lowercase();
        let mut store = self.store.write().await;
        store.user(user_id)?;

        let asset = store
            .balances
            .entry(user_id)
            .or_default()
            .entry(currency.clone())
            .or_default();
        if asset.available < amount {
            return Err(AccountError::rejected("Insufficient balance"));
        }
        asset.available -= amount;

        let now = Utc::now();
        let withdrawal = Withdrawal {
            transaction_id: to_hex(&random_bytes(32)),
            user_id,
            currency,
            amount,
            status: WithdrawalStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        store
            .withdrawals
            .insert(withdrawal.transaction_id.clone(), withdrawal.clone());

        Ok(withdrawal)
    }

    async fn create_user(
        &self,
        email: &str,
        password: &str,
        referral: Option<&str>,
    ) -> AccountResult<(UserRecord, String)> {
        let mut errors = Vec::new();
        let email = Email::new(email)
            .map_err(|e| errors.push(e.message().to_string()))
            .ok();
        let password = ClearTextPassword::new(password)
            .map_err(|e| errors.push(e.to_string()))
            .ok();
        let (Some(email), Some(password)) = (email, password) else {
            return Err(AccountError::Validation(errors));
        };

        let hashed = password.hash().map_err(internal)?;

        let mut store = self.store.write().await;
        if store.find_by_email(email.as_str()).is_some() {
            return Err(AccountError::rejected("User already exists"));
        }
        let referred_by = referral.and_then(|code| store.referrer(code));

        tracing::info!(email = %email, "User registered");
        Ok(store.insert_user(email.as_str(), &hashed, referred_by))
    }

    fn require_captcha(&self, captcha: Option<&str>) -> AccountResult<()> {
        if self.config.captcha_required && captcha.is_none_or(|c| c.trim().is_empty()) {
            return Err(AccountError::rejected("Invalid captcha"));
        }
        Ok(())
    }
}

// ============================================================================
// User Service Implementation
// ============================================================================

impl UserService for InMemoryExchange {
    async fn sign_up_user(&self, user: NewUser) -> AccountResult<()> {
        let (record, code) = self
            .create_user(&user.email, &user.password, user.referral.as_deref())
            .await?;

        self.notifier.send(Mail {
            kind: MailKind::Signup,
            to: record.email,
            data: json!({ "code": code }),
            domain: None,
        });
        Ok(())
    }

    async fn verification_code_by_email(&self, email: &str) -> AccountResult<VerificationCode> {
        let email = normalize_email(email);
        let store = self.store.read().await;
        store
            .find_by_email(&email)
            .ok_or(AccountError::UserNotFound)?;

        let code = store
            .verification_codes
            .values()
            .find(|c| c.email == email)
            .cloned()
            .ok_or(AccountError::UserNotFound)?;
        if code.verified {
            return Err(AccountError::rejected("User already verified"));
        }
        Ok(code)
    }

    async fn email_by_verification_code(&self, code: &str) -> AccountResult<String> {
        let store = self.store.read().await;
        let entry = store
            .verification_codes
            .get(code)
            .ok_or(AccountError::UserNotFound)?;
        if entry.verified {
            return Err(AccountError::rejected("User already verified"));
        }
        Ok(entry.email.clone())
    }

    async fn verify_user(
        &self,
        email: &str,
        code: &str,
        _domain: Option<&str>,
    ) -> AccountResult<()> {
        let email = normalize_email(email);
        let mut store = self.store.write().await;

        let entry = store
            .verification_codes
            .get_mut(code)
            .filter(|c| c.email == email)
            .ok_or_else(|| AccountError::rejected("Invalid verification code"))?;
        if entry.verified {
            return Err(AccountError::rejected("User already verified"));
        }
        entry.verified = true;

        let user = store
            .find_by_email_mut(&email)
            .ok_or(AccountError::UserNotFound)?;
        user.record.email_verified = true;
        Ok(())
    }

    async fn login_user(&self, attempt: LoginAttempt) -> AccountResult<UserRecord> {
        self.require_captcha(attempt.captcha.as_deref())?;

        let email = normalize_email(&attempt.email);
        let (id, phc, failed) = {
            let store = self.store.read().await;
            let user = store
                .find_by_email(&email)
                .ok_or(AccountError::UserNotFound)?;
            (user.record.id, user.record.password.clone(), user.failed_logins)
        };

        if failed >= MAX_FAILED_LOGINS {
            return Err(account_locked());
        }

        let matches = password_matches(phc.as_deref(), &attempt.password);

        // Other attempts may have failed while the hash was being checked
        let mut store = self.store.write().await;
        if store.user(id)?.failed_logins >= MAX_FAILED_LOGINS {
            return Err(account_locked());
        }
        store.push_login(id, &attempt, matches);
        let user = store.user_mut(id)?;

        if !matches {
            user.failed_logins += 1;
            tracing::debug!(user_id = id, failed = user.failed_logins, "Login failed");
            return Err(AccountError::rejected("Invalid credentials"));
        }
        if !user.record.email_verified {
            return Err(AccountError::rejected("User is not verified"));
        }
        if !user.record.activated {
            return Err(AccountError::rejected("User account is deactivated"));
        }

        user.failed_logins = 0;
        Ok(user.record.clone())
    }

    async fn user_by_email(&self, email: &str) -> AccountResult<UserRecord> {
        let email = normalize_email(email);
        let store = self.store.read().await;
        store
            .find_by_email(&email)
            .map(|u| u.record.clone())
            .ok_or(AccountError::UserNotFound)
    }

    async fn update_user_settings(
        &self,
        email: &str,
        settings: UserSettings,
    ) -> AccountResult<UserRecord> {
        let email = normalize_email(email);
        let mut store = self.store.write().await;
        let user = store
            .find_by_email_mut(&email)
            .ok_or(AccountError::UserNotFound)?;

        user.record.settings.extend(settings);
        Ok(user.record.clone())
    }

    async fn set_username(&self, user_id: i64, username: &str) -> AccountResult<()> {
        let username = username.trim();
        if !valid_username(username) {
            return Err(AccountError::Validation(vec![
                "Username must be 3 to 15 lowercase letters, digits or underscores".to_string(),
            ]));
        }

        let mut store = self.store.write().await;
        let taken = store
            .users
            .values()
            .any(|u| u.record.id != user_id && u.record.username.as_deref() == Some(username));
        if taken {
            return Err(AccountError::rejected("Username already exists"));
        }

        store.user_mut(user_id)?.record.username = Some(username.to_string());
        Ok(())
    }

    async fn user_logins(&self, user_id: i64, query: LoginQuery) -> AccountResult<LoginPage> {
        let store = self.store.read().await;

        let mut logins: Vec<LoginRecord> = store
            .logins
            .iter()
            .filter(|l| l.user_id == user_id)
            .filter(|l| query.start_date.is_none_or(|start| l.timestamp >= start))
            .filter(|l| query.end_date.is_none_or(|end| l.timestamp <= end))
            .cloned()
            .collect();

        match query.order_by.as_deref() {
            Some("id") => logins.sort_by_key(|l| l.id),
            _ => logins.sort_by_key(|l| (l.timestamp, l.id)),
        }
        if query.order.unwrap_or_default() == SortOrder::Desc {
            logins.reverse();
        }

        let count = logins.len() as u64;
        let limit = query.limit.unwrap_or(MAX_LOGIN_PAGE).clamp(1, MAX_LOGIN_PAGE) as usize;
        let page = query.page.unwrap_or(1).max(1) as usize;
        let data = logins
            .into_iter()
            .skip((page - 1) * limit)
            .take(limit)
            .collect();

        Ok(LoginPage { count, data })
    }

    async fn affiliation_count(&self, user_id: i64) -> AccountResult<u64> {
        let store = self.store.read().await;
        store.user(user_id)?;
        Ok(store
            .users
            .values()
            .filter(|u| u.referred_by == Some(user_id))
            .count() as u64)
    }

    async fn freeze_user(&self, user_id: i64) -> AccountResult<()> {
        let mut store = self.store.write().await;
        store.user_mut(user_id)?.record.activated = false;
        tracing::info!(user_id, "User deactivated");
        Ok(())
    }

    async fn user_stats(&self, user_id: i64) -> AccountResult<UserStats> {
        let store = self.store.read().await;
        store.user(user_id)?;

        let logins = store
            .logins
            .iter()
            .filter(|l| l.user_id == user_id && l.status)
            .count();
        let withdrawals = store
            .withdrawals
            .values()
            .filter(|w| w.user_id == user_id)
            .count();

        Ok(json!({
            "user_id": user_id,
            "successful_logins": logins,
            "withdrawals": withdrawals,
            "updated_at": Utc::now(),
        }))
    }
}

// ============================================================================
// Security Service Implementation
// ============================================================================

impl SecurityService for InMemoryExchange {
    async fn check_captcha(&self, captcha: Option<&str>, _ip: Option<&str>) -> AccountResult<()> {
        self.require_captcha(captcha)
    }

    fn issue_token(&self, claim: &SessionClaim, ip: Option<&str>) -> AccountResult<String> {
        let now = Utc::now();
        let payload = TokenPayload {
            claim: claim.clone(),
            ip: ip.map(str::to_string),
            iat: now.timestamp(),
            exp: (now + self.config.token_ttl).timestamp(),
        };

        let body = to_base64url(&serde_json::to_vec(&payload).map_err(internal)?);
        let signature = hmac_sha256(&self.config.token_secret, body.as_bytes());
        Ok(format!("{body}.{}", to_base64url(&signature)))
    }

    async fn verify_token(&self, token: &str) -> AccountResult<SessionClaim> {
        let invalid = || AccountError::rejected_with(ErrorKind::Unauthorized, "Invalid token");

        let (body, signature) = token.split_once('.').ok_or_else(invalid)?;
        let signature = from_base64url(signature).map_err(|_| invalid())?;
        if !verify_hmac_sha256(&self.config.token_secret, body.as_bytes(), &signature) {
            return Err(invalid());
        }

        let payload: TokenPayload = from_base64url(body)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or_else(invalid)?;
        if payload.exp <= Utc::now().timestamp() {
            return Err(AccountError::rejected_with(
                ErrorKind::Unauthorized,
                "Token expired",
            ));
        }

        let store = self.store.read().await;
        let user = store.user(payload.claim.id).map_err(|_| invalid())?;
        if !user.record.activated {
            return Err(AccountError::rejected_with(
                ErrorKind::Unauthorized,
                "User account is deactivated",
            ));
        }

        Ok(payload.claim)
    }

    async fn send_reset_password_code(
        &self,
        email: &str,
        captcha: Option<&str>,
        ip: Option<&str>,
        domain: Option<&str>,
    ) -> AccountResult<()> {
        self.require_captcha(captcha)?;

        let email = normalize_email(email);
        let code = Uuid::new_v4().to_string();
        {
            let mut store = self.store.write().await;
            let user_id = store
                .find_by_email(&email)
                .ok_or(AccountError::UserNotFound)?
                .record
                .id;
            store.reset_codes.insert(
                code.clone(),
                ResetCode {
                    user_id,
                    expires_at: Utc::now() + self.config.reset_code_ttl,
                },
            );
        }

        self.notifier.send(Mail {
            kind: MailKind::ResetPassword,
            to: email,
            data: json!({ "code": code, "ip": ip }),
            domain: domain.map(str::to_string),
        });
        Ok(())
    }

    async fn reset_user_password(&self, code: &str, new_password: &str) -> AccountResult<()> {
        let hashed = ClearTextPassword::new(new_password)
            .map_err(policy_error)?
            .hash()
            .map_err(internal)?;

        let mut store = self.store.write().await;
        let reset = store
            .reset_codes
            .remove(code)
            .ok_or_else(|| AccountError::rejected("Invalid code"))?;
        if reset.expires_at <= Utc::now() {
            return Err(AccountError::rejected_with(ErrorKind::Gone, "Code expired"));
        }

        let user = store.user_mut(reset.user_id)?;
        user.record.password = Some(hashed.as_phc_string().to_string());
        user.failed_logins = 0;
        Ok(())
    }

    async fn change_user_password(
        &self,
        email: &str,
        old_password: &str,
        new_password: &str,
    ) -> AccountResult<()> {
        let email = normalize_email(email);
        let current = {
            let store = self.store.read().await;
            store
                .find_by_email(&email)
                .ok_or(AccountError::UserNotFound)?
                .record
                .password
                .clone()
        };

        if !password_matches(current.as_deref(), old_password) {
            return Err(AccountError::rejected("Invalid password"));
        }
        if old_password == new_password {
            return Err(AccountError::rejected(
                "New password must differ from the current password",
            ));
        }

        let hashed = ClearTextPassword::new(new_password)
            .map_err(policy_error)?
            .hash()
            .map_err(internal)?;

        let mut store = self.store.write().await;
        let user = store
            .find_by_email_mut(&email)
            .ok_or(AccountError::UserNotFound)?;
        user.record.password = Some(hashed.as_phc_string().to_string());
        Ok(())
    }

    async fn hmac_tokens(&self, user_id: i64) -> AccountResult<Vec<HmacToken>> {
        let store = self.store.read().await;
        store.user(user_id)?;
        Ok(store.hmac_tokens.get(&user_id).cloned().unwrap_or_default())
    }

    async fn create_hmac_token(
        &self,
        user_id: i64,
        _otp_code: Option<&str>,
        _ip: Option<&str>,
        name: &str,
    ) -> AccountResult<CreatedHmacToken> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AccountError::Validation(vec![
                "Token name is required".to_string(),
            ]));
        }

        let mut store = self.store.write().await;
        store.user(user_id)?;
        if store.hmac_tokens.get(&user_id).map_or(0, Vec::len) >= MAX_HMAC_TOKENS {
            return Err(AccountError::rejected("Maximum number of tokens reached"));
        }

        store.next_token_id += 1;
        let token = HmacToken {
            id: store.next_token_id,
            name: name.to_string(),
            api_key: to_hex(&random_bytes(20)),
            active: true,
            created: Utc::now(),
            last_used: None,
        };
        store
            .hmac_tokens
            .entry(user_id)
            .or_default()
            .push(token.clone());

        Ok(CreatedHmacToken {
            token,
            secret: to_hex(&random_bytes(32)),
        })
    }

    async fn delete_hmac_token(
        &self,
        user_id: i64,
        _otp_code: Option<&str>,
        token_id: i64,
    ) -> AccountResult<()> {
        let mut store = self.store.write().await;
        let tokens = store.hmac_tokens.entry(user_id).or_default();
        let before = tokens.len();
        tokens.retain(|t| t.id != token_id);
        if tokens.len() == before {
            return Err(AccountError::rejected_with(
                ErrorKind::NotFound,
                "Token not found",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Wallet Service Implementation
// ============================================================================

impl WalletService for InMemoryExchange {
    fn supports_coin(&self, symbol: &str) -> bool {
        self.config
            .supported_coins
            .iter()
            .any(|c| c.eq_ignore_ascii_case(symbol))
    }

    async fn user_balance(&self, user_id: i64) -> AccountResult<Balance> {
        let store = self.store.read().await;
        store.user(user_id)?;

        let held = store.balances.get(&user_id);
        let assets = self
            .config
            .supported_coins
            .iter()
            .map(|coin| {
                let asset = held.and_then(|h| h.get(coin)).copied().unwrap_or_default();
                (coin.clone(), asset)
            })
            .collect();

        Ok(Balance {
            user_id,
            updated_at: Utc::now(),
            assets,
        })
    }

    async fn create_crypto_address(
        &self,
        user_id: i64,
        crypto: &str,
    ) -> AccountResult<CryptoAddress> {
        if !self.supports_coin(crypto) {
            return Err(AccountError::InvalidCrypto(crypto.to_string()));
        }
        let currency = crypto.to_lowercase();

        let mut store = self.store.write().await;
        store.user(user_id)?;
        let address = store
            .addresses
            .entry((user_id, currency.clone()))
            .or_insert_with(|| format!("0x{}", to_hex(&random_bytes(20))))
            .clone();

        Ok(CryptoAddress { currency, address })
    }

    async fn cancel_withdrawal(
        &self,
        user_id: i64,
        transaction_id: &str,
    ) -> AccountResult<Withdrawal> {
        let mut store = self.store.write().await;

        let withdrawal = store
            .withdrawals
            .get_mut(transaction_id)
            .filter(|w| w.user_id == user_id)
            .ok_or_else(|| AccountError::rejected_with(ErrorKind::NotFound, "Withdrawal not found"))?;
        if withdrawal.status != WithdrawalStatus::Pending {
            return Err(AccountError::rejected("Withdrawal is not pending"));
        }
        withdrawal.status = WithdrawalStatus::Cancelled;
        withdrawal.updated_at = Utc::now();
        let withdrawal = withdrawal.clone();

        store
            .balances
            .entry(user_id)
            .or_default()
            .entry(withdrawal.currency.clone())
            .or_default()
            .available += withdrawal.amount;

        Ok(withdrawal)
    }
}
