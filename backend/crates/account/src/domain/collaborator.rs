//! Collaborator Traits
//!
//! Interfaces of the services the dispatcher delegates to. Credential
//! storage, token cryptography, ledger mutation and mail delivery all live
//! behind these traits; implementations are in the infrastructure layer.

use crate::domain::claim::SessionClaim;
use crate::domain::model::{
    Balance, CreatedHmacToken, CryptoAddress, HmacToken, LoginAttempt, LoginPage, LoginQuery,
    Mail, NewUser, UserRecord, UserSettings, UserStats, VerificationCode, Withdrawal,
};
use crate::domain::value_object::sso_service::SsoService;
use crate::error::AccountResult;

/// User directory: accounts, verification, login, profile
#[trait_variant::make(UserService: Send)]
pub trait LocalUserService {
    /// Create an unverified account
    async fn sign_up_user(&self, user: NewUser) -> AccountResult<()>;

    /// Look up the pending verification code of an email
    async fn verification_code_by_email(&self, email: &str) -> AccountResult<VerificationCode>;

    /// Look up the email a verification code was issued to
    async fn email_by_verification_code(&self, code: &str) -> AccountResult<String>;

    /// Mark the email verified
    async fn verify_user(&self, email: &str, code: &str, domain: Option<&str>)
    -> AccountResult<()>;

    /// Check credentials (captcha, password, OTP) and record the attempt
    async fn login_user(&self, attempt: LoginAttempt) -> AccountResult<UserRecord>;

    /// Full user record by email
    async fn user_by_email(&self, email: &str) -> AccountResult<UserRecord>;

    /// Merge settings into the user's record
    async fn update_user_settings(
        &self,
        email: &str,
        settings: UserSettings,
    ) -> AccountResult<UserRecord>;

    /// Change the username
    async fn set_username(&self, user_id: i64, username: &str) -> AccountResult<()>;

    /// Paged login history
    async fn user_logins(&self, user_id: i64, query: LoginQuery) -> AccountResult<LoginPage>;

    /// Number of users referred by this user
    async fn affiliation_count(&self, user_id: i64) -> AccountResult<u64>;

    /// Deactivate the account
    async fn freeze_user(&self, user_id: i64) -> AccountResult<()>;

    /// Trading statistics
    async fn user_stats(&self, user_id: i64) -> AccountResult<UserStats>;
}

/// Security service: captcha, session tokens, passwords, API keys
#[trait_variant::make(SecurityService: Send)]
pub trait LocalSecurityService {
    /// Validate a captcha response for the caller's IP
    async fn check_captcha(&self, captcha: Option<&str>, ip: Option<&str>) -> AccountResult<()>;

    /// Sign a session token for the claim
    fn issue_token(&self, claim: &SessionClaim, ip: Option<&str>) -> AccountResult<String>;

    /// Verify a session token and return its claim
    async fn verify_token(&self, token: &str) -> AccountResult<SessionClaim>;

    /// Issue a reset code and mail it to the user
    async fn send_reset_password_code(
        &self,
        email: &str,
        captcha: Option<&str>,
        ip: Option<&str>,
        domain: Option<&str>,
    ) -> AccountResult<()>;

    /// Consume a reset code and set the new password
    async fn reset_user_password(&self, code: &str, new_password: &str) -> AccountResult<()>;

    /// Change password after checking the current one
    async fn change_user_password(
        &self,
        email: &str,
        old_password: &str,
        new_password: &str,
    ) -> AccountResult<()>;

    /// API keys of a user
    async fn hmac_tokens(&self, user_id: i64) -> AccountResult<Vec<HmacToken>>;

    /// Create an API key
    async fn create_hmac_token(
        &self,
        user_id: i64,
        otp_code: Option<&str>,
        ip: Option<&str>,
        name: &str,
    ) -> AccountResult<CreatedHmacToken>;

    /// Revoke an API key
    async fn delete_hmac_token(
        &self,
        user_id: i64,
        otp_code: Option<&str>,
        token_id: i64,
    ) -> AccountResult<()>;
}

/// Wallet and ledger
#[trait_variant::make(WalletService: Send)]
pub trait LocalWalletService {
    /// Whether the exchange lists the coin
    fn supports_coin(&self, symbol: &str) -> bool;

    async fn user_balance(&self, user_id: i64) -> AccountResult<Balance>;

    async fn create_crypto_address(&self, user_id: i64, crypto: &str)
    -> AccountResult<CryptoAddress>;

    async fn cancel_withdrawal(
        &self,
        user_id: i64,
        transaction_id: &str,
    ) -> AccountResult<Withdrawal>;
}

/// Outbound mail
///
/// `send` hands the mail off and returns immediately; delivery failures are
/// the notifier's to log. Callers never wait on delivery.
pub trait Notifier: Send + Sync + 'static {
    fn send(&self, mail: Mail);
}

/// Signs callback URLs for third-party helpdesk single sign-on
pub trait SsoSigner: Send + Sync + 'static {
    fn callback_url(&self, service: SsoService, user: &UserRecord) -> AccountResult<String>;
}

/// Everything the dispatcher needs from the account backend
pub trait AccountBackend:
    UserService + SecurityService + WalletService + Clone + Send + Sync + 'static
{
}

impl<T> AccountBackend for T where
    T: UserService + SecurityService + WalletService + Clone + Send + Sync + 'static
{
}
