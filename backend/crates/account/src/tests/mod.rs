//! # Account Router Tests
//!
//! Drive the full router against the in-memory backend and a recording
//! notifier.

mod protected;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use chrono::Duration;
use serde_json::Value;
use tower::ServiceExt;

use crate::application::config::AccountConfig;
use crate::domain::claim::SessionClaim;
use crate::domain::collaborator::{
    AccountBackend, Notifier, SecurityService, UserService, WalletService,
};
use crate::domain::model::{
    Balance, CreatedHmacToken, CryptoAddress, HmacToken, LoginAttempt, LoginPage, LoginQuery,
    Mail, NewUser, UserRecord, UserSettings, UserStats, VerificationCode, Withdrawal,
};
use crate::error::AccountResult;
use crate::infra::memory::{DevBackendConfig, InMemoryExchange};
use crate::infra::sso::{HmacSsoSigner, SsoConfig, SsoEndpoint};
use crate::presentation::router::account_router;

pub const PASSWORD: &str = "correct horse battery";

/// Notifier that keeps every mail it is handed
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Mail>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Mail> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, mail: Mail) {
        self.sent.lock().unwrap().push(mail);
    }
}

/// Backend that forwards to the in-memory exchange and counts address creations
#[derive(Clone)]
pub struct CountingBackend {
    inner: InMemoryExchange,
    addresses_created: Arc<AtomicUsize>,
}

impl CountingBackend {
    pub fn new(inner: InMemoryExchange) -> Self {
        Self {
            inner,
            addresses_created: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn addresses_created(&self) -> usize {
        self.addresses_created.load(Ordering::SeqCst)
    }
}

impl UserService for CountingBackend {
    async fn sign_up_user(&self, user: NewUser) -> AccountResult<()> {
        self.inner.sign_up_user(user).await
    }

    async fn verification_code_by_email(&self, email: &str) -> AccountResult<VerificationCode> {
        self.inner.verification_code_by_email(email).await
    }

    async fn email_by_verification_code(&self, code: &str) -> AccountResult<String> {
        self.inner.email_by_verification_code(code).await
    }

    async fn verify_user(
        &self,
        email: &str,
        code: &str,
        domain: Option<&str>,
    ) -> AccountResult<()> {
        self.inner.verify_user(email, code, domain).await
    }

    async fn login_user(&self, attempt: LoginAttempt) -> AccountResult<UserRecord> {
        self.inner.login_user(attempt).await
    }

    async fn user_by_email(&self, email: &str) -> AccountResult<UserRecord> {
        self.inner.user_by_email(email).await
    }

    async fn update_user_settings(
        &self,
        email: &str,
        settings: UserSettings,
    ) -> AccountResult<UserRecord> {
        self.inner.update_user_settings(email, settings).await
    }

    async fn set_username(&self, user_id: i64, username: &str) -> AccountResult<()> {
        self.inner.set_username(user_id, username).await
    }

    async fn user_logins(&self, user_id: i64, query: LoginQuery) -> AccountResult<LoginPage> {
        self.inner.user_logins(user_id, query).await
    }

    async fn affiliation_count(&self, user_id: i64) -> AccountResult<u64> {
        self.inner.affiliation_count(user_id).await
    }

    async fn freeze_user(&self, user_id: i64) -> AccountResult<()> {
        self.inner.freeze_user(user_id).await
    }

    async fn user_stats(&self, user_id: i64) -> AccountResult<UserStats> {
        self.inner.user_stats(user_id).await
    }
}

impl SecurityService for CountingBackend {
    async fn check_captcha(&self, captcha: Option<&str>, ip: Option<&str>) -> AccountResult<()> {
        self.inner.check_captcha(captcha, ip).await
    }

    fn issue_token(&self, claim: &SessionClaim, ip: Option<&str>) -> AccountResult<String> {
        self.inner.issue_token(claim, ip)
    }

    async fn verify_token(&self, token: &str) -> AccountResult<SessionClaim> {
        self.inner.verify_token(token).await
    }

    async fn send_reset_password_code(
        &self,
        email: &str,
        captcha: Option<&str>,
        ip: Option<&str>,
        domain: Option<&str>,
    ) -> AccountResult<()> {
        self.inner
            .send_reset_password_code(email, captcha, ip, domain)
            .await
    }

    async fn reset_user_password(&self, code: &str, new_password: &str) -> AccountResult<()> {
        self.inner.reset_user_password(code, new_password).await
    }

    async fn change_user_password(
        &self,
        email: &str,
        old_password: &str,
        new_password: &str,
    ) -> AccountResult<()> {
        self.inner
            .change_user_password(email, old_password, new_password)
            .await
    }

    async fn hmac_tokens(&self, user_id: i64) -> AccountResult<Vec<HmacToken>> {
        self.inner.hmac_tokens(user_id).await
    }

    async fn create_hmac_token(
        &self,
        user_id: i64,
        otp_code: Option<&str>,
        ip: Option<&str>,
        name: &str,
    ) -> AccountResult<CreatedHmacToken> {
        self.inner
            .create_hmac_token(user_id, otp_code, ip, name)
            .await
    }

    async fn delete_hmac_token(
        &self,
        user_id: i64,
        otp_code: Option<&str>,
        token_id: i64,
    ) -> AccountResult<()> {
        self.inner
            .delete_hmac_token(user_id, otp_code, token_id)
            .await
    }
}

impl WalletService for CountingBackend {
    fn supports_coin(&self, symbol: &str) -> bool {
        self.inner.supports_coin(symbol)
    }

    async fn user_balance(&self, user_id: i64) -> AccountResult<Balance> {
        self.inner.user_balance(user_id).await
    }

    async fn create_crypto_address(
        &self,
        user_id: i64,
        crypto: &str,
    ) -> AccountResult<CryptoAddress> {
        self.addresses_created.fetch_add(1, Ordering::SeqCst);
        self.inner.create_crypto_address(user_id, crypto).await
    }

    async fn cancel_withdrawal(
        &self,
        user_id: i64,
        transaction_id: &str,
    ) -> AccountResult<Withdrawal> {
        self.inner.cancel_withdrawal(user_id, transaction_id).await
    }
}

pub struct TestApp {
    pub router: Router,
    pub exchange: InMemoryExchange,
    pub mail: Arc<RecordingNotifier>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_backend_config())
    }

    pub fn with_config(config: DevBackendConfig) -> Self {
        let mail = Arc::new(RecordingNotifier::default());
        let exchange = InMemoryExchange::new(config, mail.clone());
        Self::with_backend(exchange.clone(), exchange, mail)
    }

    /// App whose backend counts address creations
    pub fn counting() -> (Self, CountingBackend) {
        let mail = Arc::new(RecordingNotifier::default());
        let exchange = InMemoryExchange::new(test_backend_config(), mail.clone());
        let backend = CountingBackend::new(exchange.clone());
        (Self::with_backend(backend.clone(), exchange, mail), backend)
    }

    fn with_backend<B: AccountBackend>(
        backend: B,
        exchange: InMemoryExchange,
        mail: Arc<RecordingNotifier>,
    ) -> Self {
        let sso = HmacSsoSigner::new(SsoConfig {
            freshdesk: Some(SsoEndpoint {
                endpoint: "https://help.example.io".to_string(),
                key: "freshdesk-secret".to_string(),
            }),
            zendesk: Some(SsoEndpoint {
                endpoint: "https://example.zendesk.com".to_string(),
                key: "zendesk-secret".to_string(),
            }),
        });

        let router = account_router(
            backend,
            mail.clone(),
            Arc::new(sso),
            AccountConfig::development(),
        );

        Self {
            router,
            exchange,
            mail,
        }
    }

    /// Verified user and a session token for it
    pub async fn user(&self, email: &str) -> (UserRecord, String) {
        let user = self
            .exchange
            .register_verified(email, PASSWORD)
            .await
            .expect("registering a test user should succeed");
        let token = self
            .exchange
            .issue_token(&user.claim(), None)
            .expect("issuing a test token should succeed");
        (user, token)
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("reading the body should succeed");

        TestResponse {
            status,
            headers,
            body: body.to_vec(),
        }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("body should be JSON")
    }

    pub fn message(&self) -> String {
        self.json()["message"]
            .as_str()
            .expect("body should carry a message")
            .to_string()
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("body should be UTF-8")
    }
}

pub fn test_backend_config() -> DevBackendConfig {
    DevBackendConfig {
        token_secret: b"test-secret-key-must-be-at-least-32-characters-long!".to_vec(),
        ..DevBackendConfig::development()
    }
}

pub fn expired_codes_config() -> DevBackendConfig {
    DevBackendConfig {
        reset_code_ttl: Duration::seconds(-1),
        ..test_backend_config()
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-real-ip", "203.0.113.9")
        .header(header::USER_AGENT, "account-tests/1.0")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn authed_get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub fn authed_json(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
