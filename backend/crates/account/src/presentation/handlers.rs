//! HTTP Handlers
//!
//! Every handler follows the same shape: log the input, delegate to the
//! backend, shape the response. Failures answer under the default policy
//! (embedded status or 400) unless the handler says otherwise.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::application::config::AccountConfig;
use crate::application::messages;
use crate::domain::claim::SessionClaim;
use crate::domain::collaborator::{AccountBackend, Notifier, SsoSigner};
use crate::domain::model::{LoginAttempt, Mail, MailKind, NewUser, UserSettings};
use crate::domain::value_object::email::Email;
use crate::domain::value_object::sso_service::SsoService;
use crate::error::{AccountError, AccountResult};
use crate::presentation::context::RequestContext;
use crate::presentation::dto::{
    CancelWithdrawalRequest, ChangePasswordRequest, CountResponse, CreateTokenRequest,
    CryptoQuery, DeleteTokenRequest, LoginRequest, LoginsQuery, MessageResponse,
    ResetPasswordQuery, ResetPasswordRequest, ServiceLoginResponse, SignUpRequest, TokenResponse,
    UsernameRequest, VerificationResponse, VerifyQuery, VerifyRequest,
};
use crate::presentation::export;
use crate::presentation::extract::{AccountJson, AccountQuery};

/// Shared state for account handlers
#[derive(Clone)]
pub struct AccountAppState<B>
where
    B: AccountBackend,
{
    pub backend: Arc<B>,
    pub notifier: Arc<dyn Notifier>,
    pub sso: Arc<dyn SsoSigner>,
    pub config: Arc<AccountConfig>,
}

// ============================================================================
// Sign Up / Verification
// ============================================================================

/// POST /signup
pub async fn sign_up<B>(
    State(state): State<AccountAppState<B>>,
    ctx: RequestContext,
    AccountJson(req): AccountJson<SignUpRequest>,
) -> AccountResult<impl IntoResponse>
where
    B: AccountBackend,
{
    let log = ctx.log("sign_up");
    log.debug(&req);

    state
        .backend
        .check_captcha(req.captcha.as_deref(), ctx.ip())
        .await
        .map_err(|e| log.reject(e))?;

    state
        .backend
        .sign_up_user(NewUser {
            email: req.email,
            password: req.password,
            referral: req.referral,
        })
        .await
        .map_err(|e| log.reject(e))?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(messages::USER_REGISTERED)),
    ))
}

/// GET /verify
///
/// Looks up by email when a valid one is given, else by verification code.
/// An unknown user answers the generic "verification email sent" message.
pub async fn verification_lookup<B>(
    State(state): State<AccountAppState<B>>,
    ctx: RequestContext,
    AccountQuery(query): AccountQuery<VerifyQuery>,
) -> AccountResult<Response>
where
    B: AccountBackend,
{
    let log = ctx.log("verification_lookup");
    log.debug(&query);

    let email = query.email.as_deref().filter(|e| Email::is_valid(e));
    let code = query
        .verification_code
        .as_deref()
        .filter(|c| Uuid::parse_str(c).is_ok());

    let lookup = if let Some(email) = email {
        state
            .backend
            .verification_code_by_email(email)
            .await
            .map(|found| {
                if query.resend {
                    state.notifier.send(Mail {
                        kind: MailKind::Signup,
                        to: found.email.clone(),
                        data: json!({ "code": found.code }),
                        domain: ctx.client.domain.clone(),
                    });
                }
                VerificationResponse {
                    email: found.email,
                    verification_code: found.code,
                    message: messages::VERIFICATION_EMAIL_MESSAGE.to_string(),
                }
            })
    } else if let Some(code) = code {
        state
            .backend
            .email_by_verification_code(code)
            .await
            .map(|email| VerificationResponse {
                email,
                verification_code: code.to_string(),
                message: messages::VERIFICATION_EMAIL_MESSAGE.to_string(),
            })
    } else {
        return Err(log.reject(AccountError::InvalidEmailOrCode));
    };

    match lookup {
        Ok(body) => Ok(Json(body).into_response()),
        Err(err) if err.is_user_not_found() => {
            log.failure(&err);
            Ok(Json(MessageResponse::new(messages::VERIFICATION_EMAIL_MESSAGE)).into_response())
        }
        Err(err) => Err(log.reject(err)),
    }
}

/// POST /verify
pub async fn verify_user<B>(
    State(state): State<AccountAppState<B>>,
    ctx: RequestContext,
    AccountJson(req): AccountJson<VerifyRequest>,
) -> AccountResult<Json<MessageResponse>>
where
    B: AccountBackend,
{
    let log = ctx.log("verify_user");
    log.debug(&req);

    state
        .backend
        .verify_user(&req.email, &req.verification_code, ctx.domain())
        .await
        .map_err(|e| log.reject(e))?;

    Ok(Json(MessageResponse::new(messages::USER_VERIFIED)))
}

// ============================================================================
// Login
// ============================================================================

/// POST /login
///
/// Every failure, whatever its origin, answers 403 with its message.
pub async fn login<B>(
    State(state): State<AccountAppState<B>>,
    ctx: RequestContext,
    payload: Result<AccountJson<LoginRequest>, AccountError>,
) -> AccountResult<Response>
where
    B: AccountBackend,
{
    let log = ctx.log("login");
    let AccountJson(req) = payload.map_err(|e| log.reject(e).into_login_failure())?;
    log.debug(&req);

    authenticate(&state, &ctx, req)
        .await
        .map_err(|e| log.reject(e).into_login_failure())
}

async fn authenticate<B>(
    state: &AccountAppState<B>,
    ctx: &RequestContext,
    req: LoginRequest,
) -> AccountResult<Response>
where
    B: AccountBackend,
{
    let time = Utc::now();
    let service = req.service.filter(|s| !s.is_empty());

    let user = state
        .backend
        .login_user(LoginAttempt {
            email: req.email,
            password: req.password,
            otp_code: req.otp_code,
            captcha: req.captcha,
            client: ctx.client.clone(),
        })
        .await?;

    let Some(service) = service else {
        state.notifier.send(Mail {
            kind: MailKind::Login,
            to: user.email.clone(),
            data: json!({
                "ip": ctx.client.ip,
                "device": ctx.client.user_agent,
                "time": time,
                "settings": user.settings,
            }),
            domain: ctx.client.domain.clone(),
        });

        let token = state.backend.issue_token(&user.claim(), ctx.ip())?;
        return Ok((StatusCode::CREATED, Json(TokenResponse { token })).into_response());
    };

    let service: SsoService = service.parse()?;
    let callback_url = state.sso.callback_url(service, &user)?;

    Ok((
        StatusCode::CREATED,
        Json(ServiceLoginResponse {
            service: service.code().to_string(),
            callback_url,
        }),
    )
        .into_response())
}

/// GET /verify-token
pub async fn verify_token(
    ctx: RequestContext,
    claim: SessionClaim,
) -> Json<MessageResponse> {
    ctx.log("verify_token").debug(&claim.email);
    Json(MessageResponse::new(messages::VALID_TOKEN))
}

// ============================================================================
// Passwords
// ============================================================================

/// GET /reset-password
///
/// Answers the same message whether or not the email belongs to a user.
pub async fn request_password_reset<B>(
    State(state): State<AccountAppState<B>>,
    ctx: RequestContext,
    AccountQuery(query): AccountQuery<ResetPasswordQuery>,
) -> AccountResult<Json<MessageResponse>>
where
    B: AccountBackend,
{
    let log = ctx.log("request_password_reset");
    log.debug(&query);

    let sent = Json(MessageResponse::new(messages::password_request_sent(
        &query.email,
    )));

    match state
        .backend
        .send_reset_password_code(&query.email, query.captcha.as_deref(), ctx.ip(), ctx.domain())
        .await
    {
        Ok(()) => Ok(sent),
        Err(err) if err.is_user_not_found() => Ok(sent),
        Err(err) => Err(log.reject(err)),
    }
}

/// POST /reset-password
pub async fn reset_password<B>(
    State(state): State<AccountAppState<B>>,
    ctx: RequestContext,
    AccountJson(req): AccountJson<ResetPasswordRequest>,
) -> AccountResult<Json<MessageResponse>>
where
    B: AccountBackend,
{
    let log = ctx.log("reset_password");
    log.debug(&req);

    state
        .backend
        .reset_user_password(&req.code, &req.new_password)
        .await
        .map_err(|e| log.reject(e).with_message(messages::INVALID_CODE))?;

    Ok(Json(MessageResponse::new(messages::PASSWORD_UPDATED)))
}

/// POST /user/change-password
pub async fn change_password<B>(
    State(state): State<AccountAppState<B>>,
    ctx: RequestContext,
    claim: SessionClaim,
    AccountJson(req): AccountJson<ChangePasswordRequest>,
) -> AccountResult<Json<MessageResponse>>
where
    B: AccountBackend,
{
    let log = ctx.log("change_password");
    log.debug(&claim.email);

    state
        .backend
        .change_user_password(&claim.email, &req.old_password, &req.new_password)
        .await
        .map_err(|e| log.reject(e))?;

    Ok(Json(MessageResponse::new(messages::PASSWORD_CHANGED)))
}

// ============================================================================
// Profile
// ============================================================================

/// GET /user
pub async fn get_user<B>(
    State(state): State<AccountAppState<B>>,
    ctx: RequestContext,
    claim: SessionClaim,
) -> AccountResult<impl IntoResponse>
where
    B: AccountBackend,
{
    let log = ctx.log("get_user");
    log.debug(&claim.email);

    let user = state
        .backend
        .user_by_email(&claim.email)
        .await
        .map_err(|e| log.reject(e))?;

    Ok(Json(user.without_password()))
}

/// PUT /user/settings
pub async fn update_settings<B>(
    State(state): State<AccountAppState<B>>,
    ctx: RequestContext,
    claim: SessionClaim,
    AccountJson(settings): AccountJson<UserSettings>,
) -> AccountResult<impl IntoResponse>
where
    B: AccountBackend,
{
    let log = ctx.log("update_settings");
    log.debug(&settings);

    let user = state
        .backend
        .update_user_settings(&claim.email, settings)
        .await
        .map_err(|e| log.reject(e))?;

    Ok(Json(user.without_password()))
}

/// POST /user/username
pub async fn set_username<B>(
    State(state): State<AccountAppState<B>>,
    ctx: RequestContext,
    claim: SessionClaim,
    AccountJson(req): AccountJson<UsernameRequest>,
) -> AccountResult<Json<MessageResponse>>
where
    B: AccountBackend,
{
    let log = ctx.log("set_username");
    log.debug(&req);

    state
        .backend
        .set_username(claim.id, &req.username)
        .await
        .map_err(|e| log.reject(e))?;

    Ok(Json(MessageResponse::new(messages::USERNAME_CHANGED)))
}

/// GET /user/logins
///
/// A truthy `format` answers 202 with the history as a CSV attachment.
pub async fn user_logins<B>(
    State(state): State<AccountAppState<B>>,
    ctx: RequestContext,
    claim: SessionClaim,
    AccountQuery(query): AccountQuery<LoginsQuery>,
) -> AccountResult<Response>
where
    B: AccountBackend,
{
    let log = ctx.log("user_logins");
    log.debug(&query);

    let (query, export) = query.into_parts();
    let page = state
        .backend
        .user_logins(claim.id, query)
        .await
        .map_err(|e| log.reject(e))?;

    if !export {
        return Ok(Json(page).into_response());
    }

    let disposition = format!(
        "attachment; filename={}",
        state.config.logins_filename()
    );
    Ok((
        StatusCode::ACCEPTED,
        [
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_TYPE, "text/csv".to_string()),
        ],
        export::logins_csv(&page.data),
    )
        .into_response())
}

/// GET /user/affiliation
pub async fn affiliation_count<B>(
    State(state): State<AccountAppState<B>>,
    ctx: RequestContext,
    claim: SessionClaim,
) -> AccountResult<Json<CountResponse>>
where
    B: AccountBackend,
{
    let log = ctx.log("affiliation_count");

    let count = state
        .backend
        .affiliation_count(claim.id)
        .await
        .map_err(|e| log.reject(e))?;
    log.verbose(&count);

    Ok(Json(CountResponse { count }))
}

/// GET /user/stats
pub async fn user_stats<B>(
    State(state): State<AccountAppState<B>>,
    ctx: RequestContext,
    claim: SessionClaim,
) -> AccountResult<impl IntoResponse>
where
    B: AccountBackend,
{
    let log = ctx.log("user_stats");

    let stats = state
        .backend
        .user_stats(claim.id)
        .await
        .map_err(|e| log.reject(e))?;
    log.verbose(&stats);

    Ok(Json(stats))
}

/// POST /user/deactivate
pub async fn deactivate<B>(
    State(state): State<AccountAppState<B>>,
    ctx: RequestContext,
    claim: SessionClaim,
) -> AccountResult<Json<MessageResponse>>
where
    B: AccountBackend,
{
    let log = ctx.log("deactivate");
    log.debug(&claim.email);

    state
        .backend
        .freeze_user(claim.id)
        .await
        .map_err(|e| log.reject(e))?;

    Ok(Json(MessageResponse::new(messages::account_deactivated(
        &claim.email,
    ))))
}

// ============================================================================
// Wallet
// ============================================================================

/// GET /user/balance
pub async fn user_balance<B>(
    State(state): State<AccountAppState<B>>,
    ctx: RequestContext,
    claim: SessionClaim,
) -> AccountResult<impl IntoResponse>
where
    B: AccountBackend,
{
    let log = ctx.log("user_balance");

    let balance = state
        .backend
        .user_balance(claim.id)
        .await
        .map_err(|e| log.reject(e))?;
    log.verbose(&balance);

    Ok(Json(balance))
}

/// GET /user/create-address
pub async fn create_crypto_address<B>(
    State(state): State<AccountAppState<B>>,
    ctx: RequestContext,
    claim: SessionClaim,
    AccountQuery(query): AccountQuery<CryptoQuery>,
) -> AccountResult<impl IntoResponse>
where
    B: AccountBackend,
{
    let log = ctx.log("create_crypto_address");
    log.debug(&query);

    let crypto = query.crypto.unwrap_or_default();
    if crypto.is_empty() || !state.backend.supports_coin(&crypto) {
        return Err(log.reject(AccountError::InvalidCrypto(crypto)));
    }

    let address = state
        .backend
        .create_crypto_address(claim.id, &crypto)
        .await
        .map_err(|e| log.reject(e))?;

    Ok((StatusCode::CREATED, Json(address)))
}

/// DELETE /user/withdrawal
pub async fn cancel_withdrawal<B>(
    State(state): State<AccountAppState<B>>,
    ctx: RequestContext,
    claim: SessionClaim,
    AccountJson(req): AccountJson<CancelWithdrawalRequest>,
) -> AccountResult<impl IntoResponse>
where
    B: AccountBackend,
{
    let log = ctx.log("cancel_withdrawal");
    log.debug(&req);

    let withdrawal = state
        .backend
        .cancel_withdrawal(claim.id, &req.transaction_id)
        .await
        .map_err(|e| log.reject(e))?;

    Ok(Json(withdrawal))
}

// ============================================================================
// HMAC tokens
// ============================================================================

/// GET /user/tokens
pub async fn hmac_tokens<B>(
    State(state): State<AccountAppState<B>>,
    ctx: RequestContext,
    claim: SessionClaim,
) -> AccountResult<impl IntoResponse>
where
    B: AccountBackend,
{
    let log = ctx.log("hmac_tokens");

    let tokens = state
        .backend
        .hmac_tokens(claim.id)
        .await
        .map_err(|e| log.reject(e))?;

    Ok(Json(tokens))
}

/// POST /user/tokens
pub async fn create_hmac_token<B>(
    State(state): State<AccountAppState<B>>,
    ctx: RequestContext,
    claim: SessionClaim,
    AccountJson(req): AccountJson<CreateTokenRequest>,
) -> AccountResult<impl IntoResponse>
where
    B: AccountBackend,
{
    let log = ctx.log("create_hmac_token");
    log.debug(&req.name);

    let token = state
        .backend
        .create_hmac_token(claim.id, req.otp_code.as_deref(), ctx.ip(), &req.name)
        .await
        .map_err(|e| log.reject(e))?;

    Ok(Json(token))
}

/// DELETE /user/tokens
pub async fn delete_hmac_token<B>(
    State(state): State<AccountAppState<B>>,
    ctx: RequestContext,
    claim: SessionClaim,
    AccountJson(req): AccountJson<DeleteTokenRequest>,
) -> AccountResult<Json<MessageResponse>>
where
    B: AccountBackend,
{
    let log = ctx.log("delete_hmac_token");
    log.debug(&req.token_id);

    state
        .backend
        .delete_hmac_token(claim.id, req.otp_code.as_deref(), req.token_id)
        .await
        .map_err(|e| log.reject(e))?;

    Ok(Json(MessageResponse::new(messages::TOKEN_REMOVED)))
}
