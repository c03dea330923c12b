//! Account Router

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;

use crate::application::config::AccountConfig;
use crate::domain::collaborator::{AccountBackend, Notifier, SsoSigner};
use crate::presentation::handlers::{self, AccountAppState};
use crate::presentation::middleware::require_session_claim;

/// Create the account router for any backend implementation
///
/// Public routes sit at the root; everything under `/user` and
/// `/verify-token` requires a bearer token.
pub fn account_router<B>(
    backend: B,
    notifier: Arc<dyn Notifier>,
    sso: Arc<dyn SsoSigner>,
    config: AccountConfig,
) -> Router
where
    B: AccountBackend,
{
    let state = AccountAppState {
        backend: Arc::new(backend),
        notifier,
        sso,
        config: Arc::new(config),
    };

    let protected = Router::new()
        .route("/verify-token", get(handlers::verify_token))
        .route("/user", get(handlers::get_user::<B>))
        .route("/user/settings", put(handlers::update_settings::<B>))
        .route("/user/change-password", post(handlers::change_password::<B>))
        .route("/user/username", post(handlers::set_username::<B>))
        .route("/user/logins", get(handlers::user_logins::<B>))
        .route("/user/affiliation", get(handlers::affiliation_count::<B>))
        .route("/user/balance", get(handlers::user_balance::<B>))
        .route("/user/deactivate", post(handlers::deactivate::<B>))
        .route("/user/create-address", get(handlers::create_crypto_address::<B>))
        .route(
            "/user/tokens",
            get(handlers::hmac_tokens::<B>)
                .post(handlers::create_hmac_token::<B>)
                .delete(handlers::delete_hmac_token::<B>),
        )
        .route("/user/stats", get(handlers::user_stats::<B>))
        .route("/user/withdrawal", delete(handlers::cancel_withdrawal::<B>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session_claim::<B>,
        ));

    Router::new()
        .route("/signup", post(handlers::sign_up::<B>))
        .route(
            "/verify",
            get(handlers::verification_lookup::<B>).post(handlers::verify_user::<B>),
        )
        .route("/login", post(handlers::login::<B>))
        .route(
            "/reset-password",
            get(handlers::request_password_reset::<B>).post(handlers::reset_password::<B>),
        )
        .merge(protected)
        .with_state(state)
}
