//! Session Middleware
//!
//! Bearer-token check for protected routes. A verified token leaves its
//! [`SessionClaim`] in the request extensions for the handlers to extract.

use axum::body::Body;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::domain::claim::SessionClaim;
use crate::domain::collaborator::AccountBackend;
use crate::error::AccountError;
use crate::presentation::context::RequestContext;
use crate::presentation::handlers::AccountAppState;

/// Middleware that requires a valid bearer token
pub async fn require_session_claim<B>(
    State(state): State<AccountAppState<B>>,
    ctx: RequestContext,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    B: AccountBackend,
{
    let Some(token) = bearer_token(&req) else {
        return AccountError::Unauthenticated.into_response();
    };

    match state.backend.verify_token(&token).await {
        Ok(claim) => {
            req.extensions_mut().insert(claim);
            next.run(req).await
        }
        Err(err) => {
            ctx.log("require_session_claim").failure(&err);
            AccountError::Unauthenticated.into_response()
        }
    }
}

fn bearer_token(req: &Request<Body>) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

impl<S> FromRequestParts<S> for SessionClaim
where
    S: Send + Sync,
{
    type Rejection = AccountError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionClaim>()
            .cloned()
            .ok_or(AccountError::Unauthenticated)
    }
}
