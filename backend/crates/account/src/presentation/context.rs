//! Request Context
//!
//! Transport metadata and the per-request operation log handed to every
//! handler.

use std::convert::Infallible;
use std::fmt;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use platform::client::{ClientMeta, extract_client_meta, extract_request_id};
use uuid::Uuid;

use crate::error::AccountError;

/// Correlation id and client metadata of one request
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub client: ClientMeta,
}

impl RequestContext {
    /// Log scoped to one handler operation
    pub fn log(&self, operation: &'static str) -> OperationLog {
        OperationLog {
            request_id: self.request_id,
            operation,
        }
    }

    pub fn ip(&self) -> Option<&str> {
        self.client.ip.as_deref()
    }

    pub fn domain(&self) -> Option<&str> {
        self.client.domain.as_deref()
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let direct_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip());

        Ok(Self {
            request_id: extract_request_id(&parts.headers),
            client: extract_client_meta(&parts.headers, direct_ip),
        })
    }
}

/// Structured log lines tagged with the request id and operation name
#[derive(Debug, Clone, Copy)]
pub struct OperationLog {
    request_id: Uuid,
    operation: &'static str,
}

impl OperationLog {
    pub fn debug(&self, detail: &dyn fmt::Debug) {
        tracing::debug!(
            request_id = %self.request_id,
            operation = self.operation,
            detail = ?detail,
            "Operation"
        );
    }

    pub fn verbose(&self, detail: &dyn fmt::Debug) {
        tracing::trace!(
            request_id = %self.request_id,
            operation = self.operation,
            detail = ?detail,
            "Operation result"
        );
    }

    /// Log a failure at a level matching its status
    pub fn failure(&self, err: &AccountError) {
        let kind = err.kind();
        if kind.is_server_error() {
            tracing::error!(
                request_id = %self.request_id,
                operation = self.operation,
                status = kind.status_code(),
                error = %err,
                "Request failed"
            );
        } else {
            tracing::warn!(
                request_id = %self.request_id,
                operation = self.operation,
                status = kind.status_code(),
                error = %err,
                "Request rejected"
            );
        }
    }

    /// Log the failure and hand it back, for `map_err`
    pub fn reject(&self, err: AccountError) -> AccountError {
        self.failure(&err);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn test_context_reads_proxy_headers() {
        let (mut parts, _) = Request::builder()
            .header("x-real-ip", "203.0.113.9")
            .header("x-real-origin", "app.example.io")
            .header("user-agent", "curl/8.0")
            .body(())
            .unwrap()
            .into_parts();

        let ctx = RequestContext::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(ctx.ip(), Some("203.0.113.9"));
        assert_eq!(ctx.domain(), Some("app.example.io"));
        assert_eq!(ctx.client.user_agent.as_deref(), Some("curl/8.0"));
    }

    #[tokio::test]
    async fn test_context_keeps_valid_request_id() {
        let id = Uuid::new_v4();
        let (mut parts, _) = Request::builder()
            .header("x-request-id", id.to_string())
            .body(())
            .unwrap()
            .into_parts();

        let ctx = RequestContext::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(ctx.request_id, id);
    }
}
