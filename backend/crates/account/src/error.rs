//! Account Error Types
//!
//! Closed set of failures a collaborator (or the dispatcher itself) can
//! report. Each variant knows whether it carries an HTTP status of its own;
//! the default policy answers 400 when it does not.

use std::borrow::Cow;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

use crate::application::messages;

/// Account-specific result type alias
pub type AccountResult<T> = Result<T, AccountError>;

/// Account-specific error variants
#[derive(Debug, Error)]
pub enum AccountError {
    /// No user matches the email, id or code
    #[error("User not found")]
    UserNotFound,

    /// Domain rejection with an optional embedded status
    #[error("{message}")]
    Rejected {
        status: Option<ErrorKind>,
        message: Cow<'static, str>,
    },

    /// Field validation failure; one message per offending field
    #[error("Validation error: {}", .0.join(", "))]
    Validation(Vec<String>),

    /// Login requested a third-party service we cannot sign for
    #[error("Service not supported")]
    ServiceNotSupported,

    /// Requested coin is not one the exchange supports
    #[error("Invalid crypto: \"{0}\"")]
    InvalidCrypto(String),

    /// Neither a valid email nor a valid verification code was supplied
    #[error("{}", messages::PROVIDE_VALID_EMAIL_CODE)]
    InvalidEmailOrCode,

    /// Missing or invalid session token
    #[error("Missing or invalid authentication token")]
    Unauthenticated,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AccountError {
    /// Rejection without an embedded status
    pub fn rejected(message: impl Into<Cow<'static, str>>) -> Self {
        AccountError::Rejected {
            status: None,
            message: message.into(),
        }
    }

    /// Rejection carrying its own status
    pub fn rejected_with(status: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        AccountError::Rejected {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Status the error carries, if any
    pub fn embedded_status(&self) -> Option<ErrorKind> {
        match self {
            AccountError::Rejected { status, .. } => *status,
            AccountError::InvalidCrypto(_) => Some(ErrorKind::NotFound),
            AccountError::Unauthenticated => Some(ErrorKind::Unauthorized),
            AccountError::Internal(_) => Some(ErrorKind::InternalServerError),
            AccountError::UserNotFound
            | AccountError::Validation(_)
            | AccountError::ServiceNotSupported
            | AccountError::InvalidEmailOrCode => None,
        }
    }

    /// Status answered under the default policy
    pub fn kind(&self) -> ErrorKind {
        self.embedded_status().unwrap_or(ErrorKind::BadRequest)
    }

    /// Message written to the client
    ///
    /// Validation failures answer their first field message only.
    pub fn public_message(&self) -> String {
        match self {
            AccountError::Validation(messages) => messages
                .first()
                .cloned()
                .unwrap_or_else(|| "Validation error".to_string()),
            other => other.to_string(),
        }
    }

    /// Whether this is the "user not found" failure the masked flows hide
    pub fn is_user_not_found(&self) -> bool {
        matches!(self, AccountError::UserNotFound)
    }

    /// Login answers every failure with 403, keeping the message
    pub fn into_login_failure(self) -> Self {
        AccountError::rejected_with(ErrorKind::Forbidden, self.public_message())
    }

    /// Keep the status, replace the message
    pub fn with_message(self, message: impl Into<Cow<'static, str>>) -> Self {
        AccountError::Rejected {
            status: Some(self.kind()),
            message: message.into(),
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.public_message())
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        if let AccountError::Internal(msg) = &self {
            tracing::error!(message = %msg, "Account internal error");
        }
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AccountError {
    fn from(err: AppError) -> Self {
        AccountError::rejected_with(err.kind(), err.message().to_string())
    }
}

impl From<JsonRejection> for AccountError {
    fn from(rejection: JsonRejection) -> Self {
        AccountError::Validation(vec![rejection.body_text()])
    }
}

impl From<QueryRejection> for AccountError {
    fn from(rejection: QueryRejection) -> Self {
        AccountError::Validation(vec![rejection.body_text()])
    }
}
