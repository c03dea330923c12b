//! Body and Query Extractors
//!
//! `axum::Json` and `axum::extract::Query` with their rejections turned into
//! [`AccountError`], so malformed input answers the `{message}` envelope.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AccountError;

/// JSON body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AccountError))]
pub struct AccountJson<T>(pub T);

/// Query string
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AccountError))]
pub struct AccountQuery<T>(pub T);
