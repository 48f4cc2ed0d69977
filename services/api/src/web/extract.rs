//! services/api/src/web/extract.rs
//!
//! Request extractors whose rejections are reported as `HttpError`, so a
//! malformed body or path answers with the same JSON error shape as every
//! other failure.

use axum::extract::{FromRequest, FromRequestParts};

use crate::web::error::HttpError;

/// `axum::Json` with a 400 `{"error": ...}` rejection.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(HttpError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` with a 400 `{"error": ...}` rejection.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(HttpError))]
pub struct ApiPath<T>(pub T);
