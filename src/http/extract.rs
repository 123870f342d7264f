//! Request extractors

use axum::extract::{FromRequest, FromRequestParts};

use super::routes::AppError;

/// JSON body whose rejections (bad syntax, missing fields) surface as
/// `invalid_input` errors instead of axum's plain-text responses
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string with the same error shape as [`ApiJson`]
#[derive(Debug, Clone, Copy, Default, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);
