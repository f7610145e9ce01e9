//! Extractors whose rejections speak [`AppError`].
//!
//! axum's stock `Json`, `Path` and `Query` reject with plain-text bodies and
//! their own status codes; wrapping them keeps every error response in the
//! same JSON shape.

use axum::extract::FromRequest;
use axum::extract::FromRequestParts;

use crate::error::AppError;

/// JSON request body. Malformed bodies become `400` under `non_field_errors`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Payload<T>(pub T);

/// Path parameters. Ids that do not parse become `404`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct IdPath<T>(pub T);

/// Query string parameters.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);
