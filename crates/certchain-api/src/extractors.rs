//! Request extraction helpers.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Extract a JSON body, mapping deserialization errors to a 400.
///
/// Handlers take `Result<Json<T>, JsonRejection>` so that malformed bodies
/// produce the standard error body instead of axum's plain-text rejection.
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result.map(|Json(v)| v).map_err(AppError::from)
}
