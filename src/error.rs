use aide::OperationOutput;
use axum::{http::StatusCode, response::IntoResponse, Json};
use schemars::JsonSchema;
use serde_json::json;

/// Represent errors in the application
///
/// All `ServiceError`s can be transformed to http errors.
#[derive(Debug, Clone, PartialEq, JsonSchema)]
pub enum ServiceError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound,
    InsufficientPoints { requested: i32, available: i32 },
    ReservationConflict,
    TransactionAborted(String),
    InternalServerError(String),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for ServiceError {}

/// Helper for `ServiceError` result
pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<sqlx::Error> for ServiceError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => ServiceError::NotFound,
            error => ServiceError::InternalServerError(error.to_string()),
        }
    }
}

impl OperationOutput for ServiceError {
    type Inner = String;
}
impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ServiceError::BadRequest(ref cause) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": cause })))
            }
            ServiceError::Unauthorized(ref cause) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "error": cause })))
            }
            ServiceError::Forbidden(ref cause) => {
                (StatusCode::FORBIDDEN, Json(json!({ "error": cause })))
            }
            ServiceError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "Not found",
                })),
            ),
            ServiceError::InsufficientPoints {
                requested,
                available,
            } => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Not enough points available",
                    "requested": requested,
                    "available": available,
                })),
            ),
            ServiceError::ReservationConflict => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "This table is already reserved for the selected time",
                })),
            ),
            ServiceError::TransactionAborted(ref cause) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Transaction aborted",
                    "cause": cause,
                })),
            ),
            ServiceError::InternalServerError(ref cause) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "cause": cause })),
            ),
        }
        .into_response()
    }
}
