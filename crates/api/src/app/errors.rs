use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use shopper_core::DomainError;

/// Map a domain failure to a structured HTTP error response.
///
/// Machine-readable kind + human-readable message; storage internals are
/// never exposed.
pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let status = match &err {
        DomainError::Validation(_)
        | DomainError::InvalidId(_)
        | DomainError::InvalidAddress(_)
        | DomainError::ProductUnavailable(_)
        | DomainError::InsufficientStock(_)
        | DomainError::InvalidStatusTransition { .. } => StatusCode::BAD_REQUEST,
        DomainError::Unauthorized => StatusCode::FORBIDDEN,
        DomainError::NotFound => StatusCode::NOT_FOUND,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let message = match &err {
        DomainError::Storage(_) => "internal storage failure".to_string(),
        other => other.to_string(),
    };

    json_error(status, err.kind(), message)
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
