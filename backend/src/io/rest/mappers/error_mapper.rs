//! Translation of domain errors into HTTP responses.

use axum::{http::StatusCode, Json};
use shared::ErrorResponse;

use crate::domain::CategoryError;

/// Status code and body for a failed category operation. Storage failures
/// get an opaque message; the details are already in the log.
pub fn error_response(err: &CategoryError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, kind, message) = match err {
        CategoryError::Validation(e) => (StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
        CategoryError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", err.to_string()),
        CategoryError::HasChildren(_) => (StatusCode::CONFLICT, "has_children", err.to_string()),
        CategoryError::HasReferences { .. } => {
            (StatusCode::CONFLICT, "has_references", err.to_string())
        }
        CategoryError::Storage(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal storage error".to_string(),
        ),
    };

    (
        status,
        Json(ErrorResponse {
            error: kind.to_string(),
            message,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValidationError;

    #[test]
    fn test_status_per_error_kind() {
        let cases = vec![
            (CategoryError::Validation(ValidationError::EmptyName), StatusCode::BAD_REQUEST),
            (CategoryError::NotFound("x".to_string()), StatusCode::NOT_FOUND),
            (CategoryError::HasChildren("x".to_string()), StatusCode::CONFLICT),
            (
                CategoryError::HasReferences {
                    id: "x".to_string(),
                    count: 3,
                },
                StatusCode::CONFLICT,
            ),
            (
                CategoryError::Storage(anyhow::anyhow!("disk on fire")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let (status, _) = error_response(&err);
            assert_eq!(status, expected, "wrong status for {:?}", err);
        }
    }

    #[test]
    fn test_storage_details_are_not_leaked() {
        let (_, Json(body)) = error_response(&CategoryError::Storage(anyhow::anyhow!("secret path")));
        assert_eq!(body.error, "internal_error");
        assert!(!body.message.contains("secret"));
    }
}
