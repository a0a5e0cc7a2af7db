use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Failure outcomes of the task, category and auth surfaces.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("resource not found")]
    NotFound,
    #[error("operation not permitted on this resource")]
    InvalidOperation,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidOperation | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        match self {
            ApiError::NotFound | ApiError::InvalidOperation => HttpResponse::build(status).finish(),
            ApiError::Validation(message)
            | ApiError::Conflict(message)
            | ApiError::Unauthorized(message) => {
                HttpResponse::build(status).json(json!({ "message": message }))
            }
            ApiError::Store(_) | ApiError::Internal(_) => {
                error!("{}", self);
                HttpResponse::build(status).json(json!({ "message": "internal server error" }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn not_found_has_no_body() {
        let resp = ApiError::NotFound.error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert!(body.is_empty());
    }

    #[actix_web::test]
    async fn store_failure_does_not_leak_detail() {
        let resp = ApiError::from(StoreError::Poisoned("tasks")).error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(resp.into_body()).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("tasks"));
    }

    #[test]
    fn validation_and_rejection_share_status_but_not_variant() {
        assert_eq!(ApiError::InvalidOperation.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::validation("title is required").status_code(), StatusCode::BAD_REQUEST);
    }
}
