use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::inference::ClassifierError;
use crate::models::FieldError;

/// Failures surfaced by the HTTP handlers. Every variant renders as
/// `{"detail": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),
    #[error("Model not loaded")]
    ModelNotLoaded,
    #[error("{0}")]
    Internal(String),
    #[error("Not Found")]
    NotFound,
    #[error("Method Not Allowed")]
    MethodNotAllowed,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ModelNotLoaded | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Validation(errors) => json!({ "detail": errors }),
            other => json!({ "detail": other.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<ClassifierError> for ApiError {
    fn from(err: ClassifierError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<Vec<FieldError>> for ApiError {
    fn from(errors: Vec<FieldError>) -> Self {
        ApiError::Validation(errors)
    }
}

/// Turns body decoding failures into the same 422 shape as field errors.
/// A body with a non-JSON content type is refused here too; a missing
/// content type is accepted (see `routes::json_config`). Oversized bodies
/// keep actix's own response.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let field_error = match &err {
        JsonPayloadError::Deserialize(e) => {
            FieldError::json_invalid(Some(e.column()), format!("JSON decode error: {e}"))
        }
        JsonPayloadError::ContentType => {
            FieldError::json_invalid(None, "Expected an application/json body")
        }
        JsonPayloadError::Payload(e) => FieldError::json_invalid(None, e.to_string()),
        _ => return err.into(),
    };
    ApiError::Validation(vec![field_error]).into()
}
