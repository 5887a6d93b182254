/// Error types for Story Service
///
/// Every handler returns `Result<HttpResponse>`; failures are rendered as a
/// small HTML page with the matching status code instead of aborting the
/// request.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

/// Result type for story-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// View rendering failed
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not allowed to touch the resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn title(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "Not Found",
            AppError::Forbidden(_) => "Forbidden",
            AppError::BadRequest(_) => "Bad Request",
            _ => "Something went wrong",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Template(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // Internal details stay in the logs.
        let detail = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "The server could not complete this request.".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(format!(
                "<!DOCTYPE html><html><head><title>{title}</title></head>\
                 <body><h1>{title}</h1><p>{detail}</p><a href=\"/stories\">Back to stories</a></body></html>",
                title = self.title(),
                detail = tera::escape_html(&detail),
            ))
    }
}
