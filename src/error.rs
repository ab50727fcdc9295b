//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Business rules raise an `AppError` at the point of detection; it is translated exactly
//! once, at the HTTP boundary, into the JSON error body:
//!
//! ```json
//! { "timestamp": "...", "status": 404, "error": "Not Found", "message": "...", "path": "/api/topics/7" }
//! ```
//!
//! `AppError` implements `actix_web::error::ResponseError` for the status code, and the
//! [`error_handlers`] middleware renders the final body (it is the only layer that knows the
//! request path). Framework-generated failures such as unknown routes are normalized to the
//! same shape there.

use std::collections::BTreeMap;

use actix_web::{
    dev::ServiceResponse,
    error::{JsonPayloadError, QueryPayloadError},
    http::{header, StatusCode},
    middleware::{ErrorHandlerResponse, ErrorHandlers},
    HttpRequest, HttpResponse, ResponseError,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{ValidationError, ValidationErrors};

/// Message returned to clients for anything unclassified; the detail only goes to the log.
const GENERIC_INTERNAL_MESSAGE: &str = "An unexpected error occurred";

/// Represents all possible errors that can occur within the application.
///
/// The variants map one-to-one onto the externally visible outcomes, so `NotFound`,
/// `Forbidden` and `Duplicate` can never be confused by callers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or invalid credentials (HTTP 401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// Malformed request that never reached validation, e.g. broken JSON (HTTP 400).
    #[error("Bad Request: {0}")]
    BadRequest(String),
    /// Missing resource; inactive (soft-deleted) resources are reported the same way (HTTP 404).
    #[error("Not Found: {0}")]
    NotFound(String),
    /// Uniqueness violation (HTTP 400).
    #[error("Duplicate: {0}")]
    Duplicate(String),
    /// Authenticated, but not allowed to perform the operation (HTTP 403).
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// Field-level input validation failure, keyed by field name (HTTP 400).
    #[error("Validation failed: {0:?}")]
    ValidationFailed(BTreeMap<String, String>),
    /// Anything unanticipated (HTTP 500). The message is logged, never sent.
    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
}

/// The JSON body sent for every 4xx/5xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub error: String,
    pub message: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}

impl ErrorBody {
    fn new(status: StatusCode, error: &str, message: String, path: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            status: status.as_u16(),
            error: error.to_string(),
            message,
            path: path.to_string(),
            errors: None,
        }
    }

    /// Body for responses that did not originate from an `AppError`.
    fn for_framework_error(status: StatusCode, path: &str, cause: Option<String>) -> Self {
        let reason = status.canonical_reason().unwrap_or("Error");
        let message = match cause {
            Some(cause) if status.is_client_error() => cause,
            _ if status.is_server_error() => GENERIC_INTERNAL_MESSAGE.to_string(),
            _ => reason.to_string(),
        };
        Self::new(status, reason, message, path)
    }
}

impl AppError {
    /// The `error` field of the body.
    fn label(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::BadRequest(_) | AppError::Duplicate(_) => "Bad Request",
            AppError::NotFound(_) => "Not Found",
            AppError::Forbidden(_) => "Forbidden",
            AppError::ValidationFailed(_) => "Validation Error",
            AppError::InternalServerError(_) => "Internal Server Error",
        }
    }

    /// The `message` field of the body.
    fn client_message(&self) -> String {
        match self {
            AppError::Unauthorized(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Duplicate(msg)
            | AppError::Forbidden(msg) => msg.clone(),
            AppError::ValidationFailed(_) => "Validation failed".to_string(),
            AppError::InternalServerError(_) => GENERIC_INTERNAL_MESSAGE.to_string(),
        }
    }

    /// Renders the error body for a request path.
    pub fn to_body(&self, path: &str) -> ErrorBody {
        let mut body = ErrorBody::new(self.status_code(), self.label(), self.client_message(), path);
        if let AppError::ValidationFailed(fields) = self {
            body.errors = Some(fields.clone());
        }
        body
    }
}

/// Converts `AppError` variants into `HttpResponse` objects.
///
/// The body produced here has an empty `path`; [`error_handlers`] fills it in when the
/// middleware is installed.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) | AppError::Duplicate(_) | AppError::ValidationFailed(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::InternalServerError(detail) = self {
            log::error!("internal error: {}", detail);
        }
        HttpResponse::build(self.status_code()).json(self.to_body(""))
    }
}

/// Middleware that renders every error response as an [`ErrorBody`] carrying the request path.
pub fn error_handlers<B: 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new().default_handler(render_error_body)
}

fn render_error_body<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let (req, res) = res.into_parts();
    let status = res.status();

    let body = match res.error() {
        Some(err) => match err.as_error::<AppError>() {
            Some(app_err) => app_err.to_body(req.path()),
            None => ErrorBody::for_framework_error(status, req.path(), Some(err.to_string())),
        },
        None => ErrorBody::for_framework_error(status, req.path(), None),
    };
    let json = serde_json::to_string(&body).map_err(actix_web::error::ErrorInternalServerError)?;

    let mut res = res.set_body(json);
    res.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );

    let res = ServiceResponse::new(req, res)
        .map_into_boxed_body()
        .map_into_right_body();
    Ok(ErrorHandlerResponse::Response(res))
}

/// Error handler for `web::JsonConfig`: malformed or mistyped JSON becomes a 400.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Malformed request body: {}", err)).into()
}

/// Error handler for `web::QueryConfig`.
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Malformed query string: {}", err)).into()
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` maps to `NotFound` and a unique-constraint violation to `Duplicate`;
/// everything else is an internal error.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Duplicate("A record with the same unique values already exists".into())
            }
            _ => AppError::InternalServerError(format!("Database error: {}", error)),
        }
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationFailed`,
/// keeping the first message per field.
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .map(describe_validation_error)
                    .unwrap_or_else(|| "invalid value".to_string());
                (field.to_string(), message)
            })
            .collect();
        AppError::ValidationFailed(fields)
    }
}

fn describe_validation_error(err: &ValidationError) -> String {
    match &err.message {
        Some(message) => message.to_string(),
        None => format!("invalid value ({})", err.code),
    }
}

/// Converts `jsonwebtoken::errors::Error` into `AppError::Unauthorized`.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::Unauthorized(format!("Invalid token: {}", error))
    }
}

/// Converts `bcrypt::BcryptError` into `AppError::InternalServerError`.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}
