use crate::security::resource::ResourceGuardError;
use crate::server::state::ApiStateError;
use crate::validation::{FieldError, ValidationErrors};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::borrow::Cow;
use tracing::{debug, error};
use whub_database::DatabaseError;
use whub_derive::api_model;

pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned by every handler.
#[whub_derive::whub_error]
pub enum ApiError {
    #[http(400)]
    #[error("Bad request{}: {message}", format_context(.context))]
    BadRequest { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[http(400)]
    #[error("Invalid identifier{}: {source}", format_context(.context))]
    InvalidId { source: ResourceGuardError, context: Option<Cow<'static, str>> },

    #[http(404)]
    #[error("Not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[http(409)]
    #[error("Conflict{}: {message}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[http(422)]
    #[error("Validation failed{}: {errors}", format_context(.context))]
    Validation { errors: ValidationErrors, context: Option<Cow<'static, str>> },

    #[error("State error{}: {source}", format_context(.context))]
    State { source: ApiStateError, context: Option<Cow<'static, str>> },

    #[error("Database error{}: {source}", format_context(.context))]
    Database { source: DatabaseError, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl ApiError {
    /// Maps a slice error onto the variant serving the same status.
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<Cow<'static, str>>) -> Self {
        let message = message.into();
        match status {
            400 => Self::BadRequest { message, context: None },
            404 => Self::NotFound { message, context: None },
            409 => Self::Conflict { message, context: None },
            422 => Self::Validation {
                errors: ValidationErrors::single("request", message),
                context: None,
            },
            _ => Self::Internal { message, context: None },
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation { errors, context: None }
    }
}

/// JSON body of every failed request.
#[api_model]
pub struct ErrorBody {
    /// Machine-readable error kind, e.g. `not_found`.
    pub error: String,
    pub message: String,
    /// Per-field problems of a rejected payload.
    pub fields: Vec<FieldError>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let kind = self.kind();

        let message = if status.is_server_error() {
            error!(kind, error = %self, "Request failed");
            "Internal server error".to_owned()
        } else {
            debug!(kind, error = %self, "Request rejected");
            self.to_string()
        };

        let fields = match self {
            Self::Validation { errors, .. } => errors.into_fields(),
            _ => Vec::new(),
        };

        (status, Json(ErrorBody { error: kind.to_owned(), message, fields })).into_response()
    }
}
