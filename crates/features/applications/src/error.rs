use std::borrow::Cow;
use whub_database::DatabaseError;
use whub_kernel::server::ApiError;
use whub_kernel::validation::ValidationErrors;

/// Applications slice error type.
#[whub_derive::whub_error]
pub enum ApplicationError {
    #[http(404)]
    #[error("Application not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[http(409)]
    #[error("Application conflict{}: {message}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[http(422)]
    #[error("Invalid application{}: {errors}", format_context(.context))]
    Validation { errors: ValidationErrors, context: Option<Cow<'static, str>> },

    #[error("Application storage error{}: {source}", format_context(.context))]
    Database { source: DatabaseError, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl From<ValidationErrors> for ApplicationError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation { errors, context: None }
    }
}

impl From<ApplicationError> for ApiError {
    fn from(err: ApplicationError) -> Self {
        match err {
            ApplicationError::Validation { errors, .. } => errors.into(),
            ApplicationError::Database { source, context } => Self::Database { source, context },
            other => Self::from_status(other.http_status(), other.to_string()),
        }
    }
}
