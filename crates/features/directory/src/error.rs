use std::borrow::Cow;
use whub_database::DatabaseError;
use whub_kernel::server::ApiError;
use whub_kernel::validation::ValidationErrors;

/// Directory slice error type.
#[whub_derive::whub_error]
pub enum DirectoryError {
    #[http(404)]
    #[error("Listing not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[http(422)]
    #[error("Invalid listing{}: {errors}", format_context(.context))]
    Validation { errors: ValidationErrors, context: Option<Cow<'static, str>> },

    #[error("Listing storage error{}: {source}", format_context(.context))]
    Database { source: DatabaseError, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl From<ValidationErrors> for DirectoryError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation { errors, context: None }
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Validation { errors, .. } => errors.into(),
            DirectoryError::Database { source, context } => Self::Database { source, context },
            other => Self::from_status(other.http_status(), other.to_string()),
        }
    }
}
