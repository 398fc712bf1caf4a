use std::borrow::Cow;
use whub_database::DatabaseError;
use whub_kernel::server::ApiError;
use whub_kernel::validation::ValidationErrors;

/// Challenges slice error type.
#[whub_derive::whub_error]
pub enum ChallengeError {
    #[http(404)]
    #[error("Challenge not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[http(422)]
    #[error("Invalid challenge{}: {errors}", format_context(.context))]
    Validation { errors: ValidationErrors, context: Option<Cow<'static, str>> },

    #[error("Challenge storage error{}: {source}", format_context(.context))]
    Database { source: DatabaseError, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl From<ValidationErrors> for ChallengeError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation { errors, context: None }
    }
}

impl From<ChallengeError> for ApiError {
    fn from(err: ChallengeError) -> Self {
        match err {
            ChallengeError::Validation { errors, .. } => errors.into(),
            ChallengeError::Database { source, context } => Self::Database { source, context },
            other => Self::from_status(other.http_status(), other.to_string()),
        }
    }
}
