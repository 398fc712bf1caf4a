use std::borrow::Cow;
use whub_database::DatabaseError;
use whub_kernel::server::ApiError;
use whub_kernel::validation::ValidationErrors;

/// Appointments slice error type.
#[whub_derive::whub_error]
pub enum AppointmentError {
    #[http(404)]
    #[error("Appointment not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[http(409)]
    #[error("Appointment conflict{}: {message}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[http(422)]
    #[error("Invalid appointment{}: {errors}", format_context(.context))]
    Validation { errors: ValidationErrors, context: Option<Cow<'static, str>> },

    #[error("Appointment storage error{}: {source}", format_context(.context))]
    Database { source: DatabaseError, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl From<ValidationErrors> for AppointmentError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation { errors, context: None }
    }
}

impl From<AppointmentError> for ApiError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::Validation { errors, .. } => errors.into(),
            AppointmentError::Database { source, context } => Self::Database { source, context },
            other => Self::from_status(other.http_status(), other.to_string()),
        }
    }
}
