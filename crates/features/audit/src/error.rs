use std::borrow::Cow;
use whub_database::DatabaseError;
use whub_event_bus::EventBusError;
use whub_kernel::server::ApiError;

/// Audit slice error type.
#[whub_derive::whub_error]
pub enum AuditError {
    #[error("Audit storage error{}: {source}", format_context(.context))]
    Database { source: DatabaseError, context: Option<Cow<'static, str>> },

    #[error("Audit subscription error{}: {source}", format_context(.context))]
    Events { source: EventBusError, context: Option<Cow<'static, str>> },

    #[error("Audit error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::Database { source, context } => Self::Database { source, context },
            other => Self::from_status(other.http_status(), other.to_string()),
        }
    }
}
