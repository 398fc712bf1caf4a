//! Audit slice.
//!
//! Records every published [`AuditEvent`](whub_kernel::audit::AuditEvent) into the audit trail
//! and serves it back for review.

pub mod domain;
mod error;
mod handlers;
mod recorder;
mod repository;
pub mod service;

pub use error::{AuditError, AuditErrorExt};
pub use repository::AuditRepository;

use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use whub_database::{Database, Migration};
use whub_event_bus::EventBus;
use whub_kernel::domain::registry::InitializedSlice;
use whub_kernel::server::ApiState;

pub const SLICE: &str = "audit";

/// Audit feature state.
#[whub_derive::whub_slice]
pub struct Audit {
    pub entries: AuditRepository,
}

/// Initialize the audit feature and start recording events.
///
/// Must be called inside a Tokio runtime.
pub fn init(database: &Database, events: &EventBus) -> Result<InitializedSlice, AuditError> {
    let entries = AuditRepository::new(database.clone());
    recorder::spawn(entries.clone(), events)?;

    tracing::info!("Audit slice initialized");
    Ok(InitializedSlice::new(Audit::new(AuditInner { entries })))
}

pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new().routes(routes!(handlers::list_audit))
}

#[must_use]
pub fn migrations() -> Vec<Migration> {
    vec![Migration::new(SLICE, "0001_init", include_str!("../migrations/0001_init.surql"))]
}
