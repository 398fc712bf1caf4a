//! Appointments slice.
//!
//! Booking with overlap detection per professional, a small status state machine, rescheduling
//! and payment tracking.

pub mod domain;
mod error;
mod handlers;
mod repository;
pub mod service;

pub use error::{AppointmentError, AppointmentErrorExt};
pub use repository::AppointmentRepository;

use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use whub_database::{Database, Migration};
use whub_kernel::domain::registry::InitializedSlice;
use whub_kernel::server::ApiState;

pub const SLICE: &str = "appointments";

/// Appointments feature state.
#[whub_derive::whub_slice]
pub struct Appointments {
    pub appointments: AppointmentRepository,
}

/// Initialize the appointments feature.
pub fn init(database: &Database) -> Result<InitializedSlice, AppointmentError> {
    let inner = AppointmentsInner { appointments: AppointmentRepository::new(database.clone()) };

    tracing::info!("Appointments slice initialized");
    Ok(InitializedSlice::new(Appointments::new(inner)))
}

pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::book_appointment, handlers::list_appointments))
        .routes(routes!(handlers::get_appointment, handlers::delete_appointment))
        .routes(routes!(handlers::set_appointment_status))
        .routes(routes!(handlers::reschedule_appointment))
        .routes(routes!(handlers::set_appointment_payment))
}

#[must_use]
pub fn migrations() -> Vec<Migration> {
    vec![Migration::new(SLICE, "0001_init", include_str!("../migrations/0001_init.surql"))]
}
