//! Professional applications slice.
//!
//! Practitioners submit an application; administrators approve or reject it. Routes live under
//! `/api/applications`.

pub mod domain;
mod error;
mod handlers;
mod repository;
pub mod service;

pub use error::{ApplicationError, ApplicationErrorExt};
pub use repository::ApplicationRepository;

use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use whub_database::{Database, Migration};
use whub_kernel::domain::registry::InitializedSlice;
use whub_kernel::server::ApiState;

pub const SLICE: &str = "applications";

/// Applications feature state.
#[whub_derive::whub_slice]
pub struct Applications {
    pub repository: ApplicationRepository,
}

/// Initialize the applications feature.
pub fn init(database: &Database) -> Result<InitializedSlice, ApplicationError> {
    let inner = ApplicationsInner { repository: ApplicationRepository::new(database.clone()) };

    tracing::info!("Applications slice initialized");
    Ok(InitializedSlice::new(Applications::new(inner)))
}

pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::submit_application, handlers::list_applications))
        .routes(routes!(handlers::get_application, handlers::delete_application))
        .routes(routes!(handlers::review_application))
}

#[must_use]
pub fn migrations() -> Vec<Migration> {
    vec![Migration::new(SLICE, "0001_init", include_str!("../migrations/0001_init.surql"))]
}
