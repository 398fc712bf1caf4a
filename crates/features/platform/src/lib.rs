//! Platform slice.
//!
//! Services the marketplace itself pays for, with monthly cost normalisation and a spending
//! summary.

pub mod domain;
mod error;
mod handlers;
mod repository;
pub mod service;

pub use error::{PlatformError, PlatformErrorExt};
pub use repository::ToolRepository;

use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use whub_database::{Database, Migration};
use whub_kernel::domain::registry::InitializedSlice;
use whub_kernel::server::ApiState;

pub const SLICE: &str = "platform";

/// Platform feature state.
#[whub_derive::whub_slice]
pub struct Platform {
    pub tools: ToolRepository,
}

/// Initialize the platform feature.
pub fn init(database: &Database) -> Result<InitializedSlice, PlatformError> {
    let inner = PlatformInner { tools: ToolRepository::new(database.clone()) };

    tracing::info!("Platform slice initialized");
    Ok(InitializedSlice::new(Platform::new(inner)))
}

pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::create_tool, handlers::list_tools))
        .routes(routes!(handlers::cost_summary))
        .routes(routes!(handlers::get_tool, handlers::update_tool, handlers::delete_tool))
}

#[must_use]
pub fn migrations() -> Vec<Migration> {
    vec![Migration::new(SLICE, "0001_init", include_str!("../migrations/0001_init.surql"))]
}
