//! Directory slice.
//!
//! Holistic centers, restaurants and shops share one listing model and one set of handlers,
//! mounted under `/api/holistic-centers`, `/api/restaurants` and `/api/shops`.

pub mod domain;
mod error;
mod handlers;
mod repository;
pub mod service;

pub use error::{DirectoryError, DirectoryErrorExt};
pub use repository::ListingRepository;

use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use whub_database::{Database, Migration};
use whub_kernel::domain::registry::InitializedSlice;
use whub_kernel::server::ApiState;

pub const SLICE: &str = "directory";

/// Directory feature state.
#[whub_derive::whub_slice]
pub struct Directory {
    pub listings: ListingRepository,
}

/// Initialize the directory feature.
pub fn init(database: &Database) -> Result<InitializedSlice, DirectoryError> {
    let inner = DirectoryInner { listings: ListingRepository::new(database.clone()) };

    tracing::info!("Directory slice initialized");
    Ok(InitializedSlice::new(Directory::new(inner)))
}

pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::create_listing, handlers::list_listings))
        .routes(routes!(handlers::get_listing, handlers::update_listing, handlers::delete_listing))
        .routes(routes!(handlers::set_listing_active))
        .routes(routes!(handlers::listing_contact))
}

#[must_use]
pub fn migrations() -> Vec<Migration> {
    vec![Migration::new(SLICE, "0001_init", include_str!("../migrations/0001_init.surql"))]
}
