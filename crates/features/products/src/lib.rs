//! Products slice.
//!
//! Digital products owned by professionals, with activation, sales counting and revenue
//! statistics.

pub mod domain;
mod error;
mod handlers;
mod repository;
pub mod service;

pub use error::{ProductError, ProductErrorExt};
pub use repository::ProductRepository;

use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use whub_database::{Database, Migration};
use whub_kernel::domain::registry::InitializedSlice;
use whub_kernel::server::ApiState;

pub const SLICE: &str = "products";

/// Products feature state.
#[whub_derive::whub_slice]
pub struct Products {
    pub products: ProductRepository,
}

/// Initialize the products feature.
pub fn init(database: &Database) -> Result<InitializedSlice, ProductError> {
    let inner = ProductsInner { products: ProductRepository::new(database.clone()) };

    tracing::info!("Products slice initialized");
    Ok(InitializedSlice::new(Products::new(inner)))
}

pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::create_product, handlers::list_products))
        .routes(routes!(handlers::get_product, handlers::update_product, handlers::delete_product))
        .routes(routes!(handlers::set_product_active))
        .routes(routes!(handlers::record_sale))
}

#[must_use]
pub fn migrations() -> Vec<Migration> {
    vec![Migration::new(SLICE, "0001_init", include_str!("../migrations/0001_init.surql"))]
}
