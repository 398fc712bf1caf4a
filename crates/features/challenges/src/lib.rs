//! Challenges slice.
//!
//! Multi-day programs with a derived phase, plus their file and link attachments under
//! `/api/challenges/{id}/resources`.

pub mod domain;
mod error;
mod handlers;
mod repository;
pub mod resources;
pub mod service;

pub use error::{ChallengeError, ChallengeErrorExt};
pub use repository::{ChallengeRepository, ResourceRepository};

use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use whub_database::{Database, Migration};
use whub_kernel::domain::registry::InitializedSlice;
use whub_kernel::server::ApiState;

pub const SLICE: &str = "challenges";

/// Challenges feature state.
#[whub_derive::whub_slice]
pub struct Challenges {
    pub challenges: ChallengeRepository,
    pub resources: ResourceRepository,
}

/// Initialize the challenges feature.
pub fn init(database: &Database) -> Result<InitializedSlice, ChallengeError> {
    let inner = ChallengesInner {
        challenges: ChallengeRepository::new(database.clone()),
        resources: ResourceRepository::new(database.clone()),
    };

    tracing::info!("Challenges slice initialized");
    Ok(InitializedSlice::new(Challenges::new(inner)))
}

pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::create_challenge, handlers::list_challenges))
        .routes(routes!(
            handlers::get_challenge,
            handlers::update_challenge,
            handlers::delete_challenge
        ))
        .routes(routes!(handlers::set_challenge_status))
        .routes(routes!(handlers::list_resources, handlers::add_resource))
        .routes(routes!(handlers::update_resource, handlers::delete_resource))
}

#[must_use]
pub fn migrations() -> Vec<Migration> {
    vec![
        Migration::new(SLICE, "0001_init", include_str!("../migrations/0001_init.surql")),
        Migration::new(SLICE, "0002_resources", include_str!("../migrations/0002_resources.surql")),
    ]
}
