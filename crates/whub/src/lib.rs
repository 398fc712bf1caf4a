//! Facade crate for the `WellnessHub` marketplace features and shared modules.
//! Re-exports domain/kernel primitives and aggregates feature initialization, routing and
//! migrations. Keep this crate thin: it should compose other crates, not implement business logic.

use utoipa_axum::router::OpenApiRouter;
use whub_database::{Database, Migration};
pub use whub_domain as domain;
use whub_event_bus::EventBus;
pub use whub_kernel as kernel;
use whub_kernel::server::ApiState;

pub mod server {
    pub mod router {
        pub use whub_kernel::server::router::system_router;
    }
}

/// Feature registry for runtime introspection.
pub mod features {
    pub use whub_applications as applications;
    pub use whub_appointments as appointments;
    pub use whub_audit as audit;
    pub use whub_challenges as challenges;
    pub use whub_directory as directory;
    pub use whub_platform as platform;
    pub use whub_products as products;

    /// Slices compiled into this build, in initialization order.
    pub const ENABLED: &[&str] = &[
        audit::SLICE,
        applications::SLICE,
        challenges::SLICE,
        directory::SLICE,
        platform::SLICE,
        appointments::SLICE,
        products::SLICE,
    ];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}

/// Initialize every feature slice.
///
/// The audit slice starts recording before any other slice can publish, so this must run inside
/// a Tokio runtime.
///
/// # Errors
/// Returns an error if any feature initialization fails.
pub fn init(
    database: &Database,
    events: &EventBus,
) -> Result<Vec<domain::registry::InitializedSlice>, Box<dyn std::error::Error + Send + Sync>> {
    let slices = vec![
        features::audit::init(database, events)?,
        features::applications::init(database)?,
        features::challenges::init(database)?,
        features::directory::init(database)?,
        features::platform::init(database)?,
        features::appointments::init(database)?,
        features::products::init(database)?,
    ];

    Ok(slices)
}

/// System routes plus the routes of every slice.
pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .merge(server::router::system_router())
        .merge(features::applications::router())
        .merge(features::challenges::router())
        .merge(features::directory::router())
        .merge(features::platform::router())
        .merge(features::appointments::router())
        .merge(features::products::router())
        .merge(features::audit::router())
}

/// Schema scripts of every slice, in the order they are applied.
#[must_use]
pub fn migrations() -> Vec<Migration> {
    [
        features::audit::migrations(),
        features::applications::migrations(),
        features::challenges::migrations(),
        features::directory::migrations(),
        features::platform::migrations(),
        features::appointments::migrations(),
        features::products::migrations(),
    ]
    .into_iter()
    .flatten()
    .collect()
}
