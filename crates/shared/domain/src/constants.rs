//! Table names and `OpenAPI` tags.

pub const APPLICATION: &str = "application";
pub const CHALLENGE: &str = "challenge";
pub const CHALLENGE_RESOURCE: &str = "challenge_resource";
pub const LISTING: &str = "listing";
pub const PLATFORM_TOOL: &str = "platform_tool";
pub const APPOINTMENT: &str = "appointment";
pub const PRODUCT: &str = "product";
pub const AUDIT_TRAIL: &str = "audit_trail";

pub const SYSTEM_TAG: &str = "System";
pub const APPLICATIONS_TAG: &str = "Applications";
pub const CHALLENGES_TAG: &str = "Challenges";
pub const DIRECTORY_TAG: &str = "Directory";
pub const PLATFORM_TAG: &str = "Platform";
pub const APPOINTMENTS_TAG: &str = "Appointments";
pub const PRODUCTS_TAG: &str = "Products";
pub const AUDIT_TAG: &str = "Audit";

/// Request header carrying the caller's self-declared identity.
pub const ACTOR_HEADER: &str = "x-actor";
