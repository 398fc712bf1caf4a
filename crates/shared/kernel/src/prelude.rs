//! Items nearly every slice handler needs.

pub use crate::audit::AuditEvent;
pub use crate::badge::{Badge, BadgeColor, StatusBadge};
pub use crate::clock;
pub use crate::links::ContactLinks;
pub use crate::listing::{DateRange, Page, Searchable, SortOrder, TextQuery};
pub use crate::safe_nanoid;
pub use crate::security::resource::ResourceGuard;
pub use crate::server::{Actor, ApiError, ApiJson, ApiQuery, ApiResult, ApiState, ErrorBody};
pub use crate::stats::{PeriodComparison, Trend};
pub use crate::validation::{ValidationErrors, Validator};
