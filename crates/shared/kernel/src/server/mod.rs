//! HTTP plumbing shared by the slice routers.

mod actor;
mod error;
mod extract;
mod health;
pub mod router;
mod state;

pub use actor::Actor;
pub use error::{ApiError, ApiErrorExt, ApiResult, ErrorBody};
pub use extract::{ApiJson, ApiQuery};
pub use state::{ApiState, ApiStateBuilder, ApiStateError, ApiStateErrorExt, ApiStateInner};
