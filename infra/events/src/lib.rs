//! # Event Bus
//!
//! Type-keyed fan-out channels shared by the feature slices.
//!
//! A slice publishes a plain Rust value; every subscriber of that type receives it as an
//! `Arc<T>`. Publishing with nobody listening is fine and simply drops the value.
//!
//! ```rust
//! use whub_event_bus::{EventBus, EventReceiverExt};
//!
//! #[derive(Debug)]
//! struct ListingCreated(&'static str);
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), whub_event_bus::EventBusError> {
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe::<ListingCreated>()?;
//! bus.publish(ListingCreated("shop:7dHk2"))?;
//! assert_eq!(rx.next_event().await.map(|e| e.0), Some("shop:7dHk2"));
//! # Ok(())
//! # }
//! ```

mod bus;
mod error;
mod receiver;

pub use bus::{Event, EventBus};
pub use error::{EventBusError, EventBusErrorExt};
pub use receiver::EventReceiverExt;
