//! # Domain
//!
//! Data-only types shared by every crate (`serde` and `bitflags` are the only dependencies).
//! No I/O and no business rules live here.

pub mod config;
pub mod constants;
pub mod registry;
pub mod schedule;
