//! Kernel utilities shared by every feature slice.
//!
//! * identifiers ([`safe_nanoid!`], [`security::resource::ResourceGuard`]),
//! * configuration loading ([`config`]),
//! * request validation, list filtering and paging, period statistics, status badges and
//!   contact links,
//! * the API state, error type and system routes ([`server`]).
//!
//! ```rust
//! # use whub_kernel::safe_nanoid;
//! let id = safe_nanoid!();
//! assert_eq!(id.len(), 12);
//! ```

pub mod audit;
pub mod badge;
pub mod clock;
pub mod config;
pub mod links;
pub mod listing;
pub mod prelude;
pub mod security;
pub mod server;
pub mod stats;
pub mod validation;

// Alphabet excludes visually ambiguous characters (I, O, l, 0, 1).
pub const SAFE_ALPHABET: &[char; 55] = &[
    '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L',
    'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b', 'c', 'd', 'e', 'f',
    'g', 'h', 'j', 'k', 'm', 'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

pub use nanoid::nanoid;
pub use whub_domain as domain;

/// Generates an unambiguous `NanoID` (12 characters unless a size is given).
#[macro_export]
macro_rules! safe_nanoid {
    () => {
        $crate::nanoid!(12, $crate::SAFE_ALPHABET)
    };
    ($size:expr) => {
        $crate::nanoid!($size, $crate::SAFE_ALPHABET)
    };
}
