use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BadgeColor {
    Gray,
    Yellow,
    Green,
    Red,
    Blue,
    Purple,
    Orange,
}

/// Label and color a client renders for a status value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Badge {
    pub label: String,
    pub color: BadgeColor,
}

impl Badge {
    #[must_use]
    pub fn new(label: &str, color: BadgeColor) -> Self {
        Self { label: label.to_owned(), color }
    }
}

/// Fixed status-to-badge mapping of an entity status.
pub trait StatusBadge {
    fn badge(&self) -> Badge;
}

impl StatusBadge for bool {
    /// Active/inactive flag of listings and products.
    fn badge(&self) -> Badge {
        if *self {
            Badge::new("Active", BadgeColor::Green)
        } else {
            Badge::new("Inactive", BadgeColor::Gray)
        }
    }
}
