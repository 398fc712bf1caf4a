//! Text search, date ranges, sorting and paging over in-memory collections.

use crate::clock;
use crate::validation::ValidationErrors;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use utoipa::ToSchema;
use whub_domain::config::MarketplaceConfig;

/// Implemented by entities that take part in free-text search.
pub trait Searchable {
    /// Texts the query is matched against.
    fn search_fields(&self) -> Vec<&str>;
}

/// Case-insensitive substring query; blank matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextQuery(Option<String>);

impl TextQuery {
    #[must_use]
    pub fn new(raw: Option<&str>) -> Self {
        Self(raw.map(|q| q.trim().to_lowercase()).filter(|q| !q.is_empty()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    #[must_use]
    pub fn matches_text(&self, text: &str) -> bool {
        self.0.as_deref().is_none_or(|q| text.to_lowercase().contains(q))
    }

    #[must_use]
    pub fn matches<T: Searchable + ?Sized>(&self, item: &T) -> bool {
        match &self.0 {
            None => true,
            Some(q) => item.search_fields().iter().any(|field| field.to_lowercase().contains(q)),
        }
    }
}

/// Inclusive calendar range; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Parses `YYYY-MM-DD` bounds coming from query parameters named `from` and `to`.
    pub fn parse(from: Option<&str>, to: Option<&str>) -> Result<Self, ValidationErrors> {
        let mut validator = crate::validation::Validator::new();
        let from = validator.optional_date("from", from);
        let to = validator.optional_date("to", to);
        validator.finish()?;

        let range = Self { from, to };
        if let (Some(from), Some(to)) = (from, to)
            && from > to
        {
            return Err(ValidationErrors::single("from", "must not be after 'to'"));
        }
        Ok(range)
    }

    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }

    /// Checks a stored RFC 3339 timestamp; unparsable values only match an unbounded range.
    #[must_use]
    pub fn contains_timestamp(&self, raw: &str) -> bool {
        clock::date_of(raw).map_or_else(|| self.is_unbounded(), |date| self.contains(date))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Orients an ascending comparison.
    #[must_use]
    pub const fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// Offset/limit window over a filtered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Page {
    /// Missing limits take the configured default; limits are clamped to `1..=max_page_size`.
    #[must_use]
    pub fn new(offset: Option<usize>, limit: Option<usize>, config: &MarketplaceConfig) -> Self {
        let max = config.max_page_size.max(1);
        let limit = limit.unwrap_or(config.default_page_size).clamp(1, max);
        Self { offset: offset.unwrap_or(0), limit }
    }

    /// Returns the window and the number of items before paging.
    #[must_use]
    pub fn apply<T>(&self, items: Vec<T>) -> (Vec<T>, usize) {
        let total = items.len();
        let window = items.into_iter().skip(self.offset).take(self.limit).collect();
        (window, total)
    }
}

/// Case-insensitive comparison for name-like sort keys.
#[must_use]
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

#[must_use]
pub fn compare_f64(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct Center {
        name: &'static str,
        city: &'static str,
    }

    impl Searchable for Center {
        fn search_fields(&self) -> Vec<&str> {
            vec![self.name, self.city]
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn query_matches_any_field_case_insensitively() {
        let center = Center { name: "Casa Prana", city: "Oaxaca" };
        assert!(TextQuery::new(Some("  PRANA ")).matches(&center));
        assert!(TextQuery::new(Some("oax")).matches(&center));
        assert!(!TextQuery::new(Some("tulum")).matches(&center));
        assert!(TextQuery::new(Some("   ")).matches(&center));
        assert!(TextQuery::new(None).is_empty());
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let range = DateRange::parse(Some("2025-01-10"), Some("2025-01-20")).unwrap();
        assert!(range.contains(date(2025, 1, 10)));
        assert!(range.contains(date(2025, 1, 20)));
        assert!(!range.contains(date(2025, 1, 21)));
        assert!(range.contains_timestamp("2025-01-15T08:00:00.000Z"));
    }

    #[test]
    fn inverted_or_malformed_ranges_fail() {
        assert!(DateRange::parse(Some("2025-02-01"), Some("2025-01-01")).unwrap_err().has("from"));
        assert!(DateRange::parse(None, Some("01/01/2025")).unwrap_err().has("to"));
        assert!(DateRange::parse(None, None).unwrap().is_unbounded());
    }

    #[test]
    fn page_defaults_and_clamps() {
        let config = MarketplaceConfig::default();
        assert_eq!(Page::new(None, None, &config), Page { offset: 0, limit: 50 });
        assert_eq!(Page::new(Some(5), Some(0), &config).limit, 1);
        assert_eq!(Page::new(None, Some(10_000), &config).limit, 200);
    }

    #[test]
    fn sort_order_reverses_for_desc() {
        assert_eq!(SortOrder::Desc.apply(Ordering::Less), Ordering::Greater);
        assert_eq!(SortOrder::Asc.apply(Ordering::Less), Ordering::Less);
        assert_eq!(SortOrder::default(), SortOrder::Desc);
    }

    proptest! {
        #[test]
        fn page_total_is_the_unpaged_length(
            len in 0usize..300,
            offset in 0usize..400,
            limit in 0usize..400,
        ) {
            let config = MarketplaceConfig::default();
            let page = Page::new(Some(offset), Some(limit), &config);
            let (items, total) = page.apply((0..len).collect::<Vec<_>>());
            prop_assert_eq!(total, len);
            prop_assert!(items.len() <= page.limit);
            prop_assert_eq!(items.len(), len.saturating_sub(offset).min(page.limit));
            prop_assert!(items.iter().all(|i| *i >= offset));
        }

        #[test]
        fn unbounded_range_contains_every_day(days in 0i64..40_000) {
            let day = date(1970, 1, 1) + chrono::Duration::days(days);
            prop_assert!(DateRange::default().contains(day));
        }
    }
}
