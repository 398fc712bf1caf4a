//! Digital products: meditations, e-books, courses and other downloadable media.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};
use whub_derive::api_model;
use whub_kernel::badge::{Badge, StatusBadge};
use whub_kernel::clock;
use whub_kernel::listing::{Searchable, SortOrder, TextQuery, compare_f64, compare_text};
use whub_kernel::stats::{PeriodComparison, round_cents};
use whub_kernel::validation::{ValidationErrors, Validator, currency_or, non_blank, non_blank_list};

pub const MAX_TITLE_LEN: usize = 150;

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
    strum_macros::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProductCategory {
    Meditation,
    Ebook,
    Course,
    Audio,
    Video,
    Workbook,
    Other,
}

impl ProductCategory {
    /// Media with a running time.
    #[must_use]
    pub const fn has_duration(self) -> bool {
        matches!(self, Self::Audio | Self::Video | Self::Course | Self::Meditation)
    }

    /// Printed-style media with pages.
    #[must_use]
    pub const fn has_pages(self) -> bool {
        matches!(self, Self::Ebook | Self::Workbook)
    }
}

#[api_model]
#[derive(Clone, PartialEq)]
pub struct DigitalProduct {
    pub id: String,
    pub professional_id: String,
    pub title: String,
    pub description: String,
    pub category: ProductCategory,
    pub price: f64,
    pub currency: String,
    pub cover_image_url: Option<String>,
    pub file_url: Option<String>,
    pub preview_url: Option<String>,
    pub duration_minutes: Option<i64>,
    pub pages: Option<i64>,
    pub tags: Vec<String>,
    pub is_active: bool,
    pub sales_count: i64,
    pub created_at: String,
    pub updated_at: String,
    pub badge: Badge,
}

impl DigitalProduct {
    #[must_use]
    pub fn revenue(&self) -> f64 {
        // Sales counts stay far below 2^52.
        #[allow(clippy::cast_precision_loss)]
        let sold = self.sales_count as f64;
        round_cents(self.price * sold)
    }

    pub fn set_active(&mut self, is_active: bool, at: &str) {
        self.is_active = is_active;
        self.badge = is_active.badge();
        self.updated_at = at.to_owned();
    }

    /// Overwrites every editable field; the owner and sales never change.
    pub fn apply(&mut self, input: ProductFields, default_currency: &str, at: &str) {
        self.title = input.title.trim().to_owned();
        self.description = input.description.trim().to_owned();
        self.category = input.category;
        self.price = input.price;
        self.currency = currency_or(input.currency, default_currency);
        self.cover_image_url = non_blank(input.cover_image_url);
        self.file_url = non_blank(input.file_url);
        self.preview_url = non_blank(input.preview_url);
        self.duration_minutes = input.duration_minutes;
        self.pages = input.pages;
        self.tags = non_blank_list(input.tags);
        if let Some(is_active) = input.is_active {
            self.is_active = is_active;
        }
        self.badge = self.is_active.badge();
        self.updated_at = at.to_owned();
    }
}

impl Searchable for DigitalProduct {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str(), self.description.as_str()];
        fields.extend(self.tags.iter().map(String::as_str));
        fields
    }
}

/// Editable product fields, the body of a full update.
#[api_model]
#[derive(Clone)]
pub struct ProductFields {
    pub title: String,
    pub description: String,
    pub category: ProductCategory,
    #[serde(default)]
    pub price: f64,
    /// Marketplace currency when omitted.
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
    /// Audio, video, course and meditation only.
    #[serde(default)]
    pub duration_minutes: Option<i64>,
    /// E-book and workbook only.
    #[serde(default)]
    pub pages: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Active on creation and unchanged on update when omitted.
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl ProductFields {
    fn check(&self, v: &mut Validator) {
        v.required("title", &self.title)
            .max_len("title", &self.title, MAX_TITLE_LEN)
            .required("description", &self.description)
            .non_negative("price", self.price)
            .optional_currency("currency", self.currency.as_deref())
            .optional_url("cover_image_url", self.cover_image_url.as_deref())
            .optional_url("file_url", self.file_url.as_deref())
            .optional_url("preview_url", self.preview_url.as_deref());

        if let Some(minutes) = self.duration_minutes {
            v.check(
                "duration_minutes",
                self.category.has_duration(),
                &format!("does not apply to {}", self.category),
            )
            .check("duration_minutes", minutes > 0, "must be greater than zero");
        }
        if let Some(pages) = self.pages {
            let applies = self.category.has_pages();
            v.check("pages", applies, &format!("does not apply to {}", self.category))
                .check("pages", pages > 0, "must be greater than zero");
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        self.check(&mut v);
        v.finish()
    }
}

/// Creation payload.
#[api_model(deny_unknown_fields = false)]
#[derive(Clone)]
pub struct CreateProduct {
    pub professional_id: String,
    #[serde(flatten)]
    pub fields: ProductFields,
}

impl CreateProduct {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.required("professional_id", &self.professional_id);
        self.fields.check(&mut v);
        v.finish()
    }

    #[must_use]
    pub fn into_product(self, id: String, default_currency: &str, at: &str) -> DigitalProduct {
        let mut product = DigitalProduct {
            id,
            professional_id: self.professional_id.trim().to_owned(),
            title: String::new(),
            description: String::new(),
            category: self.fields.category,
            price: 0.0,
            currency: String::new(),
            cover_image_url: None,
            file_url: None,
            preview_url: None,
            duration_minutes: None,
            pages: None,
            tags: Vec::new(),
            is_active: true,
            sales_count: 0,
            created_at: at.to_owned(),
            updated_at: at.to_owned(),
            badge: true.badge(),
        };
        product.apply(self.fields, default_currency, at);
        product
    }
}

#[api_model]
pub struct SetProductActive {
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    CreatedAt,
    Price,
    Title,
    /// Most sold first by default.
    Popularity,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Matches title, description and tags
    pub search: Option<String>,
    pub professional_id: Option<String>,
    pub category: Option<ProductCategory>,
    pub active: Option<bool>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort: Option<ProductSort>,
    pub order: Option<SortOrder>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl ProductQuery {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        if let Some(min) = self.min_price {
            v.non_negative("min_price", min);
        }
        if let Some(max) = self.max_price {
            v.non_negative("max_price", max);
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            v.check("min_price", min <= max, "must not exceed 'max_price'");
        }
        v.finish()
    }

    pub fn apply(
        &self,
        items: Vec<DigitalProduct>,
    ) -> Result<Vec<DigitalProduct>, ValidationErrors> {
        self.validate()?;
        let text = TextQuery::new(self.search.as_deref());
        let owner = self.professional_id.as_deref().map(str::trim).filter(|p| !p.is_empty());

        let mut items: Vec<_> = items
            .into_iter()
            .filter(|p| owner.is_none_or(|owner| p.professional_id == owner))
            .filter(|p| self.category.is_none_or(|c| p.category == c))
            .filter(|p| self.active.is_none_or(|active| p.is_active == active))
            .filter(|p| self.min_price.is_none_or(|min| p.price >= min))
            .filter(|p| self.max_price.is_none_or(|max| p.price <= max))
            .filter(|p| text.matches(p))
            .collect();

        let sort = self.sort.unwrap_or_default();
        let order = self.order.unwrap_or(match sort {
            ProductSort::Title => SortOrder::Asc,
            ProductSort::CreatedAt | ProductSort::Price | ProductSort::Popularity => {
                SortOrder::Desc
            }
        });
        items.sort_by(|a, b| order.apply(compare(sort, a, b)));
        Ok(items)
    }
}

fn compare(sort: ProductSort, a: &DigitalProduct, b: &DigitalProduct) -> Ordering {
    match sort {
        ProductSort::CreatedAt => a.created_at.cmp(&b.created_at),
        ProductSort::Price => compare_f64(a.price, b.price),
        ProductSort::Title => compare_text(&a.title, &b.title),
        ProductSort::Popularity => a.sales_count.cmp(&b.sales_count),
    }
}

#[api_model]
#[derive(Clone, PartialEq)]
pub struct ProductStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub total_sales: i64,
    /// Price times sales, summed over every product without currency conversion.
    pub gross_revenue: f64,
    /// Price times sales per currency code.
    pub revenue_by_currency: BTreeMap<String, f64>,
    pub created: PeriodComparison,
}

impl ProductStats {
    #[must_use]
    pub fn compute(items: &[DigitalProduct], today: NaiveDate, window_days: u32) -> Self {
        let active = items.iter().filter(|p| p.is_active).count();
        let mut revenue_by_currency: BTreeMap<String, f64> = BTreeMap::new();
        for product in items {
            *revenue_by_currency.entry(product.currency.clone()).or_default() += product.revenue();
        }
        revenue_by_currency.values_mut().for_each(|total| *total = round_cents(*total));
        Self {
            total: items.len(),
            active,
            inactive: items.len() - active,
            total_sales: items.iter().map(|p| p.sales_count).sum(),
            gross_revenue: round_cents(items.iter().map(DigitalProduct::revenue).sum()),
            revenue_by_currency,
            created: PeriodComparison::count(
                items.iter().filter_map(|p| clock::date_of(&p.created_at)),
                today,
                window_days,
            ),
        }
    }
}

#[api_model]
pub struct ProductList {
    pub items: Vec<DigitalProduct>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub stats: ProductStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use whub_kernel::badge::BadgeColor;

    fn fields(category: ProductCategory) -> ProductFields {
        ProductFields {
            title: "Morning calm".into(),
            description: "Ten minute guided meditation".into(),
            category,
            price: 99.0,
            currency: None,
            cover_image_url: None,
            file_url: Some("https://cdn.example.com/calm.mp3".into()),
            preview_url: None,
            duration_minutes: None,
            pages: None,
            tags: vec!["sleep".into(), " ".into()],
            is_active: None,
        }
    }

    fn product(title: &str, price: f64, sales: i64, created_at: &str) -> DigitalProduct {
        let mut product = CreateProduct {
            professional_id: "PRO1".into(),
            fields: ProductFields { title: title.into(), price, ..fields(ProductCategory::Audio) },
        }
        .into_product(title.to_lowercase(), "MXN", created_at);
        product.sales_count = sales;
        product
    }

    #[test]
    fn media_specific_fields() {
        let mut audio = fields(ProductCategory::Audio);
        audio.duration_minutes = Some(10);
        assert!(audio.validate().is_ok());
        audio.pages = Some(20);
        assert!(audio.validate().unwrap_err().has("pages"));

        let mut ebook = fields(ProductCategory::Ebook);
        ebook.pages = Some(0);
        assert!(ebook.validate().unwrap_err().has("pages"));
        ebook.pages = Some(120);
        ebook.duration_minutes = Some(30);
        assert!(ebook.validate().unwrap_err().has("duration_minutes"));

        let mut other = fields(ProductCategory::Other);
        other.duration_minutes = Some(5);
        other.pages = Some(5);
        let err = other.validate().unwrap_err();
        assert!(err.has("duration_minutes") && err.has("pages"));
    }

    #[test]
    fn creation_requires_owner() {
        let create = CreateProduct {
            professional_id: " ".into(),
            fields: fields(ProductCategory::Meditation),
        };
        assert!(create.validate().unwrap_err().has("professional_id"));
    }

    #[test]
    fn creation_defaults() {
        let p = product("Calm", 99.0, 0, "2025-06-01T00:00:00Z");
        assert!(p.is_active);
        assert_eq!(p.currency, "MXN");
        assert_eq!(p.tags, ["sleep"]);
        assert_eq!(p.badge.color, BadgeColor::Green);
    }

    #[test]
    fn price_bounds() {
        let query =
            ProductQuery { min_price: Some(200.0), max_price: Some(100.0), ..Default::default() };
        assert!(query.validate().unwrap_err().has("min_price"));

        let items = vec![
            product("A", 50.0, 1, "2025-06-01T00:00:00Z"),
            product("B", 150.0, 9, "2025-06-02T00:00:00Z"),
            product("C", 250.0, 3, "2025-06-03T00:00:00Z"),
        ];
        let query =
            ProductQuery { min_price: Some(100.0), max_price: Some(250.0), ..Default::default() };
        let titles: Vec<_> =
            query.apply(items.clone()).unwrap().into_iter().map(|p| p.title).collect();
        assert_eq!(titles, ["C", "B"]);

        let query = ProductQuery { sort: Some(ProductSort::Popularity), ..Default::default() };
        let titles: Vec<_> = query.apply(items).unwrap().into_iter().map(|p| p.title).collect();
        assert_eq!(titles, ["B", "C", "A"]);
    }

    #[test]
    fn stats_sum_sales() {
        let mut inactive = product("B", 150.0, 2, "2025-06-02T00:00:00Z");
        inactive.set_active(false, "later");
        let items = vec![product("A", 49.99, 3, "2025-06-01T00:00:00Z"), inactive];
        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let stats = ProductStats::compute(&items, today, 30);
        assert_eq!((stats.total, stats.active, stats.inactive, stats.total_sales), (2, 1, 1, 5));
        assert_eq!(stats.gross_revenue, 449.97);
        assert_eq!(stats.created.current, 2.0);
    }

    #[test]
    fn revenue_is_grouped_by_currency() {
        let mut dollars = product("B", 20.0, 2, "2025-06-02T00:00:00Z");
        dollars.currency = "USD".into();
        let items = vec![
            product("A", 100.0, 3, "2025-06-01T00:00:00Z"),
            dollars,
            product("C", 0.1, 3, "2025-06-03T00:00:00Z"),
        ];
        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let stats = ProductStats::compute(&items, today, 30);
        assert_eq!(stats.revenue_by_currency.len(), 2);
        assert_eq!(stats.revenue_by_currency["MXN"], 300.3);
        assert_eq!(stats.revenue_by_currency["USD"], 40.0);
        assert_eq!(stats.gross_revenue, 340.3);
    }
}
