//! Challenges: multi-day wellness programs created by professionals, patients or admins.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use utoipa::{IntoParams, ToSchema};
use whub_derive::api_model;
use whub_kernel::badge::{Badge, BadgeColor, StatusBadge};
use whub_kernel::clock;
use whub_kernel::listing::{Searchable, SortOrder, TextQuery, compare_f64, compare_text};
use whub_kernel::stats::PeriodComparison;
use whub_kernel::validation::{ValidationErrors, Validator, currency_or, non_blank};

pub const MAX_TITLE_LEN: usize = 120;
pub const MAX_DURATION_DAYS: i64 = 365;

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
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
        pub enum $name {
            $($variant),+
        }
    };
}

string_enum!(Difficulty { Beginner, Intermediate, Advanced });

string_enum!(
    /// Who created the challenge; decides which owner ids are required.
    CreatorRole { Professional, Patient, Admin }
);

string_enum!(ChallengeStatus { Draft, Published, Archived });

string_enum!(
    /// Where a challenge stands relative to today.
    Phase { Unscheduled, Upcoming, Running, Finished }
);

impl StatusBadge for ChallengeStatus {
    fn badge(&self) -> Badge {
        match self {
            Self::Draft => Badge::new("Draft", BadgeColor::Gray),
            Self::Published => Badge::new("Published", BadgeColor::Green),
            Self::Archived => Badge::new("Archived", BadgeColor::Orange),
        }
    }
}

/// Phase of a challenge starting on `start` and lasting `duration_days`.
#[must_use]
pub fn phase(start: Option<NaiveDate>, duration_days: i64, today: NaiveDate) -> Phase {
    let Some(start) = start else {
        return Phase::Unscheduled;
    };
    if start > today {
        Phase::Upcoming
    } else if today < start + Duration::days(duration_days) {
        Phase::Running
    } else {
        Phase::Finished
    }
}

#[api_model]
#[derive(Clone, PartialEq)]
pub struct Challenge {
    pub id: String,
    pub title: String,
    pub short_description: Option<String>,
    pub description: String,
    pub cover_image_url: Option<String>,
    pub category: String,
    pub difficulty: Difficulty,
    pub duration_days: i64,
    pub price: f64,
    pub currency: String,
    /// `YYYY-MM-DD`
    pub start_date: Option<String>,
    pub created_by: CreatorRole,
    pub professional_id: Option<String>,
    pub patient_id: Option<String>,
    pub status: ChallengeStatus,
    /// Derived from the start date and duration when read.
    pub phase: Phase,
    pub created_at: String,
    pub updated_at: String,
    pub badge: Badge,
}

impl Challenge {
    #[must_use]
    pub fn phase_on(&self, today: NaiveDate) -> Phase {
        phase(self.start_date.as_deref().and_then(clock::parse_date), self.duration_days, today)
    }

    /// Recomputes derived fields.
    pub fn refresh(&mut self, today: NaiveDate) {
        self.phase = self.phase_on(today);
        self.badge = self.status.badge();
    }

    pub fn set_status(&mut self, status: ChallengeStatus, at: &str) {
        self.status = status;
        self.badge = status.badge();
        self.updated_at = at.to_owned();
    }

    /// Overwrites every editable field; ownership never changes.
    pub fn apply(&mut self, fields: ChallengeFields, default_currency: &str, at: &str) {
        self.title = fields.title.trim().to_owned();
        self.short_description = non_blank(fields.short_description);
        self.description = fields.description.trim().to_owned();
        self.cover_image_url = non_blank(fields.cover_image_url);
        self.category = fields.category.trim().to_owned();
        self.difficulty = fields.difficulty;
        self.duration_days = fields.duration_days;
        self.price = fields.price;
        self.currency = currency_or(fields.currency, default_currency);
        self.start_date = non_blank(fields.start_date);
        self.updated_at = at.to_owned();
    }
}

impl Searchable for Challenge {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields =
            vec![self.title.as_str(), self.description.as_str(), self.category.as_str()];
        fields.extend(self.short_description.as_deref());
        fields
    }
}

/// Editable challenge fields, the body of a full update.
#[api_model]
#[derive(Clone)]
pub struct ChallengeFields {
    pub title: String,
    #[serde(default)]
    pub short_description: Option<String>,
    pub description: String,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    pub category: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: Difficulty,
    pub duration_days: i64,
    #[serde(default)]
    pub price: f64,
    /// Marketplace currency when omitted.
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
}

const fn default_difficulty() -> Difficulty {
    Difficulty::Beginner
}

impl ChallengeFields {
    fn check(&self, v: &mut Validator) {
        v.required("title", &self.title)
            .max_len("title", &self.title, MAX_TITLE_LEN)
            .required("description", &self.description)
            .required("category", &self.category)
            .range("duration_days", self.duration_days, 1, MAX_DURATION_DAYS)
            .non_negative("price", self.price)
            .optional_url("cover_image_url", self.cover_image_url.as_deref())
            .optional_currency("currency", self.currency.as_deref());
        v.optional_date("start_date", self.start_date.as_deref());
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
pub struct CreateChallenge {
    #[serde(flatten)]
    pub fields: ChallengeFields,
    pub created_by: CreatorRole,
    #[serde(default)]
    pub professional_id: Option<String>,
    #[serde(default)]
    pub patient_id: Option<String>,
    /// Draft when omitted.
    #[serde(default)]
    pub status: Option<ChallengeStatus>,
}

impl CreateChallenge {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        self.fields.check(&mut v);

        let has = |id: &Option<String>| id.as_deref().is_some_and(|id| !id.trim().is_empty());
        match self.created_by {
            CreatorRole::Professional => {
                v.check("professional_id", has(&self.professional_id), "is required");
            },
            CreatorRole::Patient => {
                v.check("patient_id", has(&self.patient_id), "is required");
            },
            CreatorRole::Admin => {},
        }
        v.finish()
    }

    #[must_use]
    pub fn into_challenge(
        self,
        id: String,
        default_currency: &str,
        today: NaiveDate,
        at: &str,
    ) -> Challenge {
        let status = self.status.unwrap_or(ChallengeStatus::Draft);
        let mut challenge = Challenge {
            id,
            title: String::new(),
            short_description: None,
            description: String::new(),
            cover_image_url: None,
            category: String::new(),
            difficulty: Difficulty::Beginner,
            duration_days: 0,
            price: 0.0,
            currency: String::new(),
            start_date: None,
            created_by: self.created_by,
            professional_id: non_blank(self.professional_id),
            patient_id: non_blank(self.patient_id),
            status,
            phase: Phase::Unscheduled,
            created_at: at.to_owned(),
            updated_at: at.to_owned(),
            badge: status.badge(),
        };
        challenge.apply(self.fields, default_currency, at);
        challenge.refresh(today);
        challenge
    }
}

#[api_model]
pub struct UpdateChallengeStatus {
    pub status: ChallengeStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeSort {
    #[default]
    CreatedAt,
    Title,
    Price,
    Duration,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ChallengeQuery {
    /// Matches title, descriptions and category
    pub search: Option<String>,
    pub professional_id: Option<String>,
    pub patient_id: Option<String>,
    pub status: Option<ChallengeStatus>,
    pub difficulty: Option<Difficulty>,
    pub category: Option<String>,
    pub phase: Option<Phase>,
    pub sort: Option<ChallengeSort>,
    pub order: Option<SortOrder>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl ChallengeQuery {
    /// Filters and sorts; `items` must already carry their phase.
    #[must_use]
    pub fn apply(&self, items: Vec<Challenge>) -> Vec<Challenge> {
        let text = TextQuery::new(self.search.as_deref());
        let category = self.category.as_deref().map(str::trim).filter(|c| !c.is_empty());

        let mut items: Vec<_> = items
            .into_iter()
            .filter(|c| same(self.professional_id.as_deref(), c.professional_id.as_deref()))
            .filter(|c| same(self.patient_id.as_deref(), c.patient_id.as_deref()))
            .filter(|c| self.status.is_none_or(|s| c.status == s))
            .filter(|c| self.difficulty.is_none_or(|d| c.difficulty == d))
            .filter(|c| self.phase.is_none_or(|p| c.phase == p))
            .filter(|c| category.is_none_or(|cat| c.category.eq_ignore_ascii_case(cat)))
            .filter(|c| text.matches(c))
            .collect();

        let sort = self.sort.unwrap_or_default();
        let order = self.order.unwrap_or_default();
        items.sort_by(|a, b| order.apply(compare(sort, a, b)));
        items
    }
}

fn same(wanted: Option<&str>, actual: Option<&str>) -> bool {
    wanted.is_none_or(|wanted| actual == Some(wanted))
}

fn compare(sort: ChallengeSort, a: &Challenge, b: &Challenge) -> Ordering {
    match sort {
        ChallengeSort::CreatedAt => a.created_at.cmp(&b.created_at),
        ChallengeSort::Title => compare_text(&a.title, &b.title),
        ChallengeSort::Price => compare_f64(a.price, b.price),
        ChallengeSort::Duration => a.duration_days.cmp(&b.duration_days),
    }
}

#[api_model]
#[derive(Clone, PartialEq)]
pub struct ChallengeStats {
    pub total: usize,
    pub draft: usize,
    pub published: usize,
    pub archived: usize,
    pub created: PeriodComparison,
}

impl ChallengeStats {
    #[must_use]
    pub fn compute(items: &[Challenge], today: NaiveDate, window_days: u32) -> Self {
        let count = |status| items.iter().filter(|c| c.status == status).count();
        Self {
            total: items.len(),
            draft: count(ChallengeStatus::Draft),
            published: count(ChallengeStatus::Published),
            archived: count(ChallengeStatus::Archived),
            created: PeriodComparison::count(
                items.iter().filter_map(|c| clock::date_of(&c.created_at)),
                today,
                window_days,
            ),
        }
    }
}

#[api_model]
pub struct ChallengeList {
    pub items: Vec<Challenge>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub stats: ChallengeStats,
}
