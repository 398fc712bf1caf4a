//! Professional applications: payloads, review rules and list statistics.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use utoipa::{IntoParams, ToSchema};
use whub_derive::api_model;
use whub_kernel::badge::{Badge, BadgeColor, StatusBadge};
use whub_kernel::clock;
use whub_kernel::listing::{DateRange, Searchable, SortOrder, TextQuery, compare_text};
use whub_kernel::stats::{PeriodComparison, ratio_percent};
use whub_kernel::validation::{ValidationErrors, Validator, non_blank, non_blank_list};

pub const MAX_EXPERIENCE_YEARS: i64 = 80;

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
    strum_macros::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl StatusBadge for ApplicationStatus {
    fn badge(&self) -> Badge {
        match self {
            Self::Pending => Badge::new("Pending", BadgeColor::Yellow),
            Self::Approved => Badge::new("Approved", BadgeColor::Green),
            Self::Rejected => Badge::new("Rejected", BadgeColor::Red),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl From<ReviewDecision> for ApplicationStatus {
    fn from(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Approved => Self::Approved,
            ReviewDecision::Rejected => Self::Rejected,
        }
    }
}

/// Request of a practitioner to join the marketplace.
#[api_model]
#[derive(Clone, PartialEq)]
pub struct ProfessionalApplication {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub profession: String,
    pub specializations: Vec<String>,
    pub experience_years: i64,
    pub certifications: Vec<String>,
    pub biography: String,
    pub city: String,
    pub country: String,
    pub instagram: Option<String>,
    pub website: Option<String>,
    pub status: ApplicationStatus,
    pub review_notes: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<String>,
    pub submitted_at: String,
    pub updated_at: String,
    pub badge: Badge,
}

impl ProfessionalApplication {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == ApplicationStatus::Pending
    }

    /// Applies a review decision. Only pending applications can be reviewed.
    pub fn review(
        &mut self,
        review: &ReviewApplication,
        reviewer: Option<&str>,
        at: &str,
    ) -> Result<(), ReviewRefusal> {
        if !self.is_pending() {
            return Err(ReviewRefusal::AlreadyReviewed(self.status));
        }
        review.validate().map_err(ReviewRefusal::Invalid)?;

        self.status = review.decision.into();
        self.badge = self.status.badge();
        self.review_notes = review.notes.as_deref().map(str::trim).map(str::to_owned);
        self.reviewed_by = reviewer.map(str::to_owned);
        self.reviewed_at = Some(at.to_owned());
        self.updated_at = at.to_owned();
        Ok(())
    }
}

/// Why a review was not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewRefusal {
    AlreadyReviewed(ApplicationStatus),
    Invalid(ValidationErrors),
}

impl Searchable for ProfessionalApplication {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.email.as_str(),
            self.profession.as_str(),
            self.city.as_str(),
        ];
        fields.extend(self.specializations.iter().map(String::as_str));
        fields
    }
}

/// Submission payload.
#[api_model]
#[derive(Clone, Default)]
#[serde(default)]
pub struct SubmitApplication {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub profession: String,
    pub specializations: Vec<String>,
    pub experience_years: i64,
    pub certifications: Vec<String>,
    pub biography: String,
    pub city: String,
    pub country: String,
    pub instagram: Option<String>,
    pub website: Option<String>,
}

impl SubmitApplication {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.required("first_name", &self.first_name)
            .required("last_name", &self.last_name)
            .email("email", &self.email)
            .phone("phone", &self.phone)
            .required("profession", &self.profession)
            .required_list("specializations", &self.specializations)
            .range("experience_years", self.experience_years, 0, MAX_EXPERIENCE_YEARS)
            .required("biography", &self.biography)
            .required("city", &self.city)
            .required("country", &self.country)
            .optional_instagram("instagram", self.instagram.as_deref())
            .optional_url("website", self.website.as_deref());
        v.finish()
    }

    /// Builds a pending application from a validated payload.
    #[must_use]
    pub fn into_application(self, id: String, at: &str) -> ProfessionalApplication {
        let status = ApplicationStatus::Pending;
        ProfessionalApplication {
            id,
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            email: self.email.trim().to_lowercase(),
            phone: self.phone.trim().to_owned(),
            profession: self.profession.trim().to_owned(),
            specializations: non_blank_list(self.specializations),
            experience_years: self.experience_years,
            certifications: non_blank_list(self.certifications),
            biography: self.biography.trim().to_owned(),
            city: self.city.trim().to_owned(),
            country: self.country.trim().to_owned(),
            instagram: non_blank(self.instagram),
            website: non_blank(self.website),
            status,
            review_notes: None,
            reviewed_by: None,
            reviewed_at: None,
            submitted_at: at.to_owned(),
            updated_at: at.to_owned(),
            badge: status.badge(),
        }
    }
}

/// Review payload.
#[api_model]
#[derive(Clone)]
pub struct ReviewApplication {
    pub decision: ReviewDecision,
    /// Required when rejecting.
    #[serde(default)]
    pub notes: Option<String>,
}

impl ReviewApplication {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        if self.decision == ReviewDecision::Rejected {
            v.required("notes", self.notes.as_deref().unwrap_or_default());
        }
        v.finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationSort {
    #[default]
    SubmittedAt,
    Name,
    Experience,
}

/// List filters.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ApplicationQuery {
    /// Matches names, email, profession, city and specializations
    pub search: Option<String>,
    pub status: Option<ApplicationStatus>,
    /// First submission day, `YYYY-MM-DD`
    pub from: Option<String>,
    /// Last submission day, `YYYY-MM-DD`
    pub to: Option<String>,
    pub sort: Option<ApplicationSort>,
    pub order: Option<SortOrder>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl ApplicationQuery {
    /// Filters and sorts `items`; paging is left to the caller.
    pub fn apply(
        &self,
        items: Vec<ProfessionalApplication>,
    ) -> Result<Vec<ProfessionalApplication>, ValidationErrors> {
        let range = DateRange::parse(self.from.as_deref(), self.to.as_deref())?;
        let text = TextQuery::new(self.search.as_deref());

        let mut items: Vec<_> = items
            .into_iter()
            .filter(|a| self.status.is_none_or(|status| a.status == status))
            .filter(|a| range.contains_timestamp(&a.submitted_at))
            .filter(|a| text.matches(a))
            .collect();

        let sort = self.sort.unwrap_or_default();
        let order = self.order.unwrap_or_default();
        items.sort_by(|a, b| order.apply(compare(sort, a, b)));
        Ok(items)
    }
}

fn compare(
    sort: ApplicationSort,
    a: &ProfessionalApplication,
    b: &ProfessionalApplication,
) -> Ordering {
    match sort {
        ApplicationSort::SubmittedAt => a.submitted_at.cmp(&b.submitted_at),
        ApplicationSort::Name => compare_text(&a.full_name(), &b.full_name()),
        ApplicationSort::Experience => a.experience_years.cmp(&b.experience_years),
    }
}

#[api_model]
#[derive(Clone, PartialEq)]
pub struct ApplicationStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    /// Approved share of reviewed applications, in percent
    pub approval_rate: f64,
    pub submissions: PeriodComparison,
}

impl ApplicationStats {
    #[must_use]
    pub fn compute(items: &[ProfessionalApplication], today: NaiveDate, window_days: u32) -> Self {
        let count = |status| items.iter().filter(|a| a.status == status).count();
        let approved = count(ApplicationStatus::Approved);
        let rejected = count(ApplicationStatus::Rejected);

        Self {
            total: items.len(),
            pending: count(ApplicationStatus::Pending),
            approved,
            rejected,
            approval_rate: ratio_percent(approved as f64, (approved + rejected) as f64),
            submissions: PeriodComparison::count(
                items.iter().filter_map(|a| clock::date_of(&a.submitted_at)),
                today,
                window_days,
            ),
        }
    }
}

#[api_model]
pub struct ApplicationList {
    pub items: Vec<ProfessionalApplication>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub stats: ApplicationStats,
}
