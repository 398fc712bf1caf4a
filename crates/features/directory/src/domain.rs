//! Directory listings: holistic centers, restaurants and shops.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use whub_derive::api_model;
use whub_kernel::badge::{Badge, StatusBadge};
use whub_kernel::clock;
use whub_kernel::domain::schedule::Weekdays;
use whub_kernel::links::{self, ContactLinks};
use whub_kernel::listing::{Searchable, SortOrder, TextQuery, compare_text};
use whub_kernel::stats::PeriodComparison;
use whub_kernel::validation::{ValidationErrors, Validator, non_blank, non_blank_list};

pub const MAX_NAME_LEN: usize = 120;

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
pub enum ListingKind {
    HolisticCenter,
    Restaurant,
    Shop,
}

impl ListingKind {
    pub const ALL: [Self; 3] = [Self::HolisticCenter, Self::Restaurant, Self::Shop];

    /// Path segment under `/api`.
    #[must_use]
    pub const fn route(self) -> &'static str {
        match self {
            Self::HolisticCenter => "holistic-centers",
            Self::Restaurant => "restaurants",
            Self::Shop => "shops",
        }
    }

    #[must_use]
    pub fn from_route(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.route() == segment)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::HolisticCenter => "Holistic center",
            Self::Restaurant => "Restaurant",
            Self::Shop => "Shop",
        }
    }
}

/// Opening hours on a set of days, `opens` inclusive and `closes` exclusive.
#[api_model]
#[derive(Clone, PartialEq, Eq)]
pub struct ScheduleSlot {
    #[schema(value_type = Vec<String>)]
    pub days: Weekdays,
    /// `HH:MM`
    pub opens: String,
    /// `HH:MM`
    pub closes: String,
}

impl ScheduleSlot {
    #[must_use]
    pub fn covers(&self, day: Weekdays, time: NaiveTime) -> bool {
        let (Some(opens), Some(closes)) =
            (clock::parse_time(&self.opens), clock::parse_time(&self.closes))
        else {
            return false;
        };
        self.days.intersects(day) && opens <= time && time < closes
    }

    fn check(&self, index: usize, v: &mut Validator) {
        v.check(
            &format!("schedule[{index}].days"),
            !self.days.is_empty(),
            "must name at least one day",
        );
        let opens = v.time(&format!("schedule[{index}].opens"), &self.opens);
        let closes = v.time(&format!("schedule[{index}].closes"), &self.closes);
        if let (Some(opens), Some(closes)) = (opens, closes) {
            v.check(&format!("schedule[{index}]"), opens < closes, "must open before it closes");
        }
    }

    fn normalized(self) -> Self {
        let tidy = |raw: &str| {
            clock::parse_time(raw).map_or_else(|| raw.trim().to_owned(), clock::format_time)
        };
        Self { opens: tidy(&self.opens), closes: tidy(&self.closes), days: self.days }
    }
}

/// Weekday flag of a calendar day.
#[must_use]
pub fn weekday_of(date: NaiveDate) -> Weekdays {
    weekday_flag(date.weekday())
}

#[must_use]
pub fn weekday_flag(day: Weekday) -> Weekdays {
    Weekdays::from_monday_offset(day.num_days_from_monday())
}

#[api_model]
#[derive(Clone, PartialEq)]
pub struct Listing {
    pub id: String,
    pub kind: ListingKind,
    pub name: String,
    pub description: String,
    pub address: String,
    pub city: String,
    pub state: Option<String>,
    pub country: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub whatsapp: Option<String>,
    pub instagram: Option<String>,
    pub website: Option<String>,
    pub image_url: Option<String>,
    pub gallery: Vec<String>,
    /// Services, cuisines or product lines depending on the kind.
    pub categories: Vec<String>,
    /// `$` to `$$$$`
    pub price_range: Option<String>,
    pub schedule: Vec<ScheduleSlot>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub badge: Badge,
    pub links: ContactLinks,
}

impl Listing {
    /// True when any slot covers `day` at `time`.
    #[must_use]
    pub fn is_open_at(&self, day: Weekdays, time: NaiveTime) -> bool {
        self.schedule.iter().any(|slot| slot.covers(day, time))
    }

    /// True when any slot includes `day`, whatever the hours.
    #[must_use]
    pub fn opens_on(&self, day: Weekdays) -> bool {
        self.schedule.iter().any(|slot| slot.days.intersects(day))
    }

    #[must_use]
    pub fn contact_links(&self, greeting: Option<&str>) -> ContactLinks {
        ContactLinks {
            whatsapp: self.whatsapp.as_deref().and_then(|n| links::whatsapp_link(n, greeting)),
            instagram: self.instagram.as_deref().and_then(links::instagram_link),
            email: self.email.as_deref().and_then(|e| links::mailto_link(e, Some(&self.name))),
            website: self.website.clone(),
        }
    }

    /// Message prefilled in the WhatsApp chat opened from the listing page.
    #[must_use]
    pub fn greeting(&self) -> String {
        format!(
            "Hello {}! I found you on the wellness marketplace and would like more information.",
            self.name
        )
    }

    /// Recomputes derived fields.
    pub fn refresh(&mut self) {
        self.badge = self.is_active.badge();
        self.links = self.contact_links(None);
    }

    pub fn set_active(&mut self, is_active: bool, at: &str) {
        self.is_active = is_active;
        self.updated_at = at.to_owned();
        self.refresh();
    }

    /// Overwrites every editable field; the kind never changes.
    pub fn apply(&mut self, input: ListingInput, at: &str) {
        self.name = input.name.trim().to_owned();
        self.description = input.description.trim().to_owned();
        self.address = input.address.trim().to_owned();
        self.city = input.city.trim().to_owned();
        self.state = non_blank(input.state);
        self.country = input.country.trim().to_owned();
        self.phone = non_blank(input.phone);
        self.email = non_blank(input.email).map(|e| e.to_lowercase());
        self.whatsapp = non_blank(input.whatsapp);
        self.instagram = non_blank(input.instagram);
        self.website = non_blank(input.website);
        self.image_url = non_blank(input.image_url);
        self.gallery = non_blank_list(input.gallery);
        self.categories = non_blank_list(input.categories);
        self.price_range = non_blank(input.price_range);
        self.schedule = input.schedule.into_iter().map(ScheduleSlot::normalized).collect();
        if let Some(is_active) = input.is_active {
            self.is_active = is_active;
        }
        self.updated_at = at.to_owned();
        self.refresh();
    }
}

impl Searchable for Listing {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.description.as_str(), self.city.as_str()];
        fields.extend(self.categories.iter().map(String::as_str));
        fields
    }
}

/// Body of both creation and full update.
#[api_model]
#[derive(Clone, Default)]
#[serde(default)]
pub struct ListingInput {
    pub name: String,
    pub description: String,
    pub address: String,
    pub city: String,
    pub state: Option<String>,
    pub country: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub whatsapp: Option<String>,
    pub instagram: Option<String>,
    pub website: Option<String>,
    pub image_url: Option<String>,
    pub gallery: Vec<String>,
    pub categories: Vec<String>,
    pub price_range: Option<String>,
    pub schedule: Vec<ScheduleSlot>,
    /// Active on creation and unchanged on update when omitted.
    pub is_active: Option<bool>,
}

impl ListingInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.required("name", &self.name)
            .max_len("name", &self.name, MAX_NAME_LEN)
            .required("address", &self.address)
            .required("city", &self.city)
            .required("country", &self.country)
            .optional_phone("phone", self.phone.as_deref())
            .optional_email("email", self.email.as_deref())
            .optional_phone("whatsapp", self.whatsapp.as_deref())
            .optional_instagram("instagram", self.instagram.as_deref())
            .optional_url("website", self.website.as_deref())
            .optional_url("image_url", self.image_url.as_deref());

        let present =
            |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
        v.check(
            "contact",
            present(&self.phone) || present(&self.email) || present(&self.whatsapp),
            "needs a phone, e-mail or WhatsApp number",
        );
        for (index, url) in self.gallery.iter().enumerate() {
            v.url(&format!("gallery[{index}]"), url);
        }
        if let Some(range) = self.price_range.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            v.check(
                "price_range",
                (1..=4).contains(&range.len()) && range.chars().all(|c| c == '$'),
                "must be $, $$, $$$ or $$$$",
            );
        }
        for (index, slot) in self.schedule.iter().enumerate() {
            slot.check(index, &mut v);
        }
        v.finish()
    }

    #[must_use]
    pub fn into_listing(self, id: String, kind: ListingKind, at: &str) -> Listing {
        let mut listing = Listing {
            id,
            kind,
            name: String::new(),
            description: String::new(),
            address: String::new(),
            city: String::new(),
            state: None,
            country: String::new(),
            phone: None,
            email: None,
            whatsapp: None,
            instagram: None,
            website: None,
            image_url: None,
            gallery: Vec::new(),
            categories: Vec::new(),
            price_range: None,
            schedule: Vec::new(),
            is_active: true,
            created_at: at.to_owned(),
            updated_at: at.to_owned(),
            badge: true.badge(),
            links: ContactLinks::default(),
        };
        listing.apply(self, at);
        listing
    }
}

#[api_model]
pub struct SetListingActive {
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ListingSort {
    #[default]
    CreatedAt,
    Name,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListingQuery {
    /// Matches name, description, city and categories
    pub search: Option<String>,
    /// Exact city, any case
    pub city: Option<String>,
    pub category: Option<String>,
    pub active: Option<bool>,
    /// Day name such as `mon` or `saturday`
    pub open_on: Option<String>,
    /// `HH:MM`; with `open_on`, keeps listings open at that moment
    pub open_at: Option<String>,
    pub sort: Option<ListingSort>,
    pub order: Option<SortOrder>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl ListingQuery {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.opening().map(|_| ())
    }

    fn opening(&self) -> Result<Option<(Weekdays, Option<NaiveTime>)>, ValidationErrors> {
        let mut v = Validator::new();
        let day = self
            .open_on
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(Weekdays::from_str);
        if let Some(Err(_)) = &day {
            v.check("open_on", false, "must be a day name");
        }
        let time = self
            .open_at
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .and_then(|t| v.time("open_at", t));
        if time.is_some() && day.is_none() {
            v.check("open_at", false, "requires 'open_on'");
        }
        v.finish()?;
        Ok(day.and_then(Result::ok).map(|day| (day, time)))
    }

    pub fn apply(&self, items: Vec<Listing>) -> Result<Vec<Listing>, ValidationErrors> {
        let opening = self.opening()?;
        let text = TextQuery::new(self.search.as_deref());
        let city = self.city.as_deref().map(str::trim).filter(|c| !c.is_empty());
        let category = self.category.as_deref().map(str::trim).filter(|c| !c.is_empty());

        let mut items: Vec<_> = items
            .into_iter()
            .filter(|l| city.is_none_or(|city| l.city.to_lowercase() == city.to_lowercase()))
            .filter(|l| {
                category.is_none_or(|cat| l.categories.iter().any(|c| c.eq_ignore_ascii_case(cat)))
            })
            .filter(|l| self.active.is_none_or(|active| l.is_active == active))
            .filter(|l| match opening {
                None => true,
                Some((day, None)) => l.opens_on(day),
                Some((day, Some(time))) => l.is_open_at(day, time),
            })
            .filter(|l| text.matches(l))
            .collect();

        let sort = self.sort.unwrap_or_default();
        let order = self.order.unwrap_or(match sort {
            ListingSort::CreatedAt => SortOrder::Desc,
            ListingSort::Name => SortOrder::Asc,
        });
        items.sort_by(|a, b| order.apply(compare(sort, a, b)));
        Ok(items)
    }
}

fn compare(sort: ListingSort, a: &Listing, b: &Listing) -> Ordering {
    match sort {
        ListingSort::CreatedAt => a.created_at.cmp(&b.created_at),
        ListingSort::Name => compare_text(&a.name, &b.name),
    }
}

#[api_model]
#[derive(Clone, PartialEq)]
pub struct ListingStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub created: PeriodComparison,
}

impl ListingStats {
    #[must_use]
    pub fn compute(items: &[Listing], today: NaiveDate, window_days: u32) -> Self {
        let active = items.iter().filter(|l| l.is_active).count();
        Self {
            total: items.len(),
            active,
            inactive: items.len() - active,
            created: PeriodComparison::count(
                items.iter().filter_map(|l| clock::date_of(&l.created_at)),
                today,
                window_days,
            ),
        }
    }
}

#[api_model]
pub struct ListingList {
    pub items: Vec<Listing>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub stats: ListingStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use whub_kernel::badge::BadgeColor;

    fn time(raw: &str) -> NaiveTime {
        clock::parse_time(raw).unwrap()
    }

    fn slot(days: Weekdays, opens: &str, closes: &str) -> ScheduleSlot {
        ScheduleSlot { days, opens: opens.into(), closes: closes.into() }
    }

    fn input() -> ListingInput {
        ListingInput {
            name: "Casa Prana".into(),
            description: "Yoga and sound healing".into(),
            address: "Av. Reforma 10".into(),
            city: "Oaxaca".into(),
            country: "Mexico".into(),
            whatsapp: Some("+52 951 123 4567".into()),
            instagram: Some("@casaprana".into()),
            categories: vec!["Yoga".into(), " Sound healing ".into()],
            schedule: vec![slot(Weekdays::WORKWEEK, " 09:00", "18:00")],
            ..ListingInput::default()
        }
    }

    fn listing(name: &str, city: &str, active: bool, created_at: &str) -> Listing {
        let mut listing = ListingInput {
            name: name.into(),
            city: city.into(),
            is_active: Some(active),
            ..input()
        }
        .into_listing(name.to_lowercase(), ListingKind::HolisticCenter, created_at);
        listing.created_at = created_at.into();
        listing
    }

    #[test]
    fn kinds_map_to_routes() {
        for kind in ListingKind::ALL {
            assert_eq!(ListingKind::from_route(kind.route()), Some(kind));
        }
        assert_eq!(ListingKind::from_route("holistic_center"), None);
        assert_eq!(ListingKind::Restaurant.to_string(), "restaurant");
    }

    #[test]
    fn valid_input_is_normalised() {
        let input = input();
        assert!(input.validate().is_ok());

        let listing =
            input.into_listing("L1".into(), ListingKind::HolisticCenter, "2025-06-01T00:00:00Z");
        assert_eq!(listing.categories, ["Yoga", "Sound healing"]);
        assert_eq!(listing.schedule[0].opens, "09:00");
        assert_eq!(listing.badge.color, BadgeColor::Green);
        assert_eq!(listing.links.whatsapp.as_deref(), Some("https://wa.me/529511234567"));
        assert_eq!(listing.links.instagram.as_deref(), Some("https://instagram.com/casaprana"));
    }

    #[test]
    fn requires_a_contact_channel() {
        let err = ListingInput { whatsapp: None, ..input() }.validate().unwrap_err();
        assert!(err.has("contact"));

        let email_only =
            ListingInput { whatsapp: None, email: Some("hola@prana.mx".into()), ..input() };
        assert!(email_only.validate().is_ok());
    }

    #[test]
    fn rejects_malformed_fields() {
        let bad = ListingInput {
            name: " ".into(),
            email: Some("nope".into()),
            price_range: Some("$$$$$".into()),
            gallery: vec!["ftp://x".into()],
            schedule: vec![
                slot(Weekdays::empty(), "18:00", "09:00"),
                slot(Weekdays::SAT, "10:00", "25:00"),
            ],
            ..input()
        };
        let err = bad.validate().unwrap_err();
        for field in [
            "name",
            "email",
            "price_range",
            "gallery[0]",
            "schedule[0].days",
            "schedule[0]",
            "schedule[1].closes",
        ] {
            assert!(err.has(field), "{field} missing from {err}");
        }
    }

    #[test]
    fn open_hours_are_half_open() {
        let listing = input().into_listing("L1".into(), ListingKind::Shop, "2025-06-01T00:00:00Z");
        assert!(listing.is_open_at(Weekdays::MON, time("09:00")));
        assert!(listing.is_open_at(Weekdays::FRI, time("17:59")));
        assert!(!listing.is_open_at(Weekdays::FRI, time("18:00")));
        assert!(!listing.is_open_at(Weekdays::SAT, time("12:00")));
        assert!(listing.opens_on(Weekdays::TUE));
        assert!(!listing.opens_on(Weekdays::SUN));
    }

    #[test]
    fn weekday_of_a_date() {
        // 2025-06-02 is a Monday.
        assert_eq!(weekday_of(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()), Weekdays::MON);
        assert_eq!(weekday_flag(Weekday::Sun), Weekdays::SUN);
    }

    #[test]
    fn greeting_mentions_the_name() {
        let listing =
            input().into_listing("L1".into(), ListingKind::Restaurant, "2025-06-01T00:00:00Z");
        let links = listing.contact_links(Some(&listing.greeting()));
        assert!(links.whatsapp.unwrap().contains("Casa%20Prana"));
    }

    #[test]
    fn query_filters_and_sorts() {
        let items = vec![
            listing("Zen", "Oaxaca", true, "2025-06-01T00:00:00Z"),
            listing("Aura", "oaxaca", false, "2025-06-02T00:00:00Z"),
            listing("Luz", "Puebla", true, "2025-06-03T00:00:00Z"),
        ];

        let query = ListingQuery {
            city: Some("OAXACA".into()),
            sort: Some(ListingSort::Name),
            ..Default::default()
        };
        let names: Vec<_> =
            query.apply(items.clone()).unwrap().into_iter().map(|l| l.name).collect();
        assert_eq!(names, ["Aura", "Zen"]);

        let query = ListingQuery { active: Some(true), ..Default::default() };
        let names: Vec<_> =
            query.apply(items.clone()).unwrap().into_iter().map(|l| l.name).collect();
        assert_eq!(names, ["Luz", "Zen"]);

        let query = ListingQuery { open_on: Some("saturday".into()), ..Default::default() };
        assert!(query.apply(items.clone()).unwrap().is_empty());

        let query = ListingQuery {
            open_on: Some("mon".into()),
            open_at: Some("08:00".into()),
            ..Default::default()
        };
        assert!(query.apply(items.clone()).unwrap().is_empty());

        let query = ListingQuery {
            category: Some("yoga".into()),
            search: Some("sound".into()),
            ..Default::default()
        };
        assert_eq!(query.apply(items).unwrap().len(), 3);
    }

    #[test]
    fn query_rejects_unknown_day() {
        let query = ListingQuery { open_on: Some("funday".into()), ..Default::default() };
        let err = query.validate().unwrap_err();
        assert!(err.has("open_on"));
        let query = ListingQuery { open_at: Some("10:00".into()), ..Default::default() };
        let err = query.validate().unwrap_err();
        assert!(err.has("open_at"));
    }

    #[test]
    fn stats_count_active_and_inactive() {
        let items = vec![
            listing("Zen", "Oaxaca", true, "2025-06-20T00:00:00Z"),
            listing("Aura", "Oaxaca", false, "2025-05-10T00:00:00Z"),
        ];
        let today = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        let stats = ListingStats::compute(&items, today, 30);
        assert_eq!((stats.total, stats.active, stats.inactive), (2, 1, 1));
        assert_eq!((stats.created.current, stats.created.previous), (1.0, 1.0));
    }
}
