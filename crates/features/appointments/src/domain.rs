//! Appointments between patients and professionals.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use utoipa::{IntoParams, ToSchema};
use whub_derive::api_model;
use whub_kernel::badge::{Badge, BadgeColor, StatusBadge};
use whub_kernel::clock;
use whub_kernel::listing::{DateRange, Searchable, SortOrder, TextQuery, compare_f64};
use whub_kernel::stats::{PeriodComparison, round_cents};
use whub_kernel::validation::{ValidationErrors, Validator, currency_or, non_blank};

pub const MIN_DURATION_MINUTES: i64 = 15;
pub const MAX_DURATION_MINUTES: i64 = 480;

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

string_enum!(Mode { InPerson, Online });

string_enum!(AppointmentStatus { Pending, Confirmed, Completed, Cancelled, NoShow });

string_enum!(PaymentStatus { Pending, Paid, Refunded });

impl AppointmentStatus {
    /// pending → confirmed | cancelled; confirmed → completed | cancelled | no_show.
    #[must_use]
    pub const fn can_become(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed | Self::Cancelled)
                | (Self::Confirmed, Self::Completed | Self::Cancelled | Self::NoShow)
        )
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::NoShow)
    }

    /// Whether the appointment still occupies the professional's time.
    #[must_use]
    pub const fn holds_slot(self) -> bool {
        !matches!(self, Self::Cancelled | Self::NoShow)
    }
}

impl StatusBadge for AppointmentStatus {
    fn badge(&self) -> Badge {
        match self {
            Self::Pending => Badge::new("Pending", BadgeColor::Yellow),
            Self::Confirmed => Badge::new("Confirmed", BadgeColor::Blue),
            Self::Completed => Badge::new("Completed", BadgeColor::Green),
            Self::Cancelled => Badge::new("Cancelled", BadgeColor::Red),
            Self::NoShow => Badge::new("No show", BadgeColor::Gray),
        }
    }
}

/// Why a requested change was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refusal {
    Transition { from: AppointmentStatus, to: AppointmentStatus },
    Closed(AppointmentStatus),
}

impl std::fmt::Display for Refusal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transition { from, to } => write!(f, "cannot move a {from} appointment to {to}"),
            Self::Closed(status) => {
                write!(f, "a {status} appointment can no longer be rescheduled")
            }
        }
    }
}

#[api_model]
#[derive(Clone, PartialEq)]
pub struct Appointment {
    pub id: String,
    pub professional_id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub patient_email: Option<String>,
    pub service_name: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub duration_minutes: i64,
    pub mode: Mode,
    pub location: Option<String>,
    pub meeting_url: Option<String>,
    pub price: f64,
    pub currency: String,
    pub status: AppointmentStatus,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub badge: Badge,
}

impl Appointment {
    #[must_use]
    pub fn day(&self) -> Option<NaiveDate> {
        clock::parse_date(&self.date)
    }

    #[must_use]
    pub fn starts_at(&self) -> Option<NaiveDateTime> {
        Some(self.day()?.and_time(clock::parse_time(&self.time)?))
    }

    /// Half-open `[start, end)` interval.
    #[must_use]
    pub fn interval(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let start = self.starts_at()?;
        Some((start, start + Duration::minutes(self.duration_minutes)))
    }

    /// The interval as minutes after midnight of `date`.
    #[must_use]
    pub fn minute_span(&self) -> Option<(i64, i64)> {
        let start = i64::from(self.starts_at()?.time().num_seconds_from_midnight() / 60);
        Some((start, start + self.duration_minutes))
    }

    /// Same professional, same day, both holding their slot and intervals intersecting.
    #[must_use]
    pub fn clashes_with(&self, other: &Self) -> bool {
        if self.id == other.id
            || self.professional_id != other.professional_id
            || self.date != other.date
            || !self.status.holds_slot()
            || !other.status.holds_slot()
        {
            return false;
        }
        match (self.interval(), other.interval()) {
            (Some((a_start, a_end)), Some((b_start, b_end))) => a_start < b_end && b_start < a_end,
            _ => false,
        }
    }

    pub fn transition(
        &mut self,
        next: AppointmentStatus,
        reason: Option<String>,
        at: &str,
    ) -> Result<(), Refusal> {
        if !self.status.can_become(next) {
            return Err(Refusal::Transition { from: self.status, to: next });
        }
        self.status = next;
        if next == AppointmentStatus::Cancelled {
            self.cancellation_reason = non_blank(reason);
        }
        self.badge = next.badge();
        self.updated_at = at.to_owned();
        Ok(())
    }

    /// Moves the appointment; only pending and confirmed ones can move.
    pub fn reschedule(
        &mut self,
        date: NaiveDate,
        time: NaiveTime,
        at: &str,
    ) -> Result<(), Refusal> {
        if self.status.is_terminal() {
            return Err(Refusal::Closed(self.status));
        }
        self.date = clock::format_date(date);
        self.time = clock::format_time(time);
        self.updated_at = at.to_owned();
        Ok(())
    }

    pub fn set_payment(&mut self, payment_status: PaymentStatus, at: &str) {
        self.payment_status = payment_status;
        self.updated_at = at.to_owned();
    }
}

impl Searchable for Appointment {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.patient_name.as_str(), self.service_name.as_str()]
    }
}

/// Booking payload.
#[api_model]
#[derive(Clone)]
pub struct BookAppointment {
    pub professional_id: String,
    pub patient_id: String,
    pub patient_name: String,
    #[serde(default)]
    pub patient_email: Option<String>,
    pub service_name: String,
    pub date: String,
    pub time: String,
    #[serde(default = "default_duration")]
    pub duration_minutes: i64,
    #[serde(default = "default_mode")]
    pub mode: Mode,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub meeting_url: Option<String>,
    #[serde(default)]
    pub price: f64,
    /// Marketplace currency when omitted.
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

const fn default_duration() -> i64 {
    60
}

const fn default_mode() -> Mode {
    Mode::InPerson
}

impl BookAppointment {
    /// Validates against the current moment, nothing may be booked in the past.
    pub fn validate(&self, now: NaiveDateTime) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.required("professional_id", &self.professional_id)
            .required("patient_id", &self.patient_id)
            .required("patient_name", &self.patient_name)
            .required("service_name", &self.service_name)
            .optional_email("patient_email", self.patient_email.as_deref())
            .range(
                "duration_minutes",
                self.duration_minutes,
                MIN_DURATION_MINUTES,
                MAX_DURATION_MINUTES,
            )
            .non_negative("price", self.price)
            .optional_currency("currency", self.currency.as_deref());
        match self.mode {
            Mode::Online => v.url("meeting_url", self.meeting_url.as_deref().unwrap_or_default()),
            Mode::InPerson => v.required("location", self.location.as_deref().unwrap_or_default()),
        };
        check_slot(&mut v, &self.date, &self.time, now);
        v.finish()
    }

    #[must_use]
    pub fn into_appointment(self, id: String, default_currency: &str, at: &str) -> Appointment {
        let status = AppointmentStatus::Pending;
        let date = clock::parse_date(&self.date)
            .map_or_else(|| self.date.trim().to_owned(), clock::format_date);
        let time = clock::parse_time(&self.time)
            .map_or_else(|| self.time.trim().to_owned(), clock::format_time);
        let (location, meeting_url) = match self.mode {
            Mode::Online => (None, non_blank(self.meeting_url)),
            Mode::InPerson => (non_blank(self.location), None),
        };
        Appointment {
            id,
            professional_id: self.professional_id.trim().to_owned(),
            patient_id: self.patient_id.trim().to_owned(),
            patient_name: self.patient_name.trim().to_owned(),
            patient_email: non_blank(self.patient_email).map(|e| e.to_lowercase()),
            service_name: self.service_name.trim().to_owned(),
            date,
            time,
            duration_minutes: self.duration_minutes,
            mode: self.mode,
            location,
            meeting_url,
            price: self.price,
            currency: currency_or(self.currency, default_currency),
            status,
            payment_status: PaymentStatus::Pending,
            notes: non_blank(self.notes),
            cancellation_reason: None,
            created_at: at.to_owned(),
            updated_at: at.to_owned(),
            badge: status.badge(),
        }
    }
}

/// Parses `date` and `time`, refusing a start before `now`.
fn check_slot(
    v: &mut Validator,
    date: &str,
    time: &str,
    now: NaiveDateTime,
) -> Option<(NaiveDate, NaiveTime)> {
    let day = v.date("date", date);
    let at = v.time("time", time);
    let (day, at) = (day?, at?);
    let future = day.and_time(at) >= now;
    v.check("date", future, "must not be in the past");
    future.then_some((day, at))
}

#[api_model]
pub struct UpdateAppointmentStatus {
    pub status: AppointmentStatus,
    /// Kept when cancelling.
    #[serde(default)]
    pub reason: Option<String>,
}

#[api_model]
pub struct RescheduleAppointment {
    pub date: String,
    pub time: String,
}

impl RescheduleAppointment {
    pub fn parse(&self, now: NaiveDateTime) -> Result<(NaiveDate, NaiveTime), ValidationErrors> {
        let mut v = Validator::new();
        let slot = check_slot(&mut v, &self.date, &self.time, now);
        match (v.finish(), slot) {
            (Ok(()), Some(slot)) => Ok(slot),
            (Err(errors), _) => Err(errors),
            (Ok(()), None) => Err(ValidationErrors::single("date", "is required")),
        }
    }
}

#[api_model]
pub struct UpdatePayment {
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentSort {
    #[default]
    Date,
    CreatedAt,
    Price,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AppointmentQuery {
    /// Matches patient and service names
    pub search: Option<String>,
    pub professional_id: Option<String>,
    pub patient_id: Option<String>,
    pub status: Option<AppointmentStatus>,
    /// First day, `YYYY-MM-DD`
    pub from: Option<String>,
    /// Last day, `YYYY-MM-DD`
    pub to: Option<String>,
    pub sort: Option<AppointmentSort>,
    pub order: Option<SortOrder>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl AppointmentQuery {
    pub fn apply(&self, items: Vec<Appointment>) -> Result<Vec<Appointment>, ValidationErrors> {
        let range = DateRange::parse(self.from.as_deref(), self.to.as_deref())?;
        let text = TextQuery::new(self.search.as_deref());

        let mut items: Vec<_> = items
            .into_iter()
            .filter(|a| same(self.professional_id.as_deref(), &a.professional_id))
            .filter(|a| same(self.patient_id.as_deref(), &a.patient_id))
            .filter(|a| self.status.is_none_or(|s| a.status == s))
            .filter(|a| range.is_unbounded() || a.day().is_some_and(|d| range.contains(d)))
            .filter(|a| text.matches(a))
            .collect();

        let sort = self.sort.unwrap_or_default();
        let order = self.order.unwrap_or(match sort {
            AppointmentSort::Date => SortOrder::Asc,
            AppointmentSort::CreatedAt | AppointmentSort::Price => SortOrder::Desc,
        });
        items.sort_by(|a, b| order.apply(compare(sort, a, b)));
        Ok(items)
    }
}

fn same(wanted: Option<&str>, actual: &str) -> bool {
    wanted.map(str::trim).filter(|w| !w.is_empty()).is_none_or(|wanted| actual == wanted)
}

fn compare(sort: AppointmentSort, a: &Appointment, b: &Appointment) -> Ordering {
    match sort {
        AppointmentSort::Date => (&a.date, &a.time).cmp(&(&b.date, &b.time)),
        AppointmentSort::CreatedAt => a.created_at.cmp(&b.created_at),
        AppointmentSort::Price => compare_f64(a.price, b.price),
    }
}

#[api_model]
#[derive(Clone, PartialEq)]
pub struct AppointmentStats {
    pub total: usize,
    pub pending: usize,
    pub confirmed: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub no_show: usize,
    /// Pending or confirmed and not started yet.
    pub upcoming: usize,
    /// Prices of completed appointments.
    pub revenue: f64,
    /// Appointments per window, by appointment date.
    pub appointments: PeriodComparison,
    /// Completed revenue per window, by appointment date.
    pub revenue_trend: PeriodComparison,
}

impl AppointmentStats {
    #[must_use]
    pub fn compute(items: &[Appointment], now: NaiveDateTime, window_days: u32) -> Self {
        let count = |status| items.iter().filter(|a| a.status == status).count();
        let completed = || items.iter().filter(|a| a.status == AppointmentStatus::Completed);
        let today = now.date();
        Self {
            total: items.len(),
            pending: count(AppointmentStatus::Pending),
            confirmed: count(AppointmentStatus::Confirmed),
            completed: count(AppointmentStatus::Completed),
            cancelled: count(AppointmentStatus::Cancelled),
            no_show: count(AppointmentStatus::NoShow),
            upcoming: items
                .iter()
                .filter(|a| {
                    matches!(a.status, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
                })
                .filter(|a| a.starts_at().is_some_and(|start| start >= now))
                .count(),
            revenue: round_cents(completed().map(|a| a.price).sum()),
            appointments: PeriodComparison::count(
                items.iter().filter_map(Appointment::day),
                today,
                window_days,
            ),
            revenue_trend: PeriodComparison::sum(
                completed().filter_map(|a| a.day().map(|d| (d, a.price))),
                today,
                window_days,
            ),
        }
    }
}

#[api_model]
pub struct AppointmentList {
    pub items: Vec<Appointment>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub stats: AppointmentStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    fn booking(date: &str, time: &str, duration: i64) -> BookAppointment {
        BookAppointment {
            professional_id: "PRO1".into(),
            patient_id: "PAT1".into(),
            patient_name: "Lucía Ramos".into(),
            patient_email: None,
            service_name: "Reiki".into(),
            date: date.into(),
            time: time.into(),
            duration_minutes: duration,
            mode: Mode::InPerson,
            location: Some("Consultorio 3".into()),
            meeting_url: None,
            price: 500.0,
            currency: None,
            notes: None,
        }
    }

    fn appointment(id: &str, time: &str, duration: i64) -> Appointment {
        booking("2025-06-12", time, duration).into_appointment(
            id.into(),
            "MXN",
            "2025-06-01T00:00:00Z",
        )
    }

    #[test]
    fn transitions() {
        use AppointmentStatus::*;
        assert!(Pending.can_become(Confirmed));
        assert!(Pending.can_become(Cancelled));
        assert!(!Pending.can_become(Completed));
        assert!(Confirmed.can_become(NoShow));
        assert!(!Confirmed.can_become(Pending));
        for terminal in [Completed, Cancelled, NoShow] {
            for next in [Pending, Confirmed, Completed, Cancelled, NoShow] {
                assert!(!terminal.can_become(next));
            }
        }
    }

    #[test]
    fn cancelling_keeps_the_reason() {
        let mut a = appointment("A", "10:00", 60);
        a.transition(AppointmentStatus::Cancelled, Some(" sick ".into()), "later").unwrap();
        assert_eq!(a.cancellation_reason.as_deref(), Some("sick"));
        assert_eq!(a.badge.color, BadgeColor::Red);

        let err = a.transition(AppointmentStatus::Confirmed, None, "later").unwrap_err();
        assert_eq!(err.to_string(), "cannot move a cancelled appointment to confirmed");
    }

    #[test]
    fn booking_validation() {
        assert!(booking("2025-06-12", "10:00", 60).validate(now()).is_ok());

        let err = booking("2025-06-10", "11:59", 10).validate(now()).unwrap_err();
        assert!(err.has("date"));
        assert!(err.has("duration_minutes"));

        let mut online = booking("2025-06-12", "10:00", 60);
        online.mode = Mode::Online;
        assert!(online.validate(now()).unwrap_err().has("meeting_url"));
        online.meeting_url = Some("https://meet.example.com/abc".into());
        assert!(online.validate(now()).is_ok());

        let mut in_person = booking("2025-06-12", "25:00", 481);
        in_person.location = None;
        let err = in_person.validate(now()).unwrap_err();
        assert!(err.has("location") && err.has("time") && err.has("duration_minutes"));
    }

    #[test]
    fn overlap_is_half_open() {
        let first = appointment("A", "10:00", 60);
        assert!(!first.clashes_with(&appointment("B", "11:00", 30)));
        assert!(!first.clashes_with(&appointment("B", "09:00", 60)));
        assert!(first.clashes_with(&appointment("B", "10:59", 30)));
        assert!(first.clashes_with(&appointment("B", "09:30", 180)));
        assert!(!first.clashes_with(&first.clone()));

        let mut cancelled = appointment("B", "10:00", 60);
        cancelled.status = AppointmentStatus::Cancelled;
        assert!(!first.clashes_with(&cancelled));

        let mut other_pro = appointment("B", "10:00", 60);
        other_pro.professional_id = "PRO2".into();
        assert!(!first.clashes_with(&other_pro));
    }

    #[test]
    fn minute_span_counts_from_midnight() {
        assert_eq!(appointment("A", "10:00", 60).minute_span(), Some((600, 660)));
        assert_eq!(appointment("A", "23:30", 90).minute_span(), Some((1410, 1500)));
        assert_eq!(appointment("A", "late", 60).minute_span(), None);
    }

    #[test]
    fn reschedule_only_open_appointments() {
        let mut a = appointment("A", "10:00", 60);
        let day = NaiveDate::from_ymd_opt(2025, 6, 20).unwrap();
        let time = NaiveTime::from_hms_opt(9, 5, 0).unwrap();
        a.reschedule(day, time, "later").unwrap();
        assert_eq!((a.date.as_str(), a.time.as_str()), ("2025-06-20", "09:05"));

        a.status = AppointmentStatus::Completed;
        assert_eq!(
            a.reschedule(day, time, "later"),
            Err(Refusal::Closed(AppointmentStatus::Completed))
        );
    }

    #[test]
    fn stats_and_revenue() {
        let mut done = appointment("A", "10:00", 60);
        done.date = "2025-06-01".into();
        done.status = AppointmentStatus::Completed;
        let mut older = appointment("B", "10:00", 60);
        older.date = "2025-05-01".into();
        older.status = AppointmentStatus::Completed;
        older.price = 250.0;
        let upcoming = appointment("C", "10:00", 60);
        let mut missed = appointment("D", "10:00", 60);
        missed.status = AppointmentStatus::NoShow;

        let stats = AppointmentStats::compute(&[done, older, upcoming, missed], now(), 30);
        assert_eq!((stats.total, stats.completed, stats.no_show, stats.upcoming), (4, 2, 1, 1));
        assert_eq!(stats.revenue, 750.0);
        assert_eq!(stats.revenue_trend.current, 500.0);
        assert_eq!(stats.revenue_trend.previous, 250.0);
    }

    #[test]
    fn query_by_range_and_search() {
        let mut early = appointment("A", "10:00", 60);
        early.date = "2025-06-11".into();
        let late = appointment("B", "08:00", 60);
        let items = vec![late, early];

        let query = AppointmentQuery { from: Some("2025-06-12".into()), ..Default::default() };
        assert_eq!(query.apply(items.clone()).unwrap().len(), 1);

        let ids: Vec<_> = AppointmentQuery::default()
            .apply(items.clone())
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, ["A", "B"]);

        let query = AppointmentQuery { search: Some("reiki".into()), ..Default::default() };
        assert_eq!(query.apply(items.clone()).unwrap().len(), 2);

        let query = AppointmentQuery {
            from: Some("2025-06-13".into()),
            to: Some("2025-06-01".into()),
            ..Default::default()
        };
        assert!(query.apply(items).is_err());
    }
}
