//! Platform tools: hosting, payments and other services the marketplace pays for.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};
use whub_derive::api_model;
use whub_kernel::badge::{Badge, BadgeColor, StatusBadge};
use whub_kernel::clock;
use whub_kernel::listing::{Searchable, SortOrder, TextQuery, compare_f64, compare_text};
use whub_kernel::stats::round_cents;
use whub_kernel::validation::{ValidationErrors, Validator, currency_or, non_blank};

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
            PartialOrd,
            Ord,
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

string_enum!(ToolCategory {
    Hosting,
    Database,
    Email,
    Payments,
    Analytics,
    Design,
    Communication,
    Marketing,
    Other,
});

string_enum!(BillingCycle { Monthly, Quarterly, Yearly, OneTime });

string_enum!(ToolStatus { Active, Trial, Paused, Cancelled });

impl BillingCycle {
    /// Cost per month, rounded to cents; one-time purchases have none.
    #[must_use]
    pub fn monthly(self, cost: f64) -> f64 {
        let monthly = match self {
            Self::Monthly => cost,
            Self::Quarterly => cost / 3.0,
            Self::Yearly => cost / 12.0,
            Self::OneTime => 0.0,
        };
        round_cents(monthly)
    }

    /// Spend over a year, unrounded.
    #[must_use]
    pub fn annual(self, cost: f64) -> f64 {
        match self {
            Self::Monthly => cost * 12.0,
            Self::Quarterly => cost * 4.0,
            Self::Yearly => cost,
            Self::OneTime => 0.0,
        }
    }

    #[must_use]
    pub const fn is_recurring(self) -> bool {
        !matches!(self, Self::OneTime)
    }
}

impl ToolStatus {
    /// Active and trial tools are the ones being paid for.
    #[must_use]
    pub const fn is_billed(self) -> bool {
        matches!(self, Self::Active | Self::Trial)
    }
}

impl StatusBadge for ToolStatus {
    fn badge(&self) -> Badge {
        match self {
            Self::Active => Badge::new("Active", BadgeColor::Green),
            Self::Trial => Badge::new("Trial", BadgeColor::Blue),
            Self::Paused => Badge::new("Paused", BadgeColor::Yellow),
            Self::Cancelled => Badge::new("Cancelled", BadgeColor::Red),
        }
    }
}

#[api_model]
#[derive(Clone, PartialEq)]
pub struct PlatformTool {
    pub id: String,
    pub name: String,
    pub category: ToolCategory,
    pub description: Option<String>,
    pub website_url: Option<String>,
    pub cost: f64,
    pub currency: String,
    pub billing_cycle: BillingCycle,
    pub status: ToolStatus,
    /// `YYYY-MM-DD`
    pub renewal_date: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub monthly_cost: f64,
    pub badge: Badge,
}

impl PlatformTool {
    #[must_use]
    pub fn renewal(&self) -> Option<NaiveDate> {
        self.renewal_date.as_deref().and_then(clock::parse_date)
    }

    /// Recomputes derived fields.
    pub fn refresh(&mut self) {
        self.monthly_cost = self.billing_cycle.monthly(self.cost);
        self.badge = self.status.badge();
    }

    pub fn apply(&mut self, input: ToolInput, default_currency: &str, at: &str) {
        self.name = input.name.trim().to_owned();
        self.category = input.category;
        self.description = non_blank(input.description);
        self.website_url = non_blank(input.website_url);
        self.cost = input.cost;
        self.currency = currency_or(input.currency, default_currency);
        self.billing_cycle = input.billing_cycle;
        self.status = input.status;
        self.renewal_date = input
            .renewal_date
            .as_deref()
            .and_then(clock::parse_date)
            .map(clock::format_date);
        self.notes = non_blank(input.notes);
        self.updated_at = at.to_owned();
        self.refresh();
    }
}

impl Searchable for PlatformTool {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.description.as_deref());
        fields.extend(self.notes.as_deref());
        fields
    }
}

/// Body of both creation and full update.
#[api_model]
#[derive(Clone)]
pub struct ToolInput {
    pub name: String,
    #[serde(default = "default_category")]
    pub category: ToolCategory,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
    pub cost: f64,
    /// Marketplace currency when omitted.
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default = "default_cycle")]
    pub billing_cycle: BillingCycle,
    #[serde(default = "default_status")]
    pub status: ToolStatus,
    #[serde(default)]
    pub renewal_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

const fn default_category() -> ToolCategory {
    ToolCategory::Other
}

const fn default_cycle() -> BillingCycle {
    BillingCycle::Monthly
}

const fn default_status() -> ToolStatus {
    ToolStatus::Active
}

impl ToolInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.required("name", &self.name)
            .non_negative("cost", self.cost)
            .optional_url("website_url", self.website_url.as_deref())
            .optional_currency("currency", self.currency.as_deref());
        v.optional_date("renewal_date", self.renewal_date.as_deref());
        v.finish()
    }

    #[must_use]
    pub fn into_tool(self, id: String, default_currency: &str, at: &str) -> PlatformTool {
        let mut tool = PlatformTool {
            id,
            name: String::new(),
            category: ToolCategory::Other,
            description: None,
            website_url: None,
            cost: 0.0,
            currency: String::new(),
            billing_cycle: BillingCycle::Monthly,
            status: ToolStatus::Active,
            renewal_date: None,
            notes: None,
            created_at: at.to_owned(),
            updated_at: at.to_owned(),
            monthly_cost: 0.0,
            badge: ToolStatus::Active.badge(),
        };
        tool.apply(self, default_currency, at);
        tool
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ToolSort {
    #[default]
    Name,
    Cost,
    MonthlyCost,
    RenewalDate,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ToolQuery {
    /// Matches name, description and notes
    pub search: Option<String>,
    pub category: Option<ToolCategory>,
    pub status: Option<ToolStatus>,
    pub billing_cycle: Option<BillingCycle>,
    pub sort: Option<ToolSort>,
    pub order: Option<SortOrder>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl ToolQuery {
    #[must_use]
    pub fn apply(&self, items: Vec<PlatformTool>) -> Vec<PlatformTool> {
        let text = TextQuery::new(self.search.as_deref());
        let mut items: Vec<_> = items
            .into_iter()
            .filter(|t| self.category.is_none_or(|c| t.category == c))
            .filter(|t| self.status.is_none_or(|s| t.status == s))
            .filter(|t| self.billing_cycle.is_none_or(|b| t.billing_cycle == b))
            .filter(|t| text.matches(t))
            .collect();

        let sort = self.sort.unwrap_or_default();
        let order = self.order.unwrap_or(match sort {
            ToolSort::Name | ToolSort::RenewalDate => SortOrder::Asc,
            ToolSort::Cost | ToolSort::MonthlyCost => SortOrder::Desc,
        });
        items.sort_by(|a, b| compare(sort, order, a, b));
        items
    }
}

// Tools without a renewal date go last in either direction.
fn compare(sort: ToolSort, order: SortOrder, a: &PlatformTool, b: &PlatformTool) -> Ordering {
    match sort {
        ToolSort::Name => order.apply(compare_text(&a.name, &b.name)),
        ToolSort::Cost => order.apply(compare_f64(a.cost, b.cost)),
        ToolSort::MonthlyCost => order.apply(compare_f64(a.monthly_cost, b.monthly_cost)),
        ToolSort::RenewalDate => match (a.renewal(), b.renewal()) {
            (Some(x), Some(y)) => order.apply(x.cmp(&y)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

#[api_model]
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub total: usize,
    pub active: usize,
    pub trial: usize,
    pub paused: usize,
    pub cancelled: usize,
}

impl StatusCounts {
    #[must_use]
    pub fn compute(items: &[PlatformTool]) -> Self {
        let count = |status| items.iter().filter(|t| t.status == status).count();
        Self {
            total: items.len(),
            active: count(ToolStatus::Active),
            trial: count(ToolStatus::Trial),
            paused: count(ToolStatus::Paused),
            cancelled: count(ToolStatus::Cancelled),
        }
    }
}

#[api_model]
pub struct ToolList {
    pub items: Vec<PlatformTool>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub stats: StatusCounts,
}

/// Spending in one currency.
#[api_model]
#[derive(Clone, PartialEq)]
pub struct CurrencyTotals {
    pub currency: String,
    /// Recurring cost per month of billed tools.
    pub monthly_total: f64,
    pub annual_total: f64,
    /// Sum of one-time purchases of billed tools.
    pub one_time_total: f64,
    /// Every tool priced in this currency, whatever its status.
    pub tool_count: usize,
}

#[api_model]
#[derive(Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: ToolCategory,
    pub currency: String,
    pub monthly_total: f64,
}

#[api_model]
#[derive(Clone, PartialEq)]
pub struct CostSummary {
    pub currencies: Vec<CurrencyTotals>,
    /// Highest monthly spend first.
    pub by_category: Vec<CategoryTotal>,
    /// Billed and paused tools renewing within the horizon, soonest first.
    pub upcoming_renewals: Vec<PlatformTool>,
    pub active: usize,
    pub trial: usize,
    pub paused: usize,
    pub cancelled: usize,
}

impl CostSummary {
    #[must_use]
    pub fn compute(tools: &[PlatformTool], today: NaiveDate, horizon_days: u32) -> Self {
        let mut currencies: BTreeMap<&str, CurrencyTotals> = BTreeMap::new();
        let mut categories: BTreeMap<(ToolCategory, &str), f64> = BTreeMap::new();

        for tool in tools {
            let totals = currencies.entry(tool.currency.as_str()).or_insert_with(|| CurrencyTotals {
                currency: tool.currency.clone(),
                monthly_total: 0.0,
                annual_total: 0.0,
                one_time_total: 0.0,
                tool_count: 0,
            });
            totals.tool_count += 1;
            if !tool.status.is_billed() {
                continue;
            }
            if tool.billing_cycle.is_recurring() {
                totals.monthly_total += tool.monthly_cost;
                totals.annual_total += tool.billing_cycle.annual(tool.cost);
                *categories.entry((tool.category, tool.currency.as_str())).or_default() +=
                    tool.monthly_cost;
            } else {
                totals.one_time_total += tool.cost;
            }
        }

        let currencies = currencies
            .into_values()
            .map(|mut totals| {
                totals.monthly_total = round_cents(totals.monthly_total);
                totals.annual_total = round_cents(totals.annual_total);
                totals.one_time_total = round_cents(totals.one_time_total);
                totals
            })
            .collect();

        let mut by_category: Vec<CategoryTotal> = categories
            .into_iter()
            .map(|((category, currency), total)| CategoryTotal {
                category,
                currency: currency.to_owned(),
                monthly_total: round_cents(total),
            })
            .collect();
        by_category.sort_by(|a, b| compare_f64(b.monthly_total, a.monthly_total));

        let horizon = today + Duration::days(i64::from(horizon_days));
        let mut upcoming_renewals: Vec<PlatformTool> = tools
            .iter()
            .filter(|t| t.status != ToolStatus::Cancelled)
            .filter(|t| t.renewal().is_some_and(|d| d >= today && d <= horizon))
            .cloned()
            .collect();
        upcoming_renewals.sort_by_key(PlatformTool::renewal);

        let counts = StatusCounts::compute(tools);
        Self {
            currencies,
            by_category,
            upcoming_renewals,
            active: counts.active,
            trial: counts.trial,
            paused: counts.paused,
            cancelled: counts.cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(name: &str, cost: f64, cycle: BillingCycle, status: ToolStatus) -> PlatformTool {
        ToolInput {
            name: name.into(),
            category: ToolCategory::Hosting,
            description: None,
            website_url: None,
            cost,
            currency: None,
            billing_cycle: cycle,
            status,
            renewal_date: None,
            notes: None,
        }
        .into_tool(name.to_lowercase(), "MXN", "2025-06-01T00:00:00Z")
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn monthly_cost_per_cycle() {
        assert_eq!(BillingCycle::Monthly.monthly(20.0), 20.0);
        assert_eq!(BillingCycle::Quarterly.monthly(100.0), 33.33);
        assert_eq!(BillingCycle::Yearly.monthly(1000.0), 83.33);
        assert_eq!(BillingCycle::OneTime.monthly(500.0), 0.0);
    }

    #[test]
    fn badges_follow_status() {
        assert_eq!(ToolStatus::Trial.badge().color, BadgeColor::Blue);
        assert_eq!(ToolStatus::Cancelled.badge().color, BadgeColor::Red);
    }

    #[test]
    fn validation() {
        let mut input = ToolInput {
            name: " ".into(),
            category: ToolCategory::Other,
            description: None,
            website_url: Some("vercel".into()),
            cost: -1.0,
            currency: Some("dollars".into()),
            billing_cycle: BillingCycle::Monthly,
            status: ToolStatus::Active,
            renewal_date: Some("June 1".into()),
            notes: None,
        };
        let err = input.validate().unwrap_err();
        for field in ["name", "cost", "website_url", "currency", "renewal_date"] {
            assert!(err.has(field), "{field}");
        }

        input.name = "Vercel".into();
        input.website_url = Some("https://vercel.com".into());
        input.cost = 0.0;
        input.currency = Some("usd".into());
        input.renewal_date = Some("2025-07-01".into());
        assert!(input.validate().is_ok());
        assert_eq!(input.into_tool("T1".into(), "MXN", "now").currency, "USD");
    }

    #[test]
    fn summary_counts_only_billed_tools() {
        let mut usd = tool("Figma", 120.0, BillingCycle::Yearly, ToolStatus::Active);
        usd.currency = "USD".into();
        usd.category = ToolCategory::Design;
        let tools = vec![
            tool("Hosting", 300.0, BillingCycle::Monthly, ToolStatus::Active),
            tool("Mailer", 90.0, BillingCycle::Quarterly, ToolStatus::Trial),
            tool("Old CDN", 500.0, BillingCycle::Monthly, ToolStatus::Cancelled),
            tool("Paused", 50.0, BillingCycle::Monthly, ToolStatus::Paused),
            tool("Theme", 800.0, BillingCycle::OneTime, ToolStatus::Active),
            usd,
        ];

        let summary = CostSummary::compute(&tools, day(1), 14);
        assert_eq!(summary.currencies.len(), 2);
        let mxn = &summary.currencies[0];
        assert_eq!(mxn.currency, "MXN");
        assert_eq!(mxn.monthly_total, 330.0);
        assert_eq!(mxn.annual_total, 3960.0);
        assert_eq!(mxn.one_time_total, 800.0);
        assert_eq!(mxn.tool_count, 5);
        assert_eq!(summary.currencies[1].monthly_total, 10.0);

        assert_eq!(summary.by_category[0].category, ToolCategory::Hosting);
        assert_eq!(summary.by_category[0].monthly_total, 330.0);
        assert_eq!(summary.by_category[1].category, ToolCategory::Design);
        let counts = (summary.active, summary.trial, summary.paused, summary.cancelled);
        assert_eq!(counts, (3, 1, 1, 1));
    }

    #[test]
    fn annual_total_uses_the_billed_amounts() {
        let tools = vec![
            tool("Domain", 100.0, BillingCycle::Yearly, ToolStatus::Active),
            tool("Backups", 100.0, BillingCycle::Quarterly, ToolStatus::Active),
            tool("Monitor", 9.99, BillingCycle::Monthly, ToolStatus::Trial),
        ];

        let summary = CostSummary::compute(&tools, day(1), 14);
        let mxn = &summary.currencies[0];
        assert_eq!(mxn.annual_total, 619.88);
        assert_eq!(mxn.monthly_total, 51.65);

        let yearly = CostSummary::compute(&tools[..1], day(1), 14);
        assert_eq!(yearly.currencies[0].annual_total, 100.0);
        let quarterly = CostSummary::compute(&tools[1..2], day(1), 14);
        assert_eq!(quarterly.currencies[0].annual_total, 400.0);
    }

    #[test]
    fn renewals_within_horizon() {
        let mut soon = tool("Soon", 10.0, BillingCycle::Monthly, ToolStatus::Active);
        soon.renewal_date = Some("2025-06-10".into());
        let mut sooner = tool("Sooner", 10.0, BillingCycle::Monthly, ToolStatus::Trial);
        sooner.renewal_date = Some("2025-06-03".into());
        let mut late = tool("Late", 10.0, BillingCycle::Monthly, ToolStatus::Active);
        late.renewal_date = Some("2025-06-30".into());
        let mut past = tool("Past", 10.0, BillingCycle::Monthly, ToolStatus::Active);
        past.renewal_date = Some("2025-05-30".into());
        let mut dropped = tool("Dropped", 10.0, BillingCycle::Monthly, ToolStatus::Cancelled);
        dropped.renewal_date = Some("2025-06-05".into());

        let summary = CostSummary::compute(&[soon, sooner, late, past, dropped], day(1), 14);
        let names: Vec<_> = summary.upcoming_renewals.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Sooner", "Soon"]);
    }

    #[test]
    fn renewal_sort_puts_undated_last() {
        let mut dated = tool("B", 10.0, BillingCycle::Monthly, ToolStatus::Active);
        dated.renewal_date = Some("2025-06-10".into());
        let undated = tool("A", 10.0, BillingCycle::Monthly, ToolStatus::Active);

        for order in [SortOrder::Asc, SortOrder::Desc] {
            let query = ToolQuery {
                sort: Some(ToolSort::RenewalDate),
                order: Some(order),
                ..Default::default()
            };
            let sorted = query.apply(vec![undated.clone(), dated.clone()]);
            assert_eq!(sorted[0].name, "B");
        }
    }
}
