use crate::domain::{BillingCycle, PlatformTool, ToolCategory, ToolStatus};
use crate::error::{PlatformError, PlatformErrorExt};
use std::str::FromStr;
use whub_database::{Database, SurrealValue, Table};
use whub_kernel::badge::StatusBadge;
use whub_kernel::domain::constants::PLATFORM_TOOL;

fn parse<T: FromStr>(raw: &str, what: &str, key: &str) -> Result<T, PlatformError> {
    T::from_str(raw).map_err(|_| PlatformError::from(format!("unknown {what} '{raw}' on {key}")))
}

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct ToolRow {
    key: String,
    name: String,
    category: String,
    description: Option<String>,
    website_url: Option<String>,
    cost: f64,
    currency: String,
    billing_cycle: String,
    status: String,
    renewal_date: Option<String>,
    notes: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<&PlatformTool> for ToolRow {
    fn from(t: &PlatformTool) -> Self {
        Self {
            key: t.id.clone(),
            name: t.name.clone(),
            category: t.category.to_string(),
            description: t.description.clone(),
            website_url: t.website_url.clone(),
            cost: t.cost,
            currency: t.currency.clone(),
            billing_cycle: t.billing_cycle.to_string(),
            status: t.status.to_string(),
            renewal_date: t.renewal_date.clone(),
            notes: t.notes.clone(),
            created_at: t.created_at.clone(),
            updated_at: t.updated_at.clone(),
        }
    }
}

impl TryFrom<ToolRow> for PlatformTool {
    type Error = PlatformError;

    fn try_from(row: ToolRow) -> Result<Self, Self::Error> {
        let category: ToolCategory = parse(&row.category, "category", &row.key)?;
        let billing_cycle: BillingCycle = parse(&row.billing_cycle, "billing cycle", &row.key)?;
        let status: ToolStatus = parse(&row.status, "status", &row.key)?;
        Ok(Self {
            id: row.key,
            name: row.name,
            category,
            description: row.description,
            website_url: row.website_url,
            cost: row.cost,
            currency: row.currency,
            billing_cycle,
            status,
            renewal_date: row.renewal_date,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
            monthly_cost: billing_cycle.monthly(row.cost),
            badge: status.badge(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ToolRepository {
    table: Table<ToolRow>,
}

impl ToolRepository {
    #[must_use]
    pub fn new(database: Database) -> Self {
        Self { table: Table::new(database, PLATFORM_TOOL) }
    }

    pub async fn list(&self) -> Result<Vec<PlatformTool>, PlatformError> {
        let rows = self.table.all().await.context("Listing platform tools")?;
        rows.into_iter().map(PlatformTool::try_from).collect()
    }

    pub async fn get(&self, id: &str) -> Result<Option<PlatformTool>, PlatformError> {
        let row = self.table.find(id).await.context("Loading platform tool")?;
        row.map(PlatformTool::try_from).transpose()
    }

    pub async fn insert(&self, tool: &PlatformTool) -> Result<(), PlatformError> {
        self.table.insert(tool.into()).await.context("Storing platform tool")
    }

    pub async fn update(&self, tool: &PlatformTool) -> Result<bool, PlatformError> {
        self.table.replace(&tool.id, tool.into()).await.context("Updating platform tool")
    }

    pub async fn delete(&self, id: &str) -> Result<Option<PlatformTool>, PlatformError> {
        let row = self.table.remove(id).await.context("Deleting platform tool")?;
        row.map(PlatformTool::try_from).transpose()
    }
}
