use crate::domain::AuditEntry;
use crate::error::{AuditError, AuditErrorExt};
use whub_database::{Database, SurrealValue, Table};
use whub_kernel::domain::constants::AUDIT_TRAIL;

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct AuditRow {
    key: String,
    action: String,
    entity: String,
    entity_id: String,
    summary: String,
    actor: Option<String>,
    at: String,
}

impl From<&AuditEntry> for AuditRow {
    fn from(e: &AuditEntry) -> Self {
        Self {
            key: e.id.clone(),
            action: e.action.clone(),
            entity: e.entity.clone(),
            entity_id: e.entity_id.clone(),
            summary: e.summary.clone(),
            actor: e.actor.clone(),
            at: e.at.clone(),
        }
    }
}

impl From<AuditRow> for AuditEntry {
    fn from(row: AuditRow) -> Self {
        Self {
            id: row.key,
            action: row.action,
            entity: row.entity,
            entity_id: row.entity_id,
            summary: row.summary,
            actor: row.actor,
            at: row.at,
        }
    }
}

/// Append-only store of audit entries.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    table: Table<AuditRow>,
}

impl AuditRepository {
    #[must_use]
    pub fn new(database: Database) -> Self {
        Self { table: Table::new(database, AUDIT_TRAIL) }
    }

    pub async fn list(&self) -> Result<Vec<AuditEntry>, AuditError> {
        let rows = self.table.all().await.context("Listing audit trail")?;
        Ok(rows.into_iter().map(AuditEntry::from).collect())
    }

    pub async fn insert(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        self.table.insert(entry.into()).await.context("Storing audit entry")
    }
}
