use crate::domain::{AuditEntry, AuditList, AuditQuery};
use crate::error::AuditError;
use crate::repository::AuditRepository;
use tracing::debug;
use whub_kernel::audit::AuditEvent;
use whub_kernel::clock;
use whub_kernel::domain::config::MarketplaceConfig;
use whub_kernel::listing::Page;
use whub_kernel::safe_nanoid;

pub async fn record(repo: &AuditRepository, event: &AuditEvent) -> Result<AuditEntry, AuditError> {
    let entry = AuditEntry::from_event(event, safe_nanoid!(), clock::now_timestamp());
    repo.insert(&entry).await?;
    debug!(id = %entry.id, action = %entry.action, entity = %entry.entity, "Audit entry stored");
    Ok(entry)
}

pub async fn list(
    repo: &AuditRepository,
    query: &AuditQuery,
    config: &MarketplaceConfig,
) -> Result<AuditList, AuditError> {
    let entries = query.apply(repo.list().await?);

    let page = Page::new(query.offset, query.limit, config);
    let (items, total) = page.apply(entries);
    Ok(AuditList { items, total, offset: page.offset, limit: page.limit })
}
