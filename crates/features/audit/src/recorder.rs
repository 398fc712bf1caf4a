use crate::error::{AuditError, AuditErrorExt};
use crate::repository::AuditRepository;
use crate::service;
use tokio::task::JoinHandle;
use tracing::{debug, error};
use whub_event_bus::{EventBus, EventReceiverExt};
use whub_kernel::audit::AuditEvent;

/// Subscribes to audit events and stores each one on a background task.
///
/// The subscription is taken before returning, so events published afterwards are not missed.
/// The task ends when the bus shuts down.
pub(crate) fn spawn(
    repo: AuditRepository,
    events: &EventBus,
) -> Result<JoinHandle<()>, AuditError> {
    let mut receiver = events.subscribe::<AuditEvent>().context("Subscribing to audit events")?;

    Ok(tokio::spawn(async move {
        while let Some(event) = receiver.next_event().await {
            if let Err(err) = service::record(&repo, &event).await {
                error!(
                    action = event.action,
                    entity = event.entity,
                    entity_id = %event.entity_id,
                    error = %err,
                    "Failed to store audit entry"
                );
            }
        }
        debug!("Audit event channel closed, recorder stopping");
    }))
}
