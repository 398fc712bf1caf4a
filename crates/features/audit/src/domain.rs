use serde::Deserialize;
use std::cmp::Ordering;
use utoipa::IntoParams;
use whub_derive::api_model;
use whub_kernel::audit::AuditEvent;

/// One stored audit trail entry.
#[api_model]
#[derive(Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub id: String,
    /// Verb of the change, e.g. `created` or `approved`
    pub action: String,
    /// Table of the changed record
    pub entity: String,
    pub entity_id: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    pub at: String,
}

impl AuditEntry {
    #[must_use]
    pub fn from_event(event: &AuditEvent, id: String, at: String) -> Self {
        Self {
            id,
            action: event.action.to_owned(),
            entity: event.entity.to_owned(),
            entity_id: event.entity_id.clone(),
            summary: event.summary.clone(),
            actor: event.actor.clone(),
            at,
        }
    }

    /// Newest first; entries of the same instant keep a stable id order.
    fn newest_first(a: &Self, b: &Self) -> Ordering {
        b.at.cmp(&a.at).then_with(|| a.id.cmp(&b.id))
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuditQuery {
    /// Table name, e.g. `application`
    pub entity: Option<String>,
    pub entity_id: Option<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl AuditQuery {
    #[must_use]
    pub fn apply(&self, mut entries: Vec<AuditEntry>) -> Vec<AuditEntry> {
        let entity = self.entity.as_deref().map(str::trim).filter(|e| !e.is_empty());
        let entity_id = self.entity_id.as_deref().map(str::trim).filter(|e| !e.is_empty());

        entries.retain(|entry| {
            entity.is_none_or(|e| entry.entity == e)
                && entity_id.is_none_or(|id| entry.entity_id == id)
        });
        entries.sort_by(AuditEntry::newest_first);
        entries
    }
}

#[api_model]
pub struct AuditList {
    pub items: Vec<AuditEntry>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, entity: &str, entity_id: &str, at: &str) -> AuditEntry {
        AuditEntry {
            id: id.to_owned(),
            action: "created".to_owned(),
            entity: entity.to_owned(),
            entity_id: entity_id.to_owned(),
            summary: String::new(),
            actor: None,
            at: at.to_owned(),
        }
    }

    #[test]
    fn event_fields_are_copied() {
        let event = AuditEvent::new("approved", "application", "APP1")
            .summary("Application approved")
            .actor(Some("admin@prana.mx"));
        let entry =
            AuditEntry::from_event(&event, "E1".to_owned(), "2025-06-01T10:00:00.000Z".to_owned());

        assert_eq!(entry.action, "approved");
        assert_eq!(entry.entity, "application");
        assert_eq!(entry.entity_id, "APP1");
        assert_eq!(entry.actor.as_deref(), Some("admin@prana.mx"));
    }

    #[test]
    fn filters_and_orders_newest_first() {
        let entries = vec![
            entry("A", "product", "P1", "2025-06-01T10:00:00.000Z"),
            entry("B", "product", "P2", "2025-06-03T10:00:00.000Z"),
            entry("C", "listing", "L1", "2025-06-02T10:00:00.000Z"),
            entry("D", "product", "P1", "2025-06-04T10:00:00.000Z"),
        ];

        let all = AuditQuery::default().apply(entries.clone());
        let ids: Vec<_> = all.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["D", "B", "C", "A"]);

        let query = AuditQuery {
            entity: Some("product".to_owned()),
            entity_id: Some(" P1 ".to_owned()),
            ..AuditQuery::default()
        };
        let ids: Vec<_> = query.apply(entries).iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids, ["D", "A"]);
    }
}
