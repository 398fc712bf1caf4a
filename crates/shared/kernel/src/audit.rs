//! Audit events published by mutating operations.

/// One recorded change. Published on the event bus; the audit slice persists it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    pub action: &'static str,
    pub entity: &'static str,
    pub entity_id: String,
    pub summary: String,
    pub actor: Option<String>,
}

impl AuditEvent {
    #[must_use]
    pub fn new(action: &'static str, entity: &'static str, entity_id: impl Into<String>) -> Self {
        Self { action, entity, entity_id: entity_id.into(), summary: String::new(), actor: None }
    }

    #[must_use]
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    #[must_use]
    pub fn actor(mut self, actor: Option<&str>) -> Self {
        self.actor = actor.map(str::to_owned);
        self
    }
}
