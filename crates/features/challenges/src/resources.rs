//! File and link attachments of a challenge. Only metadata is stored; files live elsewhere.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use whub_derive::api_model;
use whub_kernel::validation::{ValidationErrors, Validator, non_blank};

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
pub enum ResourceType {
    Pdf,
    Video,
    Audio,
    Image,
    Link,
    Document,
}

#[api_model]
#[derive(Clone, PartialEq, Eq)]
pub struct ChallengeResource {
    pub id: String,
    pub challenge_id: String,
    pub title: String,
    pub description: Option<String>,
    pub resource_type: ResourceType,
    pub url: String,
    pub file_size_bytes: Option<i64>,
    /// Display order within the challenge, starting at 1.
    pub position: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Body of resource creation and update.
#[api_model]
#[derive(Clone)]
pub struct ResourceInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub resource_type: ResourceType,
    pub url: String,
    #[serde(default)]
    pub file_size_bytes: Option<i64>,
    /// Appended after the last resource when omitted.
    #[serde(default)]
    pub position: Option<i64>,
}

impl ResourceInput {
    pub fn validate(&self, max_bytes: u64) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.required("title", &self.title).url("url", &self.url);
        if let Some(size) = self.file_size_bytes {
            let max = i64::try_from(max_bytes).unwrap_or(i64::MAX);
            v.range("file_size_bytes", size, 0, max);
        }
        if let Some(position) = self.position {
            v.check("position", position >= 1, "must be at least 1");
        }
        v.finish()
    }

    #[must_use]
    pub fn into_resource(
        self,
        id: String,
        challenge_id: &str,
        position: i64,
        at: &str,
    ) -> ChallengeResource {
        ChallengeResource {
            id,
            challenge_id: challenge_id.to_owned(),
            title: self.title.trim().to_owned(),
            description: non_blank(self.description),
            resource_type: self.resource_type,
            url: self.url.trim().to_owned(),
            file_size_bytes: self.file_size_bytes,
            position: self.position.unwrap_or(position),
            created_at: at.to_owned(),
            updated_at: at.to_owned(),
        }
    }

    /// Overwrites `resource`, keeping its position unless one is given.
    pub fn apply_to(self, resource: &mut ChallengeResource, at: &str) {
        resource.title = self.title.trim().to_owned();
        resource.description = non_blank(self.description);
        resource.resource_type = self.resource_type;
        resource.url = self.url.trim().to_owned();
        resource.file_size_bytes = self.file_size_bytes;
        if let Some(position) = self.position {
            resource.position = position;
        }
        resource.updated_at = at.to_owned();
    }
}

/// Position a new resource takes when none is requested.
#[must_use]
pub fn next_position(existing: &[ChallengeResource]) -> i64 {
    existing.iter().map(|r| r.position).max().unwrap_or(0) + 1
}

/// Orders by position, then creation time.
pub fn sort(resources: &mut [ChallengeResource]) {
    resources
        .sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.created_at.cmp(&b.created_at)));
}
