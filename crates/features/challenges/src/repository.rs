use crate::domain::{Challenge, ChallengeStatus, CreatorRole, Difficulty, Phase};
use crate::error::{ChallengeError, ChallengeErrorExt};
use crate::resources::{ChallengeResource, ResourceType};
use std::str::FromStr;
use whub_database::{Database, SurrealValue, Table};
use whub_kernel::badge::StatusBadge;
use whub_kernel::domain::constants::{CHALLENGE, CHALLENGE_RESOURCE};

fn parse<T: FromStr>(raw: &str, what: &str, key: &str) -> Result<T, ChallengeError> {
    T::from_str(raw).map_err(|_| ChallengeError::from(format!("unknown {what} '{raw}' on {key}")))
}

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct ChallengeRow {
    key: String,
    title: String,
    short_description: Option<String>,
    description: String,
    cover_image_url: Option<String>,
    category: String,
    difficulty: String,
    duration_days: i64,
    price: f64,
    currency: String,
    start_date: Option<String>,
    created_by: String,
    professional_id: Option<String>,
    patient_id: Option<String>,
    status: String,
    created_at: String,
    updated_at: String,
}

impl From<&Challenge> for ChallengeRow {
    fn from(c: &Challenge) -> Self {
        Self {
            key: c.id.clone(),
            title: c.title.clone(),
            short_description: c.short_description.clone(),
            description: c.description.clone(),
            cover_image_url: c.cover_image_url.clone(),
            category: c.category.clone(),
            difficulty: c.difficulty.to_string(),
            duration_days: c.duration_days,
            price: c.price,
            currency: c.currency.clone(),
            start_date: c.start_date.clone(),
            created_by: c.created_by.to_string(),
            professional_id: c.professional_id.clone(),
            patient_id: c.patient_id.clone(),
            status: c.status.to_string(),
            created_at: c.created_at.clone(),
            updated_at: c.updated_at.clone(),
        }
    }
}

impl TryFrom<ChallengeRow> for Challenge {
    type Error = ChallengeError;

    fn try_from(row: ChallengeRow) -> Result<Self, Self::Error> {
        let difficulty: Difficulty = parse(&row.difficulty, "difficulty", &row.key)?;
        let created_by: CreatorRole = parse(&row.created_by, "creator", &row.key)?;
        let status: ChallengeStatus = parse(&row.status, "status", &row.key)?;
        Ok(Self {
            id: row.key,
            title: row.title,
            short_description: row.short_description,
            description: row.description,
            cover_image_url: row.cover_image_url,
            category: row.category,
            difficulty,
            duration_days: row.duration_days,
            price: row.price,
            currency: row.currency,
            start_date: row.start_date,
            created_by,
            professional_id: row.professional_id,
            patient_id: row.patient_id,
            status,
            phase: Phase::Unscheduled,
            created_at: row.created_at,
            updated_at: row.updated_at,
            badge: status.badge(),
        })
    }
}

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct ResourceRow {
    key: String,
    challenge_id: String,
    title: String,
    description: Option<String>,
    resource_type: String,
    url: String,
    file_size_bytes: Option<i64>,
    position: i64,
    created_at: String,
    updated_at: String,
}

impl From<&ChallengeResource> for ResourceRow {
    fn from(r: &ChallengeResource) -> Self {
        Self {
            key: r.id.clone(),
            challenge_id: r.challenge_id.clone(),
            title: r.title.clone(),
            description: r.description.clone(),
            resource_type: r.resource_type.to_string(),
            url: r.url.clone(),
            file_size_bytes: r.file_size_bytes,
            position: r.position,
            created_at: r.created_at.clone(),
            updated_at: r.updated_at.clone(),
        }
    }
}

impl TryFrom<ResourceRow> for ChallengeResource {
    type Error = ChallengeError;

    fn try_from(row: ResourceRow) -> Result<Self, Self::Error> {
        let resource_type: ResourceType = parse(&row.resource_type, "resource type", &row.key)?;
        Ok(Self {
            id: row.key,
            challenge_id: row.challenge_id,
            title: row.title,
            description: row.description,
            resource_type,
            url: row.url,
            file_size_bytes: row.file_size_bytes,
            position: row.position,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Persistence of challenges. Phases are left for the caller to compute.
#[derive(Debug, Clone)]
pub struct ChallengeRepository {
    table: Table<ChallengeRow>,
}

impl ChallengeRepository {
    #[must_use]
    pub fn new(database: Database) -> Self {
        Self { table: Table::new(database, CHALLENGE) }
    }

    pub async fn list(&self) -> Result<Vec<Challenge>, ChallengeError> {
        let rows = self.table.all().await.context("Listing challenges")?;
        rows.into_iter().map(Challenge::try_from).collect()
    }

    pub async fn get(&self, id: &str) -> Result<Option<Challenge>, ChallengeError> {
        let row = self.table.find(id).await.context("Loading challenge")?;
        row.map(Challenge::try_from).transpose()
    }

    pub async fn insert(&self, challenge: &Challenge) -> Result<(), ChallengeError> {
        self.table.insert(challenge.into()).await.context("Storing challenge")
    }

    pub async fn update(&self, challenge: &Challenge) -> Result<bool, ChallengeError> {
        self.table.replace(&challenge.id, challenge.into()).await.context("Updating challenge")
    }

    pub async fn delete(&self, id: &str) -> Result<Option<Challenge>, ChallengeError> {
        let row = self.table.remove(id).await.context("Deleting challenge")?;
        row.map(Challenge::try_from).transpose()
    }
}

/// Persistence of challenge attachments.
#[derive(Debug, Clone)]
pub struct ResourceRepository {
    table: Table<ResourceRow>,
}

impl ResourceRepository {
    #[must_use]
    pub fn new(database: Database) -> Self {
        Self { table: Table::new(database, CHALLENGE_RESOURCE) }
    }

    pub async fn for_challenge(
        &self,
        challenge_id: &str,
    ) -> Result<Vec<ChallengeResource>, ChallengeError> {
        let rows = self
            .table
            .find_by("challenge_id", challenge_id)
            .await
            .context("Listing challenge resources")?;
        rows.into_iter().map(ChallengeResource::try_from).collect()
    }

    pub async fn get(&self, id: &str) -> Result<Option<ChallengeResource>, ChallengeError> {
        let row = self.table.find(id).await.context("Loading challenge resource")?;
        row.map(ChallengeResource::try_from).transpose()
    }

    pub async fn insert(&self, resource: &ChallengeResource) -> Result<(), ChallengeError> {
        self.table.insert(resource.into()).await.context("Storing challenge resource")
    }

    pub async fn update(&self, resource: &ChallengeResource) -> Result<bool, ChallengeError> {
        self.table
            .replace(&resource.id, resource.into())
            .await
            .context("Updating challenge resource")
    }

    pub async fn delete(&self, id: &str) -> Result<(), ChallengeError> {
        self.table.remove_by("key", id).await.context("Deleting challenge resource")
    }

    pub async fn delete_for_challenge(&self, challenge_id: &str) -> Result<(), ChallengeError> {
        self.table
            .remove_by("challenge_id", challenge_id)
            .await
            .context("Deleting challenge resources")
    }
}
