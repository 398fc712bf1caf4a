use crate::domain::{ApplicationStatus, ProfessionalApplication};
use crate::error::{ApplicationError, ApplicationErrorExt};
use std::str::FromStr;
use whub_database::{Database, SurrealValue, Table, WriteGuard};
use whub_kernel::badge::StatusBadge;
use whub_kernel::domain::constants::APPLICATION;

const PENDING_FOR_EMAIL: &str = "email = $guard.email AND status = $guard.status";

#[derive(Debug, Clone, SurrealValue)]
struct PendingGuard {
    email: String,
    status: String,
}

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct ApplicationRow {
    key: String,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    profession: String,
    specializations: Vec<String>,
    experience_years: i64,
    certifications: Vec<String>,
    biography: String,
    city: String,
    country: String,
    instagram: Option<String>,
    website: Option<String>,
    status: String,
    review_notes: Option<String>,
    reviewed_by: Option<String>,
    reviewed_at: Option<String>,
    submitted_at: String,
    updated_at: String,
}

impl From<&ProfessionalApplication> for ApplicationRow {
    fn from(app: &ProfessionalApplication) -> Self {
        Self {
            key: app.id.clone(),
            first_name: app.first_name.clone(),
            last_name: app.last_name.clone(),
            email: app.email.clone(),
            phone: app.phone.clone(),
            profession: app.profession.clone(),
            specializations: app.specializations.clone(),
            experience_years: app.experience_years,
            certifications: app.certifications.clone(),
            biography: app.biography.clone(),
            city: app.city.clone(),
            country: app.country.clone(),
            instagram: app.instagram.clone(),
            website: app.website.clone(),
            status: app.status.to_string(),
            review_notes: app.review_notes.clone(),
            reviewed_by: app.reviewed_by.clone(),
            reviewed_at: app.reviewed_at.clone(),
            submitted_at: app.submitted_at.clone(),
            updated_at: app.updated_at.clone(),
        }
    }
}

impl TryFrom<ApplicationRow> for ProfessionalApplication {
    type Error = ApplicationError;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        let status = ApplicationStatus::from_str(&row.status).map_err(|_| {
            ApplicationError::from(format!("unknown status '{}' on {}", row.status, row.key))
        })?;
        Ok(Self {
            id: row.key,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            profession: row.profession,
            specializations: row.specializations,
            experience_years: row.experience_years,
            certifications: row.certifications,
            biography: row.biography,
            city: row.city,
            country: row.country,
            instagram: row.instagram,
            website: row.website,
            status,
            review_notes: row.review_notes,
            reviewed_by: row.reviewed_by,
            reviewed_at: row.reviewed_at,
            submitted_at: row.submitted_at,
            updated_at: row.updated_at,
            badge: status.badge(),
        })
    }
}

/// Persistence of professional applications.
#[derive(Debug, Clone)]
pub struct ApplicationRepository {
    table: Table<ApplicationRow>,
}

impl ApplicationRepository {
    #[must_use]
    pub fn new(database: Database) -> Self {
        Self { table: Table::new(database, APPLICATION) }
    }

    pub async fn list(&self) -> Result<Vec<ProfessionalApplication>, ApplicationError> {
        let rows = self.table.all().await.context("Listing applications")?;
        rows.into_iter().map(ProfessionalApplication::try_from).collect()
    }

    pub async fn get(&self, id: &str) -> Result<Option<ProfessionalApplication>, ApplicationError> {
        let row = self.table.find(id).await.context("Loading application")?;
        row.map(ProfessionalApplication::try_from).transpose()
    }

    /// Applications submitted with `email`, compared case-insensitively.
    pub async fn by_email(
        &self,
        email: &str,
    ) -> Result<Vec<ProfessionalApplication>, ApplicationError> {
        let rows = self
            .table
            .find_by("email", email.trim().to_lowercase())
            .await
            .context("Looking up email")?;
        rows.into_iter().map(ProfessionalApplication::try_from).collect()
    }

    /// Stores `app` unless a pending application with the same email exists.
    /// Returns `false` when one did and nothing was stored.
    pub async fn insert_unless_pending(
        &self,
        app: &ProfessionalApplication,
    ) -> Result<bool, ApplicationError> {
        let guard = WriteGuard {
            scope: app.email.clone(),
            condition: PENDING_FOR_EMAIL,
            values: PendingGuard {
                email: app.email.clone(),
                status: ApplicationStatus::Pending.to_string(),
            },
        };
        self.table
            .insert_unless(app.into(), guard)
            .await
            .context("Storing application")
    }

    pub async fn update(&self, app: &ProfessionalApplication) -> Result<bool, ApplicationError> {
        self.table.replace(&app.id, app.into()).await.context("Updating application")
    }

    pub async fn delete(
        &self,
        id: &str,
    ) -> Result<Option<ProfessionalApplication>, ApplicationError> {
        let row = self.table.remove(id).await.context("Deleting application")?;
        row.map(ProfessionalApplication::try_from).transpose()
    }
}
