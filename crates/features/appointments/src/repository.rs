use crate::domain::{Appointment, AppointmentStatus, Mode, PaymentStatus};
use crate::error::{AppointmentError, AppointmentErrorExt};
use std::str::FromStr;
use whub_database::{Database, SurrealValue, Table, WriteGuard};
use whub_kernel::badge::StatusBadge;
use whub_kernel::domain::constants::APPOINTMENT;

fn parse<T: FromStr>(raw: &str, what: &str, key: &str) -> Result<T, AppointmentError> {
    T::from_str(raw).map_err(|_| AppointmentError::from(format!("unknown {what} '{raw}' on {key}")))
}

/// Another appointment of the same professional and day, still holding its slot, whose
/// half-open minute span intersects the guarded one.
const OVERLAPPING_SLOT: &str = "professional_id = $guard.professional_id AND date = $guard.date \
    AND key != $guard.key AND status NOTINSIDE $guard.released \
    AND start_minute < $guard.end_minute AND end_minute > $guard.start_minute";

#[derive(Debug, Clone, SurrealValue)]
struct SlotGuard {
    key: String,
    professional_id: String,
    date: String,
    start_minute: i64,
    end_minute: i64,
    released: Vec<String>,
}

/// Bookings of one professional on one day serialize on the same scope.
fn slot_guard(a: &Appointment) -> WriteGuard<SlotGuard> {
    let (start_minute, end_minute) = a.minute_span().unwrap_or_default();
    WriteGuard {
        scope: format!("{}/{}", a.professional_id, a.date),
        condition: OVERLAPPING_SLOT,
        values: SlotGuard {
            key: a.id.clone(),
            professional_id: a.professional_id.clone(),
            date: a.date.clone(),
            start_minute,
            end_minute,
            released: [AppointmentStatus::Cancelled, AppointmentStatus::NoShow]
                .iter()
                .map(ToString::to_string)
                .collect(),
        },
    }
}

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct AppointmentRow {
    key: String,
    professional_id: String,
    patient_id: String,
    patient_name: String,
    patient_email: Option<String>,
    service_name: String,
    date: String,
    time: String,
    duration_minutes: i64,
    start_minute: i64,
    end_minute: i64,
    mode: String,
    location: Option<String>,
    meeting_url: Option<String>,
    price: f64,
    currency: String,
    status: String,
    payment_status: String,
    notes: Option<String>,
    cancellation_reason: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<&Appointment> for AppointmentRow {
    fn from(a: &Appointment) -> Self {
        let (start_minute, end_minute) = a.minute_span().unwrap_or_default();
        Self {
            key: a.id.clone(),
            professional_id: a.professional_id.clone(),
            patient_id: a.patient_id.clone(),
            patient_name: a.patient_name.clone(),
            patient_email: a.patient_email.clone(),
            service_name: a.service_name.clone(),
            date: a.date.clone(),
            time: a.time.clone(),
            duration_minutes: a.duration_minutes,
            start_minute,
            end_minute,
            mode: a.mode.to_string(),
            location: a.location.clone(),
            meeting_url: a.meeting_url.clone(),
            price: a.price,
            currency: a.currency.clone(),
            status: a.status.to_string(),
            payment_status: a.payment_status.to_string(),
            notes: a.notes.clone(),
            cancellation_reason: a.cancellation_reason.clone(),
            created_at: a.created_at.clone(),
            updated_at: a.updated_at.clone(),
        }
    }
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = AppointmentError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        let mode: Mode = parse(&row.mode, "mode", &row.key)?;
        let status: AppointmentStatus = parse(&row.status, "status", &row.key)?;
        let payment_status: PaymentStatus = parse(&row.payment_status, "payment status", &row.key)?;
        Ok(Self {
            id: row.key,
            professional_id: row.professional_id,
            patient_id: row.patient_id,
            patient_name: row.patient_name,
            patient_email: row.patient_email,
            service_name: row.service_name,
            date: row.date,
            time: row.time,
            duration_minutes: row.duration_minutes,
            mode,
            location: row.location,
            meeting_url: row.meeting_url,
            price: row.price,
            currency: row.currency,
            status,
            payment_status,
            notes: row.notes,
            cancellation_reason: row.cancellation_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
            badge: status.badge(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppointmentRepository {
    table: Table<AppointmentRow>,
}

impl AppointmentRepository {
    #[must_use]
    pub fn new(database: Database) -> Self {
        Self { table: Table::new(database, APPOINTMENT) }
    }

    pub async fn list(&self) -> Result<Vec<Appointment>, AppointmentError> {
        let rows = self.table.all().await.context("Listing appointments")?;
        rows.into_iter().map(Appointment::try_from).collect()
    }

    pub async fn for_professional(
        &self,
        professional_id: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let rows = self
            .table
            .find_by("professional_id", professional_id)
            .await
            .context("Loading the professional's agenda")?;
        rows.into_iter().map(Appointment::try_from).collect()
    }

    pub async fn get(&self, id: &str) -> Result<Option<Appointment>, AppointmentError> {
        let row = self.table.find(id).await.context("Loading appointment")?;
        row.map(Appointment::try_from).transpose()
    }

    /// Stores `appointment` unless it overlaps a slot already held. Returns `false` on overlap.
    pub async fn insert_if_free(
        &self,
        appointment: &Appointment,
    ) -> Result<bool, AppointmentError> {
        self.table
            .insert_unless(appointment.into(), slot_guard(appointment))
            .await
            .context("Storing appointment")
    }

    /// Saves a moved `appointment` unless its new slot overlaps another.
    /// Returns `false` on overlap.
    pub async fn update_if_free(
        &self,
        appointment: &Appointment,
    ) -> Result<bool, AppointmentError> {
        self.table
            .replace_unless(&appointment.id, appointment.into(), slot_guard(appointment))
            .await
            .context("Rescheduling appointment")
    }

    pub async fn update(&self, appointment: &Appointment) -> Result<bool, AppointmentError> {
        self.table
            .replace(&appointment.id, appointment.into())
            .await
            .context("Updating appointment")
    }

    pub async fn delete(&self, id: &str) -> Result<Option<Appointment>, AppointmentError> {
        let row = self.table.remove(id).await.context("Deleting appointment")?;
        row.map(Appointment::try_from).transpose()
    }
}
