use crate::domain::{
    Appointment, AppointmentList, AppointmentQuery, AppointmentStats, AppointmentStatus,
    BookAppointment, PaymentStatus, RescheduleAppointment,
};
use crate::error::AppointmentError;
use crate::repository::AppointmentRepository;
use chrono::NaiveDateTime;
use tracing::{info, warn};
use whub_kernel::clock;
use whub_kernel::domain::config::MarketplaceConfig;
use whub_kernel::listing::Page;
use whub_kernel::safe_nanoid;

fn now() -> NaiveDateTime {
    clock::now().naive_utc()
}

pub async fn book(
    repo: &AppointmentRepository,
    input: BookAppointment,
    config: &MarketplaceConfig,
) -> Result<Appointment, AppointmentError> {
    input.validate(now())?;

    let appointment =
        input.into_appointment(safe_nanoid!(), &config.currency, &clock::now_timestamp());
    ensure_free(repo, &appointment).await?;
    if !repo.insert_if_free(&appointment).await? {
        return Err(slot_taken(&appointment));
    }
    info!(
        id = %appointment.id,
        professional_id = %appointment.professional_id,
        date = %appointment.date,
        time = %appointment.time,
        "Appointment booked"
    );
    Ok(appointment)
}

/// Statistics cover every appointment, filters only narrow the items.
pub async fn list(
    repo: &AppointmentRepository,
    query: &AppointmentQuery,
    config: &MarketplaceConfig,
) -> Result<AppointmentList, AppointmentError> {
    let all = repo.list().await?;
    let stats = AppointmentStats::compute(&all, now(), config.stats_window_days);

    let page = Page::new(query.offset, query.limit, config);
    let (items, total) = page.apply(query.apply(all)?);
    Ok(AppointmentList { items, total, offset: page.offset, limit: page.limit, stats })
}

pub async fn get(repo: &AppointmentRepository, id: &str) -> Result<Appointment, AppointmentError> {
    repo.get(id).await?.ok_or_else(|| not_found(id))
}

pub async fn set_status(
    repo: &AppointmentRepository,
    id: &str,
    status: AppointmentStatus,
    reason: Option<String>,
) -> Result<Appointment, AppointmentError> {
    let mut appointment = get(repo, id).await?;
    let from = appointment.status;

    appointment.transition(status, reason, &clock::now_timestamp()).map_err(|refusal| {
        warn!(id, %from, to = %status, "Appointment transition refused");
        conflict(refusal.to_string())
    })?;
    save(repo, &appointment).await?;
    info!(id, %from, to = %status, "Appointment status changed");
    Ok(appointment)
}

pub async fn reschedule(
    repo: &AppointmentRepository,
    id: &str,
    body: &RescheduleAppointment,
) -> Result<Appointment, AppointmentError> {
    let (date, time) = body.parse(now())?;
    let mut appointment = get(repo, id).await?;

    appointment
        .reschedule(date, time, &clock::now_timestamp())
        .map_err(|r| conflict(r.to_string()))?;
    ensure_free(repo, &appointment).await?;
    if !repo.update_if_free(&appointment).await? {
        return Err(slot_taken(&appointment));
    }
    info!(id, date = %appointment.date, time = %appointment.time, "Appointment rescheduled");
    Ok(appointment)
}

pub async fn set_payment(
    repo: &AppointmentRepository,
    id: &str,
    payment_status: PaymentStatus,
) -> Result<Appointment, AppointmentError> {
    let mut appointment = get(repo, id).await?;

    appointment.set_payment(payment_status, &clock::now_timestamp());
    save(repo, &appointment).await?;
    info!(id, %payment_status, "Appointment payment updated");
    Ok(appointment)
}

pub async fn delete(
    repo: &AppointmentRepository,
    id: &str,
) -> Result<Appointment, AppointmentError> {
    let removed = repo.delete(id).await?.ok_or_else(|| not_found(id))?;
    info!(id, "Appointment deleted");
    Ok(removed)
}

/// Rejects a slot overlapping another appointment still holding the professional's time.
async fn ensure_free(
    repo: &AppointmentRepository,
    appointment: &Appointment,
) -> Result<(), AppointmentError> {
    let agenda = repo.for_professional(&appointment.professional_id).await?;
    match agenda.iter().find(|other| appointment.clashes_with(other)) {
        Some(other) => Err(conflict(format!(
            "{} at {} overlaps appointment {} at {}",
            appointment.date, appointment.time, other.id, other.time
        ))),
        None => Ok(()),
    }
}

async fn save(
    repo: &AppointmentRepository,
    appointment: &Appointment,
) -> Result<(), AppointmentError> {
    if repo.update(appointment).await? { Ok(()) } else { Err(not_found(&appointment.id)) }
}

fn slot_taken(appointment: &Appointment) -> AppointmentError {
    conflict(format!("{} at {} is no longer free", appointment.date, appointment.time))
}

fn not_found(id: &str) -> AppointmentError {
    AppointmentError::NotFound { message: format!("appointment {id}").into(), context: None }
}

fn conflict(message: String) -> AppointmentError {
    AppointmentError::Conflict { message: message.into(), context: None }
}
