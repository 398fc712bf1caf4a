use crate::Appointments;
use crate::domain::{
    Appointment, AppointmentList, AppointmentQuery, BookAppointment, RescheduleAppointment,
    UpdateAppointmentStatus, UpdatePayment,
};
use crate::service;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use whub_derive::api_handler;
use whub_kernel::audit::AuditEvent;
use whub_kernel::domain::constants::{APPOINTMENT, APPOINTMENTS_TAG};
use whub_kernel::security::resource::ResourceGuard;
use whub_kernel::server::{Actor, ApiJson, ApiQuery, ApiResult, ApiState, ErrorBody};

#[api_handler(
    post,
    path = "/api/appointments",
    request_body = BookAppointment,
    responses(
        (status = CREATED, description = "Appointment booked as pending", body = Appointment),
        (status = CONFLICT, description = "Overlaps another appointment", body = ErrorBody),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid fields", body = ErrorBody),
    ),
    tag = APPOINTMENTS_TAG,
)]
pub(crate) async fn book_appointment(
    State(state): State<ApiState>,
    actor: Actor,
    ApiJson(input): ApiJson<BookAppointment>,
) -> ApiResult<(StatusCode, Json<Appointment>)> {
    let slice = state.try_get_slice::<Appointments>()?;
    let appointment = service::book(&slice.appointments, input, state.marketplace()).await?;

    state.publish_audit(
        AuditEvent::new("booked", APPOINTMENT, &appointment.id)
            .summary(format!(
                "{} booked {} on {} at {}",
                appointment.patient_name,
                appointment.service_name,
                appointment.date,
                appointment.time
            ))
            .actor(actor.as_deref()),
    );
    Ok((StatusCode::CREATED, Json(appointment)))
}

#[api_handler(
    get,
    path = "/api/appointments",
    params(AppointmentQuery),
    responses(
        (
            status = OK,
            description = "Filtered appointments with statistics",
            body = AppointmentList
        ),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid date range", body = ErrorBody),
    ),
    tag = APPOINTMENTS_TAG,
)]
pub(crate) async fn list_appointments(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<AppointmentQuery>,
) -> ApiResult<Json<AppointmentList>> {
    let slice = state.try_get_slice::<Appointments>()?;
    Ok(Json(service::list(&slice.appointments, &query, state.marketplace()).await?))
}

#[api_handler(
    get,
    path = "/api/appointments/{id}",
    params(("id" = String, Path, description = "Appointment id")),
    responses((status = OK, body = Appointment), (status = NOT_FOUND, body = ErrorBody)),
    tag = APPOINTMENTS_TAG,
)]
pub(crate) async fn get_appointment(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Appointment>> {
    let slice = state.try_get_slice::<Appointments>()?;
    let key = ResourceGuard::verify(&id, APPOINTMENT)?;
    Ok(Json(service::get(&slice.appointments, &key).await?))
}

#[api_handler(
    patch,
    path = "/api/appointments/{id}/status",
    params(("id" = String, Path, description = "Appointment id")),
    request_body = UpdateAppointmentStatus,
    responses(
        (status = OK, body = Appointment),
        (status = NOT_FOUND, body = ErrorBody),
        (status = CONFLICT, description = "Transition not allowed", body = ErrorBody),
    ),
    tag = APPOINTMENTS_TAG,
)]
pub(crate) async fn set_appointment_status(
    State(state): State<ApiState>,
    actor: Actor,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateAppointmentStatus>,
) -> ApiResult<Json<Appointment>> {
    let slice = state.try_get_slice::<Appointments>()?;
    let key = ResourceGuard::verify(&id, APPOINTMENT)?;
    let appointment =
        service::set_status(&slice.appointments, &key, body.status, body.reason).await?;

    state.publish_audit(
        AuditEvent::new("status_changed", APPOINTMENT, &key)
            .summary(format!(
                "Appointment of {} is now {}",
                appointment.patient_name, appointment.status
            ))
            .actor(actor.as_deref()),
    );
    Ok(Json(appointment))
}

#[api_handler(
    patch,
    path = "/api/appointments/{id}/schedule",
    params(("id" = String, Path, description = "Appointment id")),
    request_body = RescheduleAppointment,
    responses(
        (status = OK, body = Appointment),
        (status = NOT_FOUND, body = ErrorBody),
        (
            status = CONFLICT,
            description = "Closed appointment or overlapping slot",
            body = ErrorBody
        ),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid or past slot", body = ErrorBody),
    ),
    tag = APPOINTMENTS_TAG,
)]
pub(crate) async fn reschedule_appointment(
    State(state): State<ApiState>,
    actor: Actor,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<RescheduleAppointment>,
) -> ApiResult<Json<Appointment>> {
    let slice = state.try_get_slice::<Appointments>()?;
    let key = ResourceGuard::verify(&id, APPOINTMENT)?;
    let appointment = service::reschedule(&slice.appointments, &key, &body).await?;

    state.publish_audit(
        AuditEvent::new("rescheduled", APPOINTMENT, &key)
            .summary(format!("Appointment moved to {} at {}", appointment.date, appointment.time))
            .actor(actor.as_deref()),
    );
    Ok(Json(appointment))
}

#[api_handler(
    patch,
    path = "/api/appointments/{id}/payment",
    params(("id" = String, Path, description = "Appointment id")),
    request_body = UpdatePayment,
    responses((status = OK, body = Appointment), (status = NOT_FOUND, body = ErrorBody)),
    tag = APPOINTMENTS_TAG,
)]
pub(crate) async fn set_appointment_payment(
    State(state): State<ApiState>,
    actor: Actor,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdatePayment>,
) -> ApiResult<Json<Appointment>> {
    let slice = state.try_get_slice::<Appointments>()?;
    let key = ResourceGuard::verify(&id, APPOINTMENT)?;
    let appointment = service::set_payment(&slice.appointments, &key, body.payment_status).await?;

    state.publish_audit(
        AuditEvent::new("payment_updated", APPOINTMENT, &key)
            .summary(format!("Payment marked {}", appointment.payment_status))
            .actor(actor.as_deref()),
    );
    Ok(Json(appointment))
}

#[api_handler(
    delete,
    path = "/api/appointments/{id}",
    params(("id" = String, Path, description = "Appointment id")),
    responses(
        (status = NO_CONTENT, description = "Appointment deleted"),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    tag = APPOINTMENTS_TAG,
)]
pub(crate) async fn delete_appointment(
    State(state): State<ApiState>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let slice = state.try_get_slice::<Appointments>()?;
    let key = ResourceGuard::verify(&id, APPOINTMENT)?;
    let removed = service::delete(&slice.appointments, &key).await?;

    state.publish_audit(
        AuditEvent::new("deleted", APPOINTMENT, &key)
            .summary(format!("Appointment of {} on {} deleted", removed.patient_name, removed.date))
            .actor(actor.as_deref()),
    );
    Ok(StatusCode::NO_CONTENT)
}
