use crate::Applications;
use crate::domain::{
    ApplicationList, ApplicationQuery, ProfessionalApplication, ReviewApplication,
    SubmitApplication,
};
use crate::service;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use whub_derive::api_handler;
use whub_kernel::audit::AuditEvent;
use whub_kernel::domain::constants::{APPLICATION, APPLICATIONS_TAG};
use whub_kernel::security::resource::ResourceGuard;
use whub_kernel::server::{Actor, ApiJson, ApiQuery, ApiResult, ApiState, ErrorBody};

#[api_handler(
    post,
    path = "/api/applications",
    request_body = SubmitApplication,
    responses(
        (status = CREATED, description = "Application submitted", body = ProfessionalApplication),
        (
            status = CONFLICT,
            description = "A pending application exists for this email",
            body = ErrorBody
        ),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid fields", body = ErrorBody),
    ),
    tag = APPLICATIONS_TAG,
)]
pub(crate) async fn submit_application(
    State(state): State<ApiState>,
    actor: Actor,
    ApiJson(input): ApiJson<SubmitApplication>,
) -> ApiResult<(StatusCode, Json<ProfessionalApplication>)> {
    let slice = state.try_get_slice::<Applications>()?;
    let application = service::submit(&slice.repository, input).await?;

    state.publish_audit(
        AuditEvent::new("submitted", APPLICATION, &application.id)
            .summary(format!("{} applied as {}", application.full_name(), application.profession))
            .actor(actor.as_deref()),
    );
    Ok((StatusCode::CREATED, Json(application)))
}

#[api_handler(
    get,
    path = "/api/applications",
    params(ApplicationQuery),
    responses(
        (
            status = OK,
            description = "Filtered applications with statistics",
            body = ApplicationList
        ),
        (status = BAD_REQUEST, description = "Malformed query", body = ErrorBody),
    ),
    tag = APPLICATIONS_TAG,
)]
pub(crate) async fn list_applications(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<ApplicationQuery>,
) -> ApiResult<Json<ApplicationList>> {
    let slice = state.try_get_slice::<Applications>()?;
    Ok(Json(service::list(&slice.repository, &query, state.marketplace()).await?))
}

#[api_handler(
    get,
    path = "/api/applications/{id}",
    params(("id" = String, Path, description = "Application id")),
    responses(
        (status = OK, body = ProfessionalApplication),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    tag = APPLICATIONS_TAG,
)]
pub(crate) async fn get_application(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProfessionalApplication>> {
    let slice = state.try_get_slice::<Applications>()?;
    let key = ResourceGuard::verify(&id, APPLICATION)?;
    Ok(Json(service::get(&slice.repository, &key).await?))
}

#[api_handler(
    delete,
    path = "/api/applications/{id}",
    params(("id" = String, Path, description = "Application id")),
    responses(
        (status = NO_CONTENT, description = "Application deleted"),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    tag = APPLICATIONS_TAG,
)]
pub(crate) async fn delete_application(
    State(state): State<ApiState>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let slice = state.try_get_slice::<Applications>()?;
    let key = ResourceGuard::verify(&id, APPLICATION)?;
    let removed = service::delete(&slice.repository, &key).await?;

    state.publish_audit(
        AuditEvent::new("deleted", APPLICATION, &key)
            .summary(format!("Application of {} deleted", removed.full_name()))
            .actor(actor.as_deref()),
    );
    Ok(StatusCode::NO_CONTENT)
}

#[api_handler(
    post,
    path = "/api/applications/{id}/review",
    params(("id" = String, Path, description = "Application id")),
    request_body = ReviewApplication,
    responses(
        (status = OK, description = "Decision recorded", body = ProfessionalApplication),
        (status = NOT_FOUND, body = ErrorBody),
        (status = CONFLICT, description = "Application was already reviewed", body = ErrorBody),
        (status = UNPROCESSABLE_ENTITY, description = "Rejection without notes", body = ErrorBody),
    ),
    tag = APPLICATIONS_TAG,
)]
pub(crate) async fn review_application(
    State(state): State<ApiState>,
    actor: Actor,
    Path(id): Path<String>,
    ApiJson(review): ApiJson<ReviewApplication>,
) -> ApiResult<Json<ProfessionalApplication>> {
    let slice = state.try_get_slice::<Applications>()?;
    let key = ResourceGuard::verify(&id, APPLICATION)?;
    let application = service::review(&slice.repository, &key, &review, actor.as_deref()).await?;

    state.publish_audit(
        AuditEvent::new("reviewed", APPLICATION, &key)
            .summary(format!("Application of {} {}", application.full_name(), application.status))
            .actor(actor.as_deref()),
    );
    Ok(Json(application))
}
