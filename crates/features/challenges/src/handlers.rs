use crate::Challenges;
use crate::domain::{
    Challenge, ChallengeFields, ChallengeList, ChallengeQuery, CreateChallenge,
    UpdateChallengeStatus,
};
use crate::resources::{ChallengeResource, ResourceInput};
use crate::service;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use whub_derive::api_handler;
use whub_kernel::audit::AuditEvent;
use whub_kernel::domain::constants::{CHALLENGE, CHALLENGE_RESOURCE, CHALLENGES_TAG};
use whub_kernel::security::resource::ResourceGuard;
use whub_kernel::server::{Actor, ApiJson, ApiQuery, ApiResult, ApiState, ErrorBody};

#[api_handler(
    post,
    path = "/api/challenges",
    request_body = CreateChallenge,
    responses(
        (status = CREATED, description = "Challenge created", body = Challenge),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid fields", body = ErrorBody),
    ),
    tag = CHALLENGES_TAG,
)]
pub(crate) async fn create_challenge(
    State(state): State<ApiState>,
    actor: Actor,
    ApiJson(input): ApiJson<CreateChallenge>,
) -> ApiResult<(StatusCode, Json<Challenge>)> {
    let slice = state.try_get_slice::<Challenges>()?;
    let challenge = service::create(&slice.challenges, input, state.marketplace()).await?;

    state.publish_audit(
        AuditEvent::new("created", CHALLENGE, &challenge.id)
            .summary(format!("Challenge '{}' created", challenge.title))
            .actor(actor.as_deref()),
    );
    Ok((StatusCode::CREATED, Json(challenge)))
}

#[api_handler(
    get,
    path = "/api/challenges",
    params(ChallengeQuery),
    responses(
        (status = OK, description = "Filtered challenges with statistics", body = ChallengeList),
        (status = BAD_REQUEST, description = "Malformed query", body = ErrorBody),
    ),
    tag = CHALLENGES_TAG,
)]
pub(crate) async fn list_challenges(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<ChallengeQuery>,
) -> ApiResult<Json<ChallengeList>> {
    let slice = state.try_get_slice::<Challenges>()?;
    Ok(Json(service::list(&slice.challenges, &query, state.marketplace()).await?))
}

#[api_handler(
    get,
    path = "/api/challenges/{id}",
    params(("id" = String, Path, description = "Challenge id")),
    responses((status = OK, body = Challenge), (status = NOT_FOUND, body = ErrorBody)),
    tag = CHALLENGES_TAG,
)]
pub(crate) async fn get_challenge(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Challenge>> {
    let slice = state.try_get_slice::<Challenges>()?;
    let key = ResourceGuard::verify(&id, CHALLENGE)?;
    Ok(Json(service::get(&slice.challenges, &key).await?))
}

#[api_handler(
    put,
    path = "/api/challenges/{id}",
    params(("id" = String, Path, description = "Challenge id")),
    request_body = ChallengeFields,
    responses(
        (status = OK, description = "Challenge updated", body = Challenge),
        (status = NOT_FOUND, body = ErrorBody),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid fields", body = ErrorBody),
    ),
    tag = CHALLENGES_TAG,
)]
pub(crate) async fn update_challenge(
    State(state): State<ApiState>,
    actor: Actor,
    Path(id): Path<String>,
    ApiJson(fields): ApiJson<ChallengeFields>,
) -> ApiResult<Json<Challenge>> {
    let slice = state.try_get_slice::<Challenges>()?;
    let key = ResourceGuard::verify(&id, CHALLENGE)?;
    let challenge = service::update(&slice.challenges, &key, fields, state.marketplace()).await?;

    state.publish_audit(
        AuditEvent::new("updated", CHALLENGE, &key)
            .summary(format!("Challenge '{}' updated", challenge.title))
            .actor(actor.as_deref()),
    );
    Ok(Json(challenge))
}

#[api_handler(
    patch,
    path = "/api/challenges/{id}/status",
    params(("id" = String, Path, description = "Challenge id")),
    request_body = UpdateChallengeStatus,
    responses((status = OK, body = Challenge), (status = NOT_FOUND, body = ErrorBody)),
    tag = CHALLENGES_TAG,
)]
pub(crate) async fn set_challenge_status(
    State(state): State<ApiState>,
    actor: Actor,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateChallengeStatus>,
) -> ApiResult<Json<Challenge>> {
    let slice = state.try_get_slice::<Challenges>()?;
    let key = ResourceGuard::verify(&id, CHALLENGE)?;
    let challenge = service::set_status(&slice.challenges, &key, body.status).await?;

    state.publish_audit(
        AuditEvent::new("status_changed", CHALLENGE, &key)
            .summary(format!("Challenge '{}' is now {}", challenge.title, challenge.status))
            .actor(actor.as_deref()),
    );
    Ok(Json(challenge))
}

#[api_handler(
    delete,
    path = "/api/challenges/{id}",
    params(("id" = String, Path, description = "Challenge id")),
    responses(
        (status = NO_CONTENT, description = "Challenge and its resources deleted"),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    tag = CHALLENGES_TAG,
)]
pub(crate) async fn delete_challenge(
    State(state): State<ApiState>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let slice = state.try_get_slice::<Challenges>()?;
    let key = ResourceGuard::verify(&id, CHALLENGE)?;
    let removed = service::delete(&slice.challenges, &slice.resources, &key).await?;

    state.publish_audit(
        AuditEvent::new("deleted", CHALLENGE, &key)
            .summary(format!("Challenge '{}' deleted", removed.title))
            .actor(actor.as_deref()),
    );
    Ok(StatusCode::NO_CONTENT)
}

#[api_handler(
    get,
    path = "/api/challenges/{id}/resources",
    params(("id" = String, Path, description = "Challenge id")),
    responses(
        (status = OK, description = "Resources ordered by position", body = [ChallengeResource]),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    tag = CHALLENGES_TAG,
)]
pub(crate) async fn list_resources(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ChallengeResource>>> {
    let slice = state.try_get_slice::<Challenges>()?;
    let key = ResourceGuard::verify(&id, CHALLENGE)?;
    Ok(Json(service::list_resources(&slice.challenges, &slice.resources, &key).await?))
}

#[api_handler(
    post,
    path = "/api/challenges/{id}/resources",
    params(("id" = String, Path, description = "Challenge id")),
    request_body = ResourceInput,
    responses(
        (status = CREATED, description = "Resource attached", body = ChallengeResource),
        (status = NOT_FOUND, body = ErrorBody),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid fields", body = ErrorBody),
    ),
    tag = CHALLENGES_TAG,
)]
pub(crate) async fn add_resource(
    State(state): State<ApiState>,
    actor: Actor,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ResourceInput>,
) -> ApiResult<(StatusCode, Json<ChallengeResource>)> {
    let slice = state.try_get_slice::<Challenges>()?;
    let key = ResourceGuard::verify(&id, CHALLENGE)?;
    let resource =
        service::add_resource(&slice.challenges, &slice.resources, &key, input, state.marketplace())
            .await?;

    state.publish_audit(
        AuditEvent::new("created", CHALLENGE_RESOURCE, &resource.id)
            .summary(format!("Resource '{}' attached to challenge {key}", resource.title))
            .actor(actor.as_deref()),
    );
    Ok((StatusCode::CREATED, Json(resource)))
}

#[api_handler(
    put,
    path = "/api/challenges/{id}/resources/{resource_id}",
    params(
        ("id" = String, Path, description = "Challenge id"),
        ("resource_id" = String, Path, description = "Resource id"),
    ),
    request_body = ResourceInput,
    responses(
        (status = OK, body = ChallengeResource),
        (status = NOT_FOUND, body = ErrorBody),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid fields", body = ErrorBody),
    ),
    tag = CHALLENGES_TAG,
)]
pub(crate) async fn update_resource(
    State(state): State<ApiState>,
    actor: Actor,
    Path((id, resource_id)): Path<(String, String)>,
    ApiJson(input): ApiJson<ResourceInput>,
) -> ApiResult<Json<ChallengeResource>> {
    let slice = state.try_get_slice::<Challenges>()?;
    let key = ResourceGuard::verify(&id, CHALLENGE)?;
    let resource_key = ResourceGuard::verify(&resource_id, CHALLENGE_RESOURCE)?;
    let resource =
        service::update_resource(&slice.resources, &key, &resource_key, input, state.marketplace())
            .await?;

    state.publish_audit(
        AuditEvent::new("updated", CHALLENGE_RESOURCE, &resource_key)
            .summary(format!("Resource '{}' updated", resource.title))
            .actor(actor.as_deref()),
    );
    Ok(Json(resource))
}

#[api_handler(
    delete,
    path = "/api/challenges/{id}/resources/{resource_id}",
    params(
        ("id" = String, Path, description = "Challenge id"),
        ("resource_id" = String, Path, description = "Resource id"),
    ),
    responses(
        (status = NO_CONTENT, description = "Resource removed"),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    tag = CHALLENGES_TAG,
)]
pub(crate) async fn delete_resource(
    State(state): State<ApiState>,
    actor: Actor,
    Path((id, resource_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let slice = state.try_get_slice::<Challenges>()?;
    let key = ResourceGuard::verify(&id, CHALLENGE)?;
    let resource_key = ResourceGuard::verify(&resource_id, CHALLENGE_RESOURCE)?;
    let removed = service::delete_resource(&slice.resources, &key, &resource_key).await?;

    state.publish_audit(
        AuditEvent::new("deleted", CHALLENGE_RESOURCE, &resource_key)
            .summary(format!("Resource '{}' removed from challenge {key}", removed.title))
            .actor(actor.as_deref()),
    );
    Ok(StatusCode::NO_CONTENT)
}
