use crate::Platform;
use crate::domain::{CostSummary, PlatformTool, ToolInput, ToolList, ToolQuery};
use crate::service;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use whub_derive::api_handler;
use whub_kernel::audit::AuditEvent;
use whub_kernel::domain::constants::{PLATFORM_TAG, PLATFORM_TOOL};
use whub_kernel::security::resource::ResourceGuard;
use whub_kernel::server::{Actor, ApiJson, ApiQuery, ApiResult, ApiState, ErrorBody};

#[api_handler(
    post,
    path = "/api/platform-tools",
    request_body = ToolInput,
    responses(
        (status = CREATED, description = "Tool added", body = PlatformTool),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid fields", body = ErrorBody),
    ),
    tag = PLATFORM_TAG,
)]
pub(crate) async fn create_tool(
    State(state): State<ApiState>,
    actor: Actor,
    ApiJson(input): ApiJson<ToolInput>,
) -> ApiResult<(StatusCode, Json<PlatformTool>)> {
    let slice = state.try_get_slice::<Platform>()?;
    let tool = service::create(&slice.tools, input, state.marketplace()).await?;

    state.publish_audit(
        AuditEvent::new("created", PLATFORM_TOOL, &tool.id)
            .summary(format!("Platform tool '{}' added", tool.name))
            .actor(actor.as_deref()),
    );
    Ok((StatusCode::CREATED, Json(tool)))
}

#[api_handler(
    get,
    path = "/api/platform-tools",
    params(ToolQuery),
    responses(
        (status = OK, description = "Filtered tools with status counts", body = ToolList),
        (status = BAD_REQUEST, description = "Malformed query", body = ErrorBody),
    ),
    tag = PLATFORM_TAG,
)]
pub(crate) async fn list_tools(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<ToolQuery>,
) -> ApiResult<Json<ToolList>> {
    let slice = state.try_get_slice::<Platform>()?;
    Ok(Json(service::list(&slice.tools, &query, state.marketplace()).await?))
}

#[api_handler(
    get,
    path = "/api/platform-tools/summary",
    responses((
        status = OK,
        description = "Spending per currency and category, upcoming renewals",
        body = CostSummary
    )),
    tag = PLATFORM_TAG,
)]
pub(crate) async fn cost_summary(State(state): State<ApiState>) -> ApiResult<Json<CostSummary>> {
    let slice = state.try_get_slice::<Platform>()?;
    Ok(Json(service::summary(&slice.tools, state.marketplace()).await?))
}

#[api_handler(
    get,
    path = "/api/platform-tools/{id}",
    params(("id" = String, Path, description = "Tool id")),
    responses((status = OK, body = PlatformTool), (status = NOT_FOUND, body = ErrorBody)),
    tag = PLATFORM_TAG,
)]
pub(crate) async fn get_tool(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PlatformTool>> {
    let slice = state.try_get_slice::<Platform>()?;
    let key = ResourceGuard::verify(&id, PLATFORM_TOOL)?;
    Ok(Json(service::get(&slice.tools, &key).await?))
}

#[api_handler(
    put,
    path = "/api/platform-tools/{id}",
    params(("id" = String, Path, description = "Tool id")),
    request_body = ToolInput,
    responses(
        (status = OK, description = "Tool updated", body = PlatformTool),
        (status = NOT_FOUND, body = ErrorBody),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid fields", body = ErrorBody),
    ),
    tag = PLATFORM_TAG,
)]
pub(crate) async fn update_tool(
    State(state): State<ApiState>,
    actor: Actor,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ToolInput>,
) -> ApiResult<Json<PlatformTool>> {
    let slice = state.try_get_slice::<Platform>()?;
    let key = ResourceGuard::verify(&id, PLATFORM_TOOL)?;
    let tool = service::update(&slice.tools, &key, input, state.marketplace()).await?;

    state.publish_audit(
        AuditEvent::new("updated", PLATFORM_TOOL, &key)
            .summary(format!("Platform tool '{}' updated ({})", tool.name, tool.status))
            .actor(actor.as_deref()),
    );
    Ok(Json(tool))
}

#[api_handler(
    delete,
    path = "/api/platform-tools/{id}",
    params(("id" = String, Path, description = "Tool id")),
    responses(
        (status = NO_CONTENT, description = "Tool removed"),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    tag = PLATFORM_TAG,
)]
pub(crate) async fn delete_tool(
    State(state): State<ApiState>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let slice = state.try_get_slice::<Platform>()?;
    let key = ResourceGuard::verify(&id, PLATFORM_TOOL)?;
    let removed = service::delete(&slice.tools, &key).await?;

    state.publish_audit(
        AuditEvent::new("deleted", PLATFORM_TOOL, &key)
            .summary(format!("Platform tool '{}' removed", removed.name))
            .actor(actor.as_deref()),
    );
    Ok(StatusCode::NO_CONTENT)
}
