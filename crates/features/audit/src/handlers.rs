use crate::Audit;
use crate::domain::{AuditList, AuditQuery};
use crate::service;
use axum::Json;
use axum::extract::State;
use whub_derive::api_handler;
use whub_kernel::domain::constants::AUDIT_TAG;
use whub_kernel::server::{ApiQuery, ApiResult, ApiState, ErrorBody};

#[api_handler(
    get,
    path = "/api/audit",
    params(AuditQuery),
    responses(
        (status = OK, description = "Audit entries, newest first", body = AuditList),
        (status = BAD_REQUEST, description = "Malformed query", body = ErrorBody),
    ),
    tag = AUDIT_TAG,
)]
pub(crate) async fn list_audit(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<AuditQuery>,
) -> ApiResult<Json<AuditList>> {
    let slice = state.try_get_slice::<Audit>()?;
    Ok(Json(service::list(&slice.entries, &query, state.marketplace()).await?))
}
