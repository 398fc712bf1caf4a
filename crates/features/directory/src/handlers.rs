use crate::Directory;
use crate::domain::{
    Listing, ListingInput, ListingKind, ListingList, ListingQuery, SetListingActive,
};
use crate::error::DirectoryError;
use crate::service;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use whub_derive::api_handler;
use whub_kernel::audit::AuditEvent;
use whub_kernel::domain::constants::{DIRECTORY_TAG, LISTING};
use whub_kernel::links::ContactLinks;
use whub_kernel::security::resource::ResourceGuard;
use whub_kernel::server::{Actor, ApiJson, ApiQuery, ApiResult, ApiState, ErrorBody};

fn kind_of(segment: &str) -> Result<ListingKind, DirectoryError> {
    ListingKind::from_route(segment).ok_or_else(|| service::unknown_kind(segment))
}

#[api_handler(
    post,
    path = "/api/{kind}",
    params(("kind" = String, Path, description = "holistic-centers, restaurants or shops")),
    request_body = ListingInput,
    responses(
        (status = CREATED, description = "Listing created", body = Listing),
        (status = NOT_FOUND, description = "Unknown directory", body = ErrorBody),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid fields", body = ErrorBody),
    ),
    tag = DIRECTORY_TAG,
)]
pub(crate) async fn create_listing(
    State(state): State<ApiState>,
    actor: Actor,
    Path(kind): Path<String>,
    ApiJson(input): ApiJson<ListingInput>,
) -> ApiResult<(StatusCode, Json<Listing>)> {
    let slice = state.try_get_slice::<Directory>()?;
    let kind = kind_of(&kind)?;
    let listing = service::create(&slice.listings, kind, input).await?;

    state.publish_audit(
        AuditEvent::new("created", LISTING, &listing.id)
            .summary(format!("{} '{}' created", kind.label(), listing.name))
            .actor(actor.as_deref()),
    );
    Ok((StatusCode::CREATED, Json(listing)))
}

#[api_handler(
    get,
    path = "/api/{kind}",
    params(
        ("kind" = String, Path, description = "holistic-centers, restaurants or shops"),
        ListingQuery,
    ),
    responses(
        (status = OK, description = "Filtered listings with statistics", body = ListingList),
        (status = NOT_FOUND, description = "Unknown directory", body = ErrorBody),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid filters", body = ErrorBody),
    ),
    tag = DIRECTORY_TAG,
)]
pub(crate) async fn list_listings(
    State(state): State<ApiState>,
    Path(kind): Path<String>,
    ApiQuery(query): ApiQuery<ListingQuery>,
) -> ApiResult<Json<ListingList>> {
    let slice = state.try_get_slice::<Directory>()?;
    let kind = kind_of(&kind)?;
    Ok(Json(service::list(&slice.listings, kind, &query, state.marketplace()).await?))
}

#[api_handler(
    get,
    path = "/api/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "holistic-centers, restaurants or shops"),
        ("id" = String, Path, description = "Listing id"),
    ),
    responses((status = OK, body = Listing), (status = NOT_FOUND, body = ErrorBody)),
    tag = DIRECTORY_TAG,
)]
pub(crate) async fn get_listing(
    State(state): State<ApiState>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Json<Listing>> {
    let slice = state.try_get_slice::<Directory>()?;
    let kind = kind_of(&kind)?;
    let key = ResourceGuard::verify(&id, LISTING)?;
    Ok(Json(service::get(&slice.listings, kind, &key).await?))
}

#[api_handler(
    put,
    path = "/api/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "holistic-centers, restaurants or shops"),
        ("id" = String, Path, description = "Listing id"),
    ),
    request_body = ListingInput,
    responses(
        (status = OK, description = "Listing updated", body = Listing),
        (status = NOT_FOUND, body = ErrorBody),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid fields", body = ErrorBody),
    ),
    tag = DIRECTORY_TAG,
)]
pub(crate) async fn update_listing(
    State(state): State<ApiState>,
    actor: Actor,
    Path((kind, id)): Path<(String, String)>,
    ApiJson(input): ApiJson<ListingInput>,
) -> ApiResult<Json<Listing>> {
    let slice = state.try_get_slice::<Directory>()?;
    let kind = kind_of(&kind)?;
    let key = ResourceGuard::verify(&id, LISTING)?;
    let listing = service::update(&slice.listings, kind, &key, input).await?;

    state.publish_audit(
        AuditEvent::new("updated", LISTING, &key)
            .summary(format!("{} '{}' updated", kind.label(), listing.name))
            .actor(actor.as_deref()),
    );
    Ok(Json(listing))
}

#[api_handler(
    patch,
    path = "/api/{kind}/{id}/active",
    params(
        ("kind" = String, Path, description = "holistic-centers, restaurants or shops"),
        ("id" = String, Path, description = "Listing id"),
    ),
    request_body = SetListingActive,
    responses((status = OK, body = Listing), (status = NOT_FOUND, body = ErrorBody)),
    tag = DIRECTORY_TAG,
)]
pub(crate) async fn set_listing_active(
    State(state): State<ApiState>,
    actor: Actor,
    Path((kind, id)): Path<(String, String)>,
    ApiJson(body): ApiJson<SetListingActive>,
) -> ApiResult<Json<Listing>> {
    let slice = state.try_get_slice::<Directory>()?;
    let kind = kind_of(&kind)?;
    let key = ResourceGuard::verify(&id, LISTING)?;
    let listing = service::set_active(&slice.listings, kind, &key, body.is_active).await?;

    let action = if listing.is_active { "activated" } else { "deactivated" };
    state.publish_audit(
        AuditEvent::new(action, LISTING, &key)
            .summary(format!("{} '{}' {action}", kind.label(), listing.name))
            .actor(actor.as_deref()),
    );
    Ok(Json(listing))
}

#[api_handler(
    delete,
    path = "/api/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "holistic-centers, restaurants or shops"),
        ("id" = String, Path, description = "Listing id"),
    ),
    responses(
        (status = NO_CONTENT, description = "Listing deleted"),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    tag = DIRECTORY_TAG,
)]
pub(crate) async fn delete_listing(
    State(state): State<ApiState>,
    actor: Actor,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let slice = state.try_get_slice::<Directory>()?;
    let kind = kind_of(&kind)?;
    let key = ResourceGuard::verify(&id, LISTING)?;
    let removed = service::delete(&slice.listings, kind, &key).await?;

    state.publish_audit(
        AuditEvent::new("deleted", LISTING, &key)
            .summary(format!("{} '{}' deleted", kind.label(), removed.name))
            .actor(actor.as_deref()),
    );
    Ok(StatusCode::NO_CONTENT)
}

#[api_handler(
    get,
    path = "/api/{kind}/{id}/contact",
    params(
        ("kind" = String, Path, description = "holistic-centers, restaurants or shops"),
        ("id" = String, Path, description = "Listing id"),
    ),
    responses(
        (
            status = OK,
            description = "Links with a prefilled WhatsApp greeting",
            body = ContactLinks
        ),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    tag = DIRECTORY_TAG,
)]
pub(crate) async fn listing_contact(
    State(state): State<ApiState>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Json<ContactLinks>> {
    let slice = state.try_get_slice::<Directory>()?;
    let kind = kind_of(&kind)?;
    let key = ResourceGuard::verify(&id, LISTING)?;
    Ok(Json(service::contact(&slice.listings, kind, &key).await?))
}
