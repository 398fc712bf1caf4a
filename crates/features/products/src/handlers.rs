use crate::Products;
use crate::domain::{
    CreateProduct, DigitalProduct, ProductFields, ProductList, ProductQuery, SetProductActive,
};
use crate::service;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use whub_derive::api_handler;
use whub_kernel::audit::AuditEvent;
use whub_kernel::domain::constants::{PRODUCT, PRODUCTS_TAG};
use whub_kernel::security::resource::ResourceGuard;
use whub_kernel::server::{Actor, ApiJson, ApiQuery, ApiResult, ApiState, ErrorBody};

#[api_handler(
    post,
    path = "/api/products",
    request_body = CreateProduct,
    responses(
        (status = CREATED, description = "Product created", body = DigitalProduct),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid fields", body = ErrorBody),
    ),
    tag = PRODUCTS_TAG,
)]
pub(crate) async fn create_product(
    State(state): State<ApiState>,
    actor: Actor,
    ApiJson(input): ApiJson<CreateProduct>,
) -> ApiResult<(StatusCode, Json<DigitalProduct>)> {
    let slice = state.try_get_slice::<Products>()?;
    let product = service::create(&slice.products, input, state.marketplace()).await?;

    state.publish_audit(
        AuditEvent::new("created", PRODUCT, &product.id)
            .summary(format!("Product '{}' created", product.title))
            .actor(actor.as_deref()),
    );
    Ok((StatusCode::CREATED, Json(product)))
}

#[api_handler(
    get,
    path = "/api/products",
    params(ProductQuery),
    responses(
        (status = OK, description = "Filtered products with statistics", body = ProductList),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid price bounds", body = ErrorBody),
    ),
    tag = PRODUCTS_TAG,
)]
pub(crate) async fn list_products(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> ApiResult<Json<ProductList>> {
    let slice = state.try_get_slice::<Products>()?;
    Ok(Json(service::list(&slice.products, &query, state.marketplace()).await?))
}

#[api_handler(
    get,
    path = "/api/products/{id}",
    params(("id" = String, Path, description = "Product id")),
    responses((status = OK, body = DigitalProduct), (status = NOT_FOUND, body = ErrorBody)),
    tag = PRODUCTS_TAG,
)]
pub(crate) async fn get_product(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DigitalProduct>> {
    let slice = state.try_get_slice::<Products>()?;
    let key = ResourceGuard::verify(&id, PRODUCT)?;
    Ok(Json(service::get(&slice.products, &key).await?))
}

#[api_handler(
    put,
    path = "/api/products/{id}",
    params(("id" = String, Path, description = "Product id")),
    request_body = ProductFields,
    responses(
        (status = OK, description = "Product updated", body = DigitalProduct),
        (status = NOT_FOUND, body = ErrorBody),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid fields", body = ErrorBody),
    ),
    tag = PRODUCTS_TAG,
)]
pub(crate) async fn update_product(
    State(state): State<ApiState>,
    actor: Actor,
    Path(id): Path<String>,
    ApiJson(fields): ApiJson<ProductFields>,
) -> ApiResult<Json<DigitalProduct>> {
    let slice = state.try_get_slice::<Products>()?;
    let key = ResourceGuard::verify(&id, PRODUCT)?;
    let product = service::update(&slice.products, &key, fields, state.marketplace()).await?;

    state.publish_audit(
        AuditEvent::new("updated", PRODUCT, &key)
            .summary(format!("Product '{}' updated", product.title))
            .actor(actor.as_deref()),
    );
    Ok(Json(product))
}

#[api_handler(
    patch,
    path = "/api/products/{id}/active",
    params(("id" = String, Path, description = "Product id")),
    request_body = SetProductActive,
    responses((status = OK, body = DigitalProduct), (status = NOT_FOUND, body = ErrorBody)),
    tag = PRODUCTS_TAG,
)]
pub(crate) async fn set_product_active(
    State(state): State<ApiState>,
    actor: Actor,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<SetProductActive>,
) -> ApiResult<Json<DigitalProduct>> {
    let slice = state.try_get_slice::<Products>()?;
    let key = ResourceGuard::verify(&id, PRODUCT)?;
    let product = service::set_active(&slice.products, &key, body.is_active).await?;

    let action = if product.is_active { "activated" } else { "deactivated" };
    state.publish_audit(
        AuditEvent::new(action, PRODUCT, &key)
            .summary(format!("Product '{}' {action}", product.title))
            .actor(actor.as_deref()),
    );
    Ok(Json(product))
}

#[api_handler(
    post,
    path = "/api/products/{id}/sales",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = OK, description = "Sale counted", body = DigitalProduct),
        (status = NOT_FOUND, body = ErrorBody),
        (status = CONFLICT, description = "Product is inactive", body = ErrorBody),
    ),
    tag = PRODUCTS_TAG,
)]
pub(crate) async fn record_sale(
    State(state): State<ApiState>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult<Json<DigitalProduct>> {
    let slice = state.try_get_slice::<Products>()?;
    let key = ResourceGuard::verify(&id, PRODUCT)?;
    let product = service::record_sale(&slice.products, &key).await?;

    state.publish_audit(
        AuditEvent::new("sold", PRODUCT, &key)
            .summary(format!("Product '{}' sold ({} total)", product.title, product.sales_count))
            .actor(actor.as_deref()),
    );
    Ok(Json(product))
}

#[api_handler(
    delete,
    path = "/api/products/{id}",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = NO_CONTENT, description = "Product deleted"),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    tag = PRODUCTS_TAG,
)]
pub(crate) async fn delete_product(
    State(state): State<ApiState>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let slice = state.try_get_slice::<Products>()?;
    let key = ResourceGuard::verify(&id, PRODUCT)?;
    let removed = service::delete(&slice.products, &key).await?;

    state.publish_audit(
        AuditEvent::new("deleted", PRODUCT, &key)
            .summary(format!("Product '{}' deleted", removed.title))
            .actor(actor.as_deref()),
    );
    Ok(StatusCode::NO_CONTENT)
}
