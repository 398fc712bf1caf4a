use axum::body::to_bytes;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use whub_kernel::server::{ApiError, ErrorBody};
use whub_kernel::validation::Validator;

async fn render(error: ApiError) -> (StatusCode, ErrorBody) {
    let response = error.into_response();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn validation_errors_list_every_field() {
    let mut v = Validator::new();
    v.required("name", " ").email("email", "nope");
    let errors = v.finish().unwrap_err();

    let (status, body) = render(errors.into()).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body.error, "validation");
    let fields: Vec<_> = body.fields.iter().map(|f| f.field.as_str()).collect();
    assert_eq!(fields, ["name", "email"]);
}

#[tokio::test]
async fn statuses_map_to_variants() {
    let (status, body) = render(ApiError::from_status(404, "listing abc")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.error, "not_found");
    assert!(body.message.contains("listing abc"));
    assert!(body.fields.is_empty());

    let (status, body) = render(ApiError::from_status(409, "already reviewed")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body.error, "conflict");

    let (status, _) = render(ApiError::from_status(400, "bad")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn internal_errors_hide_details() {
    let (status, body) = render(ApiError::from_status(500, "connection string leaked")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body.error, "internal");
    assert!(!body.message.contains("leaked"));
}

#[tokio::test]
async fn malformed_ids_are_bad_requests() {
    let err = whub_kernel::security::resource::ResourceGuard::verify("shop:x", "listing")
        .map_err(ApiError::from)
        .unwrap_err();
    let (status, body) = render(err).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.error, "invalid_id");
}
