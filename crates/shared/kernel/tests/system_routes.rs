use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::routing::get;
use tower::ServiceExt;
use utoipa_axum::router::OpenApiRouter;
use whub_kernel::server::Actor;
use whub_kernel::server::router::system_router;

#[tokio::test]
async fn health_reports_up_without_caching() {
    let (router, api) = OpenApiRouter::<()>::new().merge(system_router()).split_for_parts();
    assert!(api.paths.paths.contains_key("/health"));

    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-store, no-cache, must-revalidate"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "up");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn actor_header_is_optional_and_trimmed() {
    let app = Router::new().route(
        "/",
        get(|actor: Actor| async move { actor.0.unwrap_or_else(|| "anonymous".to_owned()) }),
    );

    let request = Request::get("/").header("x-actor", "  ana@prana.mx ").body(Body::empty());
    let response = app.clone().oneshot(request.unwrap()).await.unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ana@prana.mx");

    let response = app.oneshot(Request::get("/").body(Body::empty()).unwrap()).await.unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"anonymous");
}
