use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;
use whub::domain::config::ApiConfig;
use whub_server::Server;

async fn server(cors_origins: &[&str]) -> anyhow::Result<Server> {
    let mut cfg = ApiConfig::default();
    cfg.database.credentials = None;
    cfg.database.namespace = "server".to_owned();
    cfg.server.cors_origins = cors_origins.iter().map(|o| (*o).to_owned()).collect();
    Server::builder().config(cfg).build().await
}

#[tokio::test]
async fn serves_health_and_api_reference() {
    let server = server(&[]).await.unwrap();
    assert_eq!(server.state().slice_names().count(), 7);
    let app = server.router().unwrap();

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "up");

    let request = Request::builder().uri("/api").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn configured_origins_are_echoed() {
    let app = server(&["https://admin.prana.mx"]).await.unwrap().router().unwrap();

    let request = Request::builder()
        .uri("/api/products")
        .header(header::ORIGIN, "https://admin.prana.mx")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://admin.prana.mx");
}

#[tokio::test]
async fn missing_certificate_fails_the_build() {
    let mut cfg = ApiConfig::default();
    cfg.database.credentials = None;
    cfg.server.ssl = Some(whub::domain::config::SslConfig {
        cert: "does/not/exist/cert.pem".into(),
        key: "does/not/exist/key.pem".into(),
    });

    let err = Server::builder().config(cfg).build().await.unwrap_err();
    assert!(err.to_string().contains("SSL certificate not found"));
}
