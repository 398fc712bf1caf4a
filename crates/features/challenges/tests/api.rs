use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;
use whub_database::Database;
use whub_challenges::ResourceRepository;
use whub_kernel::server::ApiState;

async fn app(namespace: &str) -> Router {
    app_with_database(namespace).await.0
}

async fn app_with_database(namespace: &str) -> (Router, Database) {
    let database = Database::builder()
        .url("mem://")
        .session(namespace, "test")
        .migrations(whub_challenges::migrations())
        .init()
        .await
        .unwrap();
    let state = ApiState::builder()
        .db(database.clone())
        .register_slice(whub_challenges::init(&database).unwrap())
        .build()
        .unwrap();

    let (router, _) = whub_challenges::router().split_for_parts();
    (router.with_state(state), database)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value =
        if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

fn challenge(title: &str) -> Value {
    json!({
        "title": title,
        "description": "One guided session per day",
        "category": "Meditation",
        "difficulty": "beginner",
        "duration_days": 21,
        "price": 299.0,
        "created_by": "professional",
        "professional_id": "PRO123"
    })
}

async fn create(app: &Router, title: &str) -> String {
    let (status, body) = send(app, Method::POST, "/api/challenges", Some(challenge(title))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn create_defaults_and_ownership() {
    let app = app("create").await;

    let (status, body) = send(&app, Method::POST, "/api/challenges", Some(challenge("Calm"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "draft");
    assert_eq!(body["currency"], "MXN");
    assert_eq!(body["phase"], "unscheduled");
    assert_eq!(body["badge"], json!({"label": "Draft", "color": "gray"}));

    let mut orphan = challenge("Orphan");
    orphan["professional_id"] = Value::Null;
    let (status, body) = send(&app, Method::POST, "/api/challenges", Some(orphan)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"][0]["field"], "professional_id");
}

#[tokio::test]
async fn update_keeps_ownership_and_status_changes() {
    let app = app("update").await;
    let id = create(&app, "Calm").await;
    let uri = format!("/api/challenges/{id}");

    let mut fields = challenge("Deep calm");
    for key in ["created_by", "professional_id"] {
        fields.as_object_mut().unwrap().remove(key);
    }
    fields["start_date"] = json!("2020-01-01");
    let (status, body) = send(&app, Method::PUT, &uri, Some(fields)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Deep calm");
    assert_eq!(body["professional_id"], "PRO123");
    assert_eq!(body["phase"], "finished");

    let published = json!({"status": "published"});
    let (status, body) =
        send(&app, Method::PATCH, &format!("{uri}/status"), Some(published)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["badge"]["color"], "green");

    let (_, list) = send(&app, Method::GET, "/api/challenges?status=published", None).await;
    assert_eq!(list["total"], 1);
    assert_eq!(list["stats"]["published"], 1);
    assert_eq!(list["stats"]["draft"], 0);
}

#[tokio::test]
async fn resources_are_scoped_to_their_challenge() {
    let app = app("resources").await;
    let first = create(&app, "First").await;
    let second = create(&app, "Second").await;
    let resources = format!("/api/challenges/{first}/resources");

    let pdf = json!({
        "title": "Workbook",
        "resource_type": "pdf",
        "url": "https://cdn.prana.mx/w.pdf",
        "file_size_bytes": 1024
    });
    let (status, a) = send(&app, Method::POST, &resources, Some(pdf.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(a["position"], 1);
    let (_, b) = send(&app, Method::POST, &resources, Some(pdf.clone())).await;
    assert_eq!(b["position"], 2);

    let (status, list) = send(&app, Method::GET, &resources, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 2);
    assert_eq!(list[0]["id"], a["id"]);

    let foreign = format!("/api/challenges/{second}/resources/{}", a["id"].as_str().unwrap());
    let (status, _) = send(&app, Method::DELETE, &foreign, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let mut huge = pdf.clone();
    huge["file_size_bytes"] = json!(60 * 1024 * 1024);
    let (status, body) = send(&app, Method::POST, &resources, Some(huge)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"][0]["field"], "file_size_bytes");

    let (status, _) =
        send(&app, Method::POST, "/api/challenges/Zzzzzzzzzzzz/resources", Some(pdf)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/challenges/{first}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &resources, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_challenge_removes_its_resources_first() {
    let (app, database) = app_with_database("cascade").await;
    let kept = create(&app, "Kept").await;
    let dropped = create(&app, "Dropped").await;
    let pdf =
        json!({"title": "Workbook", "resource_type": "pdf", "url": "https://cdn.prana.mx/w.pdf"});
    for id in [&kept, &dropped] {
        let uri = format!("/api/challenges/{id}/resources");
        let (status, _) = send(&app, Method::POST, &uri, Some(pdf.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = send(&app, Method::DELETE, "/api/challenges/Zzzzzzzzzzzz", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::DELETE, &format!("/api/challenges/{dropped}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let resources = ResourceRepository::new(database);
    assert!(resources.for_challenge(&dropped).await.unwrap().is_empty());
    assert_eq!(resources.for_challenge(&kept).await.unwrap().len(), 1);
}
