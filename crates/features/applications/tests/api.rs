use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;
use whub_database::Database;
use whub_event_bus::EventBus;
use whub_kernel::audit::AuditEvent;
use whub_kernel::server::ApiState;

async fn app(namespace: &str) -> (Router, EventBus) {
    let database = Database::builder()
        .url("mem://")
        .session(namespace, "test")
        .migrations(whub_applications::migrations())
        .init()
        .await
        .unwrap();
    let events = EventBus::new();
    let state = ApiState::builder()
        .db(database.clone())
        .events(events.clone())
        .register_slice(whub_applications::init(&database).unwrap())
        .build()
        .unwrap();

    let (router, _) = whub_applications::router().split_for_parts();
    (router.with_state(state), events)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri).header("x-actor", "admin@prana.mx");
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

fn submission(email: &str) -> Value {
    json!({
        "first_name": "Lucía",
        "last_name": "Ramos",
        "email": email,
        "phone": "+52 951 123 4567",
        "profession": "Yoga teacher",
        "specializations": ["Hatha", "Yin"],
        "experience_years": 6,
        "biography": "Certified teacher since 2018",
        "city": "Oaxaca",
        "country": "MX",
        "instagram": "@lucia.yoga"
    })
}

#[tokio::test]
async fn submit_then_review() {
    let (app, events) = app("submit_review").await;
    let mut audit = events.subscribe::<AuditEvent>().unwrap();

    let (status, created) =
        send(&app, Method::POST, "/api/applications", Some(submission("lucia@prana.mx"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");
    assert_eq!(created["badge"], json!({"label": "Pending", "color": "yellow"}));
    let id = created["id"].as_str().unwrap().to_owned();

    let submitted = audit.try_recv().unwrap();
    assert_eq!((submitted.action, submitted.entity), ("submitted", "application"));
    assert_eq!(submitted.actor.as_deref(), Some("admin@prana.mx"));

    let uri = format!("/api/applications/{id}/review");
    let (status, body) =
        send(&app, Method::POST, &uri, Some(json!({"decision": "rejected"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"][0]["field"], "notes");

    let (status, reviewed) =
        send(&app, Method::POST, &uri, Some(json!({"decision": "approved", "notes": "Welcome"})))
            .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviewed["status"], "approved");
    assert_eq!(reviewed["reviewed_by"], "admin@prana.mx");
    assert!(reviewed["reviewed_at"].is_string());

    let (status, body) =
        send(&app, Method::POST, &uri, Some(json!({"decision": "rejected", "notes": "no"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, fetched) = send(&app, Method::GET, &format!("/api/applications/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["badge"]["color"], "green");
}

#[tokio::test]
async fn duplicate_pending_email_is_a_conflict() {
    let (app, _) = app("duplicates").await;

    let (status, _) =
        send(&app, Method::POST, "/api/applications", Some(submission("ana@prana.mx"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) =
        send(&app, Method::POST, "/api/applications", Some(submission("ANA@prana.mx"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn simultaneous_submissions_store_one_pending_application() {
    let (app, _) = app("simultaneous").await;

    let attempts: Vec<_> = ["mara@prana.mx", "Mara@prana.mx", "MARA@prana.mx", "mara@Prana.mx"]
        .into_iter()
        .map(|email| {
            let app = app.clone();
            tokio::spawn(async move {
                send(&app, Method::POST, "/api/applications", Some(submission(email))).await.0
            })
        })
        .collect();
    let mut statuses = Vec::new();
    for attempt in attempts {
        statuses.push(attempt.await.unwrap());
    }

    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CREATED).count(), 1);
    let (_, list) = send(&app, Method::GET, "/api/applications", None).await;
    assert_eq!(list["total"], 1);
}

#[tokio::test]
async fn invalid_submissions_are_not_stored() {
    let (app, _) = app("invalid").await;

    let mut payload = submission("not-an-email");
    payload["experience_years"] = json!(-1);
    let (status, body) = send(&app, Method::POST, "/api/applications", Some(payload)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<_> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].clone())
        .collect();
    assert!(fields.contains(&json!("email")));
    assert!(fields.contains(&json!("experience_years")));

    let (_, list) = send(&app, Method::GET, "/api/applications", None).await;
    assert_eq!(list["total"], 0);
}

#[tokio::test]
async fn list_filters_pages_and_reports_stats() {
    let (app, _) = app("listing").await;
    for (i, city) in ["Oaxaca", "Tulum", "Tulum"].iter().enumerate() {
        let mut payload = submission(&format!("pro{i}@prana.mx"));
        payload["city"] = json!(city);
        send(&app, Method::POST, "/api/applications", Some(payload)).await;
    }

    let (status, list) =
        send(&app, Method::GET, "/api/applications?search=tulum&limit=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 2);
    assert_eq!(list["items"].as_array().unwrap().len(), 1);
    assert_eq!(list["limit"], 1);
    assert_eq!(list["stats"]["total"], 3);
    assert_eq!(list["stats"]["pending"], 3);
    assert_eq!(list["stats"]["submissions"]["current"], 3.0);
    assert_eq!(list["stats"]["submissions"]["trend"], "up");

    let (status, body) =
        send(&app, Method::GET, "/api/applications?from=2025-02-01&to=2025-01-01", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"][0]["field"], "from");

    let (status, _) = send(&app, Method::GET, "/api/applications?status=unknown", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_and_missing_ids() {
    let (app, _) = app("delete").await;
    let (_, created) =
        send(&app, Method::POST, "/api/applications", Some(submission("del@prana.mx"))).await;
    let uri = format!("/api/applications/{}", created["id"].as_str().unwrap());

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = send(&app, Method::GET, "/api/applications/product:abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
