use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use tower::ServiceExt;
use whub_database::Database;
use whub_kernel::server::ApiState;

async fn app(namespace: &str) -> Router {
    let database = Database::builder()
        .url("mem://")
        .session(namespace, "test")
        .migrations(whub_appointments::migrations())
        .init()
        .await
        .unwrap();
    let state = ApiState::builder()
        .db(database.clone())
        .register_slice(whub_appointments::init(&database).unwrap())
        .build()
        .unwrap();

    let (router, _) = whub_appointments::router().split_for_parts();
    router.with_state(state)
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

fn in_days(days: i64) -> String {
    (Utc::now().date_naive() + Duration::days(days)).format("%Y-%m-%d").to_string()
}

fn booking(date: &str, time: &str) -> Value {
    json!({
        "professional_id": "PRO1",
        "patient_id": "PAT1",
        "patient_name": "Lucía Ramos",
        "service_name": "Acupuncture",
        "date": date,
        "time": time,
        "duration_minutes": 60,
        "mode": "online",
        "meeting_url": "https://meet.example.com/lucia",
        "price": 650.0
    })
}

async fn book(app: &Router, date: &str, time: &str) -> Value {
    let (status, body) =
        send(app, Method::POST, "/api/appointments", Some(booking(date, time))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn booking_rejects_overlaps_and_past_slots() {
    let app = app("booking").await;
    let day = in_days(3);

    let first = book(&app, &day, "10:00").await;
    assert_eq!(first["status"], "pending");
    assert_eq!(first["payment_status"], "pending");
    assert_eq!(first["badge"], json!({"label": "Pending", "color": "yellow"}));

    let (status, _) =
        send(&app, Method::POST, "/api/appointments", Some(booking(&day, "10:30"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    book(&app, &day, "11:00").await;

    let past = booking(&in_days(-1), "10:00");
    let (status, body) = send(&app, Method::POST, "/api/appointments", Some(past)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"][0]["field"], "date");

    let mut no_link = booking(&day, "15:00");
    no_link.as_object_mut().unwrap().remove("meeting_url");
    let (status, body) = send(&app, Method::POST, "/api/appointments", Some(no_link)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"][0]["field"], "meeting_url");
}

#[tokio::test]
async fn status_machine_and_slot_release() {
    let app = app("status").await;
    let day = in_days(2);
    let first = book(&app, &day, "09:00").await;
    let uri = format!("/api/appointments/{}", first["id"].as_str().unwrap());

    let completed = json!({"status": "completed"});
    let (status, _) = send(&app, Method::PATCH, &format!("{uri}/status"), Some(completed)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("{uri}/status"),
        Some(json!({"status": "cancelled", "reason": "Travelling"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cancellation_reason"], "Travelling");
    assert_eq!(body["badge"]["color"], "red");

    // The cancelled appointment no longer blocks its slot.
    book(&app, &day, "09:30").await;

    let moved = json!({"date": in_days(5), "time": "09:00"});
    let (status, _) = send(&app, Method::PATCH, &format!("{uri}/schedule"), Some(moved)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn reschedule_payment_and_stats() {
    let app = app("reschedule").await;
    let day = in_days(4);
    let first = book(&app, &day, "09:00").await;
    book(&app, &day, "12:00").await;
    let uri = format!("/api/appointments/{}", first["id"].as_str().unwrap());

    let schedule = format!("{uri}/schedule");
    let (status, _) =
        send(&app, Method::PATCH, &schedule, Some(json!({"date": day, "time": "12:30"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) =
        send(&app, Method::PATCH, &schedule, Some(json!({"date": day, "time": "14:00"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["time"], "14:00");

    let paid = json!({"payment_status": "paid"});
    let (status, body) = send(&app, Method::PATCH, &format!("{uri}/payment"), Some(paid)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payment_status"], "paid");

    let (status, list) =
        send(&app, Method::GET, "/api/appointments?professional_id=PRO1&sort=date", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 2);
    assert_eq!(list["items"][0]["time"], "12:00");
    assert_eq!(list["stats"]["upcoming"], 2);
    assert_eq!(list["stats"]["revenue"], 0.0);

    let (status, _) =
        send(&app, Method::GET, "/api/appointments?from=2025-02-01&to=2025-01-01", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn simultaneous_bookings_hold_the_slot_once() {
    let app = app("simultaneous").await;
    let day = in_days(6);

    let attempts: Vec<_> = ["16:00", "16:15", "16:30", "16:45"]
        .into_iter()
        .map(|time| {
            let app = app.clone();
            let body = booking(&day, time);
            tokio::spawn(async move {
                send(&app, Method::POST, "/api/appointments", Some(body)).await.0
            })
        })
        .collect();
    let mut created = 0;
    for attempt in attempts {
        if attempt.await.unwrap() == StatusCode::CREATED {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    let uri = format!("/api/appointments?professional_id=PRO1&from={day}&to={day}");
    let (_, list) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(list["total"], 1);
}
