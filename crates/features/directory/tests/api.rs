use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;
use whub_database::Database;
use whub_kernel::server::ApiState;

async fn app(namespace: &str) -> Router {
    let database = Database::builder()
        .url("mem://")
        .session(namespace, "test")
        .migrations(whub_directory::migrations())
        .init()
        .await
        .unwrap();
    let state = ApiState::builder()
        .db(database.clone())
        .register_slice(whub_directory::init(&database).unwrap())
        .build()
        .unwrap();

    let (router, _) = whub_directory::router().split_for_parts();
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

fn listing(name: &str, city: &str) -> Value {
    json!({
        "name": name,
        "description": "Plant-based kitchen",
        "address": "Calle 5 de Mayo 12",
        "city": city,
        "country": "Mexico",
        "whatsapp": "+52 951 555 0101",
        "categories": ["Vegan"],
        "price_range": "$$",
        "schedule": [{
            "days": ["mon", "tue", "wed", "thu", "fri"],
            "opens": "08:00",
            "closes": "16:00"
        }]
    })
}

async fn create(app: &Router, prefix: &str, name: &str, city: &str) -> String {
    let (status, body) = send(app, Method::POST, prefix, Some(listing(name, city))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn listings_stay_under_their_own_prefix() {
    let app = app("prefixes").await;
    let id = create(&app, "/api/restaurants", "Verde", "Oaxaca").await;

    let (status, body) = send(&app, Method::GET, &format!("/api/restaurants/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "restaurant");
    assert_eq!(body["badge"], json!({"label": "Active", "color": "green"}));
    assert_eq!(body["schedule"][0]["days"], json!(["mon", "tue", "wed", "thu", "fri"]));

    let (status, _) = send(&app, Method::GET, &format!("/api/shops/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) =
        send(&app, Method::DELETE, &format!("/api/holistic-centers/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, shops) = send(&app, Method::GET, "/api/shops", None).await;
    assert_eq!(shops["total"], 0);

    let (status, _) = send(&app, Method::GET, "/api/spas", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn validation_requires_contact_and_sane_hours() {
    let app = app("validation").await;

    let mut body = listing("Verde", "Oaxaca");
    body.as_object_mut().unwrap().remove("whatsapp");
    body["schedule"][0]["closes"] = json!("07:00");
    let (status, error) = send(&app, Method::POST, "/api/shops", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<_> = error["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].clone())
        .collect();
    assert!(fields.contains(&json!("contact")));
    assert!(fields.contains(&json!("schedule[0]")));
}

#[tokio::test]
async fn filters_activation_and_contact() {
    let app = app("filters").await;
    let prefix = "/api/holistic-centers";
    let verde = create(&app, prefix, "Verde", "Oaxaca").await;
    create(&app, prefix, "Azul", "Puebla").await;

    let inactive = json!({"is_active": false});
    let (status, body) =
        send(&app, Method::PATCH, &format!("{prefix}/{verde}/active"), Some(inactive)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["badge"]["color"], "gray");

    let (_, list) = send(&app, Method::GET, &format!("{prefix}?city=oaxaca"), None).await;
    assert_eq!(list["total"], 1);
    assert_eq!(list["items"][0]["name"], "Verde");
    assert_eq!(list["stats"]["total"], 2);
    assert_eq!(list["stats"]["inactive"], 1);

    let uri = format!("{prefix}?active=true&open_on=tue&open_at=09:30");
    let (_, list) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(list["total"], 1);
    assert_eq!(list["items"][0]["name"], "Azul");

    let (_, list) = send(&app, Method::GET, &format!("{prefix}?open_on=sun"), None).await;
    assert_eq!(list["total"], 0);

    let (status, _) = send(&app, Method::GET, &format!("{prefix}?open_on=caturday"), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, links) = send(&app, Method::GET, &format!("{prefix}/{verde}/contact"), None).await;
    assert_eq!(status, StatusCode::OK);
    let whatsapp = links["whatsapp"].as_str().unwrap();
    assert!(whatsapp.starts_with("https://wa.me/529515550101?text="));
    assert!(whatsapp.contains("Verde"));
}
