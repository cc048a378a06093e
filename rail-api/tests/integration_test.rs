use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration as Days, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use rail_api::middleware::Claims;
use rail_api::{app, AppState, AuthConfig};
use rail_booking::{BookingPolicy, BookingService};
use rail_core::payment::SimulatedGateway;
use rail_core::repository::TrainCatalog;
use rail_store::seed::seed_demo_trains;
use rail_store::MemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const SECRET: &str = "test-secret";

async fn setup() -> (Router, i64) {
    let store = MemoryStore::new(Duration::from_secs(2));
    seed_demo_trains(&store).await.unwrap();
    let trains = store.list_trains().await.unwrap();
    let train_id = trains.iter().find(|t| t.train_no == "IR-001").unwrap().id;

    let bookings = BookingService::new(
        Arc::new(store),
        Arc::new(SimulatedGateway::approving()),
        BookingPolicy::default(),
    );
    let state = AppState {
        bookings: Arc::new(bookings),
        auth: AuthConfig {
            secret: SECRET.to_string(),
        },
    };
    (app(state), train_id)
}

fn token(sub: &str, role: &str) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        role: role.to_string(),
        exp: (Utc::now().timestamp() + 3600) as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn get(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(t) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, bearer: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", bearer))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (app, _) = setup().await;
    let (status, body) = send(&app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_booking_and_cancellation_flow() {
    let (app, train_id) = setup().await;
    let alice = token("alice", "USER");
    let travel_date = (Utc::now() + Days::days(10)).date_naive();
    let availability_uri = format!(
        "/v1/trains/{}/availability?date={}&class=AC",
        train_id, travel_date
    );

    let (status, body) = send(&app, get(&availability_uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["seats_left"].is_null());

    let (status, booking) = send(
        &app,
        post(
            "/v1/bookings",
            &alice,
            json!({
                "train_id": train_id,
                "travel_date": travel_date.to_string(),
                "class": "AC",
                "seat_count": 2,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["status"], "CONFIRMED");
    assert_eq!(booking["payment_status"], "PAID");
    assert_eq!(booking["total_fare"], "5000.00");
    let pnr = booking["pnr"].as_str().unwrap().to_string();
    assert_eq!(pnr.len(), 10);

    let (_, body) = send(&app, get(&availability_uri, None)).await;
    assert_eq!(body["seats_left"], 98);

    let (status, fetched) = send(&app, get(&format!("/v1/bookings/{}", pnr), Some(&alice))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["seat_count"], 2);

    let cancel_uri = format!("/v1/bookings/{}/cancel", pnr);
    let (status, cancelled) = send(&app, post(&cancel_uri, &alice, json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "CANCELLED");
    assert_eq!(cancelled["refund_amount"], "4500.00");
    assert_eq!(cancelled["refund_percentage"], 90);
    assert_eq!(cancelled["days_before"], 10);

    let (_, body) = send(&app, get(&availability_uri, None)).await;
    assert_eq!(body["seats_left"], 100);

    let (status, body) = send(&app, post(&cancel_uri, &alice, json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains(&pnr));
}

#[tokio::test]
async fn test_auth_is_enforced() {
    let (app, train_id) = setup().await;
    let travel_date = (Utc::now() + Days::days(3)).date_naive();
    let request = json!({
        "train_id": train_id,
        "travel_date": travel_date.to_string(),
        "class": "Sleeper",
        "seat_count": 1,
    });

    let (status, body) = send(&app, get("/v1/bookings/ABCDE12345", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, post("/v1/bookings", "not-a-jwt", request.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, booking) = send(&app, post("/v1/bookings", &token("alice", "USER"), request)).await;
    let uri = format!("/v1/bookings/{}", booking["pnr"].as_str().unwrap());

    let (status, _) = send(&app, get(&uri, Some(&token("mallory", "USER")))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, get(&uri, Some(&token("ops", "ADMIN")))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["class"], "Sleeper");

    let lookup = get("/v1/bookings/ZZZZZ99999", Some(&token("alice", "USER")));
    let (status, _) = send(&app, lookup).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_booking_errors() {
    let (app, train_id) = setup().await;
    let alice = token("alice", "USER");
    let travel_date = (Utc::now() + Days::days(7)).date_naive().to_string();

    let (status, body) = send(
        &app,
        post(
            "/v1/bookings",
            &alice,
            json!({
                "train_id": train_id,
                "travel_date": travel_date,
                "class": "AC",
                "seat_count": 101
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Insufficient"));

    let (status, _) = send(
        &app,
        post(
            "/v1/bookings",
            &alice,
            json!({ "train_id": 9999, "travel_date": travel_date, "class": "AC", "seat_count": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, post("/v1/bookings", &alice, json!({ "class": "AC" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_availability_requires_params() {
    let (app, train_id) = setup().await;

    let uri = format!("/v1/trains/{}/availability?class=AC", train_id);
    let (status, body) = send(&app, get(&uri, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "date is required");

    let (status, _) = send(
        &app,
        get(&format!("/v1/trains/{}/availability?date=2026-12-01", train_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        get(&format!("/v1/trains/{}/availability?date=tomorrow&class=AC", train_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_daily_report_for_admins() {
    let (app, train_id) = setup().await;
    let alice = token("alice", "USER");
    let travel_date = (Utc::now() + Days::days(20)).date_naive().to_string();

    for seats in [1, 3] {
        let (status, _) = send(
            &app,
            post(
                "/v1/bookings",
                &alice,
                json!({
                    "train_id": train_id,
                    "travel_date": travel_date,
                    "class": "General",
                    "seat_count": seats
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = send(&app, get("/v1/admin/reports/daily", Some(&alice))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = token("ops", "ADMIN");
    let (status, report) = send(&app, get("/v1/admin/reports/daily", Some(&admin))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report[0]["date"], Utc::now().date_naive().to_string());
    assert_eq!(report[0]["bookings"], 2);
    assert_eq!(report[0]["revenue"], "2000.00");
}
