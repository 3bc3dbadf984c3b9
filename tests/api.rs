use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use cinema_booking::{
    clock::FixedClock,
    config::BookingConfig,
    models::{
        Auditorium, Booking, BookingStatus, Seat, SeatPrice, Show, ShowCatalogEntry, User,
    },
    router,
    store::{MemoryStore, ShowCatalog, StoreError},
    AppState,
};

const EMAIL: &str = "ann@example.com";
const PASSWORD: &str = "popcorn";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap()
}

fn show_ten() -> ShowCatalogEntry {
    let seat = |id: i64, row: &str, number: i32, seat_type: &str| Seat {
        id,
        row: row.to_string(),
        number,
        seat_type: seat_type.to_string(),
        row_offset: 0,
        column_offset: number - 1,
    };
    ShowCatalogEntry {
        show: Show {
            id: 10,
            movie_id: 3,
            auditorium_id: 7,
            start_at: now() + Duration::hours(2),
        },
        auditorium: Auditorium {
            id: 7,
            name: "Hall 1".to_string(),
            cinema_id: 1,
        },
        seats: vec![
            seat(1, "A", 1, "STANDARD"),
            seat(2, "A", 2, "STANDARD"),
            seat(3, "B", 1, "VIP"),
        ],
        prices: vec![
            SeatPrice {
                seat_type: "STANDARD".to_string(),
                price_cents: 1000,
            },
            SeatPrice {
                seat_type: "VIP".to_string(),
                price_cents: 2500,
            },
        ],
    }
}

fn booking(id: i64, status: BookingStatus, expires_at: Option<DateTime<Utc>>, seat: i64) -> Booking {
    Booking {
        id,
        show_id: 10,
        user_id: 99,
        status,
        created_at: now() - Duration::minutes(30),
        reserved_at: None,
        expires_at,
        total_price_cents: 1000,
        payment_reference: None,
        seat_ids: vec![seat],
    }
}

async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.insert_show(show_ten()).await;
    store
        .insert_user(User {
            id: 1,
            email: EMAIL.to_string(),
            password_hash: bcrypt::hash(PASSWORD, 4).unwrap(),
            name: "Ann".to_string(),
            is_active: true,
        })
        .await;
    store
}

fn app(store: Arc<MemoryStore>) -> Router {
    app_with_catalog(store.clone(), store)
}

fn app_with_catalog(catalog: Arc<dyn ShowCatalog>, store: Arc<MemoryStore>) -> Router {
    let state = AppState::new(
        catalog,
        store.clone(),
        store,
        Arc::new(FixedClock::new(now())),
        &BookingConfig::default(),
    );
    router(state)
}

fn basic_auth(email: &str, password: &str) -> String {
    format!(
        "Basic {}",
        general_purpose::STANDARD.encode(format!("{email}:{password}"))
    )
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, basic_auth(EMAIL, PASSWORD))
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn seat_status(body: &Value, seat_id: i64) -> (String, Value) {
    let seat = body["data"]["auditorium"]["seats"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["id"] == seat_id)
        .unwrap();
    (seat["bookStatus"].as_str().unwrap().to_string(), seat["priceCents"].clone())
}

#[tokio::test]
async fn seat_map_reflects_active_claims() {
    let store = seeded_store().await;
    store.insert_booking(booking(1, BookingStatus::Booked, None, 1)).await;
    store
        .insert_booking(booking(2, BookingStatus::Initiated, Some(now() + Duration::minutes(5)), 2))
        .await;
    store
        .insert_booking(booking(3, BookingStatus::Initiated, Some(now() - Duration::minutes(5)), 3))
        .await;

    let (status, body) = send(&app(store), get("/api/shows/10")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], 10);
    assert_eq!(body["data"]["movieId"], 3);
    assert_eq!(body["data"]["auditoriumId"], 7);
    assert_eq!(body["data"]["auditorium"]["cinemaId"], 1);
    assert_eq!(
        body["data"]["seatPrices"],
        json!([
            { "seatType": "STANDARD", "priceCents": 1000 },
            { "seatType": "VIP", "priceCents": 2500 }
        ])
    );
    assert_eq!(seat_status(&body, 1), ("BOOKED".to_string(), json!(1000)));
    assert_eq!(seat_status(&body, 2), ("HELD".to_string(), json!(1000)));
    assert_eq!(seat_status(&body, 3), ("AVAILABLE".to_string(), json!(2500)));
}

#[tokio::test]
async fn cancelled_booking_leaves_seat_available() {
    let store = seeded_store().await;
    store.insert_booking(booking(1, BookingStatus::Cancelled, None, 1)).await;

    let (_, body) = send(&app(store), get("/api/shows/10")).await;

    assert_eq!(seat_status(&body, 1), ("AVAILABLE".to_string(), json!(1000)));
}

#[tokio::test]
async fn unknown_show_is_404() {
    let (status, body) = send(&app(seeded_store().await), get("/api/shows/11")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "show 11 not found" }));
}

struct BrokenCatalog;

#[async_trait]
impl ShowCatalog for BrokenCatalog {
    async fn load_show(&self, _show_id: i64) -> Result<Option<ShowCatalogEntry>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }
}

#[tokio::test]
async fn storage_failure_is_opaque_500() {
    let app = app_with_catalog(Arc::new(BrokenCatalog), seeded_store().await);

    let (status, body) = send(&app, get("/api/shows/10")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "internal server error" }));
}

#[tokio::test]
async fn booking_requires_credentials() {
    let app = app(seeded_store().await);

    let request = Request::builder()
        .method("POST")
        .uri("/api/bookings")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "showId": 10, "seatIds": [1] }).to_string()))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut request = post_json("/api/bookings", json!({ "showId": 10, "seatIds": [1] }));
    request.headers_mut().insert(
        header::AUTHORIZATION,
        basic_auth(EMAIL, "wrong").parse().unwrap(),
    );
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn hold_then_confirm_flow() {
    let app = app(seeded_store().await);

    let (status, body) = send(
        &app,
        post_json("/api/bookings", json!({ "showId": 10, "seatIds": [2, 3] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "INITIATED");
    assert_eq!(body["data"]["totalPriceCents"], 3500);
    let booking_id = body["data"]["id"].as_i64().unwrap();

    let (_, seats) = send(&app, get("/api/shows/10")).await;
    assert_eq!(seat_status(&seats, 2).0, "HELD");
    assert_eq!(seat_status(&seats, 3).0, "HELD");

    let (status, _) = send(
        &app,
        post_json("/api/bookings", json!({ "showId": 10, "seatIds": [3] })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        post_json(
            &format!("/api/bookings/{booking_id}/confirm"),
            json!({ "paymentReference": "pay-42" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "BOOKED");
    assert_eq!(body["data"]["paymentReference"], "pay-42");

    let (_, seats) = send(&app, get("/api/shows/10")).await;
    assert_eq!(seat_status(&seats, 2).0, "BOOKED");

    let mut list = get("/api/bookings");
    list.headers_mut().insert(
        header::AUTHORIZATION,
        basic_auth(EMAIL, PASSWORD).parse().unwrap(),
    );
    let (status, body) = send(&app, list).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["seatIds"], json!([2, 3]));
}

#[tokio::test]
async fn cancel_releases_hold() {
    let app = app(seeded_store().await);
    let (_, body) = send(
        &app,
        post_json("/api/bookings", json!({ "showId": 10, "seatIds": [1] })),
    )
    .await;
    let booking_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        post_json(&format!("/api/bookings/{booking_id}/cancel"), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "CANCELLED");

    let (_, seats) = send(&app, get("/api/shows/10")).await;
    assert_eq!(seat_status(&seats, 1).0, "AVAILABLE");
}

#[tokio::test]
async fn malformed_booking_requests_are_rejected() {
    let app = app(seeded_store().await);

    let (status, _) = send(
        &app,
        post_json("/api/bookings", json!({ "showId": 10, "seatIds": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        post_json("/api/bookings", json!({ "showId": 10, "seatIds": [77] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post_json("/api/bookings", json!({ "showId": 12, "seatIds": [1] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn seat_limit_counts_distinct_seats() {
    let app = app(seeded_store().await);

    let repeated = vec![1_i64; 11];
    let (status, body) = send(
        &app,
        post_json("/api/bookings", json!({ "showId": 10, "seatIds": repeated })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["seatIds"], json!([1]));

    let too_many: Vec<i64> = (1..=11).collect();
    let (status, body) = send(
        &app,
        post_json("/api/bookings", json!({ "showId": 10, "seatIds": too_many })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "at most 10 seats per booking");
}

#[tokio::test]
async fn health_check() {
    let app = app(seeded_store().await);
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}
