use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{Duration, NaiveDate, Utc};
use serde_json::{json, Value};
use wayfare_api::{app, AppState};
use wayfare_assistant::RuleBasedAssistant;
use wayfare_core::search::{FlightSearchQuery, HotelOffersQuery, InspirationQuery, LocationQuery};
use wayfare_core::supplier::TravelSupplier;
use wayfare_core::{CoreError, CoreResult};

// ============================================================================
// Fake supplier
// ============================================================================

#[derive(Default)]
struct FakeSupplier {
    fail_with: Option<String>,
    flight_calls: AtomicUsize,
    listing_calls: AtomicUsize,
    offer_calls: AtomicUsize,
    location_calls: AtomicUsize,
    offered_ids: Mutex<Vec<String>>,
}

impl FakeSupplier {
    fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Default::default()
        }
    }

    fn check(&self) -> CoreResult<()> {
        match &self.fail_with {
            Some(message) => Err(CoreError::UpstreamError(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TravelSupplier for FakeSupplier {
    fn name(&self) -> &str {
        "fake"
    }

    async fn search_flights(&self, query: &FlightSearchQuery) -> CoreResult<Value> {
        self.flight_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(json!({ "data": [{ "id": "1", "origin": query.origin, "destination": query.destination }] }))
    }

    async fn hotels_by_city(&self, city_code: &str, _radius: Option<u32>) -> CoreResult<Value> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(json!({ "data": [
            { "hotelId": format!("HL{}001", city_code) },
            { "hotelId": "HL-BROKEN" },
            { "hotelId": format!("HL{}002", city_code) },
            { "hotelId": format!("HL{}003", city_code) },
        ] }))
    }

    async fn hotel_offers(&self, query: &HotelOffersQuery) -> CoreResult<Value> {
        self.offer_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        *self.offered_ids.lock().unwrap() = query.hotel_ids.clone();
        let data: Vec<Value> = query
            .hotel_ids
            .iter()
            .map(|id| json!({ "hotel": { "hotelId": id }, "offers": [{ "price": { "total": "120.00" } }] }))
            .collect();
        Ok(json!({ "data": data }))
    }

    async fn search_locations(&self, query: &LocationQuery) -> CoreResult<Value> {
        self.location_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(json!({ "data": [{ "iataCode": "PAR", "name": query.keyword }] }))
    }

    async fn flight_inspiration(&self, query: &InspirationQuery) -> CoreResult<Value> {
        self.check()?;
        Ok(json!({ "data": [{ "origin": query.origin, "destination": "LIS" }] }))
    }
}

fn server_with(supplier: Arc<FakeSupplier>) -> TestServer {
    let state = AppState::in_memory(supplier, Arc::new(RuleBasedAssistant::new())).unwrap();
    TestServer::new(app(state)).unwrap()
}

fn date_in(days: i64) -> NaiveDate {
    Utc::now().date_naive() + Duration::days(days)
}

fn hotel_search_url(city: &str) -> String {
    format!(
        "/api/hotels/search?cityCode={}&checkInDate={}&checkOutDate={}&adults=2&max=2",
        city,
        date_in(30),
        date_in(33)
    )
}

async fn register(server: &TestServer, email: &str) -> String {
    let response = server
        .post("/api/auth/register")
        .json(&json!({ "email": email, "password": "correct horse", "name": "Tester" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["token"].as_str().unwrap().to_string()
}

// ============================================================================
// Health & metrics
// ============================================================================

#[tokio::test]
async fn test_health_reports_backends() {
    let server = server_with(Arc::new(FakeSupplier::default()));

    let response = server.get("/api/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "ok", "cache": "memory", "assistant": "rules" }));
}

#[tokio::test]
async fn test_metrics_count_cache_lookups() {
    let server = server_with(Arc::new(FakeSupplier::default()));
    server.get(&hotel_search_url("PAR")).await.assert_status_ok();
    server.get(&hotel_search_url("PAR")).await.assert_status_ok();

    let text = server.get("/metrics").await.text();
    assert!(
        text.contains(r#"wayfare_cache_lookups_total{outcome="hit",prefix="hotelOffers"} 1"#),
        "{}",
        text
    );
    assert!(text.contains(r#"wayfare_upstream_requests_total{operation="hotel_offers",outcome="ok"} 1"#));
}

// ============================================================================
// Search proxy
// ============================================================================

#[tokio::test]
async fn test_repeated_hotel_search_hits_supplier_once() {
    let supplier = Arc::new(FakeSupplier::default());
    let server = server_with(supplier.clone());

    let first = server.get(&hotel_search_url("PAR")).await;
    first.assert_status_ok();
    assert_eq!(first.header("x-cache"), "MISS");

    let second = server.get(&hotel_search_url("PAR")).await;
    second.assert_status_ok();
    assert_eq!(second.header("x-cache"), "HIT");
    assert_eq!(first.json::<Value>(), second.json::<Value>());

    assert_eq!(supplier.listing_calls.load(Ordering::SeqCst), 1);
    assert_eq!(supplier.offer_calls.load(Ordering::SeqCst), 1);
    // `max=2` keeps the first two well-formed listed hotels
    assert_eq!(*supplier.offered_ids.lock().unwrap(), vec!["HLPAR001", "HLPAR002"]);
}

#[tokio::test]
async fn test_city_listing_shared_between_searches() {
    let supplier = Arc::new(FakeSupplier::default());
    let server = server_with(supplier.clone());

    server.get(&hotel_search_url("PAR")).await.assert_status_ok();
    let other_dates = format!(
        "/api/hotels/search?cityCode=par&checkInDate={}&checkOutDate={}",
        date_in(60),
        date_in(62)
    );
    server.get(&other_dates).await.assert_status_ok();

    assert_eq!(supplier.listing_calls.load(Ordering::SeqCst), 1);
    assert_eq!(supplier.offer_calls.load(Ordering::SeqCst), 2);

    let by_city = server.get("/api/hotels/by-city?cityCode=PAR").await;
    by_city.assert_status_ok();
    assert_eq!(by_city.header("x-cache"), "HIT");
}

#[tokio::test]
async fn test_hotel_offers_key_ignores_id_order() {
    let supplier = Arc::new(FakeSupplier::default());
    let server = server_with(supplier.clone());
    let url = |ids: &str| {
        format!(
            "/api/hotels/offers?hotelIds={}&checkInDate={}&checkOutDate={}",
            ids,
            date_in(2),
            date_in(4)
        )
    };

    server.get(&url("HLPAR002,HLPAR001")).await.assert_status_ok();
    let again = server.get(&url("hlpar001,%20HLPAR002")).await;
    again.assert_status_ok();
    assert_eq!(again.header("x-cache"), "HIT");
    assert_eq!(supplier.offer_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_invalid_search_is_rejected_before_upstream() {
    let supplier = Arc::new(FakeSupplier::default());
    let server = server_with(supplier.clone());

    let response = server.get(&hotel_search_url("PARIS")).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].as_str().unwrap().contains("cityCode"));

    let missing = server.get("/api/flights/search?origin=PAR").await;
    missing.assert_status(StatusCode::BAD_REQUEST);
    assert!(missing.json::<Value>()["error"].is_string());

    let short = server.get("/api/destinations/airports?keyword=P").await;
    short.assert_status(StatusCode::BAD_REQUEST);

    assert_eq!(supplier.listing_calls.load(Ordering::SeqCst), 0);
    assert_eq!(supplier.flight_calls.load(Ordering::SeqCst), 0);
    assert_eq!(supplier.location_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_upstream_error_surfaces_and_is_not_cached() {
    let supplier = Arc::new(FakeSupplier::failing("Amadeus returned 400: departureDate is too far"));
    let server = server_with(supplier.clone());
    let url = format!(
        "/api/flights/search?origin=PAR&destination=NYC&departureDate={}",
        date_in(10)
    );

    for _ in 0..2 {
        let response = server.get(&url).await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        response.assert_json(&json!({ "error": "Amadeus returned 400: departureDate is too far" }));
    }
    assert_eq!(supplier.flight_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failed_listing_counts_one_upstream_error() {
    let supplier = Arc::new(FakeSupplier::failing("Amadeus returned 500: listing down"));
    let server = server_with(supplier.clone());

    server
        .get(&hotel_search_url("PAR"))
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(supplier.offer_calls.load(Ordering::SeqCst), 0);

    let text = server.get("/metrics").await.text();
    assert!(
        text.contains(r#"wayfare_upstream_requests_total{operation="hotel_list",outcome="error"} 1"#),
        "{}",
        text
    );
    assert!(!text.contains(r#"operation="hotel_offers""#), "{}", text);
}

#[tokio::test]
async fn test_circuit_opens_after_repeated_upstream_failures() {
    let supplier = Arc::new(FakeSupplier::failing("Amadeus returned 503: unavailable"));
    let server = server_with(supplier.clone());
    let url = "/api/destinations/inspiration?origin=MAD";

    for _ in 0..5 {
        server.get(url).await.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let response = server.get(url).await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert!(response.json::<Value>()["error"].as_str().unwrap().contains("OPEN"));

    // Other upstreams keep working
    server.get("/api/health").await.assert_status_ok();
    server
        .post("/api/ai/chat")
        .json(&json!({ "messages": [{ "role": "user", "content": "hello" }] }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_locations_default_sub_types() {
    let supplier = Arc::new(FakeSupplier::default());
    let server = server_with(supplier.clone());

    let response = server.get("/api/destinations/locations?keyword=par").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"][0]["name"], "PAR");

    let same = server.get("/api/destinations/locations?keyword=PAR&subType=city,airport").await;
    assert_eq!(same.header("x-cache"), "HIT");
    assert_eq!(supplier.location_calls.load(Ordering::SeqCst), 1);

    server
        .get("/api/destinations/locations?keyword=PAR&subType=SEAPORT")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

// ============================================================================
// Assistant
// ============================================================================

#[tokio::test]
async fn test_chat_requires_user_message() {
    let server = server_with(Arc::new(FakeSupplier::default()));

    server
        .post("/api/ai/chat")
        .json(&json!({ "messages": [] }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/api/ai/chat")
        .json(&json!({
            "messages": [{ "role": "user", "content": "When is the best time to visit?" }],
            "trip": { "destination": "LIS" }
        }))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["provider"], "rules");
    assert!(body["reply"].as_str().unwrap().contains("Lisbon"));
}

#[tokio::test]
async fn test_recommendations_are_cached() {
    let server = server_with(Arc::new(FakeSupplier::default()));
    let request = json!({ "interests": ["Skiing", "hiking"], "budget": 2000 });

    let first = server.post("/api/ai/recommendations").json(&request).await;
    first.assert_status_ok();
    assert_eq!(first.header("x-cache"), "MISS");
    let body = first.json::<Value>();
    assert_eq!(body["provider"], "rules");
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 5);

    let reordered = json!({ "budget": 2000, "interests": ["hiking", "skiing"] });
    let second = server.post("/api/ai/recommendations").json(&reordered).await;
    assert_eq!(second.header("x-cache"), "HIT");

    server
        .post("/api/ai/recommendations")
        .json(&json!({ "month": 13 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_register_login_and_me() {
    let server = server_with(Arc::new(FakeSupplier::default()));
    let token = register(&server, "Ada@Example.com").await;

    let me = server.get("/api/auth/me").authorization_bearer(&token).await;
    me.assert_status_ok();
    assert_eq!(me.json::<Value>()["user"]["email"], "ada@example.com");

    let duplicate = server
        .post("/api/auth/register")
        .json(&json!({ "email": "ada@example.com", "password": "another one" }))
        .await;
    duplicate.assert_status(StatusCode::CONFLICT);

    let wrong = server
        .post("/api/auth/login")
        .json(&json!({ "email": "ada@example.com", "password": "wrong password" }))
        .await;
    wrong.assert_status(StatusCode::UNAUTHORIZED);
    wrong.assert_json(&json!({ "error": "Invalid email or password" }));

    let login = server
        .post("/api/auth/login")
        .json(&json!({ "email": "ADA@example.com", "password": "correct horse" }))
        .await;
    login.assert_status_ok();
    assert_eq!(login.json::<Value>()["user"]["name"], "Tester");
}

#[tokio::test]
async fn test_weak_password_rejected() {
    let server = server_with(Arc::new(FakeSupplier::default()));
    server
        .post("/api/auth/register")
        .json(&json!({ "email": "bob@example.com", "password": "short" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_guest_token() {
    let server = server_with(Arc::new(FakeSupplier::default()));

    let guest = server.post("/api/auth/guest").await;
    guest.assert_status_ok();
    let token = guest.json::<Value>()["token"].as_str().unwrap().to_string();

    server
        .get("/api/auth/me")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    // Guests can still plan trips
    server
        .post("/api/trips")
        .authorization_bearer(&token)
        .json(&json!({ "destination": "lis" }))
        .await
        .assert_status(StatusCode::CREATED);
}

// ============================================================================
// Trips
// ============================================================================

#[tokio::test]
async fn test_trips_require_token() {
    let server = server_with(Arc::new(FakeSupplier::default()));

    let response = server.get("/api/trips").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert!(response.json::<Value>()["error"].is_string());

    server
        .get("/api/trips")
        .authorization_bearer("not-a-jwt")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_trip_crud_is_isolated_per_user() {
    let server = server_with(Arc::new(FakeSupplier::default()));
    let alice = register(&server, "alice@example.com").await;
    let bob = register(&server, "bob@example.com").await;

    // 1. Alice creates a trip
    let created = server
        .post("/api/trips")
        .authorization_bearer(&alice)
        .json(&json!({
            "origin": "par",
            "destination": "lis",
            "startDate": date_in(20),
            "endDate": date_in(25),
            "budget": 1500,
            "interests": ["Food", "food", "beach"]
        }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let trip = created.json::<Value>();
    let id = trip["id"].as_str().unwrap().to_string();
    assert_eq!(trip["name"], "Trip to LIS");
    assert_eq!(trip["origin"], "PAR");
    assert_eq!(trip["interests"], json!(["food", "beach"]));

    // 2. Bob cannot see, change or delete it
    let path = format!("/api/trips/{}", id);
    server.get(&path).authorization_bearer(&bob).await.assert_status(StatusCode::NOT_FOUND);
    server
        .put(&path)
        .authorization_bearer(&bob)
        .json(&json!({ "name": "Mine now" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server.delete(&path).authorization_bearer(&bob).await.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(server.get("/api/trips").authorization_bearer(&bob).await.json::<Value>(), json!([]));

    // 3. Alice updates it
    let updated = server
        .put(&path)
        .authorization_bearer(&alice)
        .json(&json!({ "name": "Lisbon long weekend", "destination": "LIS", "adults": 2 }))
        .await;
    updated.assert_status_ok();
    assert_eq!(updated.json::<Value>()["name"], "Lisbon long weekend");

    let invalid = server
        .put(&path)
        .authorization_bearer(&alice)
        .json(&json!({ "startDate": date_in(5), "endDate": date_in(1) }))
        .await;
    invalid.assert_status(StatusCode::BAD_REQUEST);

    let listed = server.get("/api/trips").authorization_bearer(&alice).await.json::<Value>();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["adults"], 2);

    // 4. Alice deletes it
    server
        .delete(&path)
        .authorization_bearer(&alice)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server.get(&path).authorization_bearer(&alice).await.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bad_trip_id_is_rejected() {
    let server = server_with(Arc::new(FakeSupplier::default()));
    let token = register(&server, "carol@example.com").await;

    server
        .get("/api/trips/not-a-uuid")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
