// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! End-to-end tests for the booking API.
//!
//! Each test spins up the real axum server on an ephemeral port and talks
//! to it over HTTP with reqwest, exercising the full
//! auth → guard → ledger → dispatch flow.

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Client, StatusCode};
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tourbook::server::{AppState, create_router};
use tourbook::{
    BookingLedger, BookingNotification, Catalog, LocalizedText, Notifier, NotifyError,
    NullNotifier, PaymentStatus, Tour, TourId,
};

// === Test Notifiers ===

/// Captures every delivered notification.
#[derive(Default)]
struct RecordingNotifier {
    delivered: Mutex<Vec<BookingNotification>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &BookingNotification) -> Result<(), NotifyError> {
        self.delivered.lock().push(notification.clone());
        Ok(())
    }
}

/// Simulates a notification channel outage.
struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _notification: &BookingNotification) -> Result<(), NotifyError> {
        Err(NotifyError::Status(500))
    }
}

// === Server Setup ===

struct TestServer {
    base_url: String,
    ledger: Arc<BookingLedger>,
}

impl TestServer {
    async fn new(notifier: Arc<dyn Notifier>, api_key: Option<&str>) -> Self {
        let catalog = Catalog::new();
        catalog
            .insert(Tour {
                id: TourId(1),
                title: LocalizedText::plain("Samarkand City Tour"),
                price: dec!(100.00),
                itinerary: None,
            })
            .unwrap();
        catalog
            .insert(Tour {
                id: TourId(2),
                title: LocalizedText::plain("Bukhara Old Town"),
                price: dec!(80.00),
                itinerary: None,
            })
            .unwrap();

        let ledger = Arc::new(BookingLedger::new());
        let state = AppState {
            ledger: Arc::clone(&ledger),
            catalog: Arc::new(catalog),
            notifier,
            api_key: api_key.map(str::to_string),
        };

        let app = create_router(state);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestServer { base_url, ledger }
    }

    async fn open() -> Self {
        Self::new(Arc::new(NullNotifier), None).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn booking_payload() -> Value {
    json!({
        "tour_id": 1,
        "adults": 3,
        "booking_date": "24/12/2025",
        "booking_time": "09:00",
        "total_price": "300.00",
        "payment_method": "card",
        "user_name": "Dilnoza Karimova",
        "user_email": "dilnoza@example.com",
        "user_phone": "+998901234567",
        "pickup_address": "Hotel Registan, room 12"
    })
}

// === Booking creation ===

#[tokio::test]
async fn create_booking_succeeds_with_correct_total() {
    let server = TestServer::open().await;
    let client = Client::new();

    let response = client
        .post(server.url("/bookings"))
        .json(&booking_payload())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert!(
        body["payment_url"]
            .as_str()
            .unwrap()
            .starts_with("/payments/checkout/")
    );

    let booking_id = body["booking_id"].as_str().unwrap().parse().unwrap();
    let stored = server.ledger.get(tourbook::BookingId(booking_id)).unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Pending);
    assert_eq!(stored.total_price, dec!(300.00));
    assert_eq!(stored.booking_date.to_string(), "2025-12-24");
}

#[tokio::test]
async fn tampered_total_returns_400_with_reason() {
    let server = TestServer::open().await;
    let client = Client::new();

    let mut payload = booking_payload();
    payload["total_price"] = json!("305");
    let response = client
        .post(server.url("/bookings"))
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "PRICE_MISMATCH");
    assert!(body["error"].as_str().unwrap().contains("300.00"));
    assert!(server.ledger.is_empty(), "nothing may be persisted");
}

#[tokio::test]
async fn out_of_range_adults_returns_400() {
    let server = TestServer::open().await;
    let client = Client::new();

    for (adults, total) in [(0, "0"), (21, "2100")] {
        let mut payload = booking_payload();
        payload["adults"] = json!(adults);
        payload["total_price"] = json!(total);
        let response = client
            .post(server.url("/bookings"))
            .json(&payload)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["code"], "ADULTS_OUT_OF_RANGE");
    }
    assert!(server.ledger.is_empty());
}

#[tokio::test]
async fn status_cannot_be_forced_at_creation() {
    let server = TestServer::open().await;
    let client = Client::new();

    // An extra status field in the payload is ignored; creation always
    // lands on pending.
    let mut payload = booking_payload();
    payload["payment_status"] = json!("completed");
    let response = client
        .post(server.url("/bookings"))
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bookings = server.ledger.bookings();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].payment_status, PaymentStatus::Pending);
}

// === Authorization ===

#[tokio::test]
async fn missing_token_returns_401_before_validation() {
    let server = TestServer::new(Arc::new(NullNotifier), Some("secret-key")).await;
    let client = Client::new();

    // Even a request that would fail validation is cut off at auth.
    let mut payload = booking_payload();
    payload["adults"] = json!(0);
    let response = client
        .post(server.url("/bookings"))
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn wrong_token_rejected_valid_token_accepted() {
    let server = TestServer::new(Arc::new(NullNotifier), Some("secret-key")).await;
    let client = Client::new();

    let response = client
        .post(server.url("/bookings"))
        .bearer_auth("wrong-key")
        .json(&booking_payload())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .post(server.url("/bookings"))
        .bearer_auth("secret-key")
        .json(&booking_payload())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// === Dispatcher isolation ===

#[tokio::test]
async fn notification_outage_does_not_fail_the_booking() {
    let server = TestServer::new(Arc::new(FailingNotifier), None).await;
    let client = Client::new();

    let response = client
        .post(server.url("/bookings"))
        .json(&booking_payload())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);

    // The record is durable and retrievable afterward.
    let booking_id = body["booking_id"].as_str().unwrap().parse().unwrap();
    assert!(server.ledger.get(tourbook::BookingId(booking_id)).is_some());

    let listing = client
        .get(server.url("/admin/bookings"))
        .send()
        .await
        .unwrap();
    let rows: Vec<Value> = listing.json().await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn notification_snapshot_carries_tour_title() {
    let notifier = Arc::new(RecordingNotifier::default());
    let server = TestServer::new(Arc::clone(&notifier) as Arc<dyn Notifier>, None).await;
    let client = Client::new();

    let response = client
        .post(server.url("/bookings"))
        .json(&booking_payload())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Dispatch runs on a detached task; poll briefly for delivery.
    let mut delivered = Vec::new();
    for _ in 0..50 {
        delivered = notifier.delivered.lock().clone();
        if !delivered.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(delivered.len(), 1);
    let snapshot = &delivered[0];
    assert_eq!(snapshot.tour_title, "Samarkand City Tour");
    assert_eq!(snapshot.adults, 3);
    assert_eq!(snapshot.total_price, dec!(300.00));
    assert_eq!(snapshot.payment_status, PaymentStatus::Pending);
    assert_eq!(snapshot.user_name.as_deref(), Some("Dilnoza Karimova"));
}

// === Admin operations ===

async fn create_and_get_id(server: &TestServer, client: &Client) -> String {
    let response = client
        .post(server.url("/bookings"))
        .json(&booking_payload())
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    body["booking_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn operator_status_change_round_trips() {
    let server = TestServer::open().await;
    let client = Client::new();
    let id = create_and_get_id(&server, &client).await;

    let response = client
        .patch(server.url(&format!("/admin/bookings/{}/status", id)))
        .json(&json!({"status": "completed"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let listing = client
        .get(server.url("/admin/bookings?status=completed"))
        .send()
        .await
        .unwrap();
    let rows: Vec<Value> = listing.json().await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn status_change_on_unknown_id_is_isolated_404() {
    let server = TestServer::open().await;
    let client = Client::new();
    create_and_get_id(&server, &client).await;

    let response = client
        .patch(server.url(&format!(
            "/admin/bookings/{}/status",
            uuid::Uuid::new_v4()
        )))
        .json(&json!({"status": "cancelled"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The failure affects nothing else; the existing record is untouched.
    assert_eq!(server.ledger.len(), 1);
    assert_eq!(
        server.ledger.bookings()[0].payment_status,
        PaymentStatus::Pending
    );
}

#[tokio::test]
async fn delete_removes_booking() {
    let server = TestServer::open().await;
    let client = Client::new();
    let id = create_and_get_id(&server, &client).await;

    let response = client
        .delete(server.url(&format!("/admin/bookings/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(server.ledger.is_empty());

    // Deleting again is a 404.
    let response = client
        .delete(server.url(&format!("/admin/bookings/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stats_report_unfiltered_aggregates() {
    let server = TestServer::open().await;
    let client = Client::new();

    let first = create_and_get_id(&server, &client).await;
    create_and_get_id(&server, &client).await;

    client
        .patch(server.url(&format!("/admin/bookings/{}/status", first)))
        .json(&json!({"status": "completed"}))
        .send()
        .await
        .unwrap();

    let response = client
        .get(server.url("/admin/bookings/stats"))
        .send()
        .await
        .unwrap();
    let stats: Value = response.json().await.unwrap();

    assert_eq!(stats["total"], 2);
    assert_eq!(stats["pending"], 1);
    assert_eq!(stats["completed"], 1);
    assert_eq!(stats["cancelled"], 0);
    assert_eq!(stats["revenue"], "300.00");
}

#[tokio::test]
async fn export_returns_quoted_csv_attachment() {
    let server = TestServer::open().await;
    let client = Client::new();
    create_and_get_id(&server, &client).await;

    let response = client
        .get(server.url("/admin/bookings/export"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/csv"
    );
    assert!(
        response.headers()["content-disposition"]
            .to_str()
            .unwrap()
            .contains("bookings-")
    );

    let text = response.text().await.unwrap();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().starts_with("\"Tour\",\"Client\""));
    let row = lines.next().unwrap();
    assert!(row.contains("\"Samarkand City Tour\""));
    assert!(row.contains("\"300.00\""));
}

#[tokio::test]
async fn filtered_listing_combines_parameters() {
    let server = TestServer::open().await;
    let client = Client::new();

    create_and_get_id(&server, &client).await;
    let mut other = booking_payload();
    other["tour_id"] = json!(2);
    other["total_price"] = json!("240.00");
    other["payment_method"] = json!("cash");
    other["user_name"] = json!("Bob Fletcher");
    client
        .post(server.url("/bookings"))
        .json(&other)
        .send()
        .await
        .unwrap();

    let response = client
        .get(server.url("/admin/bookings?search=bukhara&method=cash"))
        .send()
        .await
        .unwrap();
    let rows: Vec<Value> = response.json().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["user_name"], "Bob Fletcher");

    // AND semantics: same search with a non-matching method is empty.
    let response = client
        .get(server.url("/admin/bookings?search=bukhara&method=card"))
        .send()
        .await
        .unwrap();
    let rows: Vec<Value> = response.json().await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn concurrent_submissions_all_land_in_the_ledger() {
    let server = TestServer::open().await;
    let client = Client::new();

    let requests = (0..32).map(|i| {
        let client = client.clone();
        let url = server.url("/bookings");
        async move {
            let mut payload = booking_payload();
            payload["user_name"] = json!(format!("Guest {i}"));
            client.post(url).json(&payload).send().await.unwrap()
        }
    });
    let responses = futures::future::join_all(requests).await;

    for response in responses {
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(server.ledger.len(), 32);
}
