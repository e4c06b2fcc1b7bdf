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

//! HTTP surface.
//!
//! Routes:
//! - `POST /bookings` - create a booking (auth, guard, ledger, dispatch)
//! - `GET /admin/bookings` - filtered + sorted listing
//! - `GET /admin/bookings/stats` - aggregates over the full collection
//! - `GET /admin/bookings/export` - CSV snapshot of the filtered listing
//! - `PATCH /admin/bookings/{id}/status` - operator status change
//! - `DELETE /admin/bookings/{id}` - operator hard delete
//!
//! The authorization check runs before any guard logic; the dispatcher runs
//! after the ledger write and its outcome never reaches the response.

use crate::base::{BookingId, TourId};
use crate::booking::PaymentStatus;
use crate::catalog::{Catalog, Language};
use crate::dispatcher::{BookingNotification, Notifier, dispatch};
use crate::error::BookingError;
use crate::guard::{self, BookingRequest};
use crate::ledger::BookingLedger;
use crate::report::{self, BookingFilter, DateRange, SortDir, SortKey};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

// === Application State ===

/// Shared application state, constructed once at startup and passed by
/// reference into every handler. No module-level singletons.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<BookingLedger>,
    pub catalog: Arc<Catalog>,
    pub notifier: Arc<dyn Notifier>,
    /// Bearer token required on every route; `None` disables the check.
    pub api_key: Option<String>,
}

// === Request/Response DTOs ===

/// Request body for `POST /bookings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub tour_id: u32,
    pub adults: u32,
    pub booking_date: String,
    #[serde(default)]
    pub booking_time: Option<String>,
    pub total_price: Decimal,
    pub payment_method: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub user_phone: Option<String>,
    #[serde(default)]
    pub pickup_address: Option<String>,
}

impl CreateBookingRequest {
    fn into_booking_request(self) -> BookingRequest {
        BookingRequest {
            tour_id: TourId(self.tour_id),
            adults: self.adults,
            booking_date: self.booking_date,
            booking_time: self.booking_time,
            total_price: self.total_price,
            payment_method: self.payment_method,
            user_name: self.user_name,
            user_email: self.user_email,
            user_phone: self.user_phone,
            pickup_address: self.pickup_address,
        }
    }
}

/// Response body for a successful booking creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingResponse {
    pub success: bool,
    pub booking_id: Uuid,
    /// Placeholder pending real settlement integration.
    pub payment_url: String,
    pub message: String,
}

/// Request body for `PATCH /admin/bookings/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: PaymentStatus,
}

/// Query parameters for the admin listing and export.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<PaymentStatus>,
    #[serde(default)]
    pub method: Option<crate::booking::PaymentMethod>,
    #[serde(default)]
    pub date_range: Option<DateRange>,
    #[serde(default)]
    pub sort: Option<SortKey>,
    #[serde(default)]
    pub dir: Option<SortDir>,
}

impl ListParams {
    fn into_parts(self) -> (BookingFilter, SortKey, SortDir) {
        (
            BookingFilter {
                search: self.search,
                status: self.status,
                method: self.method,
                date_range: self.date_range,
            },
            self.sort.unwrap_or_default(),
            self.dir.unwrap_or_default(),
        )
    }
}

/// Response body for errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Error Handling ===

/// Wrapper for converting [`BookingError`] into HTTP responses.
pub struct AppError(BookingError);

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            BookingError::AdultsOutOfRange(_) => (StatusCode::BAD_REQUEST, "ADULTS_OUT_OF_RANGE"),
            BookingError::TourNotFound => (StatusCode::BAD_REQUEST, "TOUR_NOT_FOUND"),
            BookingError::PriceMismatch { .. } => (StatusCode::BAD_REQUEST, "PRICE_MISMATCH"),
            BookingError::InvalidDate(_) => (StatusCode::BAD_REQUEST, "INVALID_DATE"),
            BookingError::InvalidPaymentMethod(_) => {
                (StatusCode::BAD_REQUEST, "INVALID_PAYMENT_METHOD")
            }
            BookingError::InvalidTourPrice => (StatusCode::BAD_REQUEST, "INVALID_TOUR_PRICE"),
            BookingError::DuplicateBooking => {
                (StatusCode::INTERNAL_SERVER_ERROR, "DUPLICATE_BOOKING")
            }
            BookingError::BookingNotFound => (StatusCode::NOT_FOUND, "BOOKING_NOT_FOUND"),
        };

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "missing or invalid credentials".to_string(),
            code: "UNAUTHORIZED".to_string(),
        }),
    )
        .into_response()
}

/// Bearer-token check. Runs before any request validation.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), Response> {
    let Some(expected) = &state.api_key else {
        return Ok(());
    };

    let supplied = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match supplied {
        Some(token) if token == expected => Ok(()),
        _ => Err(unauthorized()),
    }
}

// === Handlers ===

/// POST /bookings - Validate, persist, then notify (fire-and-forget).
async fn create_booking(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateBookingRequest>,
) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }

    let validated = match guard::validate(&state.catalog, request.into_booking_request()) {
        Ok(validated) => validated,
        Err(err) => return AppError(err).into_response(),
    };

    let booking = match state.ledger.create(validated) {
        Ok(booking) => booking,
        Err(err) => return AppError(err).into_response(),
    };

    tracing::info!(booking_id = %booking.id, tour_id = %booking.tour_id, "booking created");

    // Notification runs after the durable write; its outcome is discarded.
    let tour_title = state
        .catalog
        .title_of(booking.tour_id, Language::En)
        .unwrap_or_default();
    dispatch(
        Arc::clone(&state.notifier),
        BookingNotification::from_booking(&booking, &tour_title),
    );

    Json(CreateBookingResponse {
        success: true,
        booking_id: booking.id.0,
        payment_url: format!("/payments/checkout/{}", booking.id),
        message: "Booking created, payment pending".to_string(),
    })
    .into_response()
}

/// GET /admin/bookings - Filtered and sorted listing.
async fn list_bookings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }

    let (filter, sort, dir) = params.into_parts();
    let today = Utc::now().date_naive();
    let rows = report::query(&state.ledger, &state.catalog, &filter, sort, dir, today);
    Json(rows).into_response()
}

/// GET /admin/bookings/stats - Aggregates over the unfiltered collection.
async fn booking_stats(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }

    Json(report::aggregates(&state.ledger)).into_response()
}

/// GET /admin/bookings/export - CSV snapshot of the filtered listing.
async fn export_bookings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }

    let (filter, sort, dir) = params.into_parts();
    let today = Utc::now().date_naive();
    let rows = report::query(&state.ledger, &state.catalog, &filter, sort, dir, today);

    let mut body = Vec::new();
    if let Err(error) = report::export_csv(&rows, &mut body) {
        tracing::error!(%error, "booking export failed");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "export failed".to_string(),
                code: "EXPORT_FAILED".to_string(),
            }),
        )
            .into_response();
    }

    let disposition = format!(
        "attachment; filename=\"{}\"",
        report::export_filename(today)
    );
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

/// PATCH /admin/bookings/{id}/status - Operator status change.
async fn set_booking_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusUpdateRequest>,
) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }

    match state.ledger.set_status(BookingId(id), request.status) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => AppError(err).into_response(),
    }
}

/// DELETE /admin/bookings/{id} - Operator hard delete.
async fn delete_booking(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }

    match state.ledger.delete(BookingId(id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => AppError(err).into_response(),
    }
}

// === Router ===

/// Builds the application router over shared state.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/admin/bookings", get(list_bookings))
        .route("/admin/bookings/stats", get(booking_stats))
        .route("/admin/bookings/export", get(export_bookings))
        .route("/admin/bookings/{id}/status", patch(set_booking_status))
        .route("/admin/bookings/{id}", delete(delete_booking))
        .with_state(state)
}
