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

//! # Tourbook
//!
//! This library provides the booking core of a tour storefront: a pricing
//! guard that re-verifies client totals against the catalog, a booking
//! ledger with a small payment-status lifecycle, a best-effort notification
//! dispatcher, and an admin reporting engine with CSV export.
//!
//! ## Core Components
//!
//! - [`Catalog`]: read-only source of canonical tour prices
//! - [`guard::validate`]: rejects tampered, malformed, or stale requests
//! - [`BookingLedger`]: persisted bookings and their lifecycle
//! - [`Notifier`] / [`dispatcher::dispatch`]: isolated side notifications
//! - [`report`]: operator-facing filter/sort/aggregate/export read path
//!
//! ## Example
//!
//! ```
//! use tourbook::{
//!     BookingLedger, Catalog, LocalizedText, PaymentStatus, Tour, TourId,
//!     guard::{self, BookingRequest},
//! };
//! use rust_decimal_macros::dec;
//!
//! let catalog = Catalog::new();
//! catalog
//!     .insert(Tour {
//!         id: TourId(1),
//!         title: LocalizedText::plain("Samarkand City Tour"),
//!         price: dec!(100.00),
//!         itinerary: None,
//!     })
//!     .unwrap();
//!
//! let ledger = BookingLedger::new();
//! let validated = guard::validate(
//!     &catalog,
//!     BookingRequest {
//!         tour_id: TourId(1),
//!         adults: 3,
//!         booking_date: "24/12/2025".to_string(),
//!         booking_time: None,
//!         total_price: dec!(300.00),
//!         payment_method: "card".to_string(),
//!         user_name: Some("Alisher Usmanov".to_string()),
//!         user_email: None,
//!         user_phone: None,
//!         pickup_address: None,
//!     },
//! )
//! .unwrap();
//!
//! let booking = ledger.create(validated).unwrap();
//! assert_eq!(booking.payment_status, PaymentStatus::Pending);
//! assert_eq!(booking.total_price, dec!(300.00));
//! assert_eq!(booking.booking_date.to_string(), "2025-12-24");
//! ```
//!
//! ## Concurrency
//!
//! The ledger and catalog are safe to share across request handlers;
//! bookings for the same tour or date never serialize against each other
//! (there is no inventory model). Notification dispatch runs on a detached
//! task after the ledger write and never affects the creation response.

pub mod base;
pub mod booking;
pub mod catalog;
pub mod dispatcher;
pub mod error;
pub mod guard;
pub mod ledger;
pub mod report;
pub mod server;

pub use base::{BookingId, TourId};
pub use booking::{Booking, PaymentMethod, PaymentStatus};
pub use catalog::{Catalog, Itinerary, Language, LocalizedText, Tour};
pub use dispatcher::{BookingNotification, Notifier, NotifyError, NullNotifier, WebhookNotifier};
pub use error::BookingError;
pub use guard::{BookingRequest, PricePreview, ValidatedBooking};
pub use ledger::BookingLedger;
pub use report::{Aggregates, BookingFilter, BookingRow, DateRange, SortDir, SortKey};
