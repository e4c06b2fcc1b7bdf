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

//! Booking ledger: the persisted booking collection and its lifecycle.
//!
//! # Lifecycle
//!
//! - `create` is the only way a booking enters the ledger; status is forced
//!   to [`PaymentStatus::Pending`] regardless of caller intent.
//! - `set_status` is an operator action that unconditionally overwrites the
//!   status. Re-applying a status the record already has succeeds silently;
//!   the operation is intentionally idempotent.
//! - `delete` is a hard delete with no audit trail.
//!
//! # Thread Safety
//!
//! Bookings live in a [`DashMap`] keyed by booking id, so concurrent
//! creations never block each other. Two operators racing on the same
//! record's status follow last-write-wins; there is no optimistic
//! concurrency token.

use crate::base::BookingId;
use crate::booking::{Booking, PaymentStatus};
use crate::error::BookingError;
use crate::guard::ValidatedBooking;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;

/// Shared booking store.
///
/// # Invariants
///
/// - Booking ids are unique; creation is atomic check-and-insert, so a
///   creation either produces a complete record or nothing at all.
/// - Every record enters with status `pending` and an immutable
///   `created_at` timestamp.
#[derive(Debug, Default)]
pub struct BookingLedger {
    /// Bookings indexed by id.
    bookings: DashMap<BookingId, Booking>,
    /// Insertion order, for deterministic reporting iteration.
    order: RwLock<Vec<BookingId>>,
}

impl BookingLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self {
            bookings: DashMap::new(),
            order: RwLock::new(Vec::new()),
        }
    }

    /// Persists a new booking from a validated payload.
    ///
    /// Generates the id, stamps `created_at`, and forces the status to
    /// `pending`. Returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::DuplicateBooking`] if the generated id
    /// already exists; in that case nothing is written.
    pub fn create(&self, payload: ValidatedBooking) -> Result<Booking, BookingError> {
        let booking = Booking {
            id: BookingId::new(),
            tour_id: payload.tour_id,
            booking_date: payload.booking_date,
            booking_time: payload.booking_time,
            adults: payload.adults,
            total_price: payload.total_price,
            payment_status: PaymentStatus::Pending,
            payment_method: payload.payment_method,
            user_name: payload.user_name,
            user_email: payload.user_email,
            user_phone: payload.user_phone,
            pickup_address: payload.pickup_address,
            created_at: Utc::now(),
        };

        // Entry API for atomic check-and-insert; no partial writes.
        match self.bookings.entry(booking.id) {
            Entry::Occupied(_) => Err(BookingError::DuplicateBooking),
            Entry::Vacant(entry) => {
                let stored = booking.clone();
                entry.insert(booking);
                self.order.write().push(stored.id);
                Ok(stored)
            }
        }
    }

    /// Re-inserts an already-persisted record, preserving its id, status,
    /// and timestamps. Used when rehydrating the ledger from storage.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::DuplicateBooking`] if the id already exists.
    pub fn restore(&self, booking: Booking) -> Result<(), BookingError> {
        match self.bookings.entry(booking.id) {
            Entry::Occupied(_) => Err(BookingError::DuplicateBooking),
            Entry::Vacant(entry) => {
                let id = booking.id;
                entry.insert(booking);
                self.order.write().push(id);
                Ok(())
            }
        }
    }

    /// Operator status change: unconditionally overwrites the status.
    ///
    /// Setting a status the record already carries succeeds silently.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::BookingNotFound`] for an unknown id.
    pub fn set_status(&self, id: BookingId, status: PaymentStatus) -> Result<(), BookingError> {
        let mut booking = self
            .bookings
            .get_mut(&id)
            .ok_or(BookingError::BookingNotFound)?;
        booking.payment_status = status;
        Ok(())
    }

    /// Operator hard delete. Irreversible.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::BookingNotFound`] for an unknown id.
    pub fn delete(&self, id: BookingId) -> Result<(), BookingError> {
        self.bookings
            .remove(&id)
            .ok_or(BookingError::BookingNotFound)?;
        self.order.write().retain(|entry| *entry != id);
        Ok(())
    }

    /// Retrieves a booking by id.
    pub fn get(&self, id: BookingId) -> Option<Booking> {
        self.bookings.get(&id).map(|entry| entry.clone())
    }

    /// Snapshot of all bookings in insertion order.
    pub fn bookings(&self) -> Vec<Booking> {
        self.order
            .read()
            .iter()
            .filter_map(|id| self.bookings.get(id).map(|entry| entry.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }
}
