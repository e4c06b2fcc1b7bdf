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

//! Booking entity and its status lifecycle.
//!
//! Bookings follow a small state machine:
//! - [`Pending`] → [`Completed`] (operator marks the booking paid)
//! - [`Pending`] → [`Cancelled`] (operator cancels the booking)
//!
//! Both terminal states are reached only through an explicit operator
//! action; creation always starts at [`Pending`].
//!
//! [`Pending`]: PaymentStatus::Pending
//! [`Completed`]: PaymentStatus::Completed
//! [`Cancelled`]: PaymentStatus::Cancelled

use crate::base::{BookingId, TourId};
use crate::error::BookingError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Payment status of a booking.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepted payment methods.
///
/// This is a closed set; free text is rejected at the API boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    MobileWallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::Transfer => "transfer",
            Self::MobileWallet => "mobile-wallet",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            "transfer" => Ok(Self::Transfer),
            "mobile-wallet" => Ok(Self::MobileWallet),
            other => Err(BookingError::InvalidPaymentMethod(other.to_string())),
        }
    }
}

/// Parses a booking date from either the canonical `YYYY-MM-DD` form or the
/// `DD/MM/YYYY` form used by checkout forms.
///
/// Everything downstream of validation sees only the canonical form.
///
/// # Errors
///
/// Returns [`BookingError::InvalidDate`] when the input matches neither
/// format; dates are never silently passed through.
pub fn parse_booking_date(input: &str) -> Result<NaiveDate, BookingError> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(input, "%d/%m/%Y"))
        .map_err(|_| BookingError::InvalidDate(input.to_string()))
}

/// A customer's reservation against a catalog tour.
///
/// The persisted record. `total_price` is always the server-recomputed
/// amount; `created_at` is set once at creation and never updated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: BookingId,
    pub tour_id: TourId,
    /// Canonical calendar date of the tour.
    pub booking_date: NaiveDate,
    /// Optional free-form slot label, e.g. "09:00" or "afternoon".
    pub booking_time: Option<String>,
    pub adults: u32,
    pub total_price: Decimal,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub user_phone: Option<String>,
    pub pickup_address: Option<String>,
    pub created_at: DateTime<Utc>,
}
