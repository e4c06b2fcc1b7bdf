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

//! Pricing and validation guard.
//!
//! Every booking request passes through [`validate`] before anything is
//! persisted. The guard recomputes the authoritative total from the catalog
//! price; a tampered or stale client total is rejected here and never
//! becomes a booking. The guard performs no writes; its only side effect
//! is a single catalog read.

use crate::base::TourId;
use crate::booking::{PaymentMethod, parse_booking_date};
use crate::catalog::Catalog;
use crate::error::BookingError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Minimum adults per booking.
pub const MIN_ADULTS: u32 = 1;
/// Maximum adults per booking.
pub const MAX_ADULTS: u32 = 20;
/// Allowed absolute difference between the client total and the
/// server-recomputed total. Covers decimal formatting drift, nothing more.
pub const PRICE_TOLERANCE: Decimal = dec!(0.01);

/// Service fee rate applied in the checkout price preview.
pub const SERVICE_FEE_RATE: Decimal = dec!(0.05);

/// Raw, untrusted booking request as submitted by a client.
///
/// `total_price` is only ever compared against the recomputed amount; it is
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub tour_id: TourId,
    pub adults: u32,
    /// `YYYY-MM-DD` or `DD/MM/YYYY`.
    pub booking_date: String,
    pub booking_time: Option<String>,
    pub total_price: Decimal,
    /// One of the closed payment-method set, e.g. `"card"`.
    pub payment_method: String,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub user_phone: Option<String>,
    pub pickup_address: Option<String>,
}

/// A fully validated creation payload, ready for the ledger.
///
/// `total_price` here is the server-recomputed amount, and `booking_date`
/// is canonical. Only the ledger consumes this type.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedBooking {
    pub tour_id: TourId,
    pub booking_date: NaiveDate,
    pub booking_time: Option<String>,
    pub adults: u32,
    pub total_price: Decimal,
    pub payment_method: PaymentMethod,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub user_phone: Option<String>,
    pub pickup_address: Option<String>,
}

/// Validates a booking request against the catalog.
///
/// # Checks
///
/// | Check | Rejection |
/// |-------|-----------|
/// | `adults` in `[1, 20]` | [`BookingError::AdultsOutOfRange`] |
/// | tour exists | [`BookingError::TourNotFound`] |
/// | client total within `0.01` of `price * adults` | [`BookingError::PriceMismatch`] |
/// | date parses | [`BookingError::InvalidDate`] |
/// | payment method in the closed set | [`BookingError::InvalidPaymentMethod`] |
///
/// On success the returned payload carries the recomputed total, never the
/// client-supplied one.
pub fn validate(
    catalog: &Catalog,
    request: BookingRequest,
) -> Result<ValidatedBooking, BookingError> {
    if !(MIN_ADULTS..=MAX_ADULTS).contains(&request.adults) {
        return Err(BookingError::AdultsOutOfRange(request.adults));
    }

    let price = catalog
        .price_of(request.tour_id)
        .ok_or(BookingError::TourNotFound)?;

    let expected = (price * Decimal::from(request.adults)).round_dp(2);
    if (request.total_price - expected).abs() > PRICE_TOLERANCE {
        return Err(BookingError::PriceMismatch {
            expected,
            supplied: request.total_price,
        });
    }

    let booking_date = parse_booking_date(&request.booking_date)?;
    let payment_method: PaymentMethod = request.payment_method.parse()?;

    Ok(ValidatedBooking {
        tour_id: request.tour_id,
        booking_date,
        booking_time: request.booking_time,
        adults: request.adults,
        total_price: expected,
        payment_method,
        user_name: request.user_name,
        user_email: request.user_email,
        user_phone: request.user_phone,
        pickup_address: request.pickup_address,
    })
}

/// Checkout price preview.
///
/// Every surface that shows a price before booking must use this one
/// computation so the displayed number never drifts between pages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PricePreview {
    pub base: Decimal,
    pub service_fee: Decimal,
    pub total: Decimal,
}

/// Computes the checkout preview: `base = price * adults`,
/// `service_fee = base * 0.05`, `total = round2(base + service_fee)`.
pub fn price_preview(price: Decimal, adults: u32) -> PricePreview {
    let base = price * Decimal::from(adults);
    let service_fee = base * SERVICE_FEE_RATE;
    let total = (base + service_fee).round_dp(2);
    PricePreview {
        base,
        service_fee,
        total,
    }
}
