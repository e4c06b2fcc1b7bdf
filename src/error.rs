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

//! Error types for booking creation and administration.

use rust_decimal::Decimal;
use thiserror::Error;

/// Booking processing errors.
///
/// Each validation failure maps to a distinct variant so callers receive
/// an actionable reason instead of a generic rejection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// Adult count outside the accepted range
    #[error("adults must be between 1 and 20, got {0}")]
    AdultsOutOfRange(u32),

    /// Referenced tour does not exist in the catalog
    #[error("tour not found")]
    TourNotFound,

    /// Client-supplied total disagrees with the catalog price
    #[error("total price mismatch: expected {expected}, got {supplied}")]
    PriceMismatch {
        expected: Decimal,
        supplied: Decimal,
    },

    /// Booking date could not be parsed
    #[error("unparseable booking date '{0}'")]
    InvalidDate(String),

    /// Payment method is not one of the accepted set
    #[error("invalid payment method '{0}'")]
    InvalidPaymentMethod(String),

    /// Catalog rejected a tour with a non-positive price
    #[error("tour price must be positive")]
    InvalidTourPrice,

    /// Generated booking id already exists in the ledger
    #[error("duplicate booking ID")]
    DuplicateBooking,

    /// Referenced booking does not exist
    #[error("booking not found")]
    BookingNotFound,
}

impl BookingError {
    /// True for rejections produced by request validation, as opposed to
    /// ledger lookup or persistence failures.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::AdultsOutOfRange(_)
                | Self::TourNotFound
                | Self::PriceMismatch { .. }
                | Self::InvalidDate(_)
                | Self::InvalidPaymentMethod(_)
        )
    }
}
