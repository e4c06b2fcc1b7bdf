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

//! Admin query and reporting engine.
//!
//! Read side over the full booking collection: free-text search,
//! categorical and date-range filters (AND semantics), sorting with a
//! stable id tie-break, aggregates over the unfiltered collection, and a
//! quoted CSV export of the filtered result set.
//!
//! All date-range predicates compare calendar days against an explicit
//! `today` argument, never wall-clock timestamps.

use crate::booking::{Booking, PaymentMethod, PaymentStatus};
use crate::catalog::{Catalog, Language};
use crate::ledger::BookingLedger;
use chrono::{Datelike, NaiveDate, Weekday};
use csv::{QuoteStyle, WriterBuilder};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::io::Write;

/// Title shown when a booking references a tour no longer in the catalog.
const UNKNOWN_TOUR: &str = "Unknown tour";

/// Export column order. Fixed; every value is quoted.
const EXPORT_HEADER: [&str; 11] = [
    "Tour", "Client", "Email", "Phone", "Date", "Time", "Adults", "Price", "PaymentMethod",
    "Status", "Address",
];

/// A booking denormalized with its tour title for display and export.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BookingRow {
    #[serde(flatten)]
    pub booking: Booking,
    pub tour_title: String,
}

/// Date-range filter, evaluated by calendar day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DateRange {
    Today,
    ThisWeek,
    ThisMonth,
    Upcoming,
}

impl DateRange {
    /// Whether `date` falls inside the range relative to `today`.
    ///
    /// Weeks run Monday through Sunday; months are calendar months;
    /// `Upcoming` is today or later.
    pub fn contains(self, date: NaiveDate, today: NaiveDate) -> bool {
        match self {
            Self::Today => date == today,
            Self::ThisWeek => {
                let week = today.week(Weekday::Mon);
                date >= week.first_day() && date <= week.last_day()
            }
            Self::ThisMonth => date.year() == today.year() && date.month() == today.month(),
            Self::Upcoming => date >= today,
        }
    }
}

/// Sort key for the admin listing.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    CreatedAt,
    BookingDate,
    TotalPrice,
    ContactName,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    #[default]
    Desc,
}

/// Filter over the booking collection. Active criteria combine with AND.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingFilter {
    /// Case-insensitive substring over contact name, email, phone, and
    /// tour title; a row matches when any one field matches.
    pub search: Option<String>,
    pub status: Option<PaymentStatus>,
    pub method: Option<PaymentMethod>,
    pub date_range: Option<DateRange>,
}

impl BookingFilter {
    fn matches(&self, row: &BookingRow, today: NaiveDate) -> bool {
        if let Some(needle) = &self.search {
            let needle = needle.to_lowercase();
            let haystacks = [
                row.booking.user_name.as_deref(),
                row.booking.user_email.as_deref(),
                row.booking.user_phone.as_deref(),
                Some(row.tour_title.as_str()),
            ];
            let hit = haystacks
                .iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if let Some(status) = self.status
            && row.booking.payment_status != status
        {
            return false;
        }
        if let Some(method) = self.method
            && row.booking.payment_method != method
        {
            return false;
        }
        if let Some(range) = self.date_range
            && !range.contains(row.booking.booking_date, today)
        {
            return false;
        }
        true
    }
}

/// Aggregates over the *unfiltered* booking collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Aggregates {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub cancelled: usize,
    /// Sum of `total_price` over completed bookings only.
    pub revenue: Decimal,
}

fn row_of(booking: Booking, catalog: &Catalog) -> BookingRow {
    let tour_title = catalog
        .title_of(booking.tour_id, Language::En)
        .unwrap_or_else(|| UNKNOWN_TOUR.to_string());
    BookingRow {
        booking,
        tour_title,
    }
}

fn compare(a: &BookingRow, b: &BookingRow, key: SortKey) -> Ordering {
    match key {
        SortKey::CreatedAt => a.booking.created_at.cmp(&b.booking.created_at),
        SortKey::BookingDate => a.booking.booking_date.cmp(&b.booking.booking_date),
        SortKey::TotalPrice => a.booking.total_price.cmp(&b.booking.total_price),
        SortKey::ContactName => {
            let name_a = a.booking.user_name.as_deref().unwrap_or("").to_lowercase();
            let name_b = b.booking.user_name.as_deref().unwrap_or("").to_lowercase();
            name_a.cmp(&name_b)
        }
    }
}

/// Filters and sorts the booking collection.
///
/// Equal sort keys tie-break by booking id ascending, in both directions,
/// so the ordering is stable across runs.
pub fn query(
    ledger: &BookingLedger,
    catalog: &Catalog,
    filter: &BookingFilter,
    sort: SortKey,
    dir: SortDir,
    today: NaiveDate,
) -> Vec<BookingRow> {
    let mut rows: Vec<BookingRow> = ledger
        .bookings()
        .into_iter()
        .map(|booking| row_of(booking, catalog))
        .filter(|row| filter.matches(row, today))
        .collect();

    rows.sort_by(|a, b| {
        let ordering = match dir {
            SortDir::Asc => compare(a, b, sort),
            SortDir::Desc => compare(b, a, sort),
        };
        ordering.then_with(|| a.booking.id.cmp(&b.booking.id))
    });

    rows
}

/// Computes counts and revenue over the full, unfiltered collection.
///
/// Revenue only ever counts completed bookings; cancelled and pending
/// records contribute nothing.
pub fn aggregates(ledger: &BookingLedger) -> Aggregates {
    let mut aggregates = Aggregates {
        total: 0,
        pending: 0,
        completed: 0,
        cancelled: 0,
        revenue: Decimal::ZERO,
    };

    for booking in ledger.bookings() {
        aggregates.total += 1;
        match booking.payment_status {
            PaymentStatus::Pending => aggregates.pending += 1,
            PaymentStatus::Completed => {
                aggregates.completed += 1;
                aggregates.revenue += booking.total_price;
            }
            PaymentStatus::Cancelled => aggregates.cancelled += 1,
        }
    }

    aggregates
}

/// Serializes the filtered-and-sorted rows as a quoted CSV snapshot.
///
/// The header row is always written, even for an empty result set. Every
/// field is quoted so embedded delimiters and quotes round-trip safely.
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn export_csv<W: Write>(rows: &[BookingRow], writer: W) -> Result<(), csv::Error> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(writer);

    wtr.write_record(EXPORT_HEADER)?;

    for row in rows {
        let booking = &row.booking;
        wtr.write_record([
            row.tour_title.as_str(),
            booking.user_name.as_deref().unwrap_or(""),
            booking.user_email.as_deref().unwrap_or(""),
            booking.user_phone.as_deref().unwrap_or(""),
            &booking.booking_date.to_string(),
            booking.booking_time.as_deref().unwrap_or(""),
            &booking.adults.to_string(),
            &booking.total_price.round_dp(2).to_string(),
            booking.payment_method.as_str(),
            booking.payment_status.as_str(),
            booking.pickup_address.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Export filename carrying the export date, e.g. `bookings-2026-08-29.csv`.
pub fn export_filename(today: NaiveDate) -> String {
    format!("bookings-{}.csv", today.format("%Y-%m-%d"))
}
