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

//! Pricing and validation guard integration tests.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tourbook::{
    BookingError, Catalog, LocalizedText, PaymentMethod, Tour, TourId,
    guard::{self, BookingRequest, price_preview},
};

fn catalog_with_tour(id: u32, price: Decimal) -> Catalog {
    let catalog = Catalog::new();
    catalog
        .insert(Tour {
            id: TourId(id),
            title: LocalizedText::plain("Samarkand City Tour"),
            price,
            itinerary: None,
        })
        .unwrap();
    catalog
}

fn make_request(tour_id: u32, adults: u32, total: Decimal) -> BookingRequest {
    BookingRequest {
        tour_id: TourId(tour_id),
        adults,
        booking_date: "2025-12-24".to_string(),
        booking_time: Some("09:00".to_string()),
        total_price: total,
        payment_method: "card".to_string(),
        user_name: Some("Dilnoza Karimova".to_string()),
        user_email: Some("dilnoza@example.com".to_string()),
        user_phone: Some("+998901234567".to_string()),
        pickup_address: Some("Hotel Registan, room 12".to_string()),
    }
}

#[test]
fn exact_total_is_accepted() {
    let catalog = catalog_with_tour(1, dec!(100));
    let validated = guard::validate(&catalog, make_request(1, 3, dec!(300.00))).unwrap();

    assert_eq!(validated.total_price, dec!(300.00));
    assert_eq!(validated.adults, 3);
    assert_eq!(validated.payment_method, PaymentMethod::Card);
}

#[test]
fn tampered_total_is_rejected() {
    let catalog = catalog_with_tour(1, dec!(100));
    let result = guard::validate(&catalog, make_request(1, 3, dec!(305)));

    assert_eq!(
        result.unwrap_err(),
        BookingError::PriceMismatch {
            expected: dec!(300.00),
            supplied: dec!(305),
        }
    );
}

#[test]
fn tolerance_boundary() {
    let catalog = catalog_with_tour(1, dec!(100));

    // Exactly 0.01 off is still accepted...
    let validated = guard::validate(&catalog, make_request(1, 3, dec!(300.01))).unwrap();
    // ...but the recomputed total is what gets persisted.
    assert_eq!(validated.total_price, dec!(300.00));

    // 0.02 off is not.
    let result = guard::validate(&catalog, make_request(1, 3, dec!(300.02)));
    assert!(matches!(
        result,
        Err(BookingError::PriceMismatch { .. })
    ));
}

#[test]
fn client_total_is_never_persisted() {
    let catalog = catalog_with_tour(1, dec!(33.33));
    let validated = guard::validate(&catalog, make_request(1, 2, dec!(66.67))).unwrap();

    assert_eq!(validated.total_price, dec!(66.66));
}

#[test]
fn adults_below_range_fails_regardless_of_price() {
    let catalog = catalog_with_tour(1, dec!(100));
    let result = guard::validate(&catalog, make_request(1, 0, dec!(0)));

    assert_eq!(result.unwrap_err(), BookingError::AdultsOutOfRange(0));
}

#[test]
fn adults_above_range_fails_regardless_of_price() {
    let catalog = catalog_with_tour(1, dec!(100));
    // 2100 would be the arithmetically correct total for 21 adults.
    let result = guard::validate(&catalog, make_request(1, 21, dec!(2100)));

    assert_eq!(result.unwrap_err(), BookingError::AdultsOutOfRange(21));
}

#[test]
fn range_endpoints_are_accepted() {
    let catalog = catalog_with_tour(1, dec!(100));
    assert!(guard::validate(&catalog, make_request(1, 1, dec!(100))).is_ok());
    assert!(guard::validate(&catalog, make_request(1, 20, dec!(2000))).is_ok());
}

#[test]
fn unknown_tour_is_rejected() {
    let catalog = catalog_with_tour(1, dec!(100));
    let result = guard::validate(&catalog, make_request(99, 2, dec!(200)));

    assert_eq!(result.unwrap_err(), BookingError::TourNotFound);
}

#[test]
fn day_first_date_is_normalized() {
    let catalog = catalog_with_tour(1, dec!(100));
    let mut request = make_request(1, 1, dec!(100));
    request.booking_date = "24/12/2025".to_string();

    let validated = guard::validate(&catalog, request).unwrap();
    assert_eq!(validated.booking_date.to_string(), "2025-12-24");
}

#[test]
fn unparseable_date_is_rejected() {
    let catalog = catalog_with_tour(1, dec!(100));
    let mut request = make_request(1, 1, dec!(100));
    request.booking_date = "December 24th".to_string();

    let result = guard::validate(&catalog, request);
    assert_eq!(
        result.unwrap_err(),
        BookingError::InvalidDate("December 24th".to_string())
    );
}

#[test]
fn free_text_payment_method_is_rejected() {
    let catalog = catalog_with_tour(1, dec!(100));
    let mut request = make_request(1, 1, dec!(100));
    request.payment_method = "I'll pay later".to_string();

    let result = guard::validate(&catalog, request);
    assert_eq!(
        result.unwrap_err(),
        BookingError::InvalidPaymentMethod("I'll pay later".to_string())
    );
}

#[test]
fn contact_fields_are_optional_at_the_boundary() {
    let catalog = catalog_with_tour(1, dec!(100));
    let mut request = make_request(1, 2, dec!(200));
    request.user_name = None;
    request.user_email = None;
    request.user_phone = None;
    request.pickup_address = None;

    let validated = guard::validate(&catalog, request).unwrap();
    assert_eq!(validated.user_name, None);
}

#[test]
fn preview_matches_documented_formula() {
    // base = 100 * 3 = 300; fee = 15; total = 315.00
    let preview = price_preview(dec!(100), 3);
    assert_eq!(preview.base, dec!(300));
    assert_eq!(preview.service_fee, dec!(15.00));
    assert_eq!(preview.total, dec!(315.00));
}

#[test]
fn preview_total_is_rounded_to_two_decimals() {
    // base = 33.33 * 3 = 99.99; fee = 4.9995; total = round2(104.9895)
    let preview = price_preview(dec!(33.33), 3);
    assert_eq!(preview.total, dec!(104.99));
}

#[test]
fn preview_is_deterministic_for_equal_inputs() {
    let first = price_preview(dec!(87.50), 4);
    let second = price_preview(dec!(87.50), 4);
    assert_eq!(first, second);
}
