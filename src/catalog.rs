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

//! Tour catalog: the read-only source of canonical prices.
//!
//! The booking path only ever reads from the catalog; catalog writes are
//! operator-driven, out-of-band events. The canonical price stored here is
//! the single source of truth for billing; client-quoted totals are only
//! ever checked against it, never trusted.

use crate::base::TourId;
use crate::error::BookingError;
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Content languages supported by the storefront.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ru,
    Uz,
}

/// Localized display text, keyed by [`Language`].
///
/// English is mandatory and serves as the fallback for missing
/// translations; there is no runtime field-name concatenation anywhere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalizedText {
    pub en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ru: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uz: Option<String>,
}

impl LocalizedText {
    /// English-only text.
    pub fn plain(en: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ru: None,
            uz: None,
        }
    }

    /// The single accessor for localized lookup. Falls back to English
    /// when the requested translation is absent.
    pub fn text(&self, lang: Language) -> &str {
        match lang {
            Language::En => &self.en,
            Language::Ru => self.ru.as_deref().unwrap_or(&self.en),
            Language::Uz => self.uz.as_deref().unwrap_or(&self.en),
        }
    }
}

/// Tour programme, decided and validated once at write time.
///
/// Legacy content stored itineraries as a JSON blob in a text column and
/// re-parsed it on every read, silently degrading to raw text on failure.
/// Here the structured/freeform decision is made exactly once, when the
/// tour enters the catalog; readers never parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Itinerary {
    /// An ordered list of day/step descriptions.
    Structured(Vec<String>),
    /// Unstructured prose.
    Freeform(String),
}

impl Itinerary {
    /// Classifies raw itinerary text from an import source.
    ///
    /// A JSON array of strings becomes [`Itinerary::Structured`]; any other
    /// non-empty text becomes [`Itinerary::Freeform`]. Empty input yields
    /// `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(steps) if !steps.is_empty() => Some(Self::Structured(steps)),
            _ => Some(Self::Freeform(raw.to_string())),
        }
    }
}

/// A catalog tour: the item being booked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tour {
    pub id: TourId,
    pub title: LocalizedText,
    /// Canonical per-adult price. Always positive.
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub itinerary: Option<Itinerary>,
}

/// In-memory tour store backing the Catalog Reader interface.
///
/// Uses [`DashMap`] so the booking path can read prices concurrently with
/// out-of-band catalog edits. There is deliberately no lock between a price
/// read and its use in validation; price edits are rare operator events.
#[derive(Debug, Default)]
pub struct Catalog {
    tours: DashMap<TourId, Tour>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self {
            tours: DashMap::new(),
        }
    }

    /// Inserts or replaces a tour.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidTourPrice`] when the price is zero or
    /// negative; such a tour never enters the catalog.
    pub fn insert(&self, tour: Tour) -> Result<(), BookingError> {
        if tour.price <= Decimal::ZERO {
            return Err(BookingError::InvalidTourPrice);
        }
        self.tours.insert(tour.id, tour);
        Ok(())
    }

    /// Retrieves a tour by id.
    pub fn get(&self, id: TourId) -> Option<dashmap::mapref::one::Ref<'_, TourId, Tour>> {
        self.tours.get(&id)
    }

    /// Canonical price lookup used by the validation guard.
    pub fn price_of(&self, id: TourId) -> Option<Decimal> {
        self.tours.get(&id).map(|tour| tour.price)
    }

    /// Localized display title, falling back to English.
    pub fn title_of(&self, id: TourId, lang: Language) -> Option<String> {
        self.tours.get(&id).map(|tour| tour.title.text(lang).to_string())
    }

    pub fn len(&self) -> usize {
        self.tours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tours.is_empty()
    }
}
