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

use clap::Parser;
use csv::{ReaderBuilder, Trim};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio::net::TcpListener;
use tourbook::server::{AppState, create_router};
use tourbook::{
    BookingLedger, Catalog, Itinerary, LocalizedText, NullNotifier, Tour, TourId, WebhookNotifier,
};
use tracing_subscriber::EnvFilter;

/// Tourbook - booking API server
///
/// Seeds the tour catalog from a CSV file and serves the booking and admin
/// endpoints over HTTP.
#[derive(Parser, Debug)]
#[command(name = "tourbook")]
#[command(about = "A tour-booking API with server-side price verification", long_about = None)]
struct Args {
    /// Path to the tour catalog CSV
    ///
    /// Expected columns: id,title_en,title_ru,title_uz,price,itinerary
    #[arg(value_name = "CATALOG")]
    catalog: PathBuf,

    /// Address to bind the HTTP server to
    #[arg(long, default_value = "127.0.0.1:3000")]
    bind: String,

    /// Webhook URL for booking notifications (disabled when absent)
    #[arg(long)]
    notify_url: Option<String>,

    /// Bearer token required on all endpoints (open when absent)
    #[arg(long, env = "TOURBOOK_API_KEY")]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let file = match File::open(&args.catalog) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening catalog '{}': {}", args.catalog.display(), e);
            process::exit(1);
        }
    };

    let catalog = match load_catalog(BufReader::new(file)) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Error loading catalog: {}", e);
            process::exit(1);
        }
    };
    tracing::info!(tours = catalog.len(), "catalog loaded");

    let notifier: Arc<dyn tourbook::Notifier> = match &args.notify_url {
        Some(url) => Arc::new(WebhookNotifier::new(url.clone())),
        None => Arc::new(NullNotifier),
    };

    let state = AppState {
        ledger: Arc::new(BookingLedger::new()),
        catalog: Arc::new(catalog),
        notifier,
        api_key: args.api_key,
    };

    let app = create_router(state);

    let listener = match TcpListener::bind(&args.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Error binding '{}': {}", args.bind, e);
            process::exit(1);
        }
    };

    tracing::info!(bind = %args.bind, "tourbook API listening");

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        process::exit(1);
    }
}

/// Raw CSV record matching the catalog format.
///
/// Fields: `id, title_en, title_ru, title_uz, price, itinerary`
#[derive(Debug, Deserialize)]
struct CatalogRecord {
    id: u32,
    title_en: String,
    #[serde(default)]
    title_ru: Option<String>,
    #[serde(default)]
    title_uz: Option<String>,
    price: Decimal,
    #[serde(default)]
    itinerary: Option<String>,
}

impl CatalogRecord {
    /// Converts a CSV record into a catalog tour.
    ///
    /// The itinerary column is classified exactly once here: a JSON array
    /// of strings becomes structured steps, anything else freeform text.
    fn into_tour(self) -> Tour {
        let none_if_blank = |field: Option<String>| field.filter(|s| !s.trim().is_empty());
        Tour {
            id: TourId(self.id),
            title: LocalizedText {
                en: self.title_en,
                ru: none_if_blank(self.title_ru),
                uz: none_if_blank(self.title_uz),
            },
            price: self.price,
            itinerary: self.itinerary.as_deref().and_then(Itinerary::parse),
        }
    }
}

/// Loads the tour catalog from a CSV reader.
///
/// Malformed rows and tours with non-positive prices are skipped with a
/// warning; seeding continues.
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
fn load_catalog<R: Read>(reader: R) -> Result<Catalog, csv::Error> {
    let catalog = Catalog::new();

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    for result in rdr.deserialize::<CatalogRecord>() {
        match result {
            Ok(record) => {
                let tour = record.into_tour();
                let id = tour.id;
                if let Err(e) = catalog.insert(tour) {
                    tracing::warn!(tour_id = %id, error = %e, "skipping tour");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed catalog row");
                continue;
            }
        }
    }

    Ok(catalog)
}
