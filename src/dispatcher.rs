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

//! Best-effort booking notifications.
//!
//! The dispatcher informs an external channel that a booking occurred. It
//! runs strictly after the ledger write and its outcome is discarded:
//! failures are logged and swallowed, never surfaced to the customer.
//! Delivery is at-most-once with no retry queue; an outage during the
//! notification window is an accepted limitation.

use crate::base::{BookingId, TourId};
use crate::booking::{Booking, PaymentMethod, PaymentStatus};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors from the external notification channel.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The request never completed (connect failure, timeout, ...)
    #[error("notification request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The channel answered with a non-success status
    #[error("notification channel returned status {0}")]
    Status(u16),
}

/// Denormalized snapshot of a just-created booking.
///
/// Carries the tour's display title so the receiving side needs no catalog
/// lookup. The snapshot is taken after the ledger write; the dispatcher
/// never mutates the booking itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingNotification {
    pub booking_id: BookingId,
    pub tour_id: TourId,
    pub tour_title: String,
    pub booking_date: NaiveDate,
    pub booking_time: Option<String>,
    pub adults: u32,
    pub total_price: Decimal,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub user_phone: Option<String>,
    pub pickup_address: Option<String>,
}

impl BookingNotification {
    /// Builds the snapshot from a stored booking plus its tour title.
    pub fn from_booking(booking: &Booking, tour_title: &str) -> Self {
        Self {
            booking_id: booking.id,
            tour_id: booking.tour_id,
            tour_title: tour_title.to_string(),
            booking_date: booking.booking_date,
            booking_time: booking.booking_time.clone(),
            adults: booking.adults,
            total_price: booking.total_price,
            payment_status: booking.payment_status,
            payment_method: booking.payment_method,
            user_name: booking.user_name.clone(),
            user_email: booking.user_email.clone(),
            user_phone: booking.user_phone.clone(),
            pickup_address: booking.pickup_address.clone(),
        }
    }
}

/// A notification channel.
///
/// Implementations must be safe to call from a detached task; the caller
/// never awaits the result on the response path.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &BookingNotification) -> Result<(), NotifyError>;
}

/// Webhook channel: POSTs the snapshot as JSON to a configured URL.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl WebhookNotifier {
    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: &BookingNotification) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(notification)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(NotifyError::Status(response.status().as_u16()))
        }
    }
}

/// Disabled channel used when no notification endpoint is configured.
#[derive(Debug, Default)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, notification: &BookingNotification) -> Result<(), NotifyError> {
        tracing::debug!(booking_id = %notification.booking_id, "notification channel disabled");
        Ok(())
    }
}

/// Fires a notification on a detached task.
///
/// Any error is logged at `warn` and dropped; the booking-creation response
/// has already been decided by the time this runs.
pub fn dispatch(notifier: Arc<dyn Notifier>, notification: BookingNotification) {
    tokio::spawn(async move {
        if let Err(error) = notifier.notify(&notification).await {
            tracing::warn!(
                booking_id = %notification.booking_id,
                %error,
                "booking notification failed"
            );
        }
    });
}
