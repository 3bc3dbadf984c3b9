use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Closed set of booking states. Only `Initiated` (while unexpired) and
/// `Booked` claim seats; everything else is inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Initiated,
    Booked,
    Cancelled,
    Expired,
    Refunded,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown booking status: {0}")]
pub struct UnknownStatus(pub String);

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Initiated => "INITIATED",
            BookingStatus::Booked => "BOOKED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Expired => "EXPIRED",
            BookingStatus::Refunded => "REFUNDED",
        }
    }

    /// Lifecycle edges: a hold is confirmed, cancelled or lapses; a confirmed
    /// booking can only be refunded.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Initiated, BookingStatus::Booked)
                | (BookingStatus::Initiated, BookingStatus::Cancelled)
                | (BookingStatus::Initiated, BookingStatus::Expired)
                | (BookingStatus::Booked, BookingStatus::Refunded)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INITIATED" => Ok(BookingStatus::Initiated),
            "BOOKED" => Ok(BookingStatus::Booked),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            "EXPIRED" => Ok(BookingStatus::Expired),
            "REFUNDED" => Ok(BookingStatus::Refunded),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub show_id: i64,
    pub user_id: i64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub reserved_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub total_price_cents: i64,
    pub payment_reference: Option<String>,
    pub seat_ids: Vec<i64>,
}

/// A hold about to be written to the ledger.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub show_id: i64,
    pub user_id: i64,
    pub seat_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub total_price_cents: i64,
}

/// Compare-and-set update applied to a booking currently in `from`.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub reserved_at: Option<DateTime<Utc>>,
    pub payment_reference: Option<String>,
}

/// One booking-seat association together with the owning booking's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatClaim {
    pub booking_id: i64,
    pub seat_id: i64,
    pub status: BookingStatus,
    pub expires_at: Option<DateTime<Utc>>,
}
