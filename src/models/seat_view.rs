use chrono::{DateTime, Utc};
use serde::Serialize;

use super::SeatPrice;

/// Read-time status of a seat for one show.
///
/// Variants are ordered by precedence so that folding claims with `max`
/// lets `Booked` dominate `Held`, which dominates `Available`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookStatus {
    Available,
    Held,
    Booked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    pub id: i64,
    pub row: String,
    pub number: i32,
    pub seat_type: String,
    pub row_offset: i32,
    pub column_offset: i32,
    pub price_cents: Option<i64>,
    pub book_status: BookStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditoriumView {
    pub id: i64,
    pub name: String,
    pub cinema_id: i64,
    pub seats: Vec<SeatView>,
}

/// Snapshot of a show's seat map. Advisory only: it can be stale as soon as
/// it is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowSeatView {
    pub id: i64,
    pub movie_id: i64,
    pub start_at: DateTime<Utc>,
    pub auditorium_id: i64,
    pub seat_prices: Vec<SeatPrice>,
    pub auditorium: AuditoriumView,
}

impl ShowSeatView {
    pub fn seat(&self, seat_id: i64) -> Option<&SeatView> {
        self.auditorium.seats.iter().find(|s| s.id == seat_id)
    }
}
