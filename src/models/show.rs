use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Seat;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    pub id: i64,
    pub movie_id: i64,
    pub auditorium_id: i64,
    pub start_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auditorium {
    pub id: i64,
    pub name: String,
    pub cinema_id: i64,
}

/// One row of a show's price table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatPrice {
    pub seat_type: String,
    pub price_cents: i64,
}

/// Static data needed to render a show's seat map: the show, its auditorium
/// layout and its price table. Changes only through venue administration,
/// which is why it is the part that gets cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowCatalogEntry {
    pub show: Show,
    pub auditorium: Auditorium,
    pub seats: Vec<Seat>,
    pub prices: Vec<SeatPrice>,
}
