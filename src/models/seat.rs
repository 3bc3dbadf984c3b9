use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A physical seat in an auditorium. Layout data only, independent of bookings.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub id: i64,
    #[sqlx(rename = "row_label")]
    pub row: String,
    pub number: i32,
    pub seat_type: String,
    pub row_offset: i32,
    pub column_offset: i32,
}
