use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::debug;

use super::{BookingLedger, ShowCatalog, StoreError, UserDirectory};
use crate::database::Database;
use crate::models::{
    Auditorium, Booking, BookingStatus, NewBooking, Seat, SeatClaim, SeatPrice, Show,
    ShowCatalogEntry, StatusChange, User,
};

const BOOKING_SELECT: &str = r#"
    SELECT b.id, b.show_id, b.user_id, b.status, b.created_at, b.reserved_at,
           b.expires_at, b.total_price_cents, b.payment_reference,
           COALESCE(
               array_agg(bs.seat_id ORDER BY bs.seat_id) FILTER (WHERE bs.seat_id IS NOT NULL),
               '{}'
           ) AS seat_ids
    FROM bookings b
    LEFT JOIN booking_seats bs ON bs.booking_id = b.id
"#;

#[derive(Clone)]
pub struct PgStore {
    db: Database,
}

impl PgStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[derive(FromRow)]
struct ShowRow {
    id: i64,
    movie_id: i64,
    auditorium_id: i64,
    start_at: DateTime<Utc>,
    auditorium_name: String,
    cinema_id: i64,
}

#[derive(FromRow)]
struct BookingRow {
    id: i64,
    show_id: i64,
    user_id: i64,
    status: String,
    created_at: DateTime<Utc>,
    reserved_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    total_price_cents: i64,
    payment_reference: Option<String>,
    seat_ids: Vec<i64>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status = parse_status(row.id, &row.status)?;
        Ok(Booking {
            id: row.id,
            show_id: row.show_id,
            user_id: row.user_id,
            status,
            created_at: row.created_at,
            reserved_at: row.reserved_at,
            expires_at: row.expires_at,
            total_price_cents: row.total_price_cents,
            payment_reference: row.payment_reference,
            seat_ids: row.seat_ids,
        })
    }
}

fn parse_status(booking_id: i64, raw: &str) -> Result<BookingStatus, StoreError> {
    raw.parse()
        .map_err(|e| StoreError::Corrupt(format!("booking {booking_id}: {e}")))
}

#[async_trait]
impl ShowCatalog for PgStore {
    async fn load_show(&self, show_id: i64) -> Result<Option<ShowCatalogEntry>, StoreError> {
        let row: Option<ShowRow> = sqlx::query_as(
            r#"
            SELECT s.id, s.movie_id, s.auditorium_id, s.start_at,
                   a.name AS auditorium_name, a.cinema_id
            FROM shows s
            JOIN auditoriums a ON a.id = s.auditorium_id
            WHERE s.id = $1
            "#,
        )
        .bind(show_id)
        .fetch_optional(&self.db.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let seats_query = sqlx::query_as::<_, Seat>(
            "SELECT id, row_label, number, seat_type, row_offset, column_offset
             FROM seats
             WHERE auditorium_id = $1
             ORDER BY row_label, number",
        )
        .bind(row.auditorium_id)
        .fetch_all(&self.db.pool);

        let prices_query = sqlx::query_as::<_, SeatPrice>(
            "SELECT seat_type, price_cents
             FROM show_seat_prices
             WHERE show_id = $1
             ORDER BY seat_type",
        )
        .bind(show_id)
        .fetch_all(&self.db.pool);

        let (seats, prices) = tokio::try_join!(seats_query, prices_query)?;

        Ok(Some(ShowCatalogEntry {
            show: Show {
                id: row.id,
                movie_id: row.movie_id,
                auditorium_id: row.auditorium_id,
                start_at: row.start_at,
            },
            auditorium: Auditorium {
                id: row.auditorium_id,
                name: row.auditorium_name,
                cinema_id: row.cinema_id,
            },
            seats,
            prices,
        }))
    }
}

#[async_trait]
impl BookingLedger for PgStore {
    async fn active_claims(
        &self,
        show_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<SeatClaim>, StoreError> {
        let rows: Vec<(i64, i64, String, Option<DateTime<Utc>>)> = sqlx::query_as(
            r#"
            SELECT bs.booking_id, bs.seat_id, b.status, b.expires_at
            FROM booking_seats bs
            JOIN bookings b ON b.id = bs.booking_id
            WHERE b.show_id = $1
              AND (b.status = 'BOOKED' OR (b.status = 'INITIATED' AND b.expires_at > $2))
            "#,
        )
        .bind(show_id)
        .bind(now)
        .fetch_all(&self.db.pool)
        .await?;

        rows.into_iter()
            .map(|(booking_id, seat_id, status, expires_at)| {
                Ok(SeatClaim {
                    booking_id,
                    seat_id,
                    status: parse_status(booking_id, &status)?,
                    expires_at,
                })
            })
            .collect()
    }

    async fn create_hold(&self, booking: NewBooking) -> Result<Booking, StoreError> {
        let mut tx = self.db.pool.begin().await?;

        let booking_id: i64 = sqlx::query_scalar(
            "INSERT INTO bookings (show_id, user_id, status, created_at, expires_at, total_price_cents)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
        )
        .bind(booking.show_id)
        .bind(booking.user_id)
        .bind(BookingStatus::Initiated.as_str())
        .bind(booking.created_at)
        .bind(booking.expires_at)
        .bind(booking.total_price_cents)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO booking_seats (booking_id, seat_id)
             SELECT $1, seat_id FROM UNNEST($2::BIGINT[]) AS seat_id",
        )
        .bind(booking_id)
        .bind(&booking.seat_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!("Booking {} written with {} seats", booking_id, booking.seat_ids.len());

        let mut seat_ids = booking.seat_ids;
        seat_ids.sort_unstable();
        Ok(Booking {
            id: booking_id,
            show_id: booking.show_id,
            user_id: booking.user_id,
            status: BookingStatus::Initiated,
            created_at: booking.created_at,
            reserved_at: None,
            expires_at: Some(booking.expires_at),
            total_price_cents: booking.total_price_cents,
            payment_reference: None,
            seat_ids,
        })
    }

    async fn find_booking(&self, booking_id: i64) -> Result<Option<Booking>, StoreError> {
        let query = format!("{BOOKING_SELECT} WHERE b.id = $1 GROUP BY b.id");
        let row: Option<BookingRow> = sqlx::query_as(&query)
            .bind(booking_id)
            .fetch_optional(&self.db.pool)
            .await?;

        row.map(Booking::try_from).transpose()
    }

    async fn change_status(
        &self,
        booking_id: i64,
        change: StatusChange,
    ) -> Result<Option<Booking>, StoreError> {
        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE bookings
            SET status = $3,
                reserved_at = COALESCE($4, reserved_at),
                payment_reference = COALESCE($5, payment_reference)
            WHERE id = $1 AND status = $2
            RETURNING id
            "#,
        )
        .bind(booking_id)
        .bind(change.from.as_str())
        .bind(change.to.as_str())
        .bind(change.reserved_at)
        .bind(change.payment_reference)
        .fetch_optional(&self.db.pool)
        .await?;

        match updated {
            Some(id) => self.find_booking(id).await,
            None => Ok(None),
        }
    }

    async fn bookings_for_user(&self, user_id: i64) -> Result<Vec<Booking>, StoreError> {
        let query = format!(
            "{BOOKING_SELECT} WHERE b.user_id = $1 GROUP BY b.id ORDER BY b.created_at DESC, b.id DESC"
        );
        let rows: Vec<BookingRow> = sqlx::query_as(&query)
            .bind(user_id)
            .fetch_all(&self.db.pool)
            .await?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn expire_lapsed_holds(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE bookings
             SET status = 'EXPIRED'
             WHERE status = 'INITIATED' AND (expires_at IS NULL OR expires_at <= $1)",
        )
        .bind(now)
        .execute(&self.db.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl UserDirectory for PgStore {
    async fn find_active_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, name, is_active
             FROM users
             WHERE email = $1 AND is_active = true",
        )
        .bind(email)
        .fetch_optional(&self.db.pool)
        .await?;

        Ok(user)
    }
}
