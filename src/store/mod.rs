//! Storage seams for the catalog, the booking ledger and user lookup.
//!
//! Postgres backs the running service; the in-memory store backs tests and
//! local experiments. Both are read and written without any seat lock.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Booking, NewBooking, SeatClaim, ShowCatalogEntry, StatusChange, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Show, auditorium layout and price table lookups.
#[async_trait]
pub trait ShowCatalog: Send + Sync {
    async fn load_show(&self, show_id: i64) -> Result<Option<ShowCatalogEntry>, StoreError>;
}

#[async_trait]
pub trait BookingLedger: Send + Sync {
    /// Seat claims of the show's bookings that may be active at `now`.
    /// Implementations may return a superset; the resolver decides activity.
    async fn active_claims(
        &self,
        show_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<SeatClaim>, StoreError>;

    async fn create_hold(&self, booking: NewBooking) -> Result<Booking, StoreError>;

    async fn find_booking(&self, booking_id: i64) -> Result<Option<Booking>, StoreError>;

    /// Applies `change` only if the booking is still in `change.from`.
    /// Returns `None` when the booking is missing or its status moved on.
    async fn change_status(
        &self,
        booking_id: i64,
        change: StatusChange,
    ) -> Result<Option<Booking>, StoreError>;

    async fn bookings_for_user(&self, user_id: i64) -> Result<Vec<Booking>, StoreError>;

    /// Marks every lapsed `INITIATED` booking as `EXPIRED`, returning how many changed.
    async fn expire_lapsed_holds(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_active_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
}
