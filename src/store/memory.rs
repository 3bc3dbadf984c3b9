use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::{BookingLedger, ShowCatalog, StoreError, UserDirectory};
use crate::models::{
    Booking, BookingStatus, NewBooking, SeatClaim, ShowCatalogEntry, StatusChange, User,
};

#[derive(Default)]
struct Tables {
    shows: HashMap<i64, ShowCatalogEntry>,
    bookings: BTreeMap<i64, Booking>,
    users: Vec<User>,
    next_booking_id: i64,
}

/// Process-local store with the same contracts as [`super::PgStore`].
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_show(&self, entry: ShowCatalogEntry) {
        self.tables.write().await.shows.insert(entry.show.id, entry);
    }

    pub async fn insert_user(&self, user: User) {
        self.tables.write().await.users.push(user);
    }

    /// Stores a booking as-is, in any state. Keeps generated ids above it.
    pub async fn insert_booking(&self, booking: Booking) {
        let mut tables = self.tables.write().await;
        tables.next_booking_id = tables.next_booking_id.max(booking.id);
        tables.bookings.insert(booking.id, booking);
    }
}

#[async_trait]
impl ShowCatalog for MemoryStore {
    async fn load_show(&self, show_id: i64) -> Result<Option<ShowCatalogEntry>, StoreError> {
        Ok(self.tables.read().await.shows.get(&show_id).cloned())
    }
}

#[async_trait]
impl BookingLedger for MemoryStore {
    // Returns every claim of the show; expiry is left to the resolver.
    async fn active_claims(
        &self,
        show_id: i64,
        _now: DateTime<Utc>,
    ) -> Result<Vec<SeatClaim>, StoreError> {
        let tables = self.tables.read().await;
        let claims = tables
            .bookings
            .values()
            .filter(|b| b.show_id == show_id)
            .flat_map(|b| {
                b.seat_ids.iter().map(move |&seat_id| SeatClaim {
                    booking_id: b.id,
                    seat_id,
                    status: b.status,
                    expires_at: b.expires_at,
                })
            })
            .collect();
        Ok(claims)
    }

    async fn create_hold(&self, booking: NewBooking) -> Result<Booking, StoreError> {
        let mut tables = self.tables.write().await;
        tables.next_booking_id += 1;
        let mut seat_ids = booking.seat_ids;
        seat_ids.sort_unstable();

        let created = Booking {
            id: tables.next_booking_id,
            show_id: booking.show_id,
            user_id: booking.user_id,
            status: BookingStatus::Initiated,
            created_at: booking.created_at,
            reserved_at: None,
            expires_at: Some(booking.expires_at),
            total_price_cents: booking.total_price_cents,
            payment_reference: None,
            seat_ids,
        };
        tables.bookings.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_booking(&self, booking_id: i64) -> Result<Option<Booking>, StoreError> {
        Ok(self.tables.read().await.bookings.get(&booking_id).cloned())
    }

    async fn change_status(
        &self,
        booking_id: i64,
        change: StatusChange,
    ) -> Result<Option<Booking>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(booking) = tables.bookings.get_mut(&booking_id) else {
            return Ok(None);
        };
        if booking.status != change.from {
            return Ok(None);
        }

        booking.status = change.to;
        if change.reserved_at.is_some() {
            booking.reserved_at = change.reserved_at;
        }
        if change.payment_reference.is_some() {
            booking.payment_reference = change.payment_reference;
        }
        Ok(Some(booking.clone()))
    }

    async fn bookings_for_user(&self, user_id: i64) -> Result<Vec<Booking>, StoreError> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(bookings)
    }

    async fn expire_lapsed_holds(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        let mut expired = 0;
        for booking in tables.bookings.values_mut() {
            let lapsed = booking.expires_at.map_or(true, |at| at <= now);
            if booking.status == BookingStatus::Initiated && lapsed {
                booking.status = BookingStatus::Expired;
                expired += 1;
            }
        }
        Ok(expired)
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn find_active_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.is_active && u.email == email)
            .cloned())
    }
}
