use chrono::Duration;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use super::availability::{AvailabilityError, SeatAvailabilityService};
use crate::clock::Clock;
use crate::config::BookingConfig;
use crate::models::{BookStatus, Booking, BookingStatus, NewBooking, StatusChange};
use crate::store::{BookingLedger, StoreError};

pub const MAX_SEATS_PER_BOOKING: usize = 10;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("show {0} not found")]
    ShowNotFound(i64),
    #[error("booking {0} not found")]
    NotFound(i64),
    #[error("{0}")]
    Invalid(String),
    #[error("seats {0:?} are not available")]
    SeatsUnavailable(Vec<i64>),
    #[error("hold for booking {0} has expired")]
    HoldExpired(i64),
    #[error("booking {id} is {status}")]
    InvalidTransition { id: i64, status: BookingStatus },
    #[error("booking {0} was modified concurrently")]
    Conflict(i64),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AvailabilityError> for BookingError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::NotFound(show_id) => BookingError::ShowNotFound(show_id),
            AvailabilityError::Store(e) => BookingError::Store(e),
        }
    }
}

/// Hold, confirm and cancel flow on top of the ledger.
///
/// Availability checks run against a fresh seat view but take no lock, so two
/// concurrent holds on the same seat can both succeed. The resolver still
/// reports a consistent status for such a seat.
#[derive(Clone)]
pub struct BookingService {
    availability: SeatAvailabilityService,
    ledger: Arc<dyn BookingLedger>,
    clock: Arc<dyn Clock>,
    hold_duration: Duration,
}

impl BookingService {
    pub fn new(
        availability: SeatAvailabilityService,
        ledger: Arc<dyn BookingLedger>,
        clock: Arc<dyn Clock>,
        config: &BookingConfig,
    ) -> Self {
        Self {
            availability,
            ledger,
            clock,
            hold_duration: config.hold_duration(),
        }
    }

    pub async fn create_hold(
        &self,
        user_id: i64,
        show_id: i64,
        seat_ids: &[i64],
    ) -> Result<Booking, BookingError> {
        let seat_ids: Vec<i64> = seat_ids
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if seat_ids.is_empty() {
            return Err(BookingError::Invalid("at least one seat is required".to_string()));
        }
        if seat_ids.len() > MAX_SEATS_PER_BOOKING {
            return Err(BookingError::Invalid(format!(
                "at most {} seats per booking",
                MAX_SEATS_PER_BOOKING
            )));
        }

        let view = self.availability.resolve(show_id).await?;

        let mut unknown = Vec::new();
        let mut unpriced = Vec::new();
        let mut taken = Vec::new();
        let mut total_price_cents: i64 = 0;
        for &seat_id in &seat_ids {
            let Some(seat) = view.seat(seat_id) else {
                unknown.push(seat_id);
                continue;
            };
            match seat.price_cents {
                Some(price) => {
                    total_price_cents = total_price_cents.checked_add(price).ok_or_else(|| {
                        BookingError::Invalid(format!("total price overflows for show {}", show_id))
                    })?;
                }
                None => unpriced.push(seat_id),
            }
            if seat.book_status != BookStatus::Available {
                taken.push(seat_id);
            }
        }

        if !unknown.is_empty() {
            return Err(BookingError::Invalid(format!(
                "seats {:?} do not belong to show {}",
                unknown, show_id
            )));
        }
        if !unpriced.is_empty() {
            return Err(BookingError::Invalid(format!(
                "seats {:?} have no price for show {}",
                unpriced, show_id
            )));
        }
        if !taken.is_empty() {
            return Err(BookingError::SeatsUnavailable(taken));
        }

        let now = self.clock.now();
        let booking = self
            .ledger
            .create_hold(NewBooking {
                show_id,
                user_id,
                seat_ids,
                created_at: now,
                expires_at: now + self.hold_duration,
                total_price_cents,
            })
            .await?;

        info!(
            "Booking {} holds {} seats of show {} for user {} until {}",
            booking.id,
            booking.seat_ids.len(),
            show_id,
            user_id,
            now + self.hold_duration
        );
        Ok(booking)
    }

    pub async fn confirm(
        &self,
        user_id: i64,
        booking_id: i64,
        payment_reference: Option<String>,
    ) -> Result<Booking, BookingError> {
        let booking = self.owned_booking(user_id, booking_id).await?;
        if !booking.status.can_transition_to(BookingStatus::Booked) {
            return Err(BookingError::InvalidTransition {
                id: booking_id,
                status: booking.status,
            });
        }

        let now = self.clock.now();
        if booking.expires_at.map_or(true, |at| at <= now) {
            return Err(BookingError::HoldExpired(booking_id));
        }

        let confirmed = self
            .ledger
            .change_status(
                booking_id,
                StatusChange {
                    from: BookingStatus::Initiated,
                    to: BookingStatus::Booked,
                    reserved_at: Some(now),
                    payment_reference,
                },
            )
            .await?
            .ok_or(BookingError::Conflict(booking_id))?;

        info!("Booking {} confirmed for user {}", booking_id, user_id);
        Ok(confirmed)
    }

    pub async fn cancel(&self, user_id: i64, booking_id: i64) -> Result<Booking, BookingError> {
        let booking = self.owned_booking(user_id, booking_id).await?;
        if !booking.status.can_transition_to(BookingStatus::Cancelled) {
            return Err(BookingError::InvalidTransition {
                id: booking_id,
                status: booking.status,
            });
        }

        let cancelled = self
            .ledger
            .change_status(
                booking_id,
                StatusChange {
                    from: booking.status,
                    to: BookingStatus::Cancelled,
                    reserved_at: None,
                    payment_reference: None,
                },
            )
            .await?
            .ok_or(BookingError::Conflict(booking_id))?;

        info!("Booking {} cancelled by user {}", booking_id, user_id);
        Ok(cancelled)
    }

    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<Booking>, BookingError> {
        Ok(self.ledger.bookings_for_user(user_id).await?)
    }

    // Someone else's booking is reported as missing
    async fn owned_booking(&self, user_id: i64, booking_id: i64) -> Result<Booking, BookingError> {
        match self.ledger.find_booking(booking_id).await? {
            Some(booking) if booking.user_id == user_id => Ok(booking),
            _ => Err(BookingError::NotFound(booking_id)),
        }
    }
}
