//! Seat availability for a show.
//!
//! Combines the auditorium layout, the show's price table and the booking
//! ledger into one status per seat. The result is a snapshot taken without
//! any lock: a booking written or expiring between the two reads may or may
//! not be reflected, and callers must treat the view as advisory.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::models::{
    AuditoriumView, BookStatus, BookingStatus, SeatClaim, SeatView, ShowCatalogEntry,
    ShowSeatView,
};
use crate::store::{BookingLedger, ShowCatalog, StoreError};

#[derive(Debug, Error)]
pub enum AvailabilityError {
    #[error("show {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a single claim contributes to its seat at `now`, if anything.
pub fn claim_status(claim: &SeatClaim, now: DateTime<Utc>) -> Option<BookStatus> {
    match claim.status {
        BookingStatus::Booked => Some(BookStatus::Booked),
        // strictly after: a hold expiring this instant no longer blocks
        BookingStatus::Initiated => match claim.expires_at {
            Some(expires_at) if expires_at > now => Some(BookStatus::Held),
            Some(_) => None,
            None => {
                warn!(
                    "Booking {} is INITIATED without an expiry; ignoring its claim",
                    claim.booking_id
                );
                None
            }
        },
        BookingStatus::Cancelled | BookingStatus::Expired | BookingStatus::Refunded => None,
    }
}

/// Folds claims into a status per claimed seat. Seats missing from the map
/// are available. The fold keeps the strongest status seen, so the result does
/// not depend on claim order and a booked seat never reads as held.
pub fn seat_statuses(claims: &[SeatClaim], now: DateTime<Utc>) -> HashMap<i64, BookStatus> {
    let mut statuses = HashMap::with_capacity(claims.len());
    for claim in claims {
        let Some(status) = claim_status(claim, now) else {
            continue;
        };
        statuses
            .entry(claim.seat_id)
            .and_modify(|current: &mut BookStatus| *current = (*current).max(status))
            .or_insert(status);
    }
    statuses
}

/// Annotates every seat of the show with its price and status.
pub fn build_seat_view(
    entry: ShowCatalogEntry,
    claims: &[SeatClaim],
    now: DateTime<Utc>,
) -> ShowSeatView {
    let statuses = seat_statuses(claims, now);

    let seats: Vec<SeatView> = {
        // First entry wins if a seat type is listed twice
        let mut prices: HashMap<&str, i64> = HashMap::with_capacity(entry.prices.len());
        for price in &entry.prices {
            prices.entry(price.seat_type.as_str()).or_insert(price.price_cents);
        }

        entry
            .seats
            .iter()
            .map(|seat| SeatView {
                id: seat.id,
                row: seat.row.clone(),
                number: seat.number,
                seat_type: seat.seat_type.clone(),
                row_offset: seat.row_offset,
                column_offset: seat.column_offset,
                price_cents: prices.get(seat.seat_type.as_str()).copied(),
                book_status: statuses
                    .get(&seat.id)
                    .copied()
                    .unwrap_or(BookStatus::Available),
            })
            .collect()
    };

    ShowSeatView {
        id: entry.show.id,
        movie_id: entry.show.movie_id,
        start_at: entry.show.start_at,
        auditorium_id: entry.show.auditorium_id,
        auditorium: AuditoriumView {
            id: entry.auditorium.id,
            name: entry.auditorium.name,
            cinema_id: entry.auditorium.cinema_id,
            seats,
        },
        seat_prices: entry.prices,
    }
}

#[derive(Clone)]
pub struct SeatAvailabilityService {
    catalog: Arc<dyn ShowCatalog>,
    ledger: Arc<dyn BookingLedger>,
    clock: Arc<dyn Clock>,
}

impl SeatAvailabilityService {
    pub fn new(
        catalog: Arc<dyn ShowCatalog>,
        ledger: Arc<dyn BookingLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            ledger,
            clock,
        }
    }

    pub async fn resolve(&self, show_id: i64) -> Result<ShowSeatView, AvailabilityError> {
        if show_id <= 0 {
            return Err(AvailabilityError::NotFound(show_id));
        }

        let now = self.clock.now();
        // Independent reads; no ordering between them is relied upon
        let (entry, claims) = tokio::try_join!(
            self.catalog.load_show(show_id),
            self.ledger.active_claims(show_id, now)
        )?;

        let entry = entry.ok_or(AvailabilityError::NotFound(show_id))?;
        debug!(
            "Resolving {} seats against {} claims for show {}",
            entry.seats.len(),
            claims.len(),
            show_id
        );
        Ok(build_seat_view(entry, &claims, now))
    }
}
