pub mod cache;
pub mod clock;
pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;

use axum::{routing::get, Router};
use std::sync::Arc;

use clock::Clock;
use config::BookingConfig;
use services::{BookingService, SeatAvailabilityService};
use store::{BookingLedger, ShowCatalog, UserDirectory};

// Shared state for every request handler
pub struct AppState {
    pub availability: SeatAvailabilityService,
    pub bookings: BookingService,
    pub users: Arc<dyn UserDirectory>,
}

impl AppState {
    pub fn new(
        catalog: Arc<dyn ShowCatalog>,
        ledger: Arc<dyn BookingLedger>,
        users: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
        booking: &BookingConfig,
    ) -> Arc<Self> {
        let availability = SeatAvailabilityService::new(catalog, ledger.clone(), clock.clone());
        let bookings = BookingService::new(availability.clone(), ledger, clock, booking);
        Arc::new(Self {
            availability,
            bookings,
            users,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Cinema Booking API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state)
}
