pub mod availability;
pub mod bookings;
pub mod hold_sweeper;

pub use availability::{AvailabilityError, SeatAvailabilityService};
pub use bookings::{BookingError, BookingService};
pub use hold_sweeper::HoldSweeper;
