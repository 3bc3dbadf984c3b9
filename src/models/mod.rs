pub mod booking;
pub mod seat;
pub mod seat_view;
pub mod show;
pub mod user;

pub use booking::{Booking, BookingStatus, NewBooking, SeatClaim, StatusChange};
pub use seat::Seat;
pub use seat_view::{AuditoriumView, BookStatus, SeatView, ShowSeatView};
pub use show::{Auditorium, SeatPrice, Show, ShowCatalogEntry};
pub use user::User;
