pub mod user;
pub mod show;
pub mod booking;
pub mod payment;

pub use user::User;
pub use show::{ParkingTerms, Show, ShowSummary, ShowVenue};
pub use booking::{Booking, BookingDetails, BookingSeat, BookingStatus, VehicleType};
pub use payment::{Payment, PaymentStatus};
