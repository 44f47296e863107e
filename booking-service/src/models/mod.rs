mod booking;
mod principal;
mod room;

pub use booking::{Booking, BookingDetails, BookingStatus, PaymentMethod, PaymentStatus};
pub use principal::{Principal, Role};
pub use room::{Room, RoomStatus};
