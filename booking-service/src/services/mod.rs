pub mod clock;
pub mod conflict;
pub mod gateway;
pub mod manager;
pub mod memory;
pub mod metrics;
pub mod repository;
pub mod stripe;

pub use clock::{Clock, FixedClock, SystemClock};
pub use conflict::{find_conflict, ranges_conflict};
pub use gateway::{GatewayError, IntentMetadata, PaymentGateway, PaymentIntent};
pub use manager::{BookingManager, CreatedBooking};
pub use memory::{InMemoryBookingStore, InMemoryRoomStore};
pub use metrics::{get_metrics, init_metrics};
pub use repository::{BookingStore, MongoBookingRepository, MongoRoomRepository, RoomStore};
pub use stripe::StripeClient;
