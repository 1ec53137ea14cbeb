pub mod property;
pub mod reservation;
pub mod review;

pub use property::Property;
pub use reservation::{
    CancellationRecord, GuestCounts, PaymentRecord, PaymentStatus, PricingSnapshot, Reservation,
    ReservationStatus,
};
pub use review::Review;
