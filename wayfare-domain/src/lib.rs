pub mod booking;
pub mod identity;
pub mod tour;
pub mod trip;

pub use booking::{
    Booking, BookingResponse, BookingStatus, CreateBookingRequest, Participant, PaymentStatus,
};
pub use identity::Caller;
pub use tour::Tour;
pub use trip::Trip;
