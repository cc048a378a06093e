pub mod ledger;
pub mod service;

pub use service::{BookingPolicy, BookingService, Cancellation, NewBooking};
