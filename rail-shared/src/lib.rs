pub mod models;

pub use models::events::{BookingCancelledEvent, BookingConfirmedEvent, BookingEvent};
