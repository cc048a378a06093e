pub mod train;
pub mod capacity;
pub mod fares;

pub use train::{NewTrain, Train};
pub use fares::{money, FareQuote};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CatalogError {
    #[error("Train {train_no} has no seat capacity configured for class {class}")]
    MissingCapacity { train_no: String, class: String },

    #[error("Train {train_no} has no fare configured for class {class}")]
    MissingFare { train_no: String, class: String },

    #[error("Fare overflow for {seat_count} seats")]
    FareOverflow { seat_count: u32 },
}
