pub mod models;
pub mod refund;
pub mod repository;
pub mod payment;
pub mod pnr;

use models::LedgerKey;
use rail_catalog::CatalogError;

/// Persistence-level failures reported by a store or unit of work.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum StoreError {
    /// Lock or transaction could not be obtained in time; safe to retry.
    #[error("Store contention: {0}")]
    Contention(String),
    #[error("Constraint violated: {0}")]
    Constraint(String),
    #[error("Store failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Insufficient seats: requested {requested}, available {available}")]
    InsufficientInventory { requested: u32, available: u32 },
    #[error("No seat inventory tracked for {0}")]
    UnknownInventoryKey(LedgerKey),
    #[error("Booking {0} is already cancelled")]
    AlreadyCancelled(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Payment declined: {0}")]
    PaymentDeclined(String),
    #[error("Payment gateway failure: {0}")]
    PaymentGateway(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BookingError {
    /// Whether the caller may simply retry the same request.
    pub fn is_transient(&self) -> bool {
        matches!(self, BookingError::Store(StoreError::Contention(_)))
    }
}

impl From<CatalogError> for BookingError {
    fn from(err: CatalogError) -> Self {
        BookingError::Configuration(err.to_string())
    }
}

pub type BookingResult<T> = Result<T, BookingError>;

pub use models::{
    Booking, BookingStatus, DailyBookingSummary, Payment, PaymentRecordStatus, PaymentStatus,
    Requester, SeatAvailability,
};
