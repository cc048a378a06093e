use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifies one inventory counter: (train, travel date, fare class).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerKey {
    pub train_id: i64,
    pub travel_date: NaiveDate,
    pub class: String,
}

impl LedgerKey {
    pub fn new(train_id: i64, travel_date: NaiveDate, class: impl Into<String>) -> Self {
        Self {
            train_id,
            travel_date,
            class: class.into(),
        }
    }
}

impl fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "train {} on {} class {}", self.train_id, self.travel_date, self.class)
    }
}

/// Remaining vs. configured seats for one ledger key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatAvailability {
    pub key: LedgerKey,
    pub seats_left: u32,
    pub seats_total: u32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    PendingPayment,
    Confirmed,
    Cancelled,
}

/// Payment state as seen from the booking.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

/// Status of a payment row recorded against a booking.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentRecordStatus {
    Pending,
    Success,
    Failed,
    Refunded,
}

macro_rules! status_strings {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(format!("unknown {} '{}'", stringify!($ty), other)),
                }
            }
        }
    };
}

status_strings!(BookingStatus {
    PendingPayment => "PENDING_PAYMENT",
    Confirmed => "CONFIRMED",
    Cancelled => "CANCELLED",
});

status_strings!(PaymentStatus {
    Pending => "PENDING",
    Paid => "PAID",
    Refunded => "REFUNDED",
});

status_strings!(PaymentRecordStatus {
    Pending => "PENDING",
    Success => "SUCCESS",
    Failed => "FAILED",
    Refunded => "REFUNDED",
});

/// A reservation of `seat_count` seats on one ledger key.
///
/// The fare snapshot is fixed at creation and survives cancellation so the
/// refund is always computed from what was actually charged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub pnr: String,
    pub user_id: String,
    pub train_id: i64,
    pub travel_date: NaiveDate,
    pub class: String,
    pub seat_count: u32,
    pub fare_per_seat: Decimal,
    pub total_fare: Decimal,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub refund_amount: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Booking {
    pub fn new(
        pnr: String,
        user_id: String,
        key: &LedgerKey,
        seat_count: u32,
        fare_per_seat: Decimal,
        total_fare: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            pnr,
            user_id,
            train_id: key.train_id,
            travel_date: key.travel_date,
            class: key.class.clone(),
            seat_count,
            fare_per_seat,
            total_fare,
            status: BookingStatus::PendingPayment,
            payment_status: PaymentStatus::Pending,
            refund_amount: None,
            created_at: Utc::now(),
            cancelled_at: None,
        }
    }

    /// The key this booking's seats were reserved on, for release.
    pub fn ledger_key(&self) -> LedgerKey {
        LedgerKey::new(self.train_id, self.travel_date, self.class.clone())
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == BookingStatus::Cancelled
    }

    pub fn is_visible_to(&self, requester: &Requester) -> bool {
        requester.is_admin || requester.user_id == self.user_id
    }

    /// Payment captured: PENDING_PAYMENT -> CONFIRMED.
    pub fn confirm(&mut self) {
        self.status = BookingStatus::Confirmed;
        self.payment_status = PaymentStatus::Paid;
    }

    pub fn cancel(&mut self, refund_amount: Decimal, at: DateTime<Utc>) {
        self.status = BookingStatus::Cancelled;
        self.payment_status = PaymentStatus::Refunded;
        self.refund_amount = Some(refund_amount);
        self.cancelled_at = Some(at);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub provider: String,
    pub provider_payment_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentRecordStatus,
    pub created_at: DateTime<Utc>,
}

/// Whoever is acting on a booking: its owner, another user, or an admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub user_id: String,
    pub is_admin: bool,
}

impl Requester {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            is_admin: false,
        }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            is_admin: true,
        }
    }
}

/// One row of the admin daily report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBookingSummary {
    pub date: NaiveDate,
    pub bookings: u64,
    pub revenue: Decimal,
}
