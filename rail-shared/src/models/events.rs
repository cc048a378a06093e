use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct BookingConfirmedEvent {
    pub booking_id: Uuid,
    pub pnr: String,
    pub user_id: String,
    pub train_id: i64,
    pub travel_date: NaiveDate,
    pub class: String,
    pub seat_count: u32,
    pub total_fare: Decimal,
    pub seats_left: u32,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct BookingCancelledEvent {
    pub booking_id: Uuid,
    pub pnr: String,
    pub train_id: i64,
    pub travel_date: NaiveDate,
    pub class: String,
    pub seat_count: u32,
    pub refund_amount: Decimal,
    pub seats_left: u32,
    pub timestamp: i64,
}

/// Published after the unit of work that produced it has committed.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BookingEvent {
    Confirmed(BookingConfirmedEvent),
    Cancelled(BookingCancelledEvent),
}

impl BookingEvent {
    pub fn pnr(&self) -> &str {
        match self {
            BookingEvent::Confirmed(e) => &e.pnr,
            BookingEvent::Cancelled(e) => &e.pnr,
        }
    }

    pub fn train_id(&self) -> i64 {
        match self {
            BookingEvent::Confirmed(e) => e.train_id,
            BookingEvent::Cancelled(e) => e.train_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_is_tagged_by_type() {
        let event = BookingEvent::Cancelled(BookingCancelledEvent {
            booking_id: Uuid::new_v4(),
            pnr: "AB12CD34EF".to_string(),
            train_id: 7,
            travel_date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
            class: "AC".to_string(),
            seat_count: 2,
            refund_amount: Decimal::new(450000, 2),
            seats_left: 100,
            timestamp: 0,
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "cancelled");
        assert_eq!(value["refund_amount"], "4500.00");
        assert_eq!(value["travel_date"], "2026-11-02");
        assert_eq!(event.pnr(), "AB12CD34EF");
        assert_eq!(event.train_id(), 7);
    }
}
