//! Cancellation refund policy.
//!
//! The refund is a fixed share of the fare snapshot, chosen by how many whole
//! days remain before the travel date:
//!
//! | days before travel | refund |
//! |--------------------|--------|
//! | more than 3        | 90%    |
//! | 1 to 3             | 50%    |
//! | less than 1        | 25%    |
//!
//! Cancelling after the travel date gives a negative day count and lands in
//! the last tier.

use chrono::NaiveDate;
use rail_catalog::money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundTier {
    Early,
    Standard,
    LastMinute,
}

impl RefundTier {
    pub fn for_days_before(days_before: i64) -> Self {
        if days_before > 3 {
            RefundTier::Early
        } else if days_before >= 1 {
            RefundTier::Standard
        } else {
            RefundTier::LastMinute
        }
    }

    /// Share of the fare returned, as a fraction (0.90, 0.50, 0.25).
    pub fn percentage(&self) -> Decimal {
        match self {
            RefundTier::Early => Decimal::new(90, 2),
            RefundTier::Standard => Decimal::new(50, 2),
            RefundTier::LastMinute => Decimal::new(25, 2),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RefundQuote {
    pub tier: RefundTier,
    pub percentage: Decimal,
    pub days_before: i64,
    pub amount: Decimal,
}

pub fn quote(total_fare: Decimal, travel_date: NaiveDate, cancel_date: NaiveDate) -> RefundQuote {
    let days_before = (travel_date - cancel_date).num_days();
    let tier = RefundTier::for_days_before(days_before);
    let percentage = tier.percentage();

    RefundQuote {
        tier,
        percentage,
        days_before,
        amount: money(total_fare * percentage),
    }
}

pub fn refund(total_fare: Decimal, travel_date: NaiveDate, cancel_date: NaiveDate) -> Decimal {
    quote(total_fare, travel_date, cancel_date).amount
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn travel() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 12, 15).unwrap()
    }

    fn days_ahead(days: i64) -> NaiveDate {
        travel() - Duration::days(days)
    }

    #[test]
    fn test_tiers_on_1000() {
        assert_eq!(refund(dec!(1000.00), travel(), days_ahead(4)), dec!(900.00));
        assert_eq!(refund(dec!(1000.00), travel(), days_ahead(2)), dec!(500.00));
        assert_eq!(refund(dec!(1000.00), travel(), days_ahead(0)), dec!(250.00));
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(RefundTier::for_days_before(4), RefundTier::Early);
        assert_eq!(RefundTier::for_days_before(3), RefundTier::Standard);
        assert_eq!(RefundTier::for_days_before(1), RefundTier::Standard);
        assert_eq!(RefundTier::for_days_before(0), RefundTier::LastMinute);
    }

    #[test]
    fn test_after_travel_is_last_minute() {
        let q = quote(dec!(1000.00), travel(), travel() + Duration::days(2));
        assert_eq!(q.days_before, -2);
        assert_eq!(q.tier, RefundTier::LastMinute);
        assert_eq!(q.amount, dec!(250.00));
    }

    #[test]
    fn test_amount_is_rounded_to_paise() {
        // 333.33 * 0.25 = 83.3325
        let q = quote(dec!(333.33), travel(), days_ahead(0));
        assert_eq!(q.amount, dec!(83.33));
        assert_eq!(q.amount.scale(), 2);

        // 0.90 * 1234.55 = 1111.095 -> half-even -> 1111.10
        assert_eq!(refund(dec!(1234.55), travel(), days_ahead(10)), dec!(1111.10));
        // 0.50 * 0.25 = 0.125 -> half-even -> 0.12
        assert_eq!(refund(dec!(0.25), travel(), days_ahead(2)), dec!(0.12));
    }

    #[test]
    fn test_same_inputs_same_output() {
        let a = quote(dec!(5000.00), travel(), days_ahead(5));
        let b = quote(dec!(5000.00), travel(), days_ahead(5));
        assert_eq!(a, b);
        assert_eq!(a.amount, dec!(4500.00));
        assert_eq!(a.percentage, dec!(0.90));
    }
}
