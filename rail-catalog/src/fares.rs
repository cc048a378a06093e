use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CatalogError, Train};

/// Fare snapshot taken at booking time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FareQuote {
    pub fare_per_seat: Decimal,
    pub total_fare: Decimal,
}

/// Rounds to whole paise (2 dp, half-even) and pins the scale at 2.
pub fn money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp(2);
    rounded.rescale(2);
    rounded
}

impl Train {
    pub fn fare_per_seat(&self, class: &str) -> Result<Decimal, CatalogError> {
        self.fares
            .get(class)
            .copied()
            .map(money)
            .ok_or_else(|| CatalogError::MissingFare {
                train_no: self.train_no.clone(),
                class: class.to_string(),
            })
    }

    pub fn quote(&self, class: &str, seat_count: u32) -> Result<FareQuote, CatalogError> {
        let fare_per_seat = self.fare_per_seat(class)?;
        let total_fare = fare_per_seat
            .checked_mul(Decimal::from(seat_count))
            .ok_or(CatalogError::FareOverflow { seat_count })?;

        Ok(FareQuote {
            fare_per_seat,
            total_fare: money(total_fare),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NewTrain;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn express_alpha() -> Train {
        NewTrain {
            train_no: "IR-001".to_string(),
            name: "Express Alpha".to_string(),
            source: "Delhi".to_string(),
            destination: "Mumbai".to_string(),
            route: String::new(),
            total_seats: 500,
            classes: BTreeMap::from([("AC".to_string(), 100)]),
            fares: BTreeMap::from([
                ("AC".to_string(), dec!(2500)),
                ("General".to_string(), dec!(499.995)),
            ]),
            schedule: serde_json::Value::Null,
        }
        .into_train(1, Utc::now())
    }

    #[test]
    fn test_quote_multiplies_per_seat_fare() {
        let quote = express_alpha().quote("AC", 2).unwrap();
        assert_eq!(quote.fare_per_seat, dec!(2500.00));
        assert_eq!(quote.total_fare, dec!(5000.00));
        assert_eq!(quote.total_fare.to_string(), "5000.00");
    }

    #[test]
    fn test_fare_rounding_is_half_even() {
        // 499.995 -> 500.00 (the 9 before the 5 is odd, so it rounds up)
        assert_eq!(express_alpha().fare_per_seat("General").unwrap(), dec!(500.00));
        assert_eq!(money(dec!(0.125)), dec!(0.12));
        assert_eq!(money(dec!(0.135)), dec!(0.14));
    }

    #[test]
    fn test_missing_fare_is_reported() {
        let err = express_alpha().quote("Sleeper", 1).unwrap_err();
        assert!(matches!(err, CatalogError::MissingFare { .. }));
    }
}
