use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A train in the catalog together with its per-class seating and fares.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Train {
    pub id: i64,
    pub train_no: String,
    pub name: String,
    pub source: String,
    pub destination: String,
    pub route: String,
    /// Last-resort capacity for classes missing from `classes`
    pub total_seats: u32,
    /// Seats per class, e.g. {"AC": 100, "Sleeper": 200}
    pub classes: BTreeMap<String, u32>,
    /// Per-seat fare per class
    pub fares: BTreeMap<String, Decimal>,
    /// Free-form timetable (departure / arrival / duration)
    pub schedule: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Payload for adding a train; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTrain {
    pub train_no: String,
    pub name: String,
    pub source: String,
    pub destination: String,
    #[serde(default)]
    pub route: String,
    #[serde(default)]
    pub total_seats: u32,
    #[serde(default)]
    pub classes: BTreeMap<String, u32>,
    #[serde(default)]
    pub fares: BTreeMap<String, Decimal>,
    #[serde(default)]
    pub schedule: serde_json::Value,
}

impl NewTrain {
    pub fn into_train(self, id: i64, created_at: DateTime<Utc>) -> Train {
        Train {
            id,
            train_no: self.train_no,
            name: self.name,
            source: self.source,
            destination: self.destination,
            route: self.route,
            total_seats: self.total_seats,
            classes: self.classes,
            fares: self.fares,
            schedule: self.schedule,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_train_keeps_payload() {
        let train = NewTrain {
            train_no: "IR-001".to_string(),
            name: "Express Alpha".to_string(),
            source: "Delhi".to_string(),
            destination: "Mumbai".to_string(),
            route: String::new(),
            total_seats: 500,
            classes: BTreeMap::from([("AC".to_string(), 100)]),
            fares: BTreeMap::new(),
            schedule: serde_json::json!({}),
        }
        .into_train(7, Utc::now());

        assert_eq!(train.id, 7);
        assert_eq!(train.train_no, "IR-001");
        assert_eq!(train.total_seats, 500);
        assert_eq!(train.classes.get("AC"), Some(&100));
    }

    #[test]
    fn test_new_train_accepts_numeric_fares() {
        let new: NewTrain = serde_json::from_value(serde_json::json!({
            "train_no": "IR-009",
            "name": "Southern Arrow",
            "source": "Bangalore",
            "destination": "Chennai",
            "classes": {"AC": 70},
            "fares": {"AC": 1100}
        }))
        .unwrap();

        assert_eq!(new.fares.get("AC"), Some(&Decimal::from(1100)));
        assert_eq!(new.total_seats, 0);
    }
}
