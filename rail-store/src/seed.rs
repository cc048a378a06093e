use rail_catalog::{NewTrain, Train};
use rail_core::repository::TrainCatalog;
use rail_core::StoreResult;
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::info;

struct DemoTrain {
    train_no: &'static str,
    name: &'static str,
    source: &'static str,
    destination: &'static str,
    route: &'static str,
    total_seats: u32,
    // (class, seats, fare)
    classes: [(&'static str, u32, i64); 3],
    departure: &'static str,
    arrival: &'static str,
    duration: &'static str,
}

const DEMO_TRAINS: [DemoTrain; 5] = [
    DemoTrain {
        train_no: "IR-001",
        name: "Express Alpha",
        source: "Delhi",
        destination: "Mumbai",
        route: "Delhi -> Agra -> Indore -> Mumbai",
        total_seats: 500,
        classes: [("AC", 100, 2500), ("Sleeper", 200, 1500), ("General", 200, 500)],
        departure: "08:00",
        arrival: "20:00",
        duration: "12h",
    },
    DemoTrain {
        train_no: "IR-002",
        name: "Bangalore Express",
        source: "Mumbai",
        destination: "Bangalore",
        route: "Mumbai -> Pune -> Belgaum -> Bangalore",
        total_seats: 400,
        classes: [("AC", 80, 2000), ("Sleeper", 160, 1200), ("General", 160, 400)],
        departure: "10:00",
        arrival: "22:00",
        duration: "12h",
    },
    DemoTrain {
        train_no: "IR-003",
        name: "Chennai Express",
        source: "Delhi",
        destination: "Chennai",
        route: "Delhi -> Jaipur -> Hyderabad -> Chennai",
        total_seats: 450,
        classes: [("AC", 90, 3000), ("Sleeper", 180, 1800), ("General", 180, 600)],
        departure: "06:00",
        arrival: "18:00",
        duration: "12h",
    },
    DemoTrain {
        train_no: "IR-004",
        name: "Kolkata Express",
        source: "Mumbai",
        destination: "Kolkata",
        route: "Mumbai -> Nagpur -> Raipur -> Kolkata",
        total_seats: 380,
        classes: [("AC", 76, 2200), ("Sleeper", 152, 1400), ("General", 152, 450)],
        departure: "12:00",
        arrival: "00:00",
        duration: "12h",
    },
    DemoTrain {
        train_no: "IR-005",
        name: "Goa Express",
        source: "Bangalore",
        destination: "Goa",
        route: "Bangalore -> Hubli -> Goa",
        total_seats: 350,
        classes: [("AC", 70, 1500), ("Sleeper", 140, 900), ("General", 140, 300)],
        departure: "14:00",
        arrival: "23:00",
        duration: "9h",
    },
];

impl DemoTrain {
    fn to_new_train(&self) -> NewTrain {
        NewTrain {
            train_no: self.train_no.to_string(),
            name: self.name.to_string(),
            source: self.source.to_string(),
            destination: self.destination.to_string(),
            route: self.route.to_string(),
            total_seats: self.total_seats,
            classes: self.classes.iter().map(|(c, seats, _)| (c.to_string(), *seats)).collect(),
            fares: self
                .classes
                .iter()
                .map(|(c, _, fare)| (c.to_string(), Decimal::from(*fare)))
                .collect::<BTreeMap<_, _>>(),
            schedule: json!({
                "departure": self.departure,
                "arrival": self.arrival,
                "duration": self.duration,
            }),
        }
    }
}

/// Loads the demo trains unless the catalog already has trains.
pub async fn seed_demo_trains(catalog: &dyn TrainCatalog) -> StoreResult<Vec<Train>> {
    if !catalog.list_trains().await?.is_empty() {
        info!("Trains already exist. Skipping seed.");
        return Ok(Vec::new());
    }

    let mut added = Vec::with_capacity(DEMO_TRAINS.len());
    for demo in DEMO_TRAINS.iter() {
        added.push(catalog.add_train(demo.to_new_train()).await?);
    }
    info!("Seeded {} demo trains", added.len());
    Ok(added)
}
