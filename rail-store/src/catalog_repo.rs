use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rail_catalog::{NewTrain, Train};
use rail_core::repository::TrainCatalog;
use rail_core::{StoreError, StoreResult};
use serde_json::Value;
use sqlx::PgConnection;

use crate::database::{db_error, to_i32, to_u32, PgStore};

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct TrainRow {
    id: i64,
    train_no: String,
    name: String,
    source: String,
    destination: String,
    route: Option<String>,
    total_seats: i32,
    classes_json: Value,
    fare_json: Value,
    schedule_json: Value,
    created_at: DateTime<Utc>,
}

fn malformed(train_no: &str, field: &str, err: serde_json::Error) -> StoreError {
    StoreError::Backend(format!("train {} has malformed {}: {}", train_no, field, err))
}

impl TrainRow {
    fn into_train(self) -> StoreResult<Train> {
        let classes = serde_json::from_value(self.classes_json)
            .map_err(|e| malformed(&self.train_no, "classes_json", e))?;
        let fares = serde_json::from_value(self.fare_json)
            .map_err(|e| malformed(&self.train_no, "fare_json", e))?;

        Ok(Train {
            id: self.id,
            train_no: self.train_no,
            name: self.name,
            source: self.source,
            destination: self.destination,
            route: self.route.unwrap_or_default(),
            total_seats: to_u32(self.total_seats)?,
            classes,
            fares,
            schedule: self.schedule_json,
            created_at: self.created_at,
        })
    }
}

const TRAIN_COLUMNS: &str = "id, train_no, name, source, destination, route, total_seats, \
    classes_json, fare_json, schedule_json, created_at";

fn json<T: serde::Serialize>(value: &T) -> StoreResult<Value> {
    serde_json::to_value(value).map_err(|e| StoreError::Backend(e.to_string()))
}

pub async fn fetch_train(conn: &mut PgConnection, id: i64) -> StoreResult<Option<Train>> {
    let sql = format!("SELECT {} FROM trains WHERE id = $1", TRAIN_COLUMNS);
    let row: Option<TrainRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error)?;

    row.map(TrainRow::into_train).transpose()
}

#[async_trait]
impl TrainCatalog for PgStore {
    async fn add_train(&self, train: NewTrain) -> StoreResult<Train> {
        let row: TrainRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO trains (train_no, name, source, destination, route, total_seats,
                                classes_json, fare_json, schedule_json)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            TRAIN_COLUMNS
        ))
        .bind(&train.train_no)
        .bind(&train.name)
        .bind(&train.source)
        .bind(&train.destination)
        .bind(&train.route)
        .bind(to_i32(train.total_seats)?)
        .bind(json(&train.classes)?)
        .bind(json(&train.fares)?)
        .bind(&train.schedule)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        row.into_train()
    }

    async fn list_trains(&self) -> StoreResult<Vec<Train>> {
        let sql = format!("SELECT {} FROM trains ORDER BY id", TRAIN_COLUMNS);
        let rows: Vec<TrainRow> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.into_iter().map(TrainRow::into_train).collect()
    }
}
