pub mod app_config;
pub mod database;
pub mod catalog_repo;
pub mod ledger_repo;
pub mod booking_repo;
pub mod unit_of_work;
pub mod memory;
pub mod seed;

pub use database::{DbClient, PgStore};
pub use memory::MemoryStore;
