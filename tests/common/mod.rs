//! Shared fixtures: an in-memory SQLite database migrated with the real
//! migrations, plus helpers to seed cars, fleets, and rentals.
#![allow(dead_code)]

use std::path::PathBuf;

use chrono::{DateTime, Duration, TimeZone, Utc};
use migration::{Migrator, MigratorTrait};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use uuid::Uuid;

use driver_dispatch::models::cars;
use driver_dispatch::models::driver_assignments::{self, ApproveAssignment};
use driver_dispatch::models::rentals::{self, NewRental};
use driver_dispatch::services::{fleet, rentals as rental_service};

/// Fresh database per test. A single pooled connection keeps the in-memory
/// database alive and serializes transactions.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// File-backed database behind several pooled connections, so transactions
/// really overlap. The database files are removed on drop.
pub struct SharedDb {
    pub db: DatabaseConnection,
    path: PathBuf,
}

impl Drop for SharedDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm", "-journal"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", self.path.display()));
        }
    }
}

pub async fn setup_shared_db(connections: u32) -> SharedDb {
    let path = std::env::temp_dir().join(format!("driver-dispatch-{}.db", Uuid::new_v4()));
    let mut options = ConnectOptions::new(format!("sqlite://{}?mode=rwc", path.display()));
    options
        .max_connections(connections)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to open database file");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    SharedDb { db, path }
}

/// Monday 2 Nov 2026, 08:00 UTC.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 11, 2, 8, 0, 0).unwrap()
}

pub async fn insert_car(db: &DatabaseConnection, owner_id: Uuid) -> cars::Model {
    cars::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(owner_id),
        name: Set("Toyota Innova".to_string()),
    }
    .insert(db)
    .await
    .expect("Failed to insert car")
}

pub async fn hire_driver(
    db: &DatabaseConnection,
    owner_id: Uuid,
    daily_driver_fee: Decimal,
) -> driver_assignments::Model {
    fleet::approve_assignment(
        db,
        owner_id,
        ApproveAssignment {
            driver_id: Uuid::new_v4(),
            daily_driver_fee,
        },
    )
    .await
    .expect("Failed to approve driver")
}

/// Booking request for a driven rental of `hours` hours.
pub fn driven_booking(
    car_id: Uuid,
    hours: i64,
    estimated_rate: Option<Decimal>,
    total_price: Decimal,
) -> NewRental {
    NewRental {
        car_id,
        customer_id: Uuid::new_v4(),
        start_date: base_time(),
        end_date: base_time() + Duration::hours(hours),
        requires_driver: true,
        estimated_driver_fee: estimated_rate,
        total_price,
        driver_id: None,
    }
}

pub async fn book(db: &DatabaseConnection, input: NewRental) -> rentals::Model {
    rental_service::register_rental(db, input)
        .await
        .expect("Failed to register rental")
}
