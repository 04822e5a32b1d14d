use chrono::{DateTime, Utc};
use sea_orm::*;
use uuid::Uuid;

use crate::models::rentals::{self, DriverDecision, NewRental, RentalStatus};

/// Insert a rental coming from the booking flow (always `Pending`).
pub async fn insert_rental<C: ConnectionTrait>(
    db: &C,
    input: NewRental,
    now: DateTime<Utc>,
) -> Result<rentals::Model, DbErr> {
    let new_rental = rentals::ActiveModel {
        id: Set(Uuid::new_v4()),
        car_id: Set(input.car_id),
        customer_id: Set(input.customer_id),
        start_date: Set(input.start_date),
        end_date: Set(input.end_date),
        status: Set(RentalStatus::Pending),
        requires_driver: Set(input.requires_driver),
        driver_id: Set(input.driver_id),
        driver_assigned_at: Set(input.driver_id.map(|_| now)),
        driver_decision: Set(DriverDecision::Undecided),
        estimated_driver_fee: Set(input.estimated_driver_fee),
        actual_driver_fee: Set(None),
        total_price: Set(input.total_price),
        notes: Set(None),
        version: Set(0),
        created_at: Set(now),
        updated_at: Set(None),
    };

    new_rental.insert(db).await
}

/// Fetch a single rental by ID.
pub async fn get_rental_by_id<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<Option<rentals::Model>, DbErr> {
    rentals::Entity::find_by_id(id).one(db).await
}

/// Rentals currently held by a driver, newest first.
pub async fn get_rentals_by_driver<C: ConnectionTrait>(
    db: &C,
    driver_id: Uuid,
) -> Result<Vec<rentals::Model>, DbErr> {
    rentals::Entity::find()
        .filter(rentals::Column::DriverId.eq(driver_id))
        .order_by_desc(rentals::Column::StartDate)
        .all(db)
        .await
}

/// Unclaimed, pending, driver-required rentals for the given cars, oldest first.
pub async fn get_open_jobs<C: ConnectionTrait>(
    db: &C,
    car_ids: Vec<Uuid>,
) -> Result<Vec<rentals::Model>, DbErr> {
    if car_ids.is_empty() {
        return Ok(Vec::new());
    }

    rentals::Entity::find()
        .filter(rentals::Column::CarId.is_in(car_ids))
        .filter(rentals::Column::RequiresDriver.eq(true))
        .filter(rentals::Column::DriverId.is_null())
        .filter(rentals::Column::Status.eq(RentalStatus::Pending))
        .order_by_asc(rentals::Column::StartDate)
        .order_by_asc(rentals::Column::CreatedAt)
        .all(db)
        .await
}

/// Write `change` only if the row still carries `expected_version`.
///
/// Returns `false` when another writer got there first.
pub async fn update_if_version<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    expected_version: i32,
    change: rentals::ActiveModel,
) -> Result<bool, DbErr> {
    let result = rentals::Entity::update_many()
        .set(change)
        .filter(rentals::Column::Id.eq(id))
        .filter(rentals::Column::Version.eq(expected_version))
        .exec(db)
        .await?;

    Ok(result.rows_affected == 1)
}

/// Compare-and-swap used by claims: the row must still be open
/// (no driver, `Pending`, driver required) and at `expected_version`.
///
/// Exactly one concurrent caller can see `true` for a given version.
pub async fn claim_if_open<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    expected_version: i32,
    change: rentals::ActiveModel,
) -> Result<bool, DbErr> {
    let result = rentals::Entity::update_many()
        .set(change)
        .filter(rentals::Column::Id.eq(id))
        .filter(rentals::Column::Version.eq(expected_version))
        .filter(rentals::Column::DriverId.is_null())
        .filter(rentals::Column::RequiresDriver.eq(true))
        .filter(rentals::Column::Status.eq(RentalStatus::Pending))
        .exec(db)
        .await?;

    Ok(result.rows_affected == 1)
}
