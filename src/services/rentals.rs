use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use uuid::Uuid;

use crate::db::cars as car_db;
use crate::db::driver_assignments as assignment_db;
use crate::db::rentals as rental_db;
use crate::error::{CoreError, CoreResult};
use crate::lifecycle;
use crate::models::rentals::{self, NewRental, StatusAction};
use crate::pricing::fees::RentalPeriod;

/// Accept a rental from the booking flow.
///
/// When the customer picked a driver directly, that driver must drive for
/// the car's owner and still has to accept once the rental is confirmed.
pub async fn register_rental(
    db: &DatabaseConnection,
    input: NewRental,
) -> CoreResult<rentals::Model> {
    RentalPeriod::new(input.start_date, input.end_date)?;

    if input.total_price < Decimal::ZERO {
        return Err(CoreError::Validation(format!(
            "total price must not be negative, got {}",
            input.total_price
        )));
    }
    if !input.requires_driver
        && (input.estimated_driver_fee.is_some() || input.driver_id.is_some())
    {
        return Err(CoreError::Validation(
            "driver details given for a rental that does not require a driver".to_string(),
        ));
    }
    if let Some(rate) = input.estimated_driver_fee {
        if rate <= Decimal::ZERO {
            return Err(CoreError::Validation(format!(
                "estimated driver fee must be positive, got {rate}"
            )));
        }
    }

    let car = car_db::get_car_by_id(db, input.car_id)
        .await?
        .ok_or_else(|| CoreError::not_found("car", input.car_id))?;

    if let Some(driver_id) = input.driver_id {
        let assignment = assignment_db::get_active_assignment_for_driver(db, driver_id)
            .await?
            .ok_or(CoreError::NoActiveAssignment(driver_id))?;
        if assignment.car_owner_id != car.owner_id {
            return Err(CoreError::Validation(format!(
                "driver {driver_id} does not drive for the owner of car {}",
                car.id
            )));
        }
    }

    let rental = rental_db::insert_rental(db, input, Utc::now()).await?;
    tracing::info!(rental_id = %rental.id, requires_driver = rental.requires_driver, "rental registered");
    Ok(rental)
}

/// Fetch a single rental.
pub async fn get_rental(db: &DatabaseConnection, id: Uuid) -> CoreResult<rentals::Model> {
    rental_db::get_rental_by_id(db, id)
        .await?
        .ok_or_else(|| CoreError::not_found("rental", id))
}

/// Move the rental along `Pending -> Confirmed -> Active -> Completed`,
/// or to one of the `Overdue` / `Cancelled` branches.
pub async fn change_status(
    db: &DatabaseConnection,
    rental_id: Uuid,
    action: StatusAction,
) -> CoreResult<rentals::Model> {
    let rental = transition(db, rental_id, |rental, now| {
        lifecycle::advance(rental, action, now)
    })
    .await?;

    tracing::info!(%rental_id, status = ?rental.status, "rental status changed");
    Ok(rental)
}

/// Rentals currently held by the driver, newest first.
pub async fn rentals_for_driver(
    db: &DatabaseConnection,
    driver_id: Uuid,
) -> CoreResult<Vec<rentals::Model>> {
    Ok(rental_db::get_rentals_by_driver(db, driver_id).await?)
}

/// The assigned driver accepts the rental at their fleet fee.
///
/// The driver must still drive for the car's owner. Their daily fee becomes
/// the rental's actual driver fee and the total is repriced in the same
/// transaction.
pub async fn accept_rental(
    db: &DatabaseConnection,
    rental_id: Uuid,
    driver_id: Uuid,
) -> CoreResult<rentals::Model> {
    let txn = db.begin().await?;

    let assignment = assignment_db::get_active_assignment_for_driver(&txn, driver_id)
        .await?
        .ok_or(CoreError::NoActiveAssignment(driver_id))?;
    let current = rental_db::get_rental_by_id(&txn, rental_id)
        .await?
        .ok_or_else(|| CoreError::not_found("rental", rental_id))?;
    let car = car_db::get_car_by_id(&txn, current.car_id)
        .await?
        .ok_or_else(|| CoreError::not_found("car", current.car_id))?;
    if car.owner_id != assignment.car_owner_id {
        return Err(CoreError::NotAuthorizedForOwner {
            driver_id,
            rental_id,
        });
    }

    let rate = assignment.daily_driver_fee;
    let rental = apply(&txn, rental_id, |rental, now| {
        lifecycle::accept(rental, driver_id, rate, now).map(|(change, _)| change)
    })
    .await?;
    txn.commit().await?;

    tracing::info!(
        %rental_id,
        %driver_id,
        fee = %rate,
        total = %rental.total_price,
        "driver accepted rental"
    );
    Ok(rental)
}

/// The assigned driver turns the rental down; it goes back to the open pool.
pub async fn reject_rental(
    db: &DatabaseConnection,
    rental_id: Uuid,
    driver_id: Uuid,
    reason: &str,
) -> CoreResult<rentals::Model> {
    let rental = transition(db, rental_id, |rental, now| {
        lifecycle::reject(rental, driver_id, reason, now)
    })
    .await?;

    tracing::info!(%rental_id, %driver_id, "driver rejected rental");
    Ok(rental)
}

/// Read, plan, and write one rental change in a transaction.
async fn transition<F>(db: &DatabaseConnection, rental_id: Uuid, plan: F) -> CoreResult<rentals::Model>
where
    F: FnOnce(&rentals::Model, DateTime<Utc>) -> CoreResult<rentals::ActiveModel>,
{
    let txn = db.begin().await?;
    let rental = apply(&txn, rental_id, plan).await?;
    txn.commit().await?;
    Ok(rental)
}

async fn apply<C, F>(db: &C, rental_id: Uuid, plan: F) -> CoreResult<rentals::Model>
where
    C: ConnectionTrait,
    F: FnOnce(&rentals::Model, DateTime<Utc>) -> CoreResult<rentals::ActiveModel>,
{
    let rental = rental_db::get_rental_by_id(db, rental_id)
        .await?
        .ok_or_else(|| CoreError::not_found("rental", rental_id))?;

    let change = plan(&rental, Utc::now())?;

    if !rental_db::update_if_version(db, rental_id, rental.version, change).await? {
        return Err(CoreError::InvalidState(format!(
            "rental {rental_id} was modified concurrently; reload and retry"
        )));
    }

    rental_db::get_rental_by_id(db, rental_id)
        .await?
        .ok_or_else(|| CoreError::not_found("rental", rental_id))
}
