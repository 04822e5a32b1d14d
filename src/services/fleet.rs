//! Driver fleet membership (`DriverAssignment`).

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};
use uuid::Uuid;

use crate::db::driver_assignments as assignment_db;
use crate::error::{CoreError, CoreResult};
use crate::models::driver_assignments::{self, ApproveAssignment};
use crate::services::{is_unique_violation, is_write_conflict};

/// Add a driver to a car owner's fleet after their onboarding was approved.
pub async fn approve_assignment(
    db: &DatabaseConnection,
    car_owner_id: Uuid,
    input: ApproveAssignment,
) -> CoreResult<driver_assignments::Model> {
    if input.daily_driver_fee <= Decimal::ZERO {
        return Err(CoreError::Validation(format!(
            "daily driver fee must be positive, got {}",
            input.daily_driver_fee
        )));
    }
    if input.driver_id == car_owner_id {
        return Err(CoreError::Validation(
            "a car owner cannot be their own driver".to_string(),
        ));
    }

    let driver_id = input.driver_id;
    let txn = db.begin().await?;

    if let Some(existing) = assignment_db::get_active_assignment_for_driver(&txn, driver_id)
        .await
        .map_err(|e| already_assigned(e, driver_id))?
    {
        return Err(CoreError::InvalidState(format!(
            "driver {driver_id} already drives for owner {}",
            existing.car_owner_id
        )));
    }

    // The unique index on active assignments settles concurrent approvals.
    let assignment = assignment_db::insert_assignment(
        &txn,
        car_owner_id,
        driver_id,
        input.daily_driver_fee,
        Utc::now(),
    )
    .await
    .map_err(|e| already_assigned(e, driver_id))?;
    txn.commit()
        .await
        .map_err(|e| already_assigned(e, driver_id))?;

    tracing::info!(
        %car_owner_id,
        driver_id = %assignment.driver_id,
        fee = %assignment.daily_driver_fee,
        "driver assignment approved"
    );
    Ok(assignment)
}

fn already_assigned(err: DbErr, driver_id: Uuid) -> CoreError {
    if is_unique_violation(&err) || is_write_conflict(&err) {
        CoreError::InvalidState(format!(
            "driver {driver_id} was assigned to another fleet concurrently"
        ))
    } else {
        CoreError::Database(err)
    }
}

/// Remove a driver from the owner's fleet. Rentals already claimed are kept.
pub async fn revoke_assignment(
    db: &DatabaseConnection,
    car_owner_id: Uuid,
    assignment_id: Uuid,
) -> CoreResult<driver_assignments::Model> {
    let assignment = assignment_db::get_assignment_by_id(db, assignment_id)
        .await?
        .ok_or_else(|| CoreError::not_found("driver assignment", assignment_id))?;

    if assignment.car_owner_id != car_owner_id {
        return Err(CoreError::InvalidState(format!(
            "assignment {assignment_id} belongs to another car owner"
        )));
    }

    if !assignment_db::deactivate_assignment(db, assignment_id, Utc::now()).await? {
        return Err(CoreError::InvalidState(format!(
            "assignment {assignment_id} is already revoked"
        )));
    }

    tracing::info!(%car_owner_id, %assignment_id, "driver assignment revoked");

    assignment_db::get_assignment_by_id(db, assignment_id)
        .await?
        .ok_or_else(|| CoreError::not_found("driver assignment", assignment_id))
}

/// The driver's current fleet membership.
pub async fn active_assignment(
    db: &DatabaseConnection,
    driver_id: Uuid,
) -> CoreResult<driver_assignments::Model> {
    assignment_db::get_active_assignment_for_driver(db, driver_id)
        .await?
        .ok_or(CoreError::NoActiveAssignment(driver_id))
}

/// Active drivers of a car owner.
pub async fn fleet(
    db: &DatabaseConnection,
    car_owner_id: Uuid,
) -> CoreResult<Vec<driver_assignments::Model>> {
    Ok(assignment_db::get_active_assignments_by_owner(db, car_owner_id).await?)
}
