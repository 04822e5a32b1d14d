use chrono::{DateTime, Utc};
use sea_orm::prelude::Decimal;
use sea_orm::*;
use uuid::Uuid;

use crate::models::driver_assignments;

/// Insert a new, active assignment.
pub async fn insert_assignment<C: ConnectionTrait>(
    db: &C,
    car_owner_id: Uuid,
    driver_id: Uuid,
    daily_driver_fee: Decimal,
    now: DateTime<Utc>,
) -> Result<driver_assignments::Model, DbErr> {
    let assignment = driver_assignments::ActiveModel {
        id: Set(Uuid::new_v4()),
        car_owner_id: Set(car_owner_id),
        driver_id: Set(driver_id),
        daily_driver_fee: Set(daily_driver_fee),
        is_active: Set(true),
        assigned_at: Set(now),
        revoked_at: Set(None),
    };

    assignment.insert(db).await
}

/// Fetch a single assignment by ID.
pub async fn get_assignment_by_id<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<Option<driver_assignments::Model>, DbErr> {
    driver_assignments::Entity::find_by_id(id).one(db).await
}

/// The driver's current fleet membership, if any.
pub async fn get_active_assignment_for_driver<C: ConnectionTrait>(
    db: &C,
    driver_id: Uuid,
) -> Result<Option<driver_assignments::Model>, DbErr> {
    driver_assignments::Entity::find()
        .filter(driver_assignments::Column::DriverId.eq(driver_id))
        .filter(driver_assignments::Column::IsActive.eq(true))
        .order_by_desc(driver_assignments::Column::AssignedAt)
        .one(db)
        .await
}

/// Active drivers of a car owner, longest-serving first.
pub async fn get_active_assignments_by_owner<C: ConnectionTrait>(
    db: &C,
    car_owner_id: Uuid,
) -> Result<Vec<driver_assignments::Model>, DbErr> {
    driver_assignments::Entity::find()
        .filter(driver_assignments::Column::CarOwnerId.eq(car_owner_id))
        .filter(driver_assignments::Column::IsActive.eq(true))
        .order_by_asc(driver_assignments::Column::AssignedAt)
        .all(db)
        .await
}

/// Deactivate an assignment. Returns `false` if it was already inactive.
pub async fn deactivate_assignment<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    now: DateTime<Utc>,
) -> Result<bool, DbErr> {
    let result = driver_assignments::Entity::update_many()
        .set(driver_assignments::ActiveModel {
            is_active: Set(false),
            revoked_at: Set(Some(now)),
            ..Default::default()
        })
        .filter(driver_assignments::Column::Id.eq(id))
        .filter(driver_assignments::Column::IsActive.eq(true))
        .exec(db)
        .await?;

    Ok(result.rows_affected == 1)
}
