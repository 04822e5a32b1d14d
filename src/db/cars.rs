use sea_orm::*;
use uuid::Uuid;

use crate::models::cars;

/// Fetch a single car by ID.
pub async fn get_car_by_id<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<Option<cars::Model>, DbErr> {
    cars::Entity::find_by_id(id).one(db).await
}

/// IDs of every car owned by `owner_id`.
pub async fn get_car_ids_by_owner<C: ConnectionTrait>(
    db: &C,
    owner_id: Uuid,
) -> Result<Vec<Uuid>, DbErr> {
    let cars = cars::Entity::find()
        .filter(cars::Column::OwnerId.eq(owner_id))
        .all(db)
        .await?;

    Ok(cars.into_iter().map(|car| car.id).collect())
}
