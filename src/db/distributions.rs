use sea_orm::*;
use uuid::Uuid;

use crate::models::payment_distributions::{self, DistributionStatus};

/// Insert one payment's full set of distribution rows.
pub async fn insert_distributions<C: ConnectionTrait>(
    db: &C,
    rows: Vec<payment_distributions::ActiveModel>,
) -> Result<(), DbErr> {
    if rows.is_empty() {
        return Ok(());
    }

    payment_distributions::Entity::insert_many(rows)
        .exec_without_returning(db)
        .await?;

    Ok(())
}

/// All rows of a payment, in insertion order.
pub async fn get_distributions_by_payment<C: ConnectionTrait>(
    db: &C,
    payment_id: Uuid,
) -> Result<Vec<payment_distributions::Model>, DbErr> {
    payment_distributions::Entity::find()
        .filter(payment_distributions::Column::PaymentId.eq(payment_id))
        .order_by_asc(payment_distributions::Column::CreatedAt)
        .all(db)
        .await
}

/// Fetch a single distribution row by ID.
pub async fn get_distribution_by_id<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<Option<payment_distributions::Model>, DbErr> {
    payment_distributions::Entity::find_by_id(id).one(db).await
}

/// Rows in a given status, oldest first, one page at a time.
pub async fn get_distributions_by_status<C: ConnectionTrait>(
    db: &C,
    status: DistributionStatus,
    page: u64,
    limit: u64,
) -> Result<Vec<payment_distributions::Model>, DbErr> {
    payment_distributions::Entity::find()
        .filter(payment_distributions::Column::Status.eq(status))
        .order_by_asc(payment_distributions::Column::CreatedAt)
        .order_by_asc(payment_distributions::Column::Id)
        .offset((page - 1) * limit)
        .limit(limit)
        .all(db)
        .await
}

/// Write `change` only if the row is still in `expected` status.
pub async fn update_if_status<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    expected: DistributionStatus,
    change: payment_distributions::ActiveModel,
) -> Result<bool, DbErr> {
    let result = payment_distributions::Entity::update_many()
        .set(change)
        .filter(payment_distributions::Column::Id.eq(id))
        .filter(payment_distributions::Column::Status.eq(expected))
        .exec(db)
        .await?;

    Ok(result.rows_affected == 1)
}
