use chrono::{DateTime, Utc};
use sea_orm::prelude::Decimal;
use sea_orm::*;
use uuid::Uuid;

use crate::models::payments::{self, PaymentStatus};
use crate::pricing::revenue::RevenueBreakdown;

/// Insert a new payment (defaults to Pending status).
pub async fn insert_payment<C: ConnectionTrait>(
    db: &C,
    rental_id: Uuid,
    amount: Decimal,
    now: DateTime<Utc>,
) -> Result<payments::Model, DbErr> {
    let new_payment = payments::ActiveModel {
        id: Set(Uuid::new_v4()),
        rental_id: Set(rental_id),
        amount: Set(amount),
        status: Set(PaymentStatus::Pending),
        platform_fee: Set(None),
        owner_revenue: Set(None),
        driver_revenue: Set(None),
        commission_rate: Set(None),
        created_at: Set(now),
        settled_at: Set(None),
    };

    new_payment.insert(db).await
}

/// Fetch a single payment by ID.
pub async fn get_payment_by_id<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<Option<payments::Model>, DbErr> {
    payments::Entity::find_by_id(id).one(db).await
}

/// Store the breakdown and mark the payment completed.
///
/// Only a `Pending` payment is touched; returns `false` otherwise.
pub async fn settle_payment<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    breakdown: &RevenueBreakdown,
    now: DateTime<Utc>,
) -> Result<bool, DbErr> {
    let result = payments::Entity::update_many()
        .set(payments::ActiveModel {
            status: Set(PaymentStatus::Completed),
            platform_fee: Set(Some(breakdown.platform_fee)),
            owner_revenue: Set(Some(breakdown.owner_revenue)),
            driver_revenue: Set(breakdown.driver_revenue),
            commission_rate: Set(Some(breakdown.commission_rate)),
            settled_at: Set(Some(now)),
            ..Default::default()
        })
        .filter(payments::Column::Id.eq(id))
        .filter(payments::Column::Status.eq(PaymentStatus::Pending))
        .exec(db)
        .await?;

    Ok(result.rows_affected == 1)
}
