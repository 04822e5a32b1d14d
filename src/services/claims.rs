//! Claim coordinator: drivers contend for open rentals, at most one wins.
//!
//! A claim is a single transaction. Preconditions are read and reported in a
//! fixed order, then the assignment is written with a conditional update that
//! only matches while the rental is still open and at the version that was
//! read. The same write carries the fee and price adjustment, so a claim is
//! either fully applied or not at all.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::Set;
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use serde::Serialize;
use uuid::Uuid;

use crate::db::cars as car_db;
use crate::db::driver_assignments as assignment_db;
use crate::db::rentals as rental_db;
use crate::error::{CoreError, CoreResult};
use crate::lifecycle;
use crate::models::rentals::{self, DriverDecision};
use crate::pricing::fees::{Billing, PriceAdjustment, RentalPeriod};
use crate::services::is_write_conflict;

/// What a winning driver gets back.
#[derive(Debug, Clone, Serialize)]
pub struct ClaimReceipt {
    pub rental: rentals::Model,
    pub daily_driver_fee: Decimal,
    pub billing: Billing,
    pub adjustment: PriceAdjustment,
}

/// Let `driver_id` take ownership of `rental_id`.
///
/// Losing a race is reported as [`CoreError::AlreadyClaimed`]; callers should
/// pick another open rental rather than retry this one.
pub async fn claim_rental(
    db: &DatabaseConnection,
    driver_id: Uuid,
    rental_id: Uuid,
) -> CoreResult<ClaimReceipt> {
    let txn = db
        .begin()
        .await
        .map_err(|e| lost_race(CoreError::Database(e), driver_id, rental_id))?;

    let receipt = match claim_in(&txn, driver_id, rental_id, Utc::now()).await {
        Ok(receipt) => receipt,
        Err(err) => {
            // Release the read snapshot before reporting, so the winner's
            // commit is not held up by this transaction.
            if let Err(e) = txn.rollback().await {
                tracing::debug!(%rental_id, "rollback after failed claim: {e}");
            }
            return Err(lost_race(err, driver_id, rental_id));
        }
    };

    txn.commit()
        .await
        .map_err(|e| lost_race(CoreError::Database(e), driver_id, rental_id))?;

    tracing::info!(
        %driver_id,
        %rental_id,
        fee = %receipt.daily_driver_fee,
        delta = %receipt.adjustment.delta,
        "rental claimed"
    );
    Ok(receipt)
}

/// A competing write reported by the database, at any statement of the
/// claim or at commit, means another driver got the rental.
fn lost_race(err: CoreError, driver_id: Uuid, rental_id: Uuid) -> CoreError {
    match err {
        CoreError::Database(e) if is_write_conflict(&e) => {
            tracing::debug!(%driver_id, %rental_id, "claim lost to a concurrent driver: {e}");
            CoreError::AlreadyClaimed(rental_id)
        }
        other => other,
    }
}

async fn claim_in<C: ConnectionTrait>(
    db: &C,
    driver_id: Uuid,
    rental_id: Uuid,
    now: DateTime<Utc>,
) -> CoreResult<ClaimReceipt> {
    let assignment = assignment_db::get_active_assignment_for_driver(db, driver_id)
        .await?
        .ok_or(CoreError::NoActiveAssignment(driver_id))?;

    let rental = rental_db::get_rental_by_id(db, rental_id)
        .await?
        .ok_or_else(|| CoreError::not_found("rental", rental_id))?;

    lifecycle::ensure_claimable(&rental)?;

    let car = car_db::get_car_by_id(db, rental.car_id)
        .await?
        .ok_or_else(|| CoreError::not_found("car", rental.car_id))?;
    if car.owner_id != assignment.car_owner_id {
        return Err(CoreError::NotAuthorizedForOwner {
            driver_id,
            rental_id,
        });
    }

    let period = RentalPeriod::new(rental.start_date, rental.end_date)?;
    let rate = assignment.daily_driver_fee;
    let (adjustment, total_price) = lifecycle::reprice_total(&rental, rate)?;

    let mut change = lifecycle::change_of(&rental, now);
    change.driver_id = Set(Some(driver_id));
    change.driver_assigned_at = Set(Some(now));
    change.driver_decision = Set(DriverDecision::Accepted);
    change.actual_driver_fee = Set(Some(rate));
    change.total_price = Set(total_price);
    change.notes = Set(Some(rental.with_note(&claim_note(
        driver_id,
        rate,
        &adjustment,
        rental.total_price,
        total_price,
        now,
    ))));

    if !rental_db::claim_if_open(db, rental_id, rental.version, change).await? {
        tracing::debug!(%driver_id, %rental_id, "claim lost to a concurrent driver");
        return Err(CoreError::AlreadyClaimed(rental_id));
    }

    let rental = rental_db::get_rental_by_id(db, rental_id)
        .await?
        .ok_or_else(|| CoreError::not_found("rental", rental_id))?;

    Ok(ClaimReceipt {
        rental,
        daily_driver_fee: rate,
        billing: period.billing(),
        adjustment,
    })
}

fn claim_note(
    driver_id: Uuid,
    rate: Decimal,
    adjustment: &PriceAdjustment,
    old_total: Decimal,
    new_total: Decimal,
    now: DateTime<Utc>,
) -> String {
    let mut note = format!(
        "[{}] claimed by driver {driver_id} at daily fee {rate} (driver cost {})",
        now.to_rfc3339(),
        adjustment.actual_cost
    );
    note.push_str(&lifecycle::price_note(adjustment, old_total, new_total));
    note
}

/// Open rentals the driver may claim: driver required, unclaimed, pending,
/// and owned by the driver's fleet owner.
pub async fn open_jobs(db: &DatabaseConnection, driver_id: Uuid) -> CoreResult<Vec<rentals::Model>> {
    let assignment = assignment_db::get_active_assignment_for_driver(db, driver_id)
        .await?
        .ok_or(CoreError::NoActiveAssignment(driver_id))?;

    let car_ids = car_db::get_car_ids_by_owner(db, assignment.car_owner_id).await?;
    Ok(rental_db::get_open_jobs(db, car_ids).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn note_mentions_adjustment_when_price_moves() {
        let adjustment = PriceAdjustment {
            estimated_cost: dec!(1000000),
            actual_cost: dec!(1200000),
            delta: dec!(200000),
        };
        let note = claim_note(
            Uuid::nil(),
            dec!(600000),
            &adjustment,
            dec!(3000000),
            dec!(3200000),
            Utc::now(),
        );
        assert!(note.contains("+200000"));
        assert!(note.contains("from 3000000 to 3200000"));
    }

    #[test]
    fn note_says_so_when_nothing_changes() {
        let adjustment = PriceAdjustment {
            estimated_cost: dec!(600000),
            actual_cost: dec!(600000),
            delta: Decimal::ZERO,
        };
        let note = claim_note(
            Uuid::nil(),
            dec!(600000),
            &adjustment,
            dec!(1000000),
            dec!(1000000),
            Utc::now(),
        );
        assert!(note.ends_with("no price adjustment"));
    }
}
