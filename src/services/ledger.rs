//! Distribution ledger: one row per recipient per finalized payment.
//!
//! Rows are created together with the payment's breakdown in a single
//! transaction. Afterwards each row moves through settlement on its own;
//! nothing here writes back to the payment. Whether the rows add up is
//! checked when read, see [`reconcile`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::Set;
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Serialize;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::cars as car_db;
use crate::db::distributions as distribution_db;
use crate::db::payments as payment_db;
use crate::db::rentals as rental_db;
use crate::error::{CoreError, CoreResult};
use crate::lifecycle::{self, DriverState};
use crate::models::payment_distributions::{
    self, DistributionStatus, RecipientType, SettlementAction, SettlementUpdate,
};
use crate::models::payments::{self, FinalizePayment, PaymentStatus, RecordPayment};
use crate::models::rentals::{self, RentalStatus};
use crate::pricing::fees::{self, RentalPeriod};
use crate::pricing::revenue::{self, RevenueBreakdown};
use crate::pricing::{money_eq, round_money};

/// Who receives a share of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recipients {
    pub platform: Uuid,
    pub owner: Uuid,
    pub driver: Option<Uuid>,
}

/// Result of finalizing a payment.
#[derive(Debug, Clone, Serialize)]
pub struct Settlement {
    pub payment: payments::Model,
    pub breakdown: RevenueBreakdown,
    pub distributions: Vec<payment_distributions::Model>,
}

/// Read-time comparison of a payment and its distribution rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub payment_id: Uuid,
    pub payment_amount: Decimal,
    /// Sum over rows that are not cancelled.
    pub distributed_total: Decimal,
    pub completed_total: Decimal,
    pub outstanding: Decimal,
    pub all_completed: bool,
    /// Every row completed and the completed sum equals the payment amount.
    pub balanced: bool,
}

/// Record money collected for a rental; it stays `Pending` until finalized.
pub async fn record_payment(
    db: &DatabaseConnection,
    input: RecordPayment,
) -> CoreResult<payments::Model> {
    if input.amount < Decimal::ZERO {
        return Err(CoreError::Validation(format!(
            "payment amount must not be negative, got {}",
            input.amount
        )));
    }

    rental_db::get_rental_by_id(db, input.rental_id)
        .await?
        .ok_or_else(|| CoreError::not_found("rental", input.rental_id))?;

    let payment =
        payment_db::insert_payment(db, input.rental_id, round_money(input.amount), Utc::now())
            .await?;
    tracing::info!(payment_id = %payment.id, rental_id = %payment.rental_id, "payment recorded");
    Ok(payment)
}

/// Driver share of a completed rental: the actual daily rate billed over the
/// rental interval, when a driver accepted the job.
pub fn driver_share(rental: &rentals::Model) -> CoreResult<Option<(Uuid, Decimal)>> {
    if lifecycle::driver_state(rental) != DriverState::Accepted {
        return Ok(None);
    }
    let Some(driver_id) = rental.driver_id else {
        return Ok(None);
    };
    let rate = rental.actual_driver_fee.ok_or_else(|| {
        CoreError::InvariantViolation(format!(
            "rental {} has accepted driver {driver_id} but no driver fee",
            rental.id
        ))
    })?;

    let period = RentalPeriod::new(rental.start_date, rental.end_date)?;
    Ok(Some((driver_id, fees::driver_fee(&period, rate))))
}

/// Build the distribution rows for `breakdown`.
///
/// Platform and owner get a row, the driver only when a driver fee was
/// charged. Zero shares get no row. A negative share (the owner, when the
/// minimum commission exceeds what is left) is not a payout: its row is
/// created `Failed` and held for manual review. Fails if the shares would
/// not add up to the total.
pub fn plan_distributions(
    payment_id: Uuid,
    breakdown: &RevenueBreakdown,
    recipients: Recipients,
    now: DateTime<Utc>,
) -> CoreResult<Vec<payment_distributions::ActiveModel>> {
    let mut shares = vec![
        (RecipientType::Platform, recipients.platform, breakdown.platform_fee),
        (RecipientType::CarOwner, recipients.owner, breakdown.owner_revenue),
    ];
    match (breakdown.driver_revenue, recipients.driver) {
        (Some(amount), Some(driver_id)) => shares.push((RecipientType::Driver, driver_id, amount)),
        (Some(amount), None) => {
            return Err(CoreError::InvariantViolation(format!(
                "driver share of {amount} on payment {payment_id} has no recipient"
            )));
        }
        (None, _) => {}
    }

    let planned: Decimal = shares.iter().map(|(_, _, amount)| *amount).sum();
    if !money_eq(planned, breakdown.total_price) {
        return Err(CoreError::InvariantViolation(format!(
            "distributions for payment {payment_id} sum to {planned}, expected {}",
            breakdown.total_price
        )));
    }

    Ok(shares
        .into_iter()
        .filter(|(_, _, amount)| !amount.is_zero())
        .map(|(recipient_type, recipient_id, amount)| {
            let (status, error_message) = if amount < Decimal::ZERO {
                (
                    DistributionStatus::Failed,
                    Some(format!(
                        "negative {recipient_type:?} share of {amount}; held for manual review"
                    )),
                )
            } else {
                (DistributionStatus::Pending, None)
            };
            payment_distributions::ActiveModel {
                id: Set(Uuid::new_v4()),
                payment_id: Set(payment_id),
                recipient_id: Set(recipient_id),
                recipient_type: Set(recipient_type),
                amount: Set(amount),
                status: Set(status),
                transaction_reference: Set(None),
                error_message: Set(error_message),
                created_at: Set(now),
                updated_at: Set(None),
            }
        })
        .collect())
}

/// Handle the payment-finalization event.
///
/// The breakdown is computed from the rental's adjusted total, which must
/// equal the payment amount. Breakdown, payment status, and distribution
/// rows are written in one transaction.
pub async fn finalize_payment(
    db: &DatabaseConnection,
    config: &AppConfig,
    payment_id: Uuid,
    event: FinalizePayment,
) -> CoreResult<Settlement> {
    let txn = db.begin().await?;
    let now = Utc::now();

    let payment = payment_db::get_payment_by_id(&txn, payment_id)
        .await?
        .ok_or_else(|| CoreError::not_found("payment", payment_id))?;
    if payment.status != PaymentStatus::Pending {
        return Err(CoreError::InvalidState(format!(
            "payment {payment_id} is already {:?}",
            payment.status
        )));
    }
    if !money_eq(payment.amount, event.amount) {
        return Err(CoreError::Validation(format!(
            "finalization amount {} does not match payment amount {}",
            event.amount, payment.amount
        )));
    }

    let rental = rental_db::get_rental_by_id(&txn, payment.rental_id)
        .await?
        .ok_or_else(|| CoreError::not_found("rental", payment.rental_id))?;
    if rental.status != RentalStatus::Completed {
        return Err(CoreError::WrongStatus {
            rental_id: rental.id,
            expected: RentalStatus::Completed,
            actual: rental.status,
        });
    }
    if !money_eq(payment.amount, rental.total_price) {
        return Err(CoreError::InvariantViolation(format!(
            "payment {payment_id} amount {} differs from rental {} total {}",
            payment.amount, rental.id, rental.total_price
        )));
    }

    let car = car_db::get_car_by_id(&txn, rental.car_id)
        .await?
        .ok_or_else(|| CoreError::not_found("car", rental.car_id))?;

    let driver = driver_share(&rental)?;
    let breakdown = revenue::split_revenue(
        rental.total_price,
        driver.map(|(_, fee)| fee),
        &config.commission,
    )?;

    let rows = plan_distributions(
        payment_id,
        &breakdown,
        Recipients {
            platform: config.platform_account_id,
            owner: car.owner_id,
            driver: driver.map(|(id, _)| id),
        },
        now,
    )?;

    if !payment_db::settle_payment(&txn, payment_id, &breakdown, now).await? {
        return Err(CoreError::InvalidState(format!(
            "payment {payment_id} was finalized concurrently"
        )));
    }
    distribution_db::insert_distributions(&txn, rows).await?;

    let payment = payment_db::get_payment_by_id(&txn, payment_id)
        .await?
        .ok_or_else(|| CoreError::not_found("payment", payment_id))?;
    let mut distributions = distribution_db::get_distributions_by_payment(&txn, payment_id).await?;
    distributions.sort_by_key(|row| row.recipient_type.rank());

    txn.commit().await?;

    tracing::info!(
        %payment_id,
        platform_fee = %breakdown.platform_fee,
        owner_revenue = %breakdown.owner_revenue,
        driver_revenue = ?breakdown.driver_revenue,
        rows = distributions.len(),
        "payment finalized"
    );
    if breakdown.owner_revenue < Decimal::ZERO {
        tracing::warn!(
            %payment_id,
            owner_revenue = %breakdown.owner_revenue,
            "minimum commission exceeds owner share; owner row held for review"
        );
    }

    Ok(Settlement {
        payment,
        breakdown,
        distributions,
    })
}

/// A payment's distribution rows: platform, owner, then driver.
pub async fn distributions(
    db: &DatabaseConnection,
    payment_id: Uuid,
) -> CoreResult<Vec<payment_distributions::Model>> {
    payment_db::get_payment_by_id(db, payment_id)
        .await?
        .ok_or_else(|| CoreError::not_found("payment", payment_id))?;

    let mut rows = distribution_db::get_distributions_by_payment(db, payment_id).await?;
    rows.sort_by_key(|row| row.recipient_type.rank());
    Ok(rows)
}

/// Work queue for the settlement process.
pub async fn distributions_by_status(
    db: &DatabaseConnection,
    status: DistributionStatus,
    page: u64,
    limit: u64,
) -> CoreResult<Vec<payment_distributions::Model>> {
    let page = page.max(1);
    let limit = limit.clamp(1, 100);
    Ok(distribution_db::get_distributions_by_status(db, status, page, limit).await?)
}

/// Target status and column changes for a settlement step.
fn settlement_change(
    row: &payment_distributions::Model,
    action: SettlementAction,
    update: SettlementUpdate,
    now: DateTime<Utc>,
) -> CoreResult<payment_distributions::ActiveModel> {
    let target = match action {
        SettlementAction::Processing => DistributionStatus::Processing,
        SettlementAction::Completed => DistributionStatus::Completed,
        SettlementAction::Failed => DistributionStatus::Failed,
        SettlementAction::Cancel => DistributionStatus::Cancelled,
        SettlementAction::Requeue => DistributionStatus::Pending,
    };
    if row.amount <= Decimal::ZERO {
        return Err(CoreError::InvalidState(format!(
            "distribution {} has non-positive amount {} and is held for manual review",
            row.id, row.amount
        )));
    }
    if !row.status.can_transition_to(target) {
        return Err(CoreError::InvalidState(format!(
            "distribution {} cannot go from {:?} to {target:?}",
            row.id, row.status
        )));
    }

    let mut change = payment_distributions::ActiveModel {
        status: Set(target),
        updated_at: Set(Some(now)),
        ..Default::default()
    };

    match action {
        SettlementAction::Completed => {
            let reference = update
                .transaction_reference
                .filter(|r| !r.trim().is_empty())
                .ok_or_else(|| {
                    CoreError::Validation("a transaction reference is required".to_string())
                })?;
            change.transaction_reference = Set(Some(reference));
        }
        SettlementAction::Failed | SettlementAction::Cancel => {
            let reason = update
                .reason
                .filter(|r| !r.trim().is_empty())
                .ok_or_else(|| CoreError::Validation("a reason is required".to_string()))?;
            change.error_message = Set(Some(reason));
        }
        SettlementAction::Processing | SettlementAction::Requeue => {}
    }

    Ok(change)
}

/// Advance one distribution row through settlement.
pub async fn settle_distribution(
    db: &DatabaseConnection,
    distribution_id: Uuid,
    action: SettlementAction,
    update: SettlementUpdate,
) -> CoreResult<payment_distributions::Model> {
    let row = distribution_db::get_distribution_by_id(db, distribution_id)
        .await?
        .ok_or_else(|| CoreError::not_found("distribution", distribution_id))?;

    let change = settlement_change(&row, action, update, Utc::now())?;

    if !distribution_db::update_if_status(db, distribution_id, row.status, change).await? {
        return Err(CoreError::InvalidState(format!(
            "distribution {distribution_id} was updated concurrently"
        )));
    }

    let updated = distribution_db::get_distribution_by_id(db, distribution_id)
        .await?
        .ok_or_else(|| CoreError::not_found("distribution", distribution_id))?;

    match updated.status {
        DistributionStatus::Failed => tracing::warn!(
            %distribution_id,
            payment_id = %updated.payment_id,
            reason = ?updated.error_message,
            "distribution failed"
        ),
        status => tracing::info!(%distribution_id, ?status, "distribution updated"),
    }

    Ok(updated)
}

/// Compare a payment with the current state of its rows.
pub fn summarize(
    payment: &payments::Model,
    rows: &[payment_distributions::Model],
) -> Reconciliation {
    let distributed_total: Decimal = rows
        .iter()
        .filter(|row| row.status != DistributionStatus::Cancelled)
        .map(|row| row.amount)
        .sum();
    let completed_total: Decimal = rows
        .iter()
        .filter(|row| row.status == DistributionStatus::Completed)
        .map(|row| row.amount)
        .sum();
    let all_completed =
        !rows.is_empty() && rows.iter().all(|row| row.status == DistributionStatus::Completed);

    Reconciliation {
        payment_id: payment.id,
        payment_amount: payment.amount,
        distributed_total,
        completed_total,
        outstanding: payment.amount - completed_total,
        all_completed,
        balanced: all_completed && money_eq(completed_total, payment.amount),
    }
}

/// Read-time reconciliation of a payment against its rows.
pub async fn reconcile(db: &DatabaseConnection, payment_id: Uuid) -> CoreResult<Reconciliation> {
    let payment = payment_db::get_payment_by_id(db, payment_id)
        .await?
        .ok_or_else(|| CoreError::not_found("payment", payment_id))?;
    let rows = distribution_db::get_distributions_by_payment(db, payment_id).await?;

    let summary = summarize(&payment, &rows);
    if summary.all_completed && !summary.balanced {
        tracing::error!(
            %payment_id,
            amount = %summary.payment_amount,
            completed = %summary.completed_total,
            "settled distributions do not match payment amount"
        );
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sea_orm::ActiveValue;

    fn breakdown(driver: Option<Decimal>) -> RevenueBreakdown {
        let driver_amount = driver.unwrap_or(Decimal::ZERO);
        RevenueBreakdown {
            total_price: dec!(1000000),
            commission_rate: dec!(0.10),
            platform_fee: dec!(100000),
            owner_revenue: dec!(900000) - driver_amount,
            driver_revenue: driver,
        }
    }

    fn recipients(driver: Option<Uuid>) -> Recipients {
        Recipients {
            platform: Uuid::nil(),
            owner: Uuid::new_v4(),
            driver,
        }
    }

    fn row(amount: Decimal, status: DistributionStatus) -> payment_distributions::Model {
        payment_distributions::Model {
            id: Uuid::new_v4(),
            payment_id: Uuid::nil(),
            recipient_id: Uuid::new_v4(),
            recipient_type: RecipientType::CarOwner,
            amount,
            status,
            transaction_reference: None,
            error_message: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn payment(amount: Decimal) -> payments::Model {
        payments::Model {
            id: Uuid::nil(),
            rental_id: Uuid::new_v4(),
            amount,
            status: PaymentStatus::Completed,
            platform_fee: None,
            owner_revenue: None,
            driver_revenue: None,
            commission_rate: None,
            created_at: Utc::now(),
            settled_at: Some(Utc::now()),
        }
    }

    #[test]
    fn two_rows_without_driver() {
        let rows =
            plan_distributions(Uuid::new_v4(), &breakdown(None), recipients(None), Utc::now())
                .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows
            .iter()
            .all(|r| r.status == ActiveValue::Set(DistributionStatus::Pending)));
    }

    #[test]
    fn three_rows_with_driver() {
        let driver = Uuid::new_v4();
        let rows = plan_distributions(
            Uuid::new_v4(),
            &breakdown(Some(dec!(450000))),
            recipients(Some(driver)),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].recipient_type, ActiveValue::Set(RecipientType::Driver));
        assert_eq!(rows[2].recipient_id, ActiveValue::Set(driver));
        assert_eq!(rows[2].amount, ActiveValue::Set(dec!(450000)));
    }

    #[test]
    fn zero_share_gets_no_row() {
        let exact_minimum = RevenueBreakdown {
            total_price: dec!(10000),
            commission_rate: dec!(0.10),
            platform_fee: dec!(10000),
            owner_revenue: Decimal::ZERO,
            driver_revenue: None,
        };
        let rows =
            plan_distributions(Uuid::new_v4(), &exact_minimum, recipients(None), Utc::now())
                .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].recipient_type, ActiveValue::Set(RecipientType::Platform));
    }

    #[test]
    fn negative_owner_share_is_held_for_review() {
        let below_minimum = RevenueBreakdown {
            total_price: dec!(5000),
            commission_rate: dec!(0.10),
            platform_fee: dec!(10000),
            owner_revenue: dec!(-5000),
            driver_revenue: None,
        };
        let rows =
            plan_distributions(Uuid::new_v4(), &below_minimum, recipients(None), Utc::now())
                .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].status, ActiveValue::Set(DistributionStatus::Pending));
        assert_eq!(rows[1].amount, ActiveValue::Set(dec!(-5000)));
        assert_eq!(rows[1].status, ActiveValue::Set(DistributionStatus::Failed));
        assert!(matches!(&rows[1].error_message, ActiveValue::Set(Some(m)) if m.contains("manual review")));
    }

    #[test]
    fn negative_row_cannot_be_requeued() {
        let held = row(dec!(-5000), DistributionStatus::Failed);
        let err = settlement_change(
            &held,
            SettlementAction::Requeue,
            SettlementUpdate::default(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));
    }

    #[test]
    fn accepted_driver_without_fee_is_fatal() {
        let now = Utc::now();
        let rental = rentals::Model {
            id: Uuid::new_v4(),
            car_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            start_date: now,
            end_date: now + chrono::Duration::hours(30),
            status: RentalStatus::Completed,
            requires_driver: true,
            driver_id: Some(Uuid::new_v4()),
            driver_assigned_at: Some(now),
            driver_decision: rentals::DriverDecision::Accepted,
            estimated_driver_fee: None,
            actual_driver_fee: None,
            total_price: dec!(3000000),
            notes: None,
            version: 4,
            created_at: now,
            updated_at: None,
        };
        assert!(matches!(driver_share(&rental), Err(CoreError::InvariantViolation(_))));

        let mut paid = rental.clone();
        paid.actual_driver_fee = Some(dec!(600000));
        let (_, amount) = driver_share(&paid).unwrap().unwrap();
        assert_eq!(amount, dec!(1200000));
    }

    #[test]
    fn driver_share_without_recipient_is_fatal() {
        let err = plan_distributions(
            Uuid::new_v4(),
            &breakdown(Some(dec!(1))),
            recipients(None),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvariantViolation(_)));
    }

    #[test]
    fn unbalanced_breakdown_is_fatal() {
        let mut broken = breakdown(None);
        broken.owner_revenue = dec!(1);
        let err = plan_distributions(Uuid::new_v4(), &broken, recipients(None), Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvariantViolation(_)));
    }

    #[test]
    fn completed_rows_balance_the_payment() {
        let rows = vec![
            row(dec!(100000), DistributionStatus::Completed),
            row(dec!(450000), DistributionStatus::Completed),
            row(dec!(450000), DistributionStatus::Completed),
        ];
        let summary = summarize(&payment(dec!(1000000)), &rows);
        assert!(summary.all_completed);
        assert!(summary.balanced);
        assert_eq!(summary.outstanding, Decimal::ZERO);
    }

    #[test]
    fn failed_row_leaves_payment_outstanding() {
        let rows = vec![
            row(dec!(100000), DistributionStatus::Completed),
            row(dec!(900000), DistributionStatus::Failed),
        ];
        let summary = summarize(&payment(dec!(1000000)), &rows);
        assert!(!summary.all_completed);
        assert!(!summary.balanced);
        assert_eq!(summary.distributed_total, dec!(1000000));
        assert_eq!(summary.outstanding, dec!(900000));
    }

    #[test]
    fn settlement_steps_follow_the_status_graph() {
        let pending = row(dec!(10), DistributionStatus::Pending);
        let err = settlement_change(
            &pending,
            SettlementAction::Completed,
            SettlementUpdate {
                transaction_reference: Some("tx-1".to_string()),
                reason: None,
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));

        let change = settlement_change(
            &pending,
            SettlementAction::Processing,
            SettlementUpdate::default(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(change.status, ActiveValue::Set(DistributionStatus::Processing));
    }

    #[test]
    fn completion_needs_transaction_reference() {
        let processing = row(dec!(10), DistributionStatus::Processing);
        let err = settlement_change(
            &processing,
            SettlementAction::Completed,
            SettlementUpdate::default(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn failed_rows_can_be_requeued() {
        let failed = row(dec!(10), DistributionStatus::Failed);
        let change = settlement_change(
            &failed,
            SettlementAction::Requeue,
            SettlementUpdate::default(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(change.status, ActiveValue::Set(DistributionStatus::Pending));
    }
}
