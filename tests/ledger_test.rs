//! Payment finalization and distribution settlement against a real schema.
//!
//! Run with: `cargo test --test ledger_test`
mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use common::{book, driven_booking, hire_driver, insert_car, setup_db};
use driver_dispatch::config::AppConfig;
use driver_dispatch::models::payment_distributions::{
    DistributionStatus, RecipientType, SettlementAction, SettlementUpdate,
};
use driver_dispatch::models::payments::{FinalizePayment, PaymentStatus, RecordPayment};
use driver_dispatch::models::rentals::{self, StatusAction};
use driver_dispatch::services::{claims, ledger, rentals as rental_service};
use driver_dispatch::CoreError;

fn config() -> AppConfig {
    AppConfig {
        platform_account_id: Uuid::new_v4(),
        ..AppConfig::default()
    }
}

async fn run_to(db: &DatabaseConnection, rental_id: Uuid, actions: &[StatusAction]) {
    for action in actions {
        rental_service::change_status(db, rental_id, *action)
            .await
            .expect("status change failed");
    }
}

/// 30h driven rental claimed at 600000/day against a 500000/day estimate,
/// then driven to completion. Total ends at 3200000.
async fn completed_driven_rental(db: &DatabaseConnection) -> (rentals::Model, Uuid, Uuid) {
    let owner = Uuid::new_v4();
    let car = insert_car(db, owner).await;
    let driver = hire_driver(db, owner, dec!(600000)).await;
    let rental = book(db, driven_booking(car.id, 30, Some(dec!(500000)), dec!(3000000))).await;

    claims::claim_rental(db, driver.driver_id, rental.id)
        .await
        .unwrap();
    run_to(
        db,
        rental.id,
        &[StatusAction::Confirm, StatusAction::Activate, StatusAction::Complete],
    )
    .await;

    let rental = rental_service::get_rental(db, rental.id).await.unwrap();
    (rental, owner, driver.driver_id)
}

fn step(reference: Option<&str>, reason: Option<&str>) -> SettlementUpdate {
    SettlementUpdate {
        transaction_reference: reference.map(str::to_string),
        reason: reason.map(str::to_string),
    }
}

#[tokio::test]
async fn test_finalize_splits_adjusted_total_three_ways() {
    let db = setup_db().await;
    let config = config();
    let (rental, owner, driver) = completed_driven_rental(&db).await;
    assert_eq!(rental.total_price, dec!(3200000));

    let payment = ledger::record_payment(
        &db,
        RecordPayment {
            rental_id: rental.id,
            amount: rental.total_price,
        },
    )
    .await
    .unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.platform_fee, None);

    let settlement = ledger::finalize_payment(
        &db,
        &config,
        payment.id,
        FinalizePayment {
            amount: dec!(3200000),
        },
    )
    .await
    .unwrap();

    assert_eq!(settlement.breakdown.platform_fee, dec!(320000));
    assert_eq!(settlement.breakdown.driver_revenue, Some(dec!(1200000)));
    assert_eq!(settlement.breakdown.owner_revenue, dec!(1680000));

    assert_eq!(settlement.payment.status, PaymentStatus::Completed);
    assert_eq!(settlement.payment.platform_fee, Some(dec!(320000)));
    assert_eq!(settlement.payment.owner_revenue, Some(dec!(1680000)));
    assert_eq!(settlement.payment.driver_revenue, Some(dec!(1200000)));
    assert_eq!(settlement.payment.commission_rate, Some(dec!(0.10)));
    assert!(settlement.payment.settled_at.is_some());

    let rows = &settlement.distributions;
    let shape: Vec<(RecipientType, Uuid, Decimal)> = rows
        .iter()
        .map(|row| (row.recipient_type, row.recipient_id, row.amount))
        .collect();
    assert_eq!(
        shape,
        vec![
            (RecipientType::Platform, config.platform_account_id, dec!(320000)),
            (RecipientType::CarOwner, owner, dec!(1680000)),
            (RecipientType::Driver, driver, dec!(1200000)),
        ]
    );
    assert!(rows.iter().all(|row| row.status == DistributionStatus::Pending));

    let listed = ledger::distributions(&db, payment.id).await.unwrap();
    assert_eq!(&listed, rows);
}

#[tokio::test]
async fn test_settlement_lifecycle_and_reconciliation() {
    let db = setup_db().await;
    let config = config();
    let (rental, _, _) = completed_driven_rental(&db).await;
    let payment = ledger::record_payment(
        &db,
        RecordPayment {
            rental_id: rental.id,
            amount: rental.total_price,
        },
    )
    .await
    .unwrap();
    let settlement = ledger::finalize_payment(
        &db,
        &config,
        payment.id,
        FinalizePayment {
            amount: rental.total_price,
        },
    )
    .await
    .unwrap();

    let pending = ledger::reconcile(&db, payment.id).await.unwrap();
    assert_eq!(pending.distributed_total, dec!(3200000));
    assert_eq!(pending.completed_total, Decimal::ZERO);
    assert!(!pending.balanced);

    let queue = ledger::distributions_by_status(&db, DistributionStatus::Pending, 1, 20)
        .await
        .unwrap();
    assert_eq!(queue.len(), 3);

    // Completing straight from pending skips processing.
    let first = &settlement.distributions[0];
    let err = ledger::settle_distribution(
        &db,
        first.id,
        SettlementAction::Completed,
        step(Some("TX-1"), None),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CoreError::InvalidState(_)));

    for (n, row) in settlement.distributions.iter().enumerate() {
        ledger::settle_distribution(&db, row.id, SettlementAction::Processing, step(None, None))
            .await
            .unwrap();

        // A completion without a bank reference is refused.
        let err = ledger::settle_distribution(
            &db,
            row.id,
            SettlementAction::Completed,
            SettlementUpdate::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let reference = format!("TX-{n}");
        let done = ledger::settle_distribution(
            &db,
            row.id,
            SettlementAction::Completed,
            step(Some(&reference), None),
        )
        .await
        .unwrap();
        assert_eq!(done.status, DistributionStatus::Completed);
        assert_eq!(done.transaction_reference.as_deref(), Some(reference.as_str()));
    }

    let summary = ledger::reconcile(&db, payment.id).await.unwrap();
    assert!(summary.all_completed);
    assert!(summary.balanced);
    assert_eq!(summary.completed_total, dec!(3200000));
    assert_eq!(summary.outstanding, Decimal::ZERO);

    let err = ledger::settle_distribution(
        &db,
        settlement.distributions[0].id,
        SettlementAction::Cancel,
        step(None, Some("too late")),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CoreError::InvalidState(_)));
}

#[tokio::test]
async fn test_failed_distribution_leaves_payment_alone_and_can_retry() {
    let db = setup_db().await;
    let config = config();
    let (rental, _, _) = completed_driven_rental(&db).await;
    let payment = ledger::record_payment(
        &db,
        RecordPayment {
            rental_id: rental.id,
            amount: rental.total_price,
        },
    )
    .await
    .unwrap();
    let settlement = ledger::finalize_payment(
        &db,
        &config,
        payment.id,
        FinalizePayment {
            amount: rental.total_price,
        },
    )
    .await
    .unwrap();
    let driver_row = settlement
        .distributions
        .iter()
        .find(|row| row.recipient_type == RecipientType::Driver)
        .unwrap();

    let err = ledger::settle_distribution(
        &db,
        driver_row.id,
        SettlementAction::Failed,
        SettlementUpdate::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let failed = ledger::settle_distribution(
        &db,
        driver_row.id,
        SettlementAction::Failed,
        step(None, Some("account closed")),
    )
    .await
    .unwrap();
    assert_eq!(failed.status, DistributionStatus::Failed);
    assert_eq!(failed.error_message.as_deref(), Some("account closed"));

    let summary = ledger::reconcile(&db, payment.id).await.unwrap();
    assert_eq!(summary.distributed_total, dec!(3200000));
    assert!(!summary.all_completed);
    assert!(!summary.balanced);

    let rows = ledger::distributions(&db, payment.id).await.unwrap();
    let statuses: Vec<DistributionStatus> = rows.iter().map(|row| row.status).collect();
    assert_eq!(
        statuses,
        vec![
            DistributionStatus::Pending,
            DistributionStatus::Pending,
            DistributionStatus::Failed,
        ]
    );
    let failed_queue = ledger::distributions_by_status(&db, DistributionStatus::Failed, 1, 20)
        .await
        .unwrap();
    assert_eq!(failed_queue.len(), 1);

    let requeued = ledger::settle_distribution(
        &db,
        driver_row.id,
        SettlementAction::Requeue,
        SettlementUpdate::default(),
    )
    .await
    .unwrap();
    assert_eq!(requeued.status, DistributionStatus::Pending);
}

#[tokio::test]
async fn test_finalize_refusals() {
    let db = setup_db().await;
    let config = config();
    let owner = Uuid::new_v4();
    let car = insert_car(&db, owner).await;
    let driver = hire_driver(&db, owner, dec!(600000)).await;
    let rental = book(&db, driven_booking(car.id, 30, Some(dec!(500000)), dec!(3000000))).await;
    claims::claim_rental(&db, driver.driver_id, rental.id)
        .await
        .unwrap();

    let payment = ledger::record_payment(
        &db,
        RecordPayment {
            rental_id: rental.id,
            amount: dec!(3200000),
        },
    )
    .await
    .unwrap();

    // Rental still pending.
    let err = ledger::finalize_payment(
        &db,
        &config,
        payment.id,
        FinalizePayment {
            amount: dec!(3200000),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CoreError::WrongStatus { .. }));

    run_to(
        &db,
        rental.id,
        &[StatusAction::Confirm, StatusAction::Activate, StatusAction::Complete],
    )
    .await;

    // Event amount disagrees with the recorded payment.
    let err = ledger::finalize_payment(
        &db,
        &config,
        payment.id,
        FinalizePayment {
            amount: dec!(3100000),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    ledger::finalize_payment(
        &db,
        &config,
        payment.id,
        FinalizePayment {
            amount: dec!(3200000),
        },
    )
    .await
    .unwrap();

    let err = ledger::finalize_payment(
        &db,
        &config,
        payment.id,
        FinalizePayment {
            amount: dec!(3200000),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CoreError::InvalidState(_)));

    let err = ledger::finalize_payment(
        &db,
        &config,
        Uuid::new_v4(),
        FinalizePayment {
            amount: dec!(1),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CoreError::NotFound { entity: "payment", .. }));
}

#[tokio::test]
async fn test_amount_mismatch_rolls_back() {
    let db = setup_db().await;
    let config = config();
    let (rental, _, _) = completed_driven_rental(&db).await;

    // Collected the pre-claim price instead of the adjusted total.
    let payment = ledger::record_payment(
        &db,
        RecordPayment {
            rental_id: rental.id,
            amount: dec!(3000000),
        },
    )
    .await
    .unwrap();

    let err = ledger::finalize_payment(
        &db,
        &config,
        payment.id,
        FinalizePayment {
            amount: dec!(3000000),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CoreError::InvariantViolation(_)));

    assert!(ledger::distributions(&db, payment.id).await.unwrap().is_empty());
    let summary = ledger::reconcile(&db, payment.id).await.unwrap();
    assert_eq!(summary.distributed_total, Decimal::ZERO);
    assert!(!summary.all_completed);
}

#[tokio::test]
async fn test_self_drive_rental_pays_platform_and_owner_only() {
    let db = setup_db().await;
    let config = config();
    let owner = Uuid::new_v4();
    let car = insert_car(&db, owner).await;
    let mut booking = driven_booking(car.id, 48, None, dec!(50000));
    booking.requires_driver = false;
    let rental = book(&db, booking).await;
    run_to(
        &db,
        rental.id,
        &[StatusAction::Confirm, StatusAction::Activate, StatusAction::Complete],
    )
    .await;

    let payment = ledger::record_payment(
        &db,
        RecordPayment {
            rental_id: rental.id,
            amount: dec!(50000),
        },
    )
    .await
    .unwrap();
    let settlement = ledger::finalize_payment(
        &db,
        &config,
        payment.id,
        FinalizePayment {
            amount: dec!(50000),
        },
    )
    .await
    .unwrap();

    // 10% of 50000 is below the minimum commission.
    assert_eq!(settlement.breakdown.platform_fee, dec!(10000));
    assert_eq!(settlement.breakdown.owner_revenue, dec!(40000));
    assert_eq!(settlement.breakdown.driver_revenue, None);
    assert_eq!(settlement.payment.driver_revenue, None);

    let types: Vec<RecipientType> = settlement
        .distributions
        .iter()
        .map(|row| row.recipient_type)
        .collect();
    assert_eq!(types, vec![RecipientType::Platform, RecipientType::CarOwner]);
}

#[tokio::test]
async fn test_preselected_driver_is_paid_after_accepting() {
    let db = setup_db().await;
    let config = config();
    let owner = Uuid::new_v4();
    let car = insert_car(&db, owner).await;
    let driver = hire_driver(&db, owner, dec!(600000)).await;

    let mut booking = driven_booking(car.id, 30, Some(dec!(500000)), dec!(3000000));
    booking.driver_id = Some(driver.driver_id);
    let rental = book(&db, booking).await;
    run_to(&db, rental.id, &[StatusAction::Confirm]).await;
    rental_service::accept_rental(&db, rental.id, driver.driver_id)
        .await
        .unwrap();
    run_to(&db, rental.id, &[StatusAction::Activate, StatusAction::Complete]).await;

    let rental = rental_service::get_rental(&db, rental.id).await.unwrap();
    assert_eq!(rental.total_price, dec!(3200000));

    let payment = ledger::record_payment(
        &db,
        RecordPayment {
            rental_id: rental.id,
            amount: rental.total_price,
        },
    )
    .await
    .unwrap();
    let settlement = ledger::finalize_payment(
        &db,
        &config,
        payment.id,
        FinalizePayment {
            amount: rental.total_price,
        },
    )
    .await
    .unwrap();

    let shape: Vec<(RecipientType, Uuid, Decimal)> = settlement
        .distributions
        .iter()
        .map(|row| (row.recipient_type, row.recipient_id, row.amount))
        .collect();
    assert_eq!(
        shape,
        vec![
            (RecipientType::Platform, config.platform_account_id, dec!(320000)),
            (RecipientType::CarOwner, owner, dec!(1680000)),
            (RecipientType::Driver, driver.driver_id, dec!(1200000)),
        ]
    );
    assert_eq!(settlement.payment.driver_revenue, Some(dec!(1200000)));
}

async fn finalize_self_drive(
    db: &DatabaseConnection,
    config: &AppConfig,
    total: Decimal,
) -> ledger::Settlement {
    let car = insert_car(db, Uuid::new_v4()).await;
    let mut booking = driven_booking(car.id, 48, None, total);
    booking.requires_driver = false;
    let rental = book(db, booking).await;
    run_to(
        db,
        rental.id,
        &[StatusAction::Confirm, StatusAction::Activate, StatusAction::Complete],
    )
    .await;

    let payment = ledger::record_payment(
        db,
        RecordPayment {
            rental_id: rental.id,
            amount: total,
        },
    )
    .await
    .unwrap();
    ledger::finalize_payment(db, config, payment.id, FinalizePayment { amount: total })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_owner_share_below_minimum_commission_is_not_paid_out() {
    let db = setup_db().await;
    let config = config();

    // Minimum commission 10000 on a 5000 rental leaves the owner at -5000.
    let settlement = finalize_self_drive(&db, &config, dec!(5000)).await;
    let rows = &settlement.distributions;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].recipient_type, RecipientType::Platform);
    assert_eq!(rows[0].status, DistributionStatus::Pending);
    assert_eq!(rows[1].recipient_type, RecipientType::CarOwner);
    assert_eq!(rows[1].amount, dec!(-5000));
    assert_eq!(rows[1].status, DistributionStatus::Failed);

    let err = ledger::settle_distribution(
        &db,
        rows[1].id,
        SettlementAction::Requeue,
        SettlementUpdate::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CoreError::InvalidState(_)));

    let summary = ledger::reconcile(&db, settlement.payment.id).await.unwrap();
    assert_eq!(summary.distributed_total, dec!(5000));
    assert!(!summary.balanced);
}

#[tokio::test]
async fn test_zero_owner_share_gets_no_row() {
    let db = setup_db().await;
    let config = config();

    let settlement = finalize_self_drive(&db, &config, dec!(10000)).await;
    let types: Vec<RecipientType> = settlement
        .distributions
        .iter()
        .map(|row| row.recipient_type)
        .collect();
    assert_eq!(types, vec![RecipientType::Platform]);
    assert_eq!(settlement.payment.owner_revenue, Some(Decimal::ZERO));
}
