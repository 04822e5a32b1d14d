//! Legal moves of a rental and of its driver sub-state.
//!
//! Every function here inspects a snapshot and either refuses with a
//! descriptive error or returns the change set to persist. Persisting is the
//! caller's job and is always conditional on the snapshot's `version`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::Set;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::models::rentals::{self, DriverDecision, RentalStatus, StatusAction};
use crate::pricing::fees::{self, PriceAdjustment, RentalPeriod};

/// Driver sub-state of a rental, derived from its columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverState {
    NotRequired,
    Unassigned,
    AwaitingDecision,
    Accepted,
}

pub fn driver_state(rental: &rentals::Model) -> DriverState {
    if !rental.requires_driver {
        return DriverState::NotRequired;
    }
    match (rental.driver_id, rental.driver_decision) {
        (None, _) => DriverState::Unassigned,
        (Some(_), DriverDecision::Accepted) => DriverState::Accepted,
        (Some(_), _) => DriverState::AwaitingDecision,
    }
}

impl RentalStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RentalStatus::Completed | RentalStatus::Cancelled)
    }

    /// Target status of `action` from `self`, if the move is legal.
    pub fn after(self, action: StatusAction) -> Option<RentalStatus> {
        use RentalStatus::*;
        match (action, self) {
            (StatusAction::Confirm, Pending) => Some(Confirmed),
            (StatusAction::Activate, Confirmed) => Some(Active),
            (StatusAction::MarkOverdue, Confirmed | Active) => Some(Overdue),
            (StatusAction::Complete, Active | Overdue) => Some(Completed),
            (StatusAction::Cancel, current) if !current.is_terminal() => Some(Cancelled),
            _ => None,
        }
    }
}

/// Start a change set on top of `rental`, bumping its version.
pub fn change_of(rental: &rentals::Model, now: DateTime<Utc>) -> rentals::ActiveModel {
    rentals::ActiveModel {
        version: Set(rental.version + 1),
        updated_at: Set(Some(now)),
        ..Default::default()
    }
}

/// Advance the fulfillment status.
pub fn advance(
    rental: &rentals::Model,
    action: StatusAction,
    now: DateTime<Utc>,
) -> CoreResult<rentals::ActiveModel> {
    let next = rental.status.after(action).ok_or_else(|| {
        CoreError::InvalidState(format!(
            "cannot {action:?} rental {} while it is {:?}",
            rental.id, rental.status
        ))
    })?;

    // A driven rental cannot start until its driver has said yes.
    if action == StatusAction::Activate
        && rental.requires_driver
        && driver_state(rental) != DriverState::Accepted
    {
        return Err(CoreError::InvalidState(format!(
            "rental {} has no accepted driver yet",
            rental.id
        )));
    }

    let mut change = change_of(rental, now);
    change.status = Set(next);
    Ok(change)
}

/// Validate the open-pool preconditions of a claim, in reporting order:
/// driver required, not yet claimed, still pending.
pub fn ensure_claimable(rental: &rentals::Model) -> CoreResult<()> {
    if !rental.requires_driver {
        return Err(CoreError::DriverNotRequired(rental.id));
    }
    if rental.driver_id.is_some() {
        return Err(CoreError::AlreadyClaimed(rental.id));
    }
    if rental.status != RentalStatus::Pending {
        return Err(CoreError::WrongStatus {
            rental_id: rental.id,
            expected: RentalStatus::Pending,
            actual: rental.status,
        });
    }
    Ok(())
}

/// Price the driver at `daily_rate` and fold the difference to the booking
/// estimate into the total. Returns the adjustment and the new total.
pub fn reprice_total(
    rental: &rentals::Model,
    daily_rate: Decimal,
) -> CoreResult<(PriceAdjustment, Decimal)> {
    let period = RentalPeriod::new(rental.start_date, rental.end_date)?;
    let adjustment = fees::reprice(&period, rental.estimated_driver_fee, daily_rate);

    let total_price = rental.total_price + adjustment.delta;
    if total_price < Decimal::ZERO {
        return Err(CoreError::InvariantViolation(format!(
            "driver fee {daily_rate} would drive rental {} total below zero ({total_price})",
            rental.id
        )));
    }
    Ok((adjustment, total_price))
}

/// Audit-note suffix describing a repricing.
pub fn price_note(adjustment: &PriceAdjustment, old_total: Decimal, new_total: Decimal) -> String {
    if adjustment.is_noop() {
        return "; no price adjustment".to_string();
    }
    let sign = if adjustment.delta > Decimal::ZERO { "+" } else { "" };
    format!(
        "; total adjusted by {sign}{} from {old_total} to {new_total} (estimated driver cost {})",
        adjustment.delta, adjustment.estimated_cost
    )
}

/// Only the assigned driver may answer, only once per assignment cycle, and
/// only while the rental is confirmed.
fn ensure_answerable(rental: &rentals::Model, driver_id: Uuid) -> CoreResult<()> {
    if !rental.requires_driver {
        return Err(CoreError::InvalidState(format!(
            "rental {} does not use a driver",
            rental.id
        )));
    }
    if rental.driver_id != Some(driver_id) {
        return Err(CoreError::InvalidState(format!(
            "rental {} is not assigned to driver {driver_id}",
            rental.id
        )));
    }
    if rental.status != RentalStatus::Confirmed {
        return Err(CoreError::InvalidState(format!(
            "rental {} must be confirmed before the driver can answer (it is {:?})",
            rental.id, rental.status
        )));
    }
    if rental.driver_decision != DriverDecision::Undecided {
        return Err(CoreError::InvalidState(format!(
            "driver already answered {:?} for rental {}",
            rental.driver_decision, rental.id
        )));
    }
    Ok(())
}

/// The assigned driver accepts at `daily_rate`, their fleet fee.
///
/// The rate becomes the rental's actual driver fee and the total is repriced
/// against the booking estimate, as for a claim.
pub fn accept(
    rental: &rentals::Model,
    driver_id: Uuid,
    daily_rate: Decimal,
    now: DateTime<Utc>,
) -> CoreResult<(rentals::ActiveModel, PriceAdjustment)> {
    ensure_answerable(rental, driver_id)?;
    let (adjustment, total_price) = reprice_total(rental, daily_rate)?;

    let mut change = change_of(rental, now);
    change.driver_decision = Set(DriverDecision::Accepted);
    change.actual_driver_fee = Set(Some(daily_rate));
    change.total_price = Set(total_price);
    change.notes = Set(Some(rental.with_note(&format!(
        "[{}] driver {driver_id} accepted the assignment at daily fee {daily_rate}{}",
        now.to_rfc3339(),
        price_note(&adjustment, rental.total_price, total_price)
    ))));
    Ok((change, adjustment))
}

/// The assigned driver turns the rental down.
///
/// The rental goes back to the open pool: driver columns are cleared, any
/// repricing done for this driver is undone, and the status returns to
/// `Pending`.
pub fn reject(
    rental: &rentals::Model,
    driver_id: Uuid,
    reason: &str,
    now: DateTime<Utc>,
) -> CoreResult<rentals::ActiveModel> {
    ensure_answerable(rental, driver_id)?;

    let reason = reason.trim();
    if reason.is_empty() {
        return Err(CoreError::Validation(
            "a reason is required to reject an assignment".to_string(),
        ));
    }

    let total_price = match rental.actual_driver_fee {
        Some(rate) => {
            let period = RentalPeriod::new(rental.start_date, rental.end_date)?;
            rental.total_price - fees::reprice(&period, rental.estimated_driver_fee, rate).delta
        }
        None => rental.total_price,
    };

    let mut change = change_of(rental, now);
    change.driver_id = Set(None);
    change.driver_assigned_at = Set(None);
    change.actual_driver_fee = Set(None);
    change.total_price = Set(total_price);
    change.driver_decision = Set(DriverDecision::Undecided);
    change.status = Set(RentalStatus::Pending);
    change.notes = Set(Some(rental.with_note(&format!(
        "[{}] driver {driver_id} rejected the assignment: {reason}",
        now.to_rfc3339()
    ))));
    Ok(change)
}
