use rust_decimal::Decimal;
use serde::Serialize;

use super::{money_eq, round_money};
use crate::config::CommissionPolicy;
use crate::error::{CoreError, CoreResult};

/// How one rental total is shared between platform, owner, and driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RevenueBreakdown {
    pub total_price: Decimal,
    pub commission_rate: Decimal,
    pub platform_fee: Decimal,
    pub owner_revenue: Decimal,
    pub driver_revenue: Option<Decimal>,
}

impl RevenueBreakdown {
    pub fn distributed(&self) -> Decimal {
        self.platform_fee + self.owner_revenue + self.driver_revenue.unwrap_or(Decimal::ZERO)
    }

    /// Fails with `InvariantViolation` unless the shares add up to the total.
    pub fn verify(&self) -> CoreResult<()> {
        if money_eq(self.distributed(), self.total_price) {
            Ok(())
        } else {
            Err(CoreError::InvariantViolation(format!(
                "revenue shares sum to {} but total is {}",
                self.distributed(),
                self.total_price
            )))
        }
    }
}

/// Split `total_price` into platform fee, owner revenue, and driver revenue.
///
/// The platform takes `max(total * rate, minimum)`; the driver fee comes out
/// of the owner's share.
pub fn split_revenue(
    total_price: Decimal,
    driver_fee: Option<Decimal>,
    policy: &CommissionPolicy,
) -> CoreResult<RevenueBreakdown> {
    if total_price < Decimal::ZERO {
        return Err(CoreError::Validation(format!(
            "total price must not be negative, got {total_price}"
        )));
    }
    if let Some(fee) = driver_fee {
        if fee < Decimal::ZERO {
            return Err(CoreError::Validation(format!(
                "driver fee must not be negative, got {fee}"
            )));
        }
    }

    let platform_fee = round_money((total_price * policy.rate).max(policy.minimum));
    let driver_revenue = driver_fee.map(round_money).filter(|fee| !fee.is_zero());
    let owner_revenue = total_price - platform_fee - driver_revenue.unwrap_or(Decimal::ZERO);

    let breakdown = RevenueBreakdown {
        total_price,
        commission_rate: policy.rate,
        platform_fee,
        owner_revenue,
        driver_revenue,
    };
    breakdown.verify()?;

    Ok(breakdown)
}
