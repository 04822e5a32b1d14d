use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{MONEY_EPSILON, round_money};
use crate::error::{CoreError, CoreResult};

/// Shortest rental billed by the hour.
pub const MIN_HOURLY_HOURS: i64 = 4;
/// Hours in the "work day" the daily rate is spread over for hourly billing.
pub const WORK_DAY_HOURS: i64 = 8;

const MILLIS_PER_HOUR: i64 = 3_600_000;
const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// A half-open rental interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RentalPeriod {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl RentalPeriod {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> CoreResult<Self> {
        if end <= start {
            return Err(CoreError::Validation(format!(
                "rental must end after it starts ({start} .. {end})"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    fn millis(&self) -> i64 {
        (self.end - self.start).num_milliseconds()
    }

    /// Duration in hours, rounded up.
    pub fn billable_hours(&self) -> i64 {
        div_ceil(self.millis(), MILLIS_PER_HOUR)
    }

    /// Duration in days, rounded up, never less than one.
    pub fn billable_days(&self) -> i64 {
        div_ceil(self.millis(), MILLIS_PER_DAY).max(1)
    }

    pub fn billing(&self) -> Billing {
        let hours = self.billable_hours();
        if (MIN_HOURLY_HOURS..24).contains(&hours) {
            Billing::Hourly { hours }
        } else {
            Billing::Daily {
                days: self.billable_days(),
            }
        }
    }
}

fn div_ceil(value: i64, unit: i64) -> i64 {
    (value + unit - 1) / unit
}

/// How a driver is paid for a given interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Billing {
    Hourly { hours: i64 },
    Daily { days: i64 },
}

/// Driver fee for `period` at `daily_rate`.
///
/// Rentals of at least 4 but under 24 hours are billed per hour at one
/// eighth of the daily rate; everything else is billed in whole days.
pub fn driver_fee(period: &RentalPeriod, daily_rate: Decimal) -> Decimal {
    let fee = match period.billing() {
        Billing::Hourly { hours } => Decimal::from(hours) * daily_rate / Decimal::from(WORK_DAY_HOURS),
        Billing::Daily { days } => Decimal::from(days) * daily_rate,
    };
    round_money(fee)
}

/// Difference between the driver cost priced at booking and the cost at
/// the rate actually charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceAdjustment {
    pub estimated_cost: Decimal,
    pub actual_cost: Decimal,
    /// Signed amount to add to the rental total. Zero when below one cent.
    pub delta: Decimal,
}

impl PriceAdjustment {
    pub fn is_noop(&self) -> bool {
        self.delta.is_zero()
    }
}

/// Price the driver twice, once per rate, and report the delta.
///
/// A rental booked without an estimate is treated as estimated at zero so the
/// whole actual cost lands on the total.
pub fn reprice(
    period: &RentalPeriod,
    estimated_rate: Option<Decimal>,
    actual_rate: Decimal,
) -> PriceAdjustment {
    let estimated_cost = estimated_rate
        .map(|rate| driver_fee(period, rate))
        .unwrap_or(Decimal::ZERO);
    let actual_cost = driver_fee(period, actual_rate);

    let raw = actual_cost - estimated_cost;
    let delta = if raw.abs() < MONEY_EPSILON {
        Decimal::ZERO
    } else {
        raw
    };

    PriceAdjustment {
        estimated_cost,
        actual_cost,
        delta,
    }
}
