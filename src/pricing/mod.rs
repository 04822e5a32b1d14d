//! Pure money rules: driver fee billing and revenue splitting.
//!
//! Nothing in here touches the database; the claim coordinator and the
//! distribution ledger feed snapshots in and persist what comes out.

pub mod fees;
pub mod revenue;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Smallest amount of money worth recording (one cent).
pub const MONEY_EPSILON: Decimal = dec!(0.01);

/// Round to whole cents, halves away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Whether two amounts are equal within [`MONEY_EPSILON`].
pub fn money_eq(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= MONEY_EPSILON
}
