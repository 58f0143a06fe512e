//! Money rounding helpers.
//!
//! Monetary values are `rust_decimal::Decimal` throughout the domain.
//! Intermediate arithmetic keeps full precision; rounding happens once, at
//! the point a value is persisted or quoted, so repeated computation cannot
//! drift.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places persisted for monetary amounts.
pub const MONEY_SCALE: u32 = 2;

/// Round a monetary amount to [`MONEY_SCALE`] places, midpoint away from
/// zero (0.005 -> 0.01).
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}
