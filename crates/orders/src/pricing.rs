//! Pricing engine.
//!
//! A pure function of the cart lines, the configured tax/shipping policy,
//! and a discount amount. Intermediate arithmetic keeps full decimal
//! precision; each component is rounded exactly once when the quote is
//! finalized, and the total is the sum of the rounded components, so the
//! persisted invariant `total = subtotal + tax + shipping - discount` holds
//! to the cent.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopper_core::round_money;

/// Tax and shipping configuration.
///
/// There is no free-shipping threshold: shipping is a flat fee regardless of
/// order value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Fraction of the subtotal charged as tax (e.g. `0.10`).
    pub tax_rate: Decimal,
    /// Flat shipping fee charged per order.
    pub shipping_fee: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(10, 2),     // 0.10
            shipping_fee: Decimal::new(50, 0), // 50
        }
    }
}

/// The priced breakdown of an order, rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub discount: Decimal,
    /// `subtotal + tax + shipping - discount`, clamped to >= 0.
    pub total: Decimal,
}

impl PricingPolicy {
    /// Price a list of `(unit_price, quantity)` lines with a flat discount.
    pub fn quote(&self, lines: &[(Decimal, i64)], discount: Decimal) -> PriceQuote {
        let subtotal: Decimal = lines
            .iter()
            .map(|(unit_price, quantity)| *unit_price * Decimal::from(*quantity))
            .sum();
        let tax = subtotal * self.tax_rate;

        let subtotal = round_money(subtotal);
        let tax = round_money(tax);
        let shipping = round_money(self.shipping_fee);
        let discount = round_money(discount);
        let total = (subtotal + tax + shipping - discount).max(Decimal::ZERO);

        PriceQuote {
            subtotal,
            tax,
            shipping,
            discount,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn money(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn prices_the_reference_checkout() {
        // 3 x 100.00 at 10% tax and flat 50 shipping.
        let quote = PricingPolicy::default().quote(&[(money(10000), 3)], Decimal::ZERO);
        assert_eq!(quote.subtotal, money(30000));
        assert_eq!(quote.tax, money(3000));
        assert_eq!(quote.shipping, money(5000));
        assert_eq!(quote.discount, Decimal::ZERO);
        assert_eq!(quote.total, money(38000));
    }

    #[test]
    fn sums_multiple_lines() {
        let quote = PricingPolicy::default().quote(
            &[(money(1999), 2), (money(550), 1)],
            Decimal::ZERO,
        );
        // 39.98 + 5.50 = 45.48; tax 4.548 -> 4.55
        assert_eq!(quote.subtotal, money(4548));
        assert_eq!(quote.tax, money(455));
        assert_eq!(quote.total, money(4548) + money(455) + money(5000));
    }

    #[test]
    fn total_is_clamped_at_zero() {
        let quote = PricingPolicy::default().quote(&[(money(100), 1)], money(100000));
        assert_eq!(quote.total, Decimal::ZERO);
    }

    #[test]
    fn empty_cart_still_pays_shipping() {
        let quote = PricingPolicy::default().quote(&[], Decimal::ZERO);
        assert_eq!(quote.subtotal, Decimal::ZERO);
        assert_eq!(quote.total, money(5000));
    }

    #[test]
    fn rounds_once_not_per_line() {
        // Three lines of 0.333 each: rounding per line would give 0.99,
        // rounding the summed subtotal gives 1.00.
        let lines: Vec<(Decimal, i64)> = vec![(Decimal::new(333, 3), 1); 3];
        let quote = PricingPolicy::default().quote(&lines, Decimal::ZERO);
        assert_eq!(quote.subtotal, money(100));
    }

    proptest! {
        #[test]
        fn totals_never_negative(
            lines in proptest::collection::vec((1i64..=1_000_000, 1i64..=50), 0..8),
            discount_cents in 0i64..=10_000_000,
        ) {
            let lines: Vec<(Decimal, i64)> = lines
                .into_iter()
                .map(|(cents, qty)| (money(cents), qty))
                .collect();
            let quote = PricingPolicy::default().quote(&lines, money(discount_cents));
            prop_assert!(quote.total >= Decimal::ZERO);
        }

        #[test]
        fn breakdown_adds_up_unless_clamped(
            lines in proptest::collection::vec((1i64..=1_000_000, 1i64..=50), 1..8),
            discount_cents in 0i64..=10_000,
        ) {
            let lines: Vec<(Decimal, i64)> = lines
                .into_iter()
                .map(|(cents, qty)| (money(cents), qty))
                .collect();
            let quote = PricingPolicy::default().quote(&lines, money(discount_cents));
            let sum = quote.subtotal + quote.tax + quote.shipping - quote.discount;
            if sum >= Decimal::ZERO {
                prop_assert_eq!(quote.total, sum);
            } else {
                prop_assert_eq!(quote.total, Decimal::ZERO);
            }
        }
    }
}
