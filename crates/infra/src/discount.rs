//! Coupon resolution seam.
//!
//! Discount computation is outside the order core; checkout only needs a
//! coupon code resolved to a flat amount before pricing.

use async_trait::async_trait;
use rust_decimal::Decimal;

use shopper_core::DomainResult;

/// Resolve a coupon code against a priced subtotal.
#[async_trait]
pub trait DiscountPolicy: Send + Sync {
    /// The flat discount amount to subtract from the order total. `None`
    /// coupon codes resolve to zero.
    async fn resolve(&self, coupon_code: Option<&str>, subtotal: Decimal) -> DomainResult<Decimal>;
}

/// Default policy: every coupon resolves to zero discount.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDiscount;

#[async_trait]
impl DiscountPolicy for NoDiscount {
    async fn resolve(
        &self,
        _coupon_code: Option<&str>,
        _subtotal: Decimal,
    ) -> DomainResult<Decimal> {
        Ok(Decimal::ZERO)
    }
}
