use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopper_catalog::Product;
use shopper_core::{
    round_money, AddressId, DomainError, DomainResult, Entity, OrderId, OrderItemId, ProductId,
    UserId, VendorId,
};

use crate::pricing::PriceQuote;
use crate::status::{OrderStatus, PaymentMethod, PaymentStatus};

/// Days between checkout and the default delivery estimate.
const DEFAULT_DELIVERY_DAYS: i64 = 5;

/// One product line within an order, owned by exactly one vendor.
///
/// `product_name`, `product_sku`, `vendor_id` and `price` are snapshots
/// captured at order time; later product edits must not change them.
/// Invariant: `line_total = price * quantity - discount + tax`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub vendor_id: VendorId,
    pub product_name: String,
    pub product_sku: String,
    pub quantity: i64,
    /// Unit price captured at order time.
    pub price: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub line_total: Decimal,
}

impl OrderItem {
    /// Capture a product snapshot for `quantity` units.
    ///
    /// Line-level discount and tax are zero for Cash-on-Delivery checkouts;
    /// order-level tax is computed by the pricing engine.
    pub fn from_product(order_id: OrderId, product: &Product, quantity: i64) -> DomainResult<Self> {
        if quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }

        let discount = Decimal::ZERO;
        let tax = Decimal::ZERO;
        let line_total = round_money(product.price * Decimal::from(quantity) - discount + tax);

        Ok(Self {
            id: OrderItemId::new(),
            order_id,
            product_id: product.id,
            vendor_id: product.vendor_id,
            product_name: product.name.clone(),
            product_sku: product.sku.clone(),
            quantity,
            price: product.price,
            discount,
            tax,
            line_total,
        })
    }
}

impl Entity for OrderItem {
    type Id = OrderItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Inputs assembled by the order service at checkout time.
#[derive(Debug, Clone)]
pub struct Checkout {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    pub shipping_address_id: AddressId,
    pub billing_address_id: AddressId,
    pub payment_method: PaymentMethod,
    pub quote: PriceQuote,
    pub notes: Option<String>,
    pub now: DateTime<Utc>,
}

/// Optional fulfillment details accepted alongside a status update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusUpdate {
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

/// One purchase transaction by one buyer, potentially spanning multiple
/// vendors.
///
/// Orders are created once at checkout with status `Pending` and mutated
/// only through the decision methods below; they are never deleted
/// (cancellation is a status, not a deletion). Invariant:
/// `total_amount = subtotal + tax_amount - discount_amount + shipping_amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Human-readable, globally unique.
    pub order_number: String,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub shipping_amount: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    pub shipping_address_id: AddressId,
    pub billing_address_id: AddressId,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    /// Optimistic concurrency: bumped on every persisted write.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Assemble a new `Pending` order from checkout inputs.
    pub fn create(checkout: Checkout, items: Vec<OrderItem>) -> Self {
        let Checkout {
            id,
            order_number,
            user_id,
            shipping_address_id,
            billing_address_id,
            payment_method,
            quote,
            notes,
            now,
        } = checkout;

        Self {
            id,
            order_number,
            user_id,
            status: OrderStatus::Pending,
            subtotal: quote.subtotal,
            tax_amount: quote.tax,
            shipping_amount: quote.shipping,
            discount_amount: quote.discount,
            total_amount: quote.total,
            payment_method,
            payment_status: PaymentStatus::Pending,
            notes,
            shipping_address_id,
            billing_address_id,
            tracking_number: None,
            estimated_delivery: Some(now + Duration::days(DEFAULT_DELIVERY_DAYS)),
            delivered_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            version: 0,
            created_at: now,
            updated_at: now,
            items,
        }
    }

    /// Buyer-or-admin read authorization.
    pub fn ensure_readable_by(&self, user_id: UserId, is_admin: bool) -> DomainResult<()> {
        if is_admin || self.user_id == user_id {
            Ok(())
        } else {
            Err(DomainError::Unauthorized)
        }
    }

    /// Buyer-initiated cancellation. The requester must be the buyer and the
    /// order must still be cancellable.
    pub fn cancel(
        &mut self,
        requester: UserId,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if self.user_id != requester {
            return Err(DomainError::Unauthorized);
        }
        self.force_cancel(reason, now)
    }

    /// Cancellation regardless of who initiated it (buyer cancel, vendor
    /// decline). The single place `Cancelled` is entered; the service pairs
    /// every successful call with exactly one stock release per item.
    pub fn force_cancel(&mut self, reason: Option<String>, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.status.is_cancellable() {
            return Err(self.transition_error(OrderStatus::Cancelled));
        }
        self.status = OrderStatus::Cancelled;
        self.cancelled_at = Some(now);
        self.cancellation_reason = reason;
        self.updated_at = now;
        Ok(())
    }

    /// Move the order along the fulfillment state machine.
    ///
    /// A `Cancelled` target is routed through [`Order::force_cancel`] so
    /// cancellation semantics cannot be bypassed.
    pub fn transition(
        &mut self,
        to: OrderStatus,
        update: StatusUpdate,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if to == OrderStatus::Cancelled {
            return self.force_cancel(None, now);
        }
        if !self.status.can_transition(to) {
            return Err(self.transition_error(to));
        }

        self.status = to;
        if let Some(tracking) = update.tracking_number {
            self.tracking_number = Some(tracking);
        }
        if let Some(eta) = update.estimated_delivery {
            self.estimated_delivery = Some(eta);
        }
        match to {
            OrderStatus::Delivered => {
                self.delivered_at = Some(now);
                // Cash on delivery is collected at the door.
                if self.payment_method == PaymentMethod::CashOnDelivery {
                    self.payment_status = PaymentStatus::Paid;
                }
            }
            OrderStatus::Refunded => {
                self.payment_status = PaymentStatus::Refunded;
            }
            _ => {}
        }
        self.updated_at = now;
        Ok(())
    }

    fn transition_error(&self, to: OrderStatus) -> DomainError {
        DomainError::InvalidStatusTransition {
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Build a human-readable order number: `ORD` + UTC timestamp to the second
/// + a 4-digit suffix.
///
/// Collisions are possible (same second, same suffix); the caller retries
/// with a fresh suffix on a uniqueness violation at persistence time.
pub fn generate_order_number(now: DateTime<Utc>, suffix: u32) -> String {
    format!("ORD{}{:04}", now.format("%Y%m%d%H%M%S"), suffix % 10_000)
}
