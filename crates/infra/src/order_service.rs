//! Order service: the application pipeline for the order lifecycle.
//!
//! The only component that decides and persists order state changes. It
//! composes the store traits, the pricing policy and the discount seam, and
//! recovers every failure into a typed [`DomainError`]: callers never see a
//! raw storage error, and no failure continues silently.
//!
//! ## Cancellation discipline
//!
//! Every path into `Cancelled` (buyer cancel, vendor decline, a status
//! update targeting `Cancelled`) goes through one routine that releases
//! reserved stock exactly once, atomically with the status write.

use std::sync::Arc;

use chrono::{Months, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use shopper_core::{AddressId, DomainError, DomainResult, OrderId, ProductId, UserId, VendorId};
use shopper_orders::{
    generate_order_number, vendor, Checkout, Order, OrderItem, OrderStatus, PaymentMethod,
    PricingPolicy, StatusUpdate, VendorAnalytics, VendorDashboard, VendorOrderView,
};
use shopper_parties::{Address, Buyer};

use crate::discount::DiscountPolicy;
use crate::stores::{AddressStore, BuyerStore, OrderStore, ProductStore, StoreError};

const TOP_PRODUCTS_LIMIT: usize = 5;
const RECENT_ORDERS_LIMIT: usize = 5;
const REVENUE_WINDOW_MONTHS: u32 = 6;

/// One cart line of a checkout request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Checkout request, as assembled by the HTTP layer.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub user_id: UserId,
    pub shipping_address_id: AddressId,
    pub billing_address_id: AddressId,
    pub payment_method: PaymentMethod,
    pub coupon_code: Option<String>,
    pub notes: Option<String>,
    pub lines: Vec<CartLine>,
}

/// Who is driving a status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusActor {
    Admin,
    Vendor(VendorId),
}

/// Orchestrator for order creation, cancellation, status updates and the
/// vendor-scoped read paths.
pub struct OrderService {
    addresses: Arc<dyn AddressStore>,
    buyers: Arc<dyn BuyerStore>,
    products: Arc<dyn ProductStore>,
    orders: Arc<dyn OrderStore>,
    discounts: Arc<dyn DiscountPolicy>,
    pricing: PricingPolicy,
}

impl OrderService {
    pub fn new(
        addresses: Arc<dyn AddressStore>,
        buyers: Arc<dyn BuyerStore>,
        products: Arc<dyn ProductStore>,
        orders: Arc<dyn OrderStore>,
        discounts: Arc<dyn DiscountPolicy>,
        pricing: PricingPolicy,
    ) -> Self {
        Self {
            addresses,
            buyers,
            products,
            orders,
            discounts,
            pricing,
        }
    }

    /// Create a Cash-on-Delivery order from cart lines.
    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn create_cod_order(&self, request: CreateOrder) -> DomainResult<Order> {
        if request.payment_method != PaymentMethod::CashOnDelivery {
            return Err(DomainError::validation(
                "only CashOnDelivery payments are supported",
            ));
        }
        if request.lines.is_empty() {
            return Err(DomainError::validation("cart must contain at least one line"));
        }

        self.checked_address(request.shipping_address_id, request.user_id, "shipping")
            .await?;
        self.checked_address(request.billing_address_id, request.user_id, "billing")
            .await?;

        let now = Utc::now();
        let order_id = OrderId::new();

        // Snapshot every line up front; availability is re-checked
        // atomically by the store when the order is committed.
        let mut items = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            let product = self
                .products
                .product(line.product_id)
                .await
                .map_err(DomainError::from)?
                .ok_or_else(|| {
                    DomainError::product_unavailable(format!("product {}", line.product_id))
                })?;
            if !product.is_sellable() {
                return Err(DomainError::product_unavailable(product.name));
            }
            if !product.has_stock(line.quantity) {
                return Err(DomainError::insufficient_stock(product.name));
            }
            items.push(OrderItem::from_product(order_id, &product, line.quantity)?);
        }

        let subtotal: Decimal = items
            .iter()
            .map(|i| i.price * Decimal::from(i.quantity))
            .sum();
        let discount = self
            .discounts
            .resolve(request.coupon_code.as_deref(), subtotal)
            .await?;

        let lines: Vec<(Decimal, i64)> = items.iter().map(|i| (i.price, i.quantity)).collect();
        let quote = self.pricing.quote(&lines, discount);

        let mut order = Order::create(
            Checkout {
                id: order_id,
                order_number: generate_order_number(now, number_suffix()),
                user_id: request.user_id,
                shipping_address_id: request.shipping_address_id,
                billing_address_id: request.billing_address_id,
                payment_method: request.payment_method,
                quote,
                notes: request.notes,
                now,
            },
            items,
        );

        match self.orders.create(&order).await {
            Ok(()) => {}
            Err(StoreError::DuplicateOrderNumber(number)) => {
                // Timestamp-to-the-second plus a random suffix can collide;
                // retry once with a fresh number before surfacing a conflict.
                warn!(%number, "order number collision, retrying");
                order.order_number = generate_order_number(Utc::now(), number_suffix());
                self.orders.create(&order).await?;
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            order_number = %order.order_number,
            total = %order.total_amount,
            "order created"
        );
        Ok(order)
    }

    /// Fetch an order, enforcing buyer-or-admin read access.
    pub async fn get_order(
        &self,
        id: OrderId,
        requester: UserId,
        is_admin: bool,
    ) -> DomainResult<Order> {
        let order = self
            .orders
            .get(id)
            .await
            .map_err(DomainError::from)?
            .ok_or(DomainError::NotFound)?;
        order.ensure_readable_by(requester, is_admin)?;
        Ok(order)
    }

    /// Fetch an order by its human-readable number.
    pub async fn get_order_by_number(
        &self,
        order_number: &str,
        requester: UserId,
        is_admin: bool,
    ) -> DomainResult<Order> {
        let order = self
            .orders
            .get_by_number(order_number)
            .await
            .map_err(DomainError::from)?
            .ok_or(DomainError::NotFound)?;
        order.ensure_readable_by(requester, is_admin)?;
        Ok(order)
    }

    /// A buyer's order history, most recent first.
    pub async fn my_orders(&self, user_id: UserId) -> DomainResult<Vec<Order>> {
        Ok(self.orders.list_for_buyer(user_id).await?)
    }

    /// Buyer-initiated cancellation: restores reserved stock and stamps the
    /// cancellation reason.
    #[instrument(skip(self, reason))]
    pub async fn cancel_order(
        &self,
        id: OrderId,
        requester: UserId,
        reason: Option<String>,
    ) -> DomainResult<Order> {
        let mut order = self
            .orders
            .get(id)
            .await
            .map_err(DomainError::from)?
            .ok_or(DomainError::NotFound)?;

        let expected_version = order.version;
        order.cancel(requester, reason, Utc::now())?;
        self.orders.update(&order, expected_version, true).await?;
        order.version = expected_version + 1;

        info!(order_number = %order.order_number, "order cancelled");
        Ok(order)
    }

    /// Move an order along the status state machine.
    ///
    /// Vendors may only touch orders containing their own items; a
    /// `Cancelled` target releases stock like any other cancellation.
    #[instrument(skip(self, update))]
    pub async fn update_status(
        &self,
        id: OrderId,
        new_status: OrderStatus,
        actor: StatusActor,
        update: StatusUpdate,
    ) -> DomainResult<Order> {
        let mut order = self
            .orders
            .get(id)
            .await
            .map_err(DomainError::from)?
            .ok_or(DomainError::NotFound)?;

        if let StatusActor::Vendor(vendor_id) = actor {
            if !vendor::vendor_owns_order(&order, vendor_id) {
                return Err(DomainError::Unauthorized);
            }
        }

        let expected_version = order.version;
        let release_stock = new_status == OrderStatus::Cancelled;
        order.transition(new_status, update, Utc::now())?;
        self.orders
            .update(&order, expected_version, release_stock)
            .await?;
        order.version = expected_version + 1;

        info!(
            order_number = %order.order_number,
            status = %order.status,
            "order status updated"
        );
        Ok(order)
    }

    /// Vendor decline: forced cancellation through the shared routine, so
    /// stock is restored regardless of which role initiated it.
    #[instrument(skip(self, reason))]
    pub async fn decline_order(
        &self,
        id: OrderId,
        vendor_id: VendorId,
        reason: Option<String>,
    ) -> DomainResult<Order> {
        let mut order = self
            .orders
            .get(id)
            .await
            .map_err(DomainError::from)?
            .ok_or(DomainError::NotFound)?;

        if !vendor::vendor_owns_order(&order, vendor_id) {
            return Err(DomainError::Unauthorized);
        }

        let expected_version = order.version;
        order.force_cancel(reason, Utc::now())?;
        self.orders.update(&order, expected_version, true).await?;
        order.version = expected_version + 1;

        info!(order_number = %order.order_number, %vendor_id, "order declined");
        Ok(order)
    }

    /// Vendor marks its order delivered.
    pub async fn deliver_order(&self, id: OrderId, vendor_id: VendorId) -> DomainResult<Order> {
        self.update_status(
            id,
            OrderStatus::Delivered,
            StatusActor::Vendor(vendor_id),
            StatusUpdate::default(),
        )
        .await
    }

    /// Vendor-scoped views of every order containing the vendor's items.
    pub async fn vendor_orders(&self, vendor_id: VendorId) -> DomainResult<Vec<VendorOrderView>> {
        let orders = self.orders.list_for_vendor(vendor_id).await?;
        Ok(orders
            .iter()
            .map(|o| vendor::vendor_view(o, vendor_id))
            .collect())
    }

    /// Vendor sales analytics. Monthly revenue is windowed to the last six
    /// months; top products and totals cover the vendor's whole history.
    pub async fn vendor_analytics(&self, vendor_id: VendorId) -> DomainResult<VendorAnalytics> {
        let orders = self.orders.list_for_vendor(vendor_id).await?;

        let now = Utc::now();
        let since = now
            .checked_sub_months(Months::new(REVENUE_WINDOW_MONTHS))
            .unwrap_or(now);
        let windowed: Vec<Order> = orders
            .iter()
            .filter(|o| o.created_at >= since)
            .cloned()
            .collect();

        Ok(VendorAnalytics {
            top_products: vendor::top_products(vendor_id, &orders, TOP_PRODUCTS_LIMIT),
            revenue_by_month: vendor::revenue_by_month(vendor_id, &windowed),
            total_revenue: vendor::vendor_revenue(vendor_id, &orders),
            total_orders: orders.len() as u64,
        })
    }

    /// Vendor dashboard headline numbers.
    pub async fn vendor_dashboard(&self, vendor_id: VendorId) -> DomainResult<VendorDashboard> {
        let orders = self.orders.list_for_vendor(vendor_id).await?;
        Ok(vendor::dashboard(vendor_id, &orders, RECENT_ORDERS_LIMIT))
    }

    /// Address lookup for response composition.
    pub async fn address(&self, id: AddressId) -> DomainResult<Option<Address>> {
        Ok(self.addresses.address(id).await?)
    }

    /// Buyer lookup for response composition.
    pub async fn buyer(&self, id: UserId) -> DomainResult<Option<Buyer>> {
        Ok(self.buyers.buyer(id).await?)
    }

    async fn checked_address(
        &self,
        id: AddressId,
        user_id: UserId,
        role: &str,
    ) -> DomainResult<Address> {
        let address = self
            .addresses
            .address(id)
            .await
            .map_err(DomainError::from)?
            .ok_or_else(|| DomainError::invalid_address(format!("{role} address not found")))?;
        if !address.is_owned_by(user_id) {
            return Err(DomainError::invalid_address(format!(
                "{role} address does not belong to the buyer"
            )));
        }
        Ok(address)
    }
}

fn number_suffix() -> u32 {
    rand::thread_rng().gen_range(1000..10_000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use shopper_catalog::Product;
    use shopper_orders::PaymentStatus;
    use shopper_parties::{Address, AddressKind, Buyer};

    use crate::discount::NoDiscount;
    use crate::stores::InMemoryStore;

    fn money(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    struct Fixture {
        store: Arc<InMemoryStore>,
        service: OrderService,
        buyer: UserId,
        shipping: AddressId,
        billing: AddressId,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let service = OrderService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(NoDiscount),
            PricingPolicy::default(),
        );

        let buyer = UserId::new();
        store.insert_buyer(Buyer {
            id: buyer,
            email: "ada@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone_number: None,
            is_active: true,
            created_at: Utc::now(),
        });

        let shipping = AddressId::new();
        let billing = AddressId::new();
        for (id, kind) in [(shipping, AddressKind::Shipping), (billing, AddressKind::Billing)] {
            store.insert_address(Address {
                id,
                user_id: buyer,
                line1: "1 Analytical Row".to_string(),
                line2: None,
                city: "London".to_string(),
                state: "LDN".to_string(),
                country: "UK".to_string(),
                postal_code: "E1 6AN".to_string(),
                is_default: kind == AddressKind::Shipping,
                kind,
                created_at: Utc::now(),
            });
        }

        Fixture {
            store,
            service,
            buyer,
            shipping,
            billing,
        }
    }

    fn seed_product(fx: &Fixture, price_cents: i64, quantity: i64, is_active: bool) -> Product {
        let product = Product {
            id: ProductId::new(),
            vendor_id: VendorId::new(),
            sku: "SKU-77".to_string(),
            name: "Walnut desk".to_string(),
            price: money(price_cents),
            quantity,
            is_active,
            created_at: Utc::now(),
        };
        fx.store.insert_product(product.clone());
        product
    }

    fn checkout(fx: &Fixture, lines: Vec<CartLine>) -> CreateOrder {
        CreateOrder {
            user_id: fx.buyer,
            shipping_address_id: fx.shipping,
            billing_address_id: fx.billing,
            payment_method: PaymentMethod::CashOnDelivery,
            coupon_code: None,
            notes: Some("leave at the door".to_string()),
            lines,
        }
    }

    #[tokio::test]
    async fn checkout_creates_pending_order_and_reserves_stock() {
        let fx = fixture();
        let product = seed_product(&fx, 10000, 5, true);

        let order = fx
            .service
            .create_cod_order(checkout(
                &fx,
                vec![CartLine {
                    product_id: product.id,
                    quantity: 3,
                }],
            ))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.subtotal, money(30000));
        assert_eq!(order.tax_amount, money(3000));
        assert_eq!(order.shipping_amount, money(5000));
        assert_eq!(order.total_amount, money(38000));
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].product_name, "Walnut desk");
        assert!(order.order_number.starts_with("ORD"));
        assert_eq!(fx.store.stock_of(product.id), Some(2));

        let fetched = fx.service.get_order(order.id, fx.buyer, false).await.unwrap();
        assert_eq!(fetched.order_number, order.order_number);
    }

    #[tokio::test]
    async fn insufficient_stock_aborts_whole_checkout() {
        let fx = fixture();
        let product = seed_product(&fx, 10000, 2, true);

        let err = fx
            .service
            .create_cod_order(checkout(
                &fx,
                vec![CartLine {
                    product_id: product.id,
                    quantity: 3,
                }],
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::InsufficientStock(_)));
        assert_eq!(fx.store.stock_of(product.id), Some(2));
        assert!(fx.service.my_orders(fx.buyer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failing_second_line_leaves_first_line_unreserved() {
        let fx = fixture();
        let plenty = seed_product(&fx, 1000, 10, true);
        let scarce = seed_product(&fx, 2000, 1, true);

        let err = fx
            .service
            .create_cod_order(checkout(
                &fx,
                vec![
                    CartLine {
                        product_id: plenty.id,
                        quantity: 2,
                    },
                    CartLine {
                        product_id: scarce.id,
                        quantity: 5,
                    },
                ],
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::InsufficientStock(_)));
        assert_eq!(fx.store.stock_of(plenty.id), Some(10));
        assert_eq!(fx.store.stock_of(scarce.id), Some(1));
    }

    #[tokio::test]
    async fn inactive_product_is_unavailable() {
        let fx = fixture();
        let product = seed_product(&fx, 10000, 5, false);

        let err = fx
            .service
            .create_cod_order(checkout(
                &fx,
                vec![CartLine {
                    product_id: product.id,
                    quantity: 1,
                }],
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::ProductUnavailable(_)));
        assert_eq!(fx.store.stock_of(product.id), Some(5));
    }

    #[tokio::test]
    async fn foreign_address_is_rejected() {
        let fx = fixture();
        let product = seed_product(&fx, 10000, 5, true);

        let foreign = AddressId::new();
        fx.store.insert_address(Address {
            id: foreign,
            user_id: UserId::new(),
            line1: "9 Elsewhere".to_string(),
            line2: None,
            city: "Paris".to_string(),
            state: "IDF".to_string(),
            country: "FR".to_string(),
            postal_code: "75002".to_string(),
            is_default: false,
            kind: AddressKind::Shipping,
            created_at: Utc::now(),
        });

        let mut request = checkout(
            &fx,
            vec![CartLine {
                product_id: product.id,
                quantity: 1,
            }],
        );
        request.shipping_address_id = foreign;

        let err = fx.service.create_cod_order(request).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidAddress(_)));
        assert_eq!(fx.store.stock_of(product.id), Some(5));
    }

    #[tokio::test]
    async fn rejects_non_cod_payment_and_empty_cart() {
        let fx = fixture();
        let product = seed_product(&fx, 10000, 5, true);

        let mut request = checkout(
            &fx,
            vec![CartLine {
                product_id: product.id,
                quantity: 1,
            }],
        );
        request.payment_method = PaymentMethod::CreditCard;
        let err = fx.service.create_cod_order(request).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = fx
            .service
            .create_cod_order(checkout(&fx, vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn cancellation_restores_stock_exactly_once() {
        let fx = fixture();
        let product = seed_product(&fx, 10000, 5, true);
        let order = fx
            .service
            .create_cod_order(checkout(
                &fx,
                vec![CartLine {
                    product_id: product.id,
                    quantity: 3,
                }],
            ))
            .await
            .unwrap();
        assert_eq!(fx.store.stock_of(product.id), Some(2));

        let cancelled = fx
            .service
            .cancel_order(order.id, fx.buyer, Some("changed mind".to_string()))
            .await
            .unwrap();

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert!(cancelled.cancelled_at.is_some());
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("changed mind"));
        assert_eq!(fx.store.stock_of(product.id), Some(5));

        // Cancelling again must fail and must not double-restore.
        let err = fx
            .service
            .cancel_order(order.id, fx.buyer, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidStatusTransition { .. }));
        assert_eq!(fx.store.stock_of(product.id), Some(5));
    }

    #[tokio::test]
    async fn cancel_requires_the_buyer() {
        let fx = fixture();
        let product = seed_product(&fx, 10000, 5, true);
        let order = fx
            .service
            .create_cod_order(checkout(
                &fx,
                vec![CartLine {
                    product_id: product.id,
                    quantity: 1,
                }],
            ))
            .await
            .unwrap();

        let err = fx
            .service
            .cancel_order(order.id, UserId::new(), None)
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::Unauthorized);
        assert_eq!(fx.store.stock_of(product.id), Some(4));
    }

    #[tokio::test]
    async fn vendor_without_items_cannot_update_status() {
        let fx = fixture();
        let product = seed_product(&fx, 10000, 5, true);
        let order = fx
            .service
            .create_cod_order(checkout(
                &fx,
                vec![CartLine {
                    product_id: product.id,
                    quantity: 1,
                }],
            ))
            .await
            .unwrap();

        let err = fx
            .service
            .update_status(
                order.id,
                OrderStatus::Confirmed,
                StatusActor::Vendor(VendorId::new()),
                StatusUpdate::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::Unauthorized);

        let unchanged = fx.service.get_order(order.id, fx.buyer, false).await.unwrap();
        assert_eq!(unchanged.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn illegal_transition_is_rejected_and_status_unchanged() {
        let fx = fixture();
        let product = seed_product(&fx, 10000, 5, true);
        let order = fx
            .service
            .create_cod_order(checkout(
                &fx,
                vec![CartLine {
                    product_id: product.id,
                    quantity: 1,
                }],
            ))
            .await
            .unwrap();

        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
        ] {
            fx.service
                .update_status(order.id, status, StatusActor::Admin, StatusUpdate::default())
                .await
                .unwrap();
        }

        let err = fx
            .service
            .update_status(
                order.id,
                OrderStatus::Pending,
                StatusActor::Vendor(product.vendor_id),
                StatusUpdate::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidStatusTransition { .. }));

        let unchanged = fx.service.get_order(order.id, fx.buyer, false).await.unwrap();
        assert_eq!(unchanged.status, OrderStatus::Shipped);
    }

    #[tokio::test]
    async fn status_update_to_cancelled_releases_stock() {
        let fx = fixture();
        let product = seed_product(&fx, 10000, 5, true);
        let order = fx
            .service
            .create_cod_order(checkout(
                &fx,
                vec![CartLine {
                    product_id: product.id,
                    quantity: 2,
                }],
            ))
            .await
            .unwrap();
        assert_eq!(fx.store.stock_of(product.id), Some(3));

        let cancelled = fx
            .service
            .update_status(
                order.id,
                OrderStatus::Cancelled,
                StatusActor::Admin,
                StatusUpdate::default(),
            )
            .await
            .unwrap();

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert!(cancelled.cancelled_at.is_some());
        assert_eq!(fx.store.stock_of(product.id), Some(5));
    }

    #[tokio::test]
    async fn vendor_decline_cancels_and_restores_stock() {
        let fx = fixture();
        let product = seed_product(&fx, 10000, 5, true);
        let order = fx
            .service
            .create_cod_order(checkout(
                &fx,
                vec![CartLine {
                    product_id: product.id,
                    quantity: 2,
                }],
            ))
            .await
            .unwrap();

        let declined = fx
            .service
            .decline_order(
                order.id,
                product.vendor_id,
                Some("out of service area".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(declined.status, OrderStatus::Cancelled);
        assert_eq!(
            declined.cancellation_reason.as_deref(),
            Some("out of service area")
        );
        assert_eq!(fx.store.stock_of(product.id), Some(5));

        let err = fx
            .service
            .decline_order(order.id, VendorId::new(), None)
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::Unauthorized);
    }

    #[tokio::test]
    async fn delivery_flow_marks_cod_paid() {
        let fx = fixture();
        let product = seed_product(&fx, 10000, 5, true);
        let order = fx
            .service
            .create_cod_order(checkout(
                &fx,
                vec![CartLine {
                    product_id: product.id,
                    quantity: 1,
                }],
            ))
            .await
            .unwrap();

        for status in [OrderStatus::Confirmed, OrderStatus::Processing] {
            fx.service
                .update_status(order.id, status, StatusActor::Admin, StatusUpdate::default())
                .await
                .unwrap();
        }
        fx.service
            .update_status(
                order.id,
                OrderStatus::Shipped,
                StatusActor::Vendor(product.vendor_id),
                StatusUpdate {
                    tracking_number: Some("TRK-5150".to_string()),
                    estimated_delivery: None,
                },
            )
            .await
            .unwrap();

        let delivered = fx
            .service
            .deliver_order(order.id, product.vendor_id)
            .await
            .unwrap();

        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert!(delivered.delivered_at.is_some());
        assert_eq!(delivered.payment_status, PaymentStatus::Paid);
        assert_eq!(delivered.tracking_number.as_deref(), Some("TRK-5150"));
        // Delivery never returns stock.
        assert_eq!(fx.store.stock_of(product.id), Some(4));
    }

    #[tokio::test]
    async fn vendor_views_contain_only_own_items() {
        let fx = fixture();
        let mine = seed_product(&fx, 10000, 5, true);
        let theirs = Product {
            id: ProductId::new(),
            vendor_id: VendorId::new(),
            sku: "SKU-88".to_string(),
            name: "Brass lamp".to_string(),
            price: money(2500),
            quantity: 9,
            is_active: true,
            created_at: Utc::now(),
        };
        fx.store.insert_product(theirs.clone());

        fx.service
            .create_cod_order(checkout(
                &fx,
                vec![
                    CartLine {
                        product_id: mine.id,
                        quantity: 2,
                    },
                    CartLine {
                        product_id: theirs.id,
                        quantity: 1,
                    },
                ],
            ))
            .await
            .unwrap();

        let views = fx.service.vendor_orders(mine.vendor_id).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].items.len(), 1);
        assert_eq!(views[0].items[0].vendor_id, mine.vendor_id);

        let analytics = fx.service.vendor_analytics(mine.vendor_id).await.unwrap();
        assert_eq!(analytics.total_orders, 1);
        assert_eq!(analytics.total_revenue, money(20000));
        assert_eq!(analytics.top_products.len(), 1);
        assert_eq!(analytics.top_products[0].sold, 2);

        let dashboard = fx.service.vendor_dashboard(mine.vendor_id).await.unwrap();
        assert_eq!(dashboard.total_orders, 1);
        assert_eq!(dashboard.pending_orders, 1);
        assert_eq!(dashboard.recent_orders.len(), 1);
    }
}
