//! Vendor-scoped order aggregation.
//!
//! Translates between the buyer-centric `Order` + `OrderItem` model and
//! vendor-centric views. Attribution always uses the vendor id **captured on
//! the item at order time**, never a re-resolved product record, so vendor
//! reassignment of a product cannot move historical orders.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use shopper_core::{OrderId, ProductId, VendorId};

use crate::order::{Order, OrderItem};
use crate::status::{OrderStatus, PaymentMethod, PaymentStatus};

/// Group items by their captured vendor identifier.
pub fn attribute_items(items: &[OrderItem]) -> HashMap<VendorId, Vec<OrderItem>> {
    let mut by_vendor: HashMap<VendorId, Vec<OrderItem>> = HashMap::new();
    for item in items {
        by_vendor.entry(item.vendor_id).or_default().push(item.clone());
    }
    by_vendor
}

/// True iff at least one item of the order belongs to `vendor_id`.
pub fn vendor_owns_order(order: &Order, vendor_id: VendorId) -> bool {
    order.items.iter().any(|item| item.vendor_id == vendor_id)
}

/// The subset of an order visible to one vendor: its own items plus read
/// access to shared order-level fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VendorOrderView {
    pub order_id: OrderId,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Only the items belonging to the vendor.
    pub items: Vec<OrderItem>,
}

/// Project an order down to one vendor's view.
pub fn vendor_view(order: &Order, vendor_id: VendorId) -> VendorOrderView {
    VendorOrderView {
        order_id: order.id,
        order_number: order.order_number.clone(),
        status: order.status,
        payment_method: order.payment_method,
        payment_status: order.payment_status,
        total_amount: order.total_amount,
        notes: order.notes.clone(),
        created_at: order.created_at,
        items: order
            .items
            .iter()
            .filter(|item| item.vendor_id == vendor_id)
            .cloned()
            .collect(),
    }
}

/// One of a vendor's best-selling products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopProduct {
    pub product_id: ProductId,
    pub name: String,
    pub sold: i64,
    pub revenue: Decimal,
}

/// Top products by units sold over the vendor's item subset of `orders`.
pub fn top_products(vendor_id: VendorId, orders: &[Order], limit: usize) -> Vec<TopProduct> {
    let mut by_product: HashMap<ProductId, TopProduct> = HashMap::new();
    for order in orders {
        for item in order.items.iter().filter(|i| i.vendor_id == vendor_id) {
            let entry = by_product.entry(item.product_id).or_insert_with(|| TopProduct {
                product_id: item.product_id,
                name: item.product_name.clone(),
                sold: 0,
                revenue: Decimal::ZERO,
            });
            entry.sold += item.quantity;
            entry.revenue += item.line_total;
        }
    }

    let mut ranked: Vec<TopProduct> = by_product.into_values().collect();
    ranked.sort_by(|a, b| b.sold.cmp(&a.sold).then_with(|| b.revenue.cmp(&a.revenue)));
    ranked.truncate(limit);
    ranked
}

/// Revenue of one calendar month, keyed `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyRevenue {
    pub month: String,
    pub revenue: Decimal,
}

/// Vendor line revenue grouped by calendar month of the parent order's
/// creation timestamp, sorted chronologically.
pub fn revenue_by_month(vendor_id: VendorId, orders: &[Order]) -> Vec<MonthlyRevenue> {
    let mut by_month: HashMap<String, Decimal> = HashMap::new();
    for order in orders {
        let vendor_revenue: Decimal = order
            .items
            .iter()
            .filter(|i| i.vendor_id == vendor_id)
            .map(|i| i.line_total)
            .sum();
        if vendor_revenue.is_zero() {
            continue;
        }
        let month = order.created_at.format("%Y-%m").to_string();
        *by_month.entry(month).or_insert(Decimal::ZERO) += vendor_revenue;
    }

    let mut months: Vec<MonthlyRevenue> = by_month
        .into_iter()
        .map(|(month, revenue)| MonthlyRevenue { month, revenue })
        .collect();
    // "YYYY-MM" sorts chronologically as a string.
    months.sort_by(|a, b| a.month.cmp(&b.month));
    months
}

/// Sum of a vendor's line revenue across `orders`.
pub fn vendor_revenue(vendor_id: VendorId, orders: &[Order]) -> Decimal {
    orders
        .iter()
        .flat_map(|o| o.items.iter())
        .filter(|i| i.vendor_id == vendor_id)
        .map(|i| i.line_total)
        .sum()
}

/// Sales analytics over a vendor's orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VendorAnalytics {
    pub top_products: Vec<TopProduct>,
    pub revenue_by_month: Vec<MonthlyRevenue>,
    pub total_revenue: Decimal,
    pub total_orders: u64,
}

/// Headline numbers for the vendor dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VendorDashboard {
    pub total_orders: u64,
    pub pending_orders: u64,
    pub total_revenue: Decimal,
    pub recent_orders: Vec<VendorOrderView>,
}

/// Dashboard stats for a vendor; `recent_limit` most recent orders by
/// creation time.
pub fn dashboard(vendor_id: VendorId, orders: &[Order], recent_limit: usize) -> VendorDashboard {
    let owned: Vec<&Order> = orders
        .iter()
        .filter(|o| vendor_owns_order(o, vendor_id))
        .collect();

    let pending_orders = owned
        .iter()
        .filter(|o| matches!(o.status, OrderStatus::Pending | OrderStatus::Processing))
        .count() as u64;

    let total_revenue = owned
        .iter()
        .flat_map(|o| o.items.iter())
        .filter(|i| i.vendor_id == vendor_id)
        .map(|i| i.line_total)
        .sum::<Decimal>();

    let mut recent = owned.clone();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent.truncate(recent_limit);

    VendorDashboard {
        total_orders: owned.len() as u64,
        pending_orders,
        total_revenue,
        recent_orders: recent.into_iter().map(|o| vendor_view(o, vendor_id)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use shopper_catalog::Product;
    use shopper_core::{AddressId, UserId};

    use crate::order::{Checkout, OrderItem};
    use crate::pricing::PricingPolicy;

    fn money(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn product_for(vendor_id: VendorId, name: &str, price_cents: i64) -> Product {
        Product {
            id: ProductId::new(),
            vendor_id,
            sku: format!("SKU-{name}"),
            name: name.to_string(),
            price: money(price_cents),
            quantity: 100,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn order_with_items(created_at: DateTime<Utc>, specs: &[(&Product, i64)]) -> Order {
        let id = OrderId::new();
        let items: Vec<OrderItem> = specs
            .iter()
            .map(|(product, qty)| OrderItem::from_product(id, product, *qty).unwrap())
            .collect();
        let lines: Vec<(Decimal, i64)> = items.iter().map(|i| (i.price, i.quantity)).collect();
        let quote = PricingPolicy::default().quote(&lines, Decimal::ZERO);
        Order::create(
            Checkout {
                id,
                order_number: crate::order::generate_order_number(created_at, 1111),
                user_id: UserId::new(),
                shipping_address_id: AddressId::new(),
                billing_address_id: AddressId::new(),
                payment_method: PaymentMethod::CashOnDelivery,
                quote,
                notes: None,
                now: created_at,
            },
            items,
        )
    }

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 9, 0, 0).unwrap()
    }

    #[test]
    fn attribution_groups_by_captured_vendor() {
        let vendor_a = VendorId::new();
        let vendor_b = VendorId::new();
        let pa = product_for(vendor_a, "lamp", 1000);
        let pb = product_for(vendor_b, "rug", 2000);
        let order = order_with_items(at(2024, 1, 5), &[(&pa, 1), (&pb, 2)]);

        let grouped = attribute_items(&order.items);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&vendor_a].len(), 1);
        assert_eq!(grouped[&vendor_b].len(), 1);
        assert_eq!(grouped[&vendor_b][0].quantity, 2);
    }

    #[test]
    fn ownership_requires_at_least_one_item() {
        let vendor_a = VendorId::new();
        let pa = product_for(vendor_a, "lamp", 1000);
        let order = order_with_items(at(2024, 1, 5), &[(&pa, 1)]);

        assert!(vendor_owns_order(&order, vendor_a));
        assert!(!vendor_owns_order(&order, VendorId::new()));
    }

    #[test]
    fn vendor_view_filters_items_but_keeps_order_fields() {
        let vendor_a = VendorId::new();
        let vendor_b = VendorId::new();
        let pa = product_for(vendor_a, "lamp", 1000);
        let pb = product_for(vendor_b, "rug", 2000);
        let order = order_with_items(at(2024, 1, 5), &[(&pa, 1), (&pb, 2)]);

        let view = vendor_view(&order, vendor_a);
        assert_eq!(view.order_id, order.id);
        assert_eq!(view.total_amount, order.total_amount);
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].vendor_id, vendor_a);
    }

    #[test]
    fn top_products_ranks_by_units_sold() {
        let vendor = VendorId::new();
        let other = VendorId::new();
        let lamp = product_for(vendor, "lamp", 1000);
        let rug = product_for(vendor, "rug", 2000);
        let noise = product_for(other, "noise", 99999);

        let orders = vec![
            order_with_items(at(2024, 1, 5), &[(&lamp, 3), (&noise, 9)]),
            order_with_items(at(2024, 1, 9), &[(&lamp, 2), (&rug, 4)]),
        ];

        let top = top_products(vendor, &orders, 5);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "lamp");
        assert_eq!(top[0].sold, 5);
        assert_eq!(top[0].revenue, money(5000));
        assert_eq!(top[1].name, "rug");
        assert_eq!(top[1].sold, 4);

        let top_one = top_products(vendor, &orders, 1);
        assert_eq!(top_one.len(), 1);
        assert_eq!(top_one[0].name, "lamp");
    }

    #[test]
    fn revenue_groups_by_month_chronologically() {
        let vendor = VendorId::new();
        let lamp = product_for(vendor, "lamp", 10000);

        let orders = vec![
            order_with_items(at(2024, 2, 20), &[(&lamp, 1)]),
            order_with_items(at(2024, 1, 5), &[(&lamp, 2)]),
            order_with_items(at(2024, 1, 28), &[(&lamp, 1)]),
        ];

        let months = revenue_by_month(vendor, &orders);
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].month, "2024-01");
        assert_eq!(months[0].revenue, money(30000));
        assert_eq!(months[1].month, "2024-02");
        assert_eq!(months[1].revenue, money(10000));
    }

    #[test]
    fn revenue_skips_orders_without_vendor_items() {
        let vendor = VendorId::new();
        let other = VendorId::new();
        let noise = product_for(other, "noise", 5000);
        let orders = vec![order_with_items(at(2024, 3, 1), &[(&noise, 1)])];

        assert!(revenue_by_month(vendor, &orders).is_empty());
    }

    #[test]
    fn dashboard_counts_pending_and_processing() {
        let vendor = VendorId::new();
        let lamp = product_for(vendor, "lamp", 1000);

        let mut processing = order_with_items(at(2024, 1, 2), &[(&lamp, 1)]);
        processing
            .transition(OrderStatus::Confirmed, Default::default(), at(2024, 1, 3))
            .unwrap();
        processing
            .transition(OrderStatus::Processing, Default::default(), at(2024, 1, 3))
            .unwrap();
        let pending = order_with_items(at(2024, 1, 4), &[(&lamp, 2)]);
        let mut confirmed = order_with_items(at(2024, 1, 5), &[(&lamp, 3)]);
        confirmed
            .transition(OrderStatus::Confirmed, Default::default(), at(2024, 1, 6))
            .unwrap();

        let orders = vec![processing, pending, confirmed];
        let stats = dashboard(vendor, &orders, 2);

        assert_eq!(stats.total_orders, 3);
        assert_eq!(stats.pending_orders, 2);
        assert_eq!(stats.total_revenue, money(6000));
        assert_eq!(stats.recent_orders.len(), 2);
        // Most recent first.
        assert_eq!(stats.recent_orders[0].created_at, at(2024, 1, 5));
    }
}
