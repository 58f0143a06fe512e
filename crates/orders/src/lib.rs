//! Orders domain module.
//!
//! This crate contains the business rules of the order lifecycle,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no
//! storage): the status state machine, the pricing engine, the
//! order/order-item models, and the vendor-scoped aggregation helpers.

pub mod order;
pub mod pricing;
pub mod status;
pub mod vendor;

pub use order::{generate_order_number, Checkout, Order, OrderItem, StatusUpdate};
pub use pricing::{PriceQuote, PricingPolicy};
pub use status::{OrderStatus, PaymentMethod, PaymentStatus};
pub use vendor::{
    attribute_items, dashboard, revenue_by_month, top_products, vendor_owns_order, vendor_revenue,
    vendor_view, MonthlyRevenue, TopProduct, VendorAnalytics, VendorDashboard, VendorOrderView,
};
