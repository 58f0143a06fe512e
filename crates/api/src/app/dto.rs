//! Request DTOs and JSON mapping helpers.
//!
//! The wire contract (camelCase field names, status strings, response
//! nesting) is preserved from the storefront API this service replaces.

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use shopper_core::UserId;
use shopper_infra::{CartLine, CreateOrder};
use shopper_orders::{Order, OrderItem, PaymentMethod, VendorAnalytics, VendorDashboard, VendorOrderView};
use shopper_parties::{Address, Buyer};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub shipping_address_id: String,
    pub billing_address_id: String,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub cart_items: Vec<CartItemRequest>,
}

fn default_payment_method() -> String {
    "CashOnDelivery".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct CancelOrderRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusRequest {
    pub status: String,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub estimated_delivery: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct DeclineOrderRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Translate the checkout request body into the service command, rejecting
/// malformed identifiers and unknown payment methods with a 400.
pub fn parse_create_order(
    user_id: UserId,
    body: CreateOrderRequest,
) -> Result<CreateOrder, axum::response::Response> {
    let shipping_address_id = parse_or_400(&body.shipping_address_id)?;
    let billing_address_id = parse_or_400(&body.billing_address_id)?;
    let payment_method: PaymentMethod = parse_or_400(&body.payment_method)?;

    let mut lines = Vec::with_capacity(body.cart_items.len());
    for item in &body.cart_items {
        lines.push(CartLine {
            product_id: parse_or_400(&item.product_id)?,
            quantity: item.quantity,
        });
    }

    Ok(CreateOrder {
        user_id,
        shipping_address_id,
        billing_address_id,
        payment_method,
        coupon_code: body.coupon_code,
        notes: body.notes,
        lines,
    })
}

pub fn parse_or_400<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: core::str::FromStr<Err = shopper_core::DomainError>,
{
    raw.parse::<T>()
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, e.kind(), e.to_string()))
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn order_to_json(
    order: &Order,
    shipping: Option<&Address>,
    billing: Option<&Address>,
    buyer: Option<&Buyer>,
) -> Value {
    json!({
        "id": order.id.to_string(),
        "orderNumber": order.order_number,
        "userId": order.user_id.to_string(),
        "status": order.status,
        "subTotal": order.subtotal,
        "taxAmount": order.tax_amount,
        "shippingAmount": order.shipping_amount,
        "discountAmount": order.discount_amount,
        "totalAmount": order.total_amount,
        "paymentMethod": order.payment_method,
        "paymentStatus": order.payment_status,
        "notes": order.notes,
        "shippingAddressId": order.shipping_address_id.to_string(),
        "billingAddressId": order.billing_address_id.to_string(),
        "trackingNumber": order.tracking_number,
        "estimatedDelivery": order.estimated_delivery,
        "deliveredAt": order.delivered_at,
        "cancelledAt": order.cancelled_at,
        "cancellationReason": order.cancellation_reason,
        "createdAt": order.created_at,
        "updatedAt": order.updated_at,
        "shippingAddress": shipping.map(address_to_json),
        "billingAddress": billing.map(address_to_json),
        "user": buyer.map(buyer_to_json),
        "items": order.items.iter().map(order_item_to_json).collect::<Vec<_>>(),
    })
}

pub fn order_item_to_json(item: &OrderItem) -> Value {
    json!({
        "id": item.id.to_string(),
        "orderId": item.order_id.to_string(),
        "productId": item.product_id.to_string(),
        "vendorId": item.vendor_id.to_string(),
        "productName": item.product_name,
        "productSku": item.product_sku,
        "quantity": item.quantity,
        "price": item.price,
        "discount": item.discount,
        "tax": item.tax,
        "total": item.line_total,
    })
}

pub fn address_to_json(address: &Address) -> Value {
    json!({
        "id": address.id.to_string(),
        "line1": address.line1,
        "line2": address.line2,
        "city": address.city,
        "state": address.state,
        "country": address.country,
        "postalCode": address.postal_code,
        "isDefault": address.is_default,
        "kind": address.kind,
    })
}

pub fn buyer_to_json(buyer: &Buyer) -> Value {
    json!({
        "id": buyer.id.to_string(),
        "email": buyer.email,
        "firstName": buyer.first_name,
        "lastName": buyer.last_name,
        "phoneNumber": buyer.phone_number,
        "isActive": buyer.is_active,
        "createdAt": buyer.created_at,
    })
}

pub fn vendor_view_to_json(view: &VendorOrderView) -> Value {
    json!({
        "id": view.order_id.to_string(),
        "orderNumber": view.order_number,
        "status": view.status,
        "paymentMethod": view.payment_method,
        "paymentStatus": view.payment_status,
        "totalAmount": view.total_amount,
        "notes": view.notes,
        "createdAt": view.created_at,
        "items": view.items.iter().map(order_item_to_json).collect::<Vec<_>>(),
    })
}

pub fn analytics_to_json(analytics: &VendorAnalytics) -> Value {
    json!({
        "topProducts": analytics
            .top_products
            .iter()
            .map(|p| json!({
                "productId": p.product_id.to_string(),
                "name": p.name,
                "sold": p.sold,
                "revenue": p.revenue,
            }))
            .collect::<Vec<_>>(),
        "revenueByMonth": analytics
            .revenue_by_month
            .iter()
            .map(|m| json!({ "name": m.month, "revenue": m.revenue }))
            .collect::<Vec<_>>(),
        "totalRevenue": analytics.total_revenue,
        "totalOrders": analytics.total_orders,
    })
}

pub fn dashboard_to_json(dashboard: &VendorDashboard) -> Value {
    json!({
        "totalOrders": dashboard.total_orders,
        "pendingOrders": dashboard.pending_orders,
        "totalRevenue": dashboard.total_revenue,
        "recentOrders": dashboard
            .recent_orders
            .iter()
            .map(vendor_view_to_json)
            .collect::<Vec<_>>(),
    })
}
