use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use shopper_core::OrderId;
use shopper_orders::{Order, OrderStatus, StatusUpdate};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{Principal, Role};

use shopper_infra::StatusActor;

pub fn router() -> Router {
    Router::new().nest("/orders", orders_router())
}

fn orders_router() -> Router {
    Router::new()
        .route("/create-cod", post(create_cod_order))
        .route("/my-orders", get(my_orders))
        .route("/number/:order_number", get(get_order_by_number))
        .route("/:id", get(get_order))
        .route("/:id/cancel", post(cancel_order))
        .route("/:id/status", put(update_order_status))
}

/// Compose the full order response (nested addresses + buyer summary).
async fn order_response(
    services: &AppServices,
    order: &Order,
    status: StatusCode,
) -> axum::response::Response {
    let shipping = match services.orders.address(order.shipping_address_id).await {
        Ok(a) => a,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let billing = match services.orders.address(order.billing_address_id).await {
        Ok(a) => a,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let buyer = match services.orders.buyer(order.user_id).await {
        Ok(b) => b,
        Err(e) => return errors::domain_error_to_response(e),
    };

    (
        status,
        Json(dto::order_to_json(
            order,
            shipping.as_ref(),
            billing.as_ref(),
            buyer.as_ref(),
        )),
    )
        .into_response()
}

pub async fn create_cod_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    let request = match dto::parse_create_order(principal.user_id(), body) {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match services.orders.create_cod_order(request).await {
        Ok(order) => order_response(&services, &order, StatusCode::CREATED).await,
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OrderId = match dto::parse_or_400(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .orders
        .get_order(id, principal.user_id(), principal.is_admin())
        .await
    {
        Ok(order) => order_response(&services, &order, StatusCode::OK).await,
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_order_by_number(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(order_number): Path<String>,
) -> axum::response::Response {
    match services
        .orders
        .get_order_by_number(&order_number, principal.user_id(), principal.is_admin())
        .await
    {
        Ok(order) => order_response(&services, &order, StatusCode::OK).await,
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn my_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
) -> axum::response::Response {
    let orders = match services.orders.my_orders(principal.user_id()).await {
        Ok(orders) => orders,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let mut items = Vec::with_capacity(orders.len());
    for order in &orders {
        let shipping = services.orders.address(order.shipping_address_id).await;
        let billing = services.orders.address(order.billing_address_id).await;
        match (shipping, billing) {
            (Ok(shipping), Ok(billing)) => items.push(dto::order_to_json(
                order,
                shipping.as_ref(),
                billing.as_ref(),
                None,
            )),
            (Err(e), _) | (_, Err(e)) => return errors::domain_error_to_response(e),
        }
    }

    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn cancel_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    Json(body): Json<dto::CancelOrderRequest>,
) -> axum::response::Response {
    let id: OrderId = match dto::parse_or_400(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .orders
        .cancel_order(id, principal.user_id(), body.reason)
        .await
    {
        Ok(order) => order_response(&services, &order, StatusCode::OK).await,
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_order_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateOrderStatusRequest>,
) -> axum::response::Response {
    let id: OrderId = match dto::parse_or_400(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let status: OrderStatus = match dto::parse_or_400(&body.status) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let actor = match principal.role() {
        Role::Admin => StatusActor::Admin,
        Role::Vendor => match principal.vendor_id() {
            Some(vendor_id) => StatusActor::Vendor(vendor_id),
            None => return errors::json_error(StatusCode::FORBIDDEN, "unauthorized", "unauthorized"),
        },
        Role::Buyer => {
            return errors::json_error(
                StatusCode::FORBIDDEN,
                "unauthorized",
                "only admins and vendors may update order status",
            )
        }
    };

    let update = StatusUpdate {
        tracking_number: body.tracking_number,
        estimated_delivery: body.estimated_delivery,
    };

    match services.orders.update_status(id, status, actor, update).await {
        Ok(order) => order_response(&services, &order, StatusCode::OK).await,
        Err(e) => errors::domain_error_to_response(e),
    }
}
