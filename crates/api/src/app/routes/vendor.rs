use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};

use shopper_core::{OrderId, VendorId};
use shopper_orders::{OrderStatus, StatusUpdate};

use shopper_infra::StatusActor;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{Principal, Role};

pub fn router() -> Router {
    Router::new().nest("/vendor", vendor_router())
}

fn vendor_router() -> Router {
    Router::new()
        .route("/orders", get(vendor_orders))
        .route("/orders/:id/status", put(update_order_status))
        .route("/orders/:id/deliver", put(deliver_order))
        .route("/orders/:id/decline", put(decline_order))
        .route("/analytics", get(analytics))
        .route("/dashboard", get(dashboard))
}

/// Vendor routes require a vendor principal.
fn require_vendor(principal: &Principal) -> Result<VendorId, axum::response::Response> {
    match (principal.role(), principal.vendor_id()) {
        (Role::Vendor, Some(vendor_id)) => Ok(vendor_id),
        _ => Err(errors::json_error(
            StatusCode::FORBIDDEN,
            "unauthorized",
            "vendor access required",
        )),
    }
}

pub async fn vendor_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
) -> axum::response::Response {
    let vendor_id = match require_vendor(&principal) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.orders.vendor_orders(vendor_id).await {
        Ok(views) => {
            let items: Vec<_> = views.iter().map(dto::vendor_view_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_order_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateOrderStatusRequest>,
) -> axum::response::Response {
    let vendor_id = match require_vendor(&principal) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let id: OrderId = match dto::parse_or_400(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let status: OrderStatus = match dto::parse_or_400(&body.status) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let update = StatusUpdate {
        tracking_number: body.tracking_number,
        estimated_delivery: body.estimated_delivery,
    };

    match services
        .orders
        .update_status(id, status, StatusActor::Vendor(vendor_id), update)
        .await
    {
        Ok(order) => {
            let view = shopper_orders::vendor_view(&order, vendor_id);
            (StatusCode::OK, Json(dto::vendor_view_to_json(&view))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn deliver_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let vendor_id = match require_vendor(&principal) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let id: OrderId = match dto::parse_or_400(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.orders.deliver_order(id, vendor_id).await {
        Ok(order) => {
            let view = shopper_orders::vendor_view(&order, vendor_id);
            (StatusCode::OK, Json(dto::vendor_view_to_json(&view))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn decline_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    Json(body): Json<dto::DeclineOrderRequest>,
) -> axum::response::Response {
    let vendor_id = match require_vendor(&principal) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let id: OrderId = match dto::parse_or_400(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.orders.decline_order(id, vendor_id, body.reason).await {
        Ok(order) => {
            let view = shopper_orders::vendor_view(&order, vendor_id);
            (StatusCode::OK, Json(dto::vendor_view_to_json(&view))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn analytics(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
) -> axum::response::Response {
    let vendor_id = match require_vendor(&principal) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.orders.vendor_analytics(vendor_id).await {
        Ok(analytics) => {
            (StatusCode::OK, Json(dto::analytics_to_json(&analytics))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn dashboard(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
) -> axum::response::Response {
    let vendor_id = match require_vendor(&principal) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.orders.vendor_dashboard(vendor_id).await {
        Ok(dashboard) => {
            (StatusCode::OK, Json(dto::dashboard_to_json(&dashboard))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}
