//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store backend selection and order-service wiring
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub fn build_app(services: AppServices) -> Router {
    // Protected routes: require a forwarded principal.
    let protected = routes::router()
        .layer(Extension(std::sync::Arc::new(services)))
        .layer(axum::middleware::from_fn(middleware::principal_middleware));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new())
}
