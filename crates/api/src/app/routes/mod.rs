use axum::Router;

pub mod orders;
pub mod system;
pub mod vendor;

/// All protected routes (principal required).
pub fn router() -> Router {
    Router::new().merge(orders::router()).merge(vendor::router())
}
