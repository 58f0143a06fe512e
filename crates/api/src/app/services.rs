//! Store backend selection and order-service wiring.
//!
//! Configuration comes from the environment:
//! - `USE_PERSISTENT_STORES` (`true`/`false`, default `false`)
//! - `DATABASE_URL` (required when persistent)
//! - `SHOP_TAX_RATE` (default `0.10`)
//! - `SHOP_SHIPPING_FEE` (default `50`)

use std::sync::Arc;

use rust_decimal::Decimal;

use shopper_infra::{
    AddressStore, BuyerStore, InMemoryStore, NoDiscount, OrderService, OrderStore, PostgresStore,
    ProductStore,
};
use shopper_orders::PricingPolicy;

/// Application services shared with every handler.
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
}

impl AppServices {
    /// Wire the order service over one backend implementing every store
    /// trait.
    pub fn with_store<S>(store: Arc<S>, pricing: PricingPolicy) -> Self
    where
        S: AddressStore + BuyerStore + ProductStore + OrderStore + 'static,
    {
        let orders = OrderService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            Arc::new(NoDiscount),
            pricing,
        );
        Self {
            orders: Arc::new(orders),
        }
    }

    /// In-memory wiring (dev/test). Returns the store handle so fixtures can
    /// seed products, buyers and addresses.
    pub fn in_memory(pricing: PricingPolicy) -> (Self, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (Self::with_store(store.clone(), pricing), store)
    }
}

/// Build services from the environment.
pub async fn build_services() -> AppServices {
    let pricing = pricing_from_env();

    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if use_persistent {
        let database_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set when USE_PERSISTENT_STORES=true");
        let store = PostgresStore::connect(&database_url)
            .await
            .expect("failed to connect to Postgres");
        return AppServices::with_store(Arc::new(store), pricing);
    }

    let (services, _store) = AppServices::in_memory(pricing);
    services
}

fn pricing_from_env() -> PricingPolicy {
    let default = PricingPolicy::default();
    PricingPolicy {
        tax_rate: env_decimal("SHOP_TAX_RATE", default.tax_rate),
        shipping_fee: env_decimal("SHOP_SHIPPING_FEE", default.shipping_fee),
    }
}

fn env_decimal(name: &str, default: Decimal) -> Decimal {
    match std::env::var(name) {
        Ok(raw) => match raw.parse::<Decimal>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(%name, %raw, "unparseable decimal in environment, using default");
                default
            }
        },
        Err(_) => default,
    }
}
