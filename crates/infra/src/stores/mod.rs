//! Store interfaces for the order core.
//!
//! Addresses, buyers and products are external collaborators: the order
//! core only reads them (and adjusts product stock through the order store's
//! transactional operations). Orders are owned by this core.
//!
//! ## Atomicity contract
//!
//! `OrderStore::create` and `OrderStore::update` are each a single atomic
//! unit: order, items and stock adjustments commit together or not at all.
//! The in-memory backend holds one lock across the whole operation; the
//! Postgres backend runs one transaction per operation. A crash between
//! steps can therefore never leave stock decremented without a persisted
//! order, or a cancelled order without its stock restored.

mod in_memory;
mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

use async_trait::async_trait;
use thiserror::Error;

use shopper_catalog::Product;
use shopper_core::{AddressId, DomainError, OrderId, ProductId, UserId, VendorId};
use shopper_orders::Order;
use shopper_parties::{Address, Buyer};

/// Storage-level failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique-constraint violation on the human-readable order number.
    #[error("order number {0} already exists")]
    DuplicateOrderNumber(String),

    /// Conditional stock decrement found fewer units than requested.
    #[error("insufficient stock for {product}")]
    InsufficientStock { product: String },

    /// Product missing or inactive at commit time.
    #[error("product {product} is not available")]
    ProductUnavailable { product: String },

    /// Optimistic concurrency check failed (stale order version).
    #[error("version conflict for order {0}")]
    VersionConflict(OrderId),

    /// The targeted record does not exist.
    #[error("not found")]
    NotFound,

    /// Backend failure (connection, IO, corrupt row).
    #[error("backend failure: {0}")]
    Backend(String),
}

impl From<StoreError> for DomainError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::DuplicateOrderNumber(number) => {
                DomainError::conflict(format!("order number {number} already exists"))
            }
            StoreError::InsufficientStock { product } => DomainError::insufficient_stock(product),
            StoreError::ProductUnavailable { product } => DomainError::product_unavailable(product),
            StoreError::VersionConflict(id) => {
                DomainError::conflict(format!("order {id} was modified concurrently"))
            }
            StoreError::NotFound => DomainError::NotFound,
            StoreError::Backend(msg) => DomainError::storage(msg),
        }
    }
}

/// Read access to buyer addresses (address CRUD lives elsewhere).
#[async_trait]
pub trait AddressStore: Send + Sync {
    async fn address(&self, id: AddressId) -> Result<Option<Address>, StoreError>;
}

/// Read access to buyer identities.
#[async_trait]
pub trait BuyerStore: Send + Sync {
    async fn buyer(&self, id: UserId) -> Result<Option<Buyer>, StoreError>;
}

/// Read access to catalog products.
///
/// Stock adjustment is intentionally absent here: quantity changes only
/// inside `OrderStore::create` / `OrderStore::update`, where they are atomic
/// with the order write.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;
}

/// Persistence for orders and their items.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new order with its items, reserving stock for every item
    /// in cart-line submission order within the same atomic unit.
    ///
    /// Fails with [`StoreError::InsufficientStock`] /
    /// [`StoreError::ProductUnavailable`] without any partial effect, and
    /// with [`StoreError::DuplicateOrderNumber`] on an order-number
    /// collision.
    async fn create(&self, order: &Order) -> Result<(), StoreError>;

    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    async fn get_by_number(&self, order_number: &str) -> Result<Option<Order>, StoreError>;

    /// A buyer's orders, most recent first.
    async fn list_for_buyer(&self, user_id: UserId) -> Result<Vec<Order>, StoreError>;

    /// Orders containing at least one item captured for `vendor_id`, most
    /// recent first.
    async fn list_for_vendor(&self, vendor_id: VendorId) -> Result<Vec<Order>, StoreError>;

    /// Persist a mutated order, checking that the stored version still
    /// equals `expected_version` (and bumping it by one). When
    /// `release_stock` is set, every item's quantity is returned to its
    /// product in the same atomic unit (the cancellation compensation).
    async fn update(
        &self,
        order: &Order,
        expected_version: u64,
        release_stock: bool,
    ) -> Result<(), StoreError>;
}
