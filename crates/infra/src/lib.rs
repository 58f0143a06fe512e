//! Infrastructure layer: store interfaces, backends, and the order service.

pub mod discount;
pub mod order_service;
pub mod stores;

pub use discount::{DiscountPolicy, NoDiscount};
pub use order_service::{CartLine, CreateOrder, OrderService, StatusActor};
pub use stores::{
    AddressStore, BuyerStore, InMemoryStore, OrderStore, PostgresStore, ProductStore, StoreError,
};
