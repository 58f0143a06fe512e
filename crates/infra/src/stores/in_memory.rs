//! In-memory store backend for tests and development.
//!
//! One `RwLock` guards the whole state, so every `OrderStore` operation is
//! trivially atomic: stock reservation and the order write happen under the
//! same exclusive lock.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use shopper_catalog::Product;
use shopper_core::{AddressId, DomainError, Entity, OrderId, ProductId, UserId, VendorId};
use shopper_orders::Order;
use shopper_parties::{Address, Buyer};

use super::{AddressStore, BuyerStore, OrderStore, ProductStore, StoreError};

fn upsert<E>(map: &mut HashMap<E::Id, E>, entity: E)
where
    E: Entity,
    E::Id: Copy,
{
    map.insert(*entity.id(), entity);
}

#[derive(Debug, Default)]
struct State {
    addresses: HashMap<AddressId, Address>,
    buyers: HashMap<UserId, Buyer>,
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
}

/// In-memory backend implementing every store trait.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an address (dev/test fixture).
    pub fn insert_address(&self, address: Address) {
        if let Ok(mut state) = self.inner.write() {
            upsert(&mut state.addresses, address);
        }
    }

    /// Seed a buyer (dev/test fixture).
    pub fn insert_buyer(&self, buyer: Buyer) {
        if let Ok(mut state) = self.inner.write() {
            upsert(&mut state.buyers, buyer);
        }
    }

    /// Seed a product (dev/test fixture).
    pub fn insert_product(&self, product: Product) {
        if let Ok(mut state) = self.inner.write() {
            upsert(&mut state.products, product);
        }
    }

    /// Current stock of a product, if it exists.
    pub fn stock_of(&self, id: ProductId) -> Option<i64> {
        self.inner
            .read()
            .ok()
            .and_then(|state| state.products.get(&id).map(|p| p.quantity))
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }
}

fn reserve_in(product: &mut Product, quantity: i64) -> Result<(), StoreError> {
    let name = product.name.clone();
    product.reserve(quantity).map_err(|e| match e {
        DomainError::InsufficientStock(_) => StoreError::InsufficientStock { product: name },
        _ => StoreError::ProductUnavailable { product: name },
    })
}

#[async_trait]
impl AddressStore for InMemoryStore {
    async fn address(&self, id: AddressId) -> Result<Option<Address>, StoreError> {
        Ok(self.read()?.addresses.get(&id).cloned())
    }
}

#[async_trait]
impl BuyerStore for InMemoryStore {
    async fn buyer(&self, id: UserId) -> Result<Option<Buyer>, StoreError> {
        Ok(self.read()?.buyers.get(&id).cloned())
    }
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.read()?.products.get(&id).cloned())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn create(&self, order: &Order) -> Result<(), StoreError> {
        let mut state = self.write()?;

        if state
            .orders
            .values()
            .any(|o| o.order_number == order.order_number)
        {
            return Err(StoreError::DuplicateOrderNumber(order.order_number.clone()));
        }

        // Reserve against scratch copies first (a product may appear on
        // several lines); nothing is written back until every line holds.
        let mut reserved: HashMap<ProductId, Product> = HashMap::new();
        for item in &order.items {
            if !reserved.contains_key(&item.product_id) {
                let product = state
                    .products
                    .get(&item.product_id)
                    .ok_or_else(|| StoreError::ProductUnavailable {
                        product: item.product_name.clone(),
                    })?
                    .clone();
                reserved.insert(item.product_id, product);
            }
            if let Some(product) = reserved.get_mut(&item.product_id) {
                reserve_in(product, item.quantity)?;
            }
        }

        for (product_id, product) in reserved {
            state.products.insert(product_id, product);
        }
        upsert(&mut state.orders, order.clone());
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.read()?.orders.get(&id).cloned())
    }

    async fn get_by_number(&self, order_number: &str) -> Result<Option<Order>, StoreError> {
        Ok(self
            .read()?
            .orders
            .values()
            .find(|o| o.order_number == order_number)
            .cloned())
    }

    async fn list_for_buyer(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        let state = self.read()?;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn list_for_vendor(&self, vendor_id: VendorId) -> Result<Vec<Order>, StoreError> {
        let state = self.read()?;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.items.iter().any(|i| i.vendor_id == vendor_id))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn update(
        &self,
        order: &Order,
        expected_version: u64,
        release_stock: bool,
    ) -> Result<(), StoreError> {
        let mut state = self.write()?;

        let stored_version = match state.orders.get(&order.id) {
            Some(stored) => stored.version,
            None => return Err(StoreError::NotFound),
        };
        if stored_version != expected_version {
            return Err(StoreError::VersionConflict(order.id));
        }

        if release_stock {
            for item in &order.items {
                // Products are externally owned; one that has since vanished
                // simply has nothing to restore.
                if let Some(product) = state.products.get_mut(&item.product_id) {
                    product.release(item.quantity);
                }
            }
        }

        let mut persisted = order.clone();
        persisted.version = expected_version + 1;
        upsert(&mut state.orders, persisted);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    use shopper_orders::{generate_order_number, Checkout, OrderItem, PaymentMethod, PricingPolicy};

    fn product(quantity: i64) -> Product {
        Product {
            id: ProductId::new(),
            vendor_id: VendorId::new(),
            sku: "SKU-9".to_string(),
            name: "Lamp".to_string(),
            price: Decimal::new(10000, 2),
            quantity,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn order_for(products: &[(&Product, i64)], suffix: u32) -> Order {
        let now = Utc::now();
        let id = OrderId::new();
        let items: Vec<OrderItem> = products
            .iter()
            .map(|(p, qty)| OrderItem::from_product(id, p, *qty).unwrap())
            .collect();
        let lines: Vec<(Decimal, i64)> = items.iter().map(|i| (i.price, i.quantity)).collect();
        Order::create(
            Checkout {
                id,
                order_number: generate_order_number(now, suffix),
                user_id: UserId::new(),
                shipping_address_id: AddressId::new(),
                billing_address_id: AddressId::new(),
                payment_method: PaymentMethod::CashOnDelivery,
                quote: PricingPolicy::default().quote(&lines, Decimal::ZERO),
                notes: None,
                now,
            },
            items,
        )
    }

    #[tokio::test]
    async fn create_reserves_stock() {
        let store = InMemoryStore::new();
        let p = product(5);
        store.insert_product(p.clone());

        let order = order_for(&[(&p, 3)], 1);
        store.create(&order).await.unwrap();

        assert_eq!(store.stock_of(p.id), Some(2));
        assert!(store.get(order.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn failed_line_rolls_back_earlier_reservations() {
        let store = InMemoryStore::new();
        let plenty = product(10);
        let scarce = product(1);
        store.insert_product(plenty.clone());
        store.insert_product(scarce.clone());

        let order = order_for(&[(&plenty, 2), (&scarce, 5)], 2);
        let err = store.create(&order).await.unwrap_err();

        assert!(matches!(err, StoreError::InsufficientStock { .. }));
        assert_eq!(store.stock_of(plenty.id), Some(10));
        assert_eq!(store.stock_of(scarce.id), Some(1));
        assert!(store.get(order.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn repeated_product_lines_reserve_cumulatively() {
        let store = InMemoryStore::new();
        let p = product(5);
        store.insert_product(p.clone());

        // Two lines of the same product exceeding stock together must fail
        // without any partial decrement.
        let order = order_for(&[(&p, 3), (&p, 3)], 7);
        let err = store.create(&order).await.unwrap_err();
        assert!(matches!(err, StoreError::InsufficientStock { .. }));
        assert_eq!(store.stock_of(p.id), Some(5));

        // Two lines that fit together succeed.
        let order = order_for(&[(&p, 3), (&p, 2)], 8);
        store.create(&order).await.unwrap();
        assert_eq!(store.stock_of(p.id), Some(0));
    }

    #[tokio::test]
    async fn duplicate_order_number_is_rejected() {
        let store = InMemoryStore::new();
        let p = product(10);
        store.insert_product(p.clone());

        let first = order_for(&[(&p, 1)], 3);
        store.create(&first).await.unwrap();

        let mut second = order_for(&[(&p, 1)], 4);
        second.order_number = first.order_number.clone();
        let err = store.create(&second).await.unwrap_err();

        assert!(matches!(err, StoreError::DuplicateOrderNumber(_)));
        // The duplicate must not have reserved anything.
        assert_eq!(store.stock_of(p.id), Some(9));
    }

    #[tokio::test]
    async fn update_checks_version_and_releases_stock() {
        let store = InMemoryStore::new();
        let p = product(5);
        store.insert_product(p.clone());

        let order = order_for(&[(&p, 3)], 5);
        store.create(&order).await.unwrap();

        let mut cancelled = store.get(order.id).await.unwrap().unwrap();
        cancelled.force_cancel(Some("test".to_string()), Utc::now()).unwrap();
        store.update(&cancelled, 0, true).await.unwrap();

        assert_eq!(store.stock_of(p.id), Some(5));
        let stored = store.get(order.id).await.unwrap().unwrap();
        assert_eq!(stored.version, 1);

        // A second writer holding the stale version loses.
        let err = store.update(&cancelled, 0, false).await.unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict(_)));
    }
}
