//! Postgres store backend.
//!
//! Every `OrderStore` write runs in one transaction. Stock reservation is a
//! conditional decrement checked by affected-row count, so concurrent
//! checkouts can never drive a quantity negative:
//!
//! ```sql
//! UPDATE products SET quantity = quantity - $q
//! WHERE id = $id AND is_active AND quantity >= $q
//! ```
//!
//! Status writes carry an optimistic `version` check; a lost race surfaces
//! as [`StoreError::VersionConflict`]. The unique constraint on
//! `orders.order_number` maps Postgres error code `23505` to
//! [`StoreError::DuplicateOrderNumber`].

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use shopper_catalog::Product;
use shopper_core::{AddressId, OrderId, ProductId, UserId, VendorId};
use shopper_orders::{Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus};
use shopper_parties::{Address, AddressKind, Buyer};

use super::{AddressStore, BuyerStore, OrderStore, ProductStore, StoreError};

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

const UNIQUE_VIOLATION: &str = "23505";

/// Postgres-backed store implementing every store trait.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl From<sqlx::Error> for StoreError {
    fn from(value: sqlx::Error) -> Self {
        StoreError::Backend(value.to_string())
    }
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect and apply the schema.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Apply the idempotent schema (CREATE TABLE IF NOT EXISTS).
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&*self.pool).await?;
        Ok(())
    }

    async fn items_for(&self, order_ids: &[Uuid]) -> Result<Vec<OrderItem>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, order_id, product_id, vendor_id, product_name, product_sku, \
                    quantity, price, discount, tax, line_total \
             FROM order_items WHERE order_id = ANY($1) ORDER BY id",
        )
        .bind(order_ids)
        .fetch_all(&*self.pool)
        .await?;

        rows.iter().map(item_from_row).collect()
    }

    async fn hydrate(&self, row: Option<PgRow>) -> Result<Option<Order>, StoreError> {
        let Some(row) = row else { return Ok(None) };
        let mut order = order_from_row(&row)?;
        order.items = self.items_for(&[Uuid::from(order.id)]).await?;
        Ok(Some(order))
    }

    async fn hydrate_all(&self, rows: Vec<PgRow>) -> Result<Vec<Order>, StoreError> {
        let mut orders = rows
            .iter()
            .map(order_from_row)
            .collect::<Result<Vec<Order>, StoreError>>()?;
        if orders.is_empty() {
            return Ok(orders);
        }

        let ids: Vec<Uuid> = orders.iter().map(|o| Uuid::from(o.id)).collect();
        let items = self.items_for(&ids).await?;
        for order in &mut orders {
            order.items = items
                .iter()
                .filter(|i| i.order_id == order.id)
                .cloned()
                .collect();
        }
        Ok(orders)
    }
}

/// Reserve stock for one item inside the creation transaction.
async fn reserve(
    tx: &mut Transaction<'_, Postgres>,
    item: &OrderItem,
) -> Result<(), StoreError> {
    let updated = sqlx::query(
        "UPDATE products SET quantity = quantity - $1 \
         WHERE id = $2 AND is_active AND quantity >= $1",
    )
    .bind(item.quantity)
    .bind(Uuid::from(item.product_id))
    .execute(&mut **tx)
    .await?;

    if updated.rows_affected() == 1 {
        return Ok(());
    }

    // Zero rows: distinguish "not enough stock" from "missing or inactive".
    let row = sqlx::query("SELECT is_active FROM products WHERE id = $1")
        .bind(Uuid::from(item.product_id))
        .fetch_optional(&mut **tx)
        .await?;
    match row {
        Some(r) if r.try_get::<bool, _>("is_active")? => Err(StoreError::InsufficientStock {
            product: item.product_name.clone(),
        }),
        _ => Err(StoreError::ProductUnavailable {
            product: item.product_name.clone(),
        }),
    }
}

/// Return stock for one item inside the cancellation transaction. A product
/// that has since been removed has nothing to restore.
async fn release(
    tx: &mut Transaction<'_, Postgres>,
    item: &OrderItem,
) -> Result<(), StoreError> {
    sqlx::query("UPDATE products SET quantity = quantity + $1 WHERE id = $2")
        .bind(item.quantity)
        .bind(Uuid::from(item.product_id))
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[async_trait]
impl AddressStore for PostgresStore {
    #[instrument(skip(self))]
    async fn address(&self, id: AddressId) -> Result<Option<Address>, StoreError> {
        let row = sqlx::query(
            "SELECT id, user_id, line1, line2, city, state, country, postal_code, \
                    is_default, kind, created_at \
             FROM addresses WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_optional(&*self.pool)
        .await?;

        row.map(|r| address_from_row(&r)).transpose()
    }
}

#[async_trait]
impl BuyerStore for PostgresStore {
    #[instrument(skip(self))]
    async fn buyer(&self, id: UserId) -> Result<Option<Buyer>, StoreError> {
        let row = sqlx::query(
            "SELECT id, email, first_name, last_name, phone_number, is_active, created_at \
             FROM users WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_optional(&*self.pool)
        .await?;

        row.map(|r| buyer_from_row(&r)).transpose()
    }
}

#[async_trait]
impl ProductStore for PostgresStore {
    #[instrument(skip(self))]
    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(
            "SELECT id, vendor_id, sku, name, price, quantity, is_active, created_at \
             FROM products WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_optional(&*self.pool)
        .await?;

        row.map(|r| product_from_row(&r)).transpose()
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    #[instrument(skip(self, order), fields(order_id = %order.id, order_number = %order.order_number))]
    async fn create(&self, order: &Order) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        // Reserve in cart-line submission order; any failure rolls the whole
        // transaction back.
        for item in &order.items {
            reserve(&mut tx, item).await?;
        }

        let inserted = sqlx::query(
            "INSERT INTO orders (id, order_number, user_id, status, subtotal, tax_amount, \
                shipping_amount, discount_amount, total_amount, payment_method, payment_status, \
                notes, shipping_address_id, billing_address_id, tracking_number, \
                estimated_delivery, delivered_at, cancelled_at, cancellation_reason, version, \
                created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
                $17, $18, $19, $20, $21, $22)",
        )
        .bind(Uuid::from(order.id))
        .bind(&order.order_number)
        .bind(Uuid::from(order.user_id))
        .bind(order.status.as_str())
        .bind(order.subtotal)
        .bind(order.tax_amount)
        .bind(order.shipping_amount)
        .bind(order.discount_amount)
        .bind(order.total_amount)
        .bind(order.payment_method.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.notes.as_deref())
        .bind(Uuid::from(order.shipping_address_id))
        .bind(Uuid::from(order.billing_address_id))
        .bind(order.tracking_number.as_deref())
        .bind(order.estimated_delivery)
        .bind(order.delivered_at)
        .bind(order.cancelled_at)
        .bind(order.cancellation_reason.as_deref())
        .bind(order.version as i64)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            if is_unique_violation(&e) {
                return Err(StoreError::DuplicateOrderNumber(order.order_number.clone()));
            }
            return Err(e.into());
        }

        for item in &order.items {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, product_id, vendor_id, product_name, \
                    product_sku, quantity, price, discount, tax, line_total) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            )
            .bind(Uuid::from(item.id))
            .bind(Uuid::from(item.order_id))
            .bind(Uuid::from(item.product_id))
            .bind(Uuid::from(item.vendor_id))
            .bind(&item.product_name)
            .bind(&item.product_sku)
            .bind(item.quantity)
            .bind(item.price)
            .bind(item.discount)
            .bind(item.tax)
            .bind(item.line_total)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(&select_orders("WHERE id = $1"))
            .bind(Uuid::from(id))
            .fetch_optional(&*self.pool)
            .await?;
        self.hydrate(row).await
    }

    #[instrument(skip(self))]
    async fn get_by_number(&self, order_number: &str) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(&select_orders("WHERE order_number = $1"))
            .bind(order_number)
            .fetch_optional(&*self.pool)
            .await?;
        self.hydrate(row).await
    }

    #[instrument(skip(self))]
    async fn list_for_buyer(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query(&select_orders("WHERE user_id = $1 ORDER BY created_at DESC"))
            .bind(Uuid::from(user_id))
            .fetch_all(&*self.pool)
            .await?;
        self.hydrate_all(rows).await
    }

    #[instrument(skip(self))]
    async fn list_for_vendor(&self, vendor_id: VendorId) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query(&select_orders(
            "WHERE id IN (SELECT order_id FROM order_items WHERE vendor_id = $1) \
             ORDER BY created_at DESC",
        ))
        .bind(Uuid::from(vendor_id))
        .fetch_all(&*self.pool)
        .await?;
        self.hydrate_all(rows).await
    }

    #[instrument(skip(self, order), fields(order_id = %order.id, status = %order.status))]
    async fn update(
        &self,
        order: &Order,
        expected_version: u64,
        release_stock: bool,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE orders SET status = $1, payment_status = $2, tracking_number = $3, \
                estimated_delivery = $4, delivered_at = $5, cancelled_at = $6, \
                cancellation_reason = $7, version = $8, updated_at = $9 \
             WHERE id = $10 AND version = $11",
        )
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.tracking_number.as_deref())
        .bind(order.estimated_delivery)
        .bind(order.delivered_at)
        .bind(order.cancelled_at)
        .bind(order.cancellation_reason.as_deref())
        .bind((expected_version + 1) as i64)
        .bind(order.updated_at)
        .bind(Uuid::from(order.id))
        .bind(expected_version as i64)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let exists = sqlx::query("SELECT 1 FROM orders WHERE id = $1")
                .bind(Uuid::from(order.id))
                .fetch_optional(&mut *tx)
                .await?;
            return Err(match exists {
                Some(_) => StoreError::VersionConflict(order.id),
                None => StoreError::NotFound,
            });
        }

        if release_stock {
            for item in &order.items {
                release(&mut tx, item).await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

fn select_orders(clause: &str) -> String {
    format!(
        "SELECT id, order_number, user_id, status, subtotal, tax_amount, shipping_amount, \
                discount_amount, total_amount, payment_method, payment_status, notes, \
                shipping_address_id, billing_address_id, tracking_number, estimated_delivery, \
                delivered_at, cancelled_at, cancellation_reason, version, created_at, updated_at \
         FROM orders {clause}"
    )
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION)
    )
}

fn corrupt(column: &str, err: impl core::fmt::Display) -> StoreError {
    StoreError::Backend(format!("corrupt {column} column: {err}"))
}

fn order_from_row(row: &PgRow) -> Result<Order, StoreError> {
    let status = OrderStatus::from_str(row.try_get::<&str, _>("status")?)
        .map_err(|e| corrupt("status", e))?;
    let payment_method = PaymentMethod::from_str(row.try_get::<&str, _>("payment_method")?)
        .map_err(|e| corrupt("payment_method", e))?;
    let payment_status = match row.try_get::<&str, _>("payment_status")? {
        "Pending" => PaymentStatus::Pending,
        "Paid" => PaymentStatus::Paid,
        "Failed" => PaymentStatus::Failed,
        "Refunded" => PaymentStatus::Refunded,
        other => return Err(corrupt("payment_status", other)),
    };

    Ok(Order {
        id: OrderId::from_uuid(row.try_get("id")?),
        order_number: row.try_get("order_number")?,
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        status,
        subtotal: row.try_get("subtotal")?,
        tax_amount: row.try_get("tax_amount")?,
        shipping_amount: row.try_get("shipping_amount")?,
        discount_amount: row.try_get("discount_amount")?,
        total_amount: row.try_get("total_amount")?,
        payment_method,
        payment_status,
        notes: row.try_get("notes")?,
        shipping_address_id: AddressId::from_uuid(row.try_get("shipping_address_id")?),
        billing_address_id: AddressId::from_uuid(row.try_get("billing_address_id")?),
        tracking_number: row.try_get("tracking_number")?,
        estimated_delivery: row.try_get("estimated_delivery")?,
        delivered_at: row.try_get("delivered_at")?,
        cancelled_at: row.try_get("cancelled_at")?,
        cancellation_reason: row.try_get("cancellation_reason")?,
        version: row.try_get::<i64, _>("version")? as u64,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        items: Vec::new(),
    })
}

fn item_from_row(row: &PgRow) -> Result<OrderItem, StoreError> {
    Ok(OrderItem {
        id: shopper_core::OrderItemId::from_uuid(row.try_get("id")?),
        order_id: OrderId::from_uuid(row.try_get("order_id")?),
        product_id: ProductId::from_uuid(row.try_get("product_id")?),
        vendor_id: VendorId::from_uuid(row.try_get("vendor_id")?),
        product_name: row.try_get("product_name")?,
        product_sku: row.try_get("product_sku")?,
        quantity: row.try_get("quantity")?,
        price: row.try_get("price")?,
        discount: row.try_get("discount")?,
        tax: row.try_get("tax")?,
        line_total: row.try_get("line_total")?,
    })
}

fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
    Ok(Product {
        id: ProductId::from_uuid(row.try_get("id")?),
        vendor_id: VendorId::from_uuid(row.try_get("vendor_id")?),
        sku: row.try_get("sku")?,
        name: row.try_get("name")?,
        price: row.try_get("price")?,
        quantity: row.try_get("quantity")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
    })
}

fn address_from_row(row: &PgRow) -> Result<Address, StoreError> {
    let kind = match row.try_get::<&str, _>("kind")? {
        "shipping" => AddressKind::Shipping,
        "billing" => AddressKind::Billing,
        "both" => AddressKind::Both,
        other => return Err(corrupt("kind", other)),
    };

    Ok(Address {
        id: AddressId::from_uuid(row.try_get("id")?),
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        line1: row.try_get("line1")?,
        line2: row.try_get("line2")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        country: row.try_get("country")?,
        postal_code: row.try_get("postal_code")?,
        is_default: row.try_get("is_default")?,
        kind,
        created_at: row.try_get("created_at")?,
    })
}

fn buyer_from_row(row: &PgRow) -> Result<Buyer, StoreError> {
    Ok(Buyer {
        id: UserId::from_uuid(row.try_get("id")?),
        email: row.try_get("email")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        phone_number: row.try_get("phone_number")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
    })
}
