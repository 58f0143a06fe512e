use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopper_core::{DomainError, DomainResult, Entity, ProductId, VendorId};

/// A sellable catalog product.
///
/// `quantity` is the available stock count, the inventory ledger's single
/// source of truth. It is never negative: decrements happen only through a
/// conditional reserve that checks availability first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub vendor_id: VendorId,
    pub sku: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Check if the product can be sold (active listing).
    pub fn is_sellable(&self) -> bool {
        self.is_active
    }

    /// Check if `quantity` units can currently be reserved.
    pub fn has_stock(&self, quantity: i64) -> bool {
        self.quantity >= quantity
    }

    /// Reserve `quantity` units against this product's stock.
    ///
    /// Fails on an inactive product or insufficient stock; on success the
    /// stock is decremented. Store backends apply this inside the order
    /// creation transaction so a failed checkout never leaves a partial
    /// decrement behind.
    pub fn reserve(&mut self, quantity: i64) -> DomainResult<()> {
        if quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if !self.is_sellable() {
            return Err(DomainError::product_unavailable(self.name.clone()));
        }
        if !self.has_stock(quantity) {
            return Err(DomainError::insufficient_stock(self.name.clone()));
        }
        self.quantity -= quantity;
        Ok(())
    }

    /// Return `quantity` units to stock. Used exactly once per item of a
    /// cancelled order.
    pub fn release(&mut self, quantity: i64) {
        self.quantity += quantity;
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
