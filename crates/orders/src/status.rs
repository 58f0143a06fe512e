//! Order status state machine and payment constants.
//!
//! The transition table is a fixed directed graph with no self-loops:
//!
//! ```text
//! Pending    -> Confirmed, Cancelled
//! Confirmed  -> Processing, Cancelled
//! Processing -> Shipped, Cancelled
//! Shipped    -> Delivered
//! Delivered  -> Refunded
//! Cancelled  -> (terminal)
//! Refunded   -> (terminal)
//! ```

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use shopper_core::DomainError;

/// Order status lifecycle.
///
/// Serialized with the exact case-sensitive strings stored by the backend
/// (`"Pending"`, `"Confirmed"`, ...), so no `rename_all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Refunded,
    ];

    /// The states this status may move to.
    pub fn transitions(self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Confirmed, OrderStatus::Cancelled],
            OrderStatus::Confirmed => &[OrderStatus::Processing, OrderStatus::Cancelled],
            OrderStatus::Processing => &[OrderStatus::Shipped, OrderStatus::Cancelled],
            OrderStatus::Shipped => &[OrderStatus::Delivered],
            OrderStatus::Delivered => &[OrderStatus::Refunded],
            OrderStatus::Cancelled => &[],
            OrderStatus::Refunded => &[],
        }
    }

    /// Whether `self -> to` is a legal transition.
    pub fn can_transition(self, to: OrderStatus) -> bool {
        self.transitions().contains(&to)
    }

    /// Whether a buyer (or vendor decline) may still cancel an order in this
    /// status.
    pub fn is_cancellable(self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Processing
        )
    }

    /// Whether the order has reached the end of fulfillment.
    ///
    /// `Delivered` counts as terminal even though `Delivered -> Refunded`
    /// remains a legal transition: "terminal" means not cancellable and not
    /// further shippable, not "no outgoing edges".
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Refunded
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Refunded => "Refunded",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(OrderStatus::Pending),
            "Confirmed" => Ok(OrderStatus::Confirmed),
            "Processing" => Ok(OrderStatus::Processing),
            "Shipped" => Ok(OrderStatus::Shipped),
            "Delivered" => Ok(OrderStatus::Delivered),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            "Refunded" => Ok(OrderStatus::Refunded),
            other => Err(DomainError::validation(format!(
                "unknown order status: {other}"
            ))),
        }
    }
}

/// Payment status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Failed => "Failed",
            PaymentStatus::Refunded => "Refunded",
        }
    }
}

impl core::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported payment methods.
///
/// Only `CashOnDelivery` has an implemented flow; the others are persisted
/// values reserved for gateway integrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    CashOnDelivery,
    CreditCard,
    DebitCard,
    UPI,
    NetBanking,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "CashOnDelivery",
            PaymentMethod::CreditCard => "CreditCard",
            PaymentMethod::DebitCard => "DebitCard",
            PaymentMethod::UPI => "UPI",
            PaymentMethod::NetBanking => "NetBanking",
        }
    }
}

impl core::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CashOnDelivery" => Ok(PaymentMethod::CashOnDelivery),
            "CreditCard" => Ok(PaymentMethod::CreditCard),
            "DebitCard" => Ok(PaymentMethod::DebitCard),
            "UPI" => Ok(PaymentMethod::UPI),
            "NetBanking" => Ok(PaymentMethod::NetBanking),
            other => Err(DomainError::validation(format!(
                "unknown payment method: {other}"
            ))),
        }
    }
}
