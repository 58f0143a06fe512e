//! Request principal.
//!
//! Authentication is an external collaborator: an upstream gateway validates
//! the caller and forwards the authenticated identity in trusted headers
//! (see [`crate::middleware`]). This module only models what the order core
//! needs: who is calling and in which role.

use shopper_core::{UserId, VendorId};

/// Caller role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Buyer,
    Vendor,
    Admin,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "buyer" => Some(Role::Buyer),
            "vendor" => Some(Role::Vendor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Authenticated identity for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    user_id: UserId,
    role: Role,
    vendor_id: Option<VendorId>,
}

impl Principal {
    pub fn new(user_id: UserId, role: Role, vendor_id: Option<VendorId>) -> Self {
        Self {
            user_id,
            role,
            vendor_id,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// The vendor identity, present iff the caller acts as a vendor.
    pub fn vendor_id(&self) -> Option<VendorId> {
        self.vendor_id
    }
}
