//! Catalog domain module.
//!
//! The order core reads products and adjusts their stock quantity through
//! the store interfaces in `shopper-infra`; product CRUD itself lives
//! outside this repository.

pub mod product;

pub use product::Product;
