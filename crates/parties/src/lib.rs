//! Parties domain module (buyers and their addresses).
//!
//! The order core only **consumes** these records: address/user CRUD lives
//! outside this repository and is reached through the store interfaces in
//! `shopper-infra`.

pub mod address;
pub mod user;

pub use address::{Address, AddressKind};
pub use user::Buyer;
