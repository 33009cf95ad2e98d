//! Typed bindings for the backend's REST resources.
//!
//! Each module owns one resource family: the wire types (camelCase JSON) and
//! the raw calls through [`crate::client::ApiClient`]. Cache keys and
//! invalidation live a level up in [`crate::queries`].

pub mod approvals;
pub mod auth;
pub mod balance;
pub mod contracts;
pub mod transfers;
pub mod withdrawals;
