//! Client library for the custodia admin backend.
//!
//! Wires a persistent session store, an authenticated HTTP client with
//! silent credential renewal, and a deduplicating query cache into the
//! operations a console front-end needs: listing and mutating approvals,
//! claim requests, and custodial contracts, plus transfers and balance
//! lookups.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod queries;
pub mod resources;
pub mod session;
pub mod tokens;

pub use cache::{QueryCache, QueryOptions, QueryStatus};
pub use client::ApiClient;
pub use config::Config;
pub use error::{ApiError, ApiErrorKind};
pub use queries::Queries;
pub use session::{SessionStore, User};
