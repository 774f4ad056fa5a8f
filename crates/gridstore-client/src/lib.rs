//! # gridstore-client
//!
//! High-level async client for GridStore data grids.
//!
//! This is the primary public API surface of the driver. A [`Client`]
//! wraps a shared connection [`Pool`] and exposes the grid operations:
//! region puts/gets (single and bulk), removes, sizing, server-side
//! function execution and OQL queries. Each operation is one schema
//! message run through the exchange engine, which frames it on the wire
//! and transparently retries transient transport failures on a fresh
//! connection, within a bounded [`RetryPolicy`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gridstore_client::{Client, Json, Pool, Query};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = Arc::new(Pool::new());
//!     pool.add_server("grid-1.internal", 40404).await;
//!     pool.add_credentials("app", "secret").await;
//!
//!     let client = Client::new(pool);
//!     client.put("greetings", "k1", "hello").await?;
//!     let greeting: String = client.get("greetings", "k1").await?;
//!
//!     let query = Query::new("SELECT total FROM /orders WHERE id = $1").bind(&1001i32);
//!     let total: f64 = client.query_single(&query).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod error;
pub mod exchange;
pub mod query;

pub use client::{Client, GetAllResult};
pub use error::Error;
pub use exchange::RetryPolicy;
pub use query::Query;

// Re-export the types callers need at the API boundary
pub use gridstore_pool::{
    ConnectionMetrics, ConnectionProvider, MetricsSink, MetricsSnapshot, Pool, ServerProvider,
};
pub use gridstore_types::{FromValue, Json, ToValue, Value};
