//! # gridstore-pool
//!
//! Connection pool for the GridStore client driver.
//!
//! The pool owns a set of authenticated transport connections and a set of
//! connection providers, and hands out exclusive checkouts to concurrent
//! callers. Exclusivity is enforced by ownership: a checked-out connection
//! is moved out of the pool's idle list into a [`PooledConnection`] and
//! cannot be observed by another caller until it is returned.
//!
//! Handshake and authentication run during checkout, while the pool-wide
//! lock is held. This serializes connection setup across callers, a
//! deliberate simplicity trade-off: the alternative (publishing the
//! membership change under the lock but doing setup I/O outside it) avoids
//! the contention at the cost of duplicate-creation races.
//!
//! Pool activity is reported through an injectable [`MetricsSink`], so
//! tests and embedders observe counters without process-global state.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod connection;
pub mod error;
pub mod metrics;
pub mod pool;
pub mod provider;

pub use connection::{Connection, Credentials};
pub use error::PoolError;
pub use metrics::{ConnectionMetrics, MetricsSink, MetricsSnapshot};
pub use pool::{Pool, PooledConnection};
pub use provider::{ConnectionProvider, ServerProvider};
