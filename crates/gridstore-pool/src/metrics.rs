//! Pool metrics reporting.
//!
//! The pool reports lifecycle events through a [`MetricsSink`] supplied at
//! construction time. The default [`ConnectionMetrics`] implementation
//! keeps three counters behind a short-critical-section mutex; embedders
//! with their own telemetry pipeline can substitute any sink.

use std::sync::Arc;

use parking_lot::Mutex;

/// Receiver for pool lifecycle events.
pub trait MetricsSink: Send + Sync {
    /// A provider created a brand-new connection.
    fn connection_created(&self);

    /// A connection's transport was closed and removed from the pool.
    fn connection_discarded(&self);

    /// A checkout succeeded.
    fn checkout_started(&self);

    /// A checked-out connection was returned or discarded.
    fn checkout_ended(&self);
}

/// Point-in-time view of the default metrics counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Connections currently checked out.
    pub active: i64,
    /// Connections created by providers since pool start.
    pub created: u64,
    /// Connections discarded since pool start.
    pub discarded: u64,
}

#[derive(Debug, Default)]
struct CountersInner {
    active: i64,
    created: u64,
    discarded: u64,
}

/// Default metrics sink: three monotonic-adjusted counters.
#[derive(Debug, Default)]
pub struct ConnectionMetrics {
    inner: Mutex<CountersInner>,
}

impl ConnectionMetrics {
    /// Create a sink with all counters at zero.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Read the current counter values.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.inner.lock();
        MetricsSnapshot {
            active: inner.active,
            created: inner.created,
            discarded: inner.discarded,
        }
    }
}

impl MetricsSink for ConnectionMetrics {
    fn connection_created(&self) {
        self.inner.lock().created += 1;
    }

    fn connection_discarded(&self) {
        self.inner.lock().discarded += 1;
    }

    fn checkout_started(&self) {
        self.inner.lock().active += 1;
    }

    fn checkout_ended(&self) {
        self.inner.lock().active -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_track_lifecycle() {
        let metrics = ConnectionMetrics::new();
        metrics.connection_created();
        metrics.checkout_started();
        metrics.checkout_started();
        metrics.checkout_ended();
        metrics.connection_discarded();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.active, 1);
        assert_eq!(snapshot.created, 1);
        assert_eq!(snapshot.discarded, 1);
    }
}
