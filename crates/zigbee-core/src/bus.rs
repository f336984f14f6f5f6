//! Per-device consumption bus
//!
//! Relays power consumption readings (kWh) from whichever part of a device
//! produces them to every cluster that wants to expose them.

use crate::error::ClusterError;
use std::sync::{PoisonError, RwLock, Weak};

/// Receiver of consumption readings
pub trait ConsumptionListener: Send + Sync {
    /// Called once per published reading
    fn consumption_reported(&self, value: f64) -> Result<(), ClusterError>;
}

/// Many-listener broadcast of consumption readings.
///
/// Listeners are held weakly so a cluster's lifetime stays bound to its
/// device; dropped listeners are pruned on the next publish.
#[derive(Default)]
pub struct ConsumptionBus {
    listeners: RwLock<Vec<Weak<dyn ConsumptionListener>>>,
}

impl ConsumptionBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn subscribe(&self, listener: Weak<dyn ConsumptionListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Deliver a reading to every live listener.
    ///
    /// Returns the number of listeners that accepted it.
    pub fn publish(&self, value: f64) -> usize {
        let (live, dead) = {
            let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
            let live: Vec<_> = listeners.iter().filter_map(|l| l.upgrade()).collect();
            let dead = listeners.len() - live.len();
            (live, dead)
        };

        if dead > 0 {
            self.listeners
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|l| l.strong_count() > 0);
        }

        // Lock is released here so listeners may publish or subscribe
        let mut delivered = 0;
        for listener in live {
            match listener.consumption_reported(value) {
                Ok(()) => delivered += 1,
                Err(e) => tracing::warn!("Consumption listener rejected reading: {}", e),
            }
        }

        tracing::debug!("Published consumption {} to {} listeners", value, delivered);
        delivered
    }

    /// Number of listeners still alive
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|l| l.strong_count() > 0)
            .count()
    }
}

impl std::fmt::Debug for ConsumptionBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsumptionBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<f64>>,
    }

    impl ConsumptionListener for Recorder {
        fn consumption_reported(&self, value: f64) -> Result<(), ClusterError> {
            if value < 0.0 {
                return Err(ClusterError::InvalidReading(value));
            }
            self.seen.lock().unwrap().push(value);
            Ok(())
        }
    }

    #[test]
    fn test_publish_reaches_all_listeners() {
        let bus = ConsumptionBus::new();
        let a = Arc::new(Recorder::default());
        let b = Arc::new(Recorder::default());
        let weak_a = Arc::downgrade(&a);
        let weak_b = Arc::downgrade(&b);
        bus.subscribe(weak_a);
        bus.subscribe(weak_b);

        assert_eq!(bus.publish(1.5), 2);
        assert_eq!(*a.seen.lock().unwrap(), vec![1.5]);
        assert_eq!(*b.seen.lock().unwrap(), vec![1.5]);
    }

    #[test]
    fn test_publish_without_listeners() {
        let bus = ConsumptionBus::new();
        assert_eq!(bus.publish(3.0), 0);
    }

    #[test]
    fn test_dropped_listener_is_pruned() {
        let bus = ConsumptionBus::new();
        let kept = Arc::new(Recorder::default());
        let weak_kept = Arc::downgrade(&kept);
        bus.subscribe(weak_kept);
        {
            let dropped = Arc::new(Recorder::default());
            let weak_dropped = Arc::downgrade(&dropped);
            bus.subscribe(weak_dropped);
            assert_eq!(bus.listener_count(), 2);
        }

        assert_eq!(bus.listener_count(), 1);
        assert_eq!(bus.publish(0.25), 1);
        assert_eq!(bus.listeners.read().unwrap().len(), 1);
    }

    #[test]
    fn test_rejected_reading_not_counted() {
        let bus = ConsumptionBus::new();
        let listener = Arc::new(Recorder::default());
        let weak = Arc::downgrade(&listener);
        bus.subscribe(weak);

        assert_eq!(bus.publish(-1.0), 0);
        assert!(listener.seen.lock().unwrap().is_empty());
    }
}
