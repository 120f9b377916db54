#![forbid(unsafe_code)]

/**
 *     ______     ______   ______     __         __
 *    /\  ___\   /\__  _\ /\  __ \   /\ \       /\ \
 *    \ \___  \  \/_/\ \/ \ \  __ \  \ \ \____  \ \ \____
 *     \/\_____\    \ \_\  \ \_\ \_\  \ \_____\  \ \_____\
 *      \/_____/     \/_/   \/_/\/_/   \/_____/   \/_____/
 *
 * Author: Colin MacRitchie / Ripple Group
 */

/* Stall events and observer delivery */

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::warn;

use crate::metrics::MonitorMetrics;

/// A detected event-loop stall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StallEvent {
    /// Measured gap between consecutive probe wake-ups. Includes the nominal
    /// check interval, so a loop held for 300ms on a 100ms cadence reports
    /// roughly 400ms here.
    pub elapsed: Duration,
}

/// Stall notification interface.
pub trait StallObserver: Send + Sync {
    /// Called once per detected stall, in subscription order.
    fn on_stall(&self, event: &StallEvent);
}

impl<F> StallObserver for F
where
    F: Fn(&StallEvent) + Send + Sync,
{
    fn on_stall(&self, event: &StallEvent) {
        self(event);
    }
}

/// Null implementation of `StallObserver` for tests and benchmarks.
#[derive(Debug, Default)]
pub struct NullObserver;

impl StallObserver for NullObserver {
    #[inline(always)]
    fn on_stall(&self, _event: &StallEvent) {
        // No-op
    }
}

/// Registry of stall observers: built-in reporter in its own slot, externals
/// behind an `RwLock`.
///
/// The reporter fires only while the external list is empty; the first
/// subscription silences it permanently.
pub struct ObserverRegistry {
    reporter: Arc<dyn StallObserver>,
    external: RwLock<Vec<Arc<dyn StallObserver>>>,
    metrics: Arc<MonitorMetrics>,
}

impl ObserverRegistry {
    /// Creates a registry with the given built-in reporter.
    #[must_use]
    pub fn new(reporter: Arc<dyn StallObserver>, metrics: Arc<MonitorMetrics>) -> Self {
        Self {
            reporter,
            external: RwLock::new(Vec::new()),
            metrics,
        }
    }

    /// Appends an external observer.
    pub fn subscribe(&self, observer: Arc<dyn StallObserver>) {
        self.external.write().push(observer);
    }

    /// Number of external observers registered so far.
    #[inline]
    pub fn external_count(&self) -> usize {
        self.external.read().len()
    }

    /// Delivers one event to every external observer in subscription order,
    /// or to the built-in reporter when none was ever registered.
    pub fn dispatch(&self, event: &StallEvent) {
        // Snapshot under the read lock; an observer may itself subscribe.
        let external = self.external.read().clone();

        if external.is_empty() {
            self.deliver(&self.reporter, event);
            return;
        }

        for observer in &external {
            self.deliver(observer, event);
        }
    }

    /* One isolated delivery; a panicking observer must not stop the rest */
    fn deliver(&self, observer: &Arc<dyn StallObserver>, event: &StallEvent) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| observer.on_stall(event)));
        if outcome.is_err() {
            self.metrics.record_observer_panic();
            warn!("stall observer panicked; delivery continues");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Test observer that counts deliveries
    struct CountingObserver {
        calls: AtomicU64,
    }

    impl CountingObserver {
        fn new() -> Self {
            Self {
                calls: AtomicU64::new(0),
            }
        }
    }

    impl StallObserver for CountingObserver {
        fn on_stall(&self, _event: &StallEvent) {
            self.calls.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn registry_with(reporter: Arc<dyn StallObserver>) -> ObserverRegistry {
        ObserverRegistry::new(reporter, Arc::new(MonitorMetrics::default()))
    }

    fn event(ms: u64) -> StallEvent {
        StallEvent {
            elapsed: Duration::from_millis(ms),
        }
    }

    #[test]
    fn test_reporter_fires_with_no_externals() {
        let reporter = Arc::new(CountingObserver::new());
        let registry = registry_with(reporter.clone());

        registry.dispatch(&event(500));
        registry.dispatch(&event(600));

        assert_eq!(reporter.calls.load(Ordering::Relaxed), 2);
        assert_eq!(registry.external_count(), 0);
    }

    #[test]
    fn test_first_external_silences_reporter() {
        let reporter = Arc::new(CountingObserver::new());
        let external = Arc::new(CountingObserver::new());
        let registry = registry_with(reporter.clone());

        registry.subscribe(external.clone());
        registry.dispatch(&event(500));

        assert_eq!(reporter.calls.load(Ordering::Relaxed), 0);
        assert_eq!(external.calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_delivery_follows_subscription_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let registry = registry_with(Arc::new(NullObserver));

        for tag in ["a", "b", "c"] {
            let order = Arc::clone(&order);
            registry.subscribe(Arc::new(move |_: &StallEvent| {
                order.lock().push(tag);
            }));
        }

        registry.dispatch(&event(500));
        registry.dispatch(&event(700));

        assert_eq!(*order.lock(), vec!["a", "b", "c", "a", "b", "c"]);
    }

    #[test]
    fn test_panicking_observer_does_not_stop_delivery() {
        let metrics = Arc::new(MonitorMetrics::default());
        let registry = ObserverRegistry::new(Arc::new(NullObserver), Arc::clone(&metrics));
        let survivor = Arc::new(CountingObserver::new());

        registry.subscribe(Arc::new(|_: &StallEvent| {
            panic!("observer bug");
        }));
        registry.subscribe(survivor.clone());

        registry.dispatch(&event(500));
        registry.dispatch(&event(500));

        assert_eq!(survivor.calls.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.snapshot().observer_panics, 2);
    }

    #[test]
    fn test_closure_observer_receives_elapsed() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let registry = registry_with(Arc::new(NullObserver));

        let sink = Arc::clone(&seen);
        registry.subscribe(Arc::new(move |event: &StallEvent| {
            sink.lock().push(event.elapsed);
        }));

        registry.dispatch(&event(1234));

        assert_eq!(*seen.lock(), vec![Duration::from_millis(1234)]);
    }

    #[test]
    fn test_subscribing_from_inside_an_observer_does_not_deadlock() {
        let registry = Arc::new(registry_with(Arc::new(NullObserver)));
        let late = Arc::new(CountingObserver::new());

        let registry_clone = Arc::clone(&registry);
        let late_clone = Arc::clone(&late);
        registry.subscribe(Arc::new(move |_: &StallEvent| {
            registry_clone.subscribe(late_clone.clone());
        }));

        registry.dispatch(&event(500));
        assert_eq!(registry.external_count(), 2);

        // The late observer only sees events dispatched after it joined.
        assert_eq!(late.calls.load(Ordering::Relaxed), 0);
        registry.dispatch(&event(500));
        assert_eq!(late.calls.load(Ordering::Relaxed), 1);
    }
}
