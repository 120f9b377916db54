//     ______     ______   ______     __         __
//    /\  ___\   /\__  _\ /\  __ \   /\ \       /\ \
//    \ \___  \  \/_/\ \/ \ \  __ \  \ \ \____  \ \ \____
//     \/\_____\    \ \_\  \ \_\ \_\  \ \_____\  \ \_____\
//      \/_____/     \/_/   \/_/\/_/   \/_____/   \/_____/
//
// Author: Colin MacRitchie / Ripple Group
//! Counters for probe activity and stall detection
//!
//! Plain process-local atomics, readable at any time through
//! [`MonitorMetrics::snapshot`]. With the `metrics` feature enabled the same
//! events are mirrored to the `metrics` facade for whatever exporter the host
//! has installed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[cfg(feature = "metrics")]
use metrics::{counter, histogram};

/// Counters maintained by a running [`StallMonitor`](crate::StallMonitor).
#[derive(Debug, Default)]
pub struct MonitorMetrics {
    /// Total probe wake-ups observed
    pub ticks_total: AtomicU64,

    /// Number of wake-ups whose measured gap exceeded the stall threshold
    pub stalls_detected: AtomicU64,

    /// Number of observer panics swallowed during delivery
    pub observer_panics: AtomicU64,

    /// Longest measured gap so far, in microseconds
    longest_stall_us: AtomicU64,
}

impl MonitorMetrics {
    /// Record one probe wake-up
    pub fn record_tick(&self) {
        self.ticks_total.fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "metrics")]
        counter!("stall_ticks_total").increment(1);
    }

    /// Record a detected stall and its measured gap
    pub fn record_stall(&self, elapsed: Duration) {
        self.stalls_detected.fetch_add(1, Ordering::Relaxed);

        let elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.longest_stall_us.fetch_max(elapsed_us, Ordering::Relaxed);

        #[cfg(feature = "metrics")]
        {
            counter!("stall_events_total").increment(1);
            histogram!("stall_blocked_duration_seconds").record(elapsed.as_secs_f64());
        }
    }

    /// Record an observer panic swallowed at the delivery site
    pub fn record_observer_panic(&self) {
        self.observer_panics.fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "metrics")]
        counter!("stall_observer_panics_total").increment(1);
    }

    /// Get snapshot of current counters
    #[must_use]
    pub fn snapshot(&self) -> MonitorMetricsSnapshot {
        MonitorMetricsSnapshot {
            ticks_total: self.ticks_total.load(Ordering::Relaxed),
            stalls_detected: self.stalls_detected.load(Ordering::Relaxed),
            observer_panics: self.observer_panics.load(Ordering::Relaxed),
            longest_stall: Duration::from_micros(self.longest_stall_us.load(Ordering::Relaxed)),
        }
    }
}

/// Point-in-time copy of [`MonitorMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorMetricsSnapshot {
    /// Total probe wake-ups observed
    pub ticks_total: u64,
    /// Number of wake-ups whose measured gap exceeded the stall threshold
    pub stalls_detected: u64,
    /// Number of observer panics swallowed during delivery
    pub observer_panics: u64,
    /// Longest measured gap so far (zero when no stall was detected)
    pub longest_stall: Duration,
}
