//     ______     ______   ______     __         __
//    /\  ___\   /\__  _\ /\  __ \   /\ \       /\ \
//    \ \___  \  \/_/\ \/ \ \  __ \  \ \ \____  \ \ \____
//     \/\_____\    \ \_\  \ \_\ \_\  \ \_____\  \ \_____\
//      \/_____/     \/_/   \/_/\/_/   \/_____/   \/_____/
//
// Author: Colin MacRitchie / Ripple Group
//! Event-loop stall monitor
//!
//! The monitor spawns a probe task onto the runtime under observation. The
//! probe sleeps for `check_interval`, and on every wake compares the actual
//! gap since the previous wake against `min_block_time`. A timer can only
//! fire once the event loop returns to its scheduling point, so a wake that
//! arrives late is direct evidence that something held the loop.

#![forbid(unsafe_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

use crate::metrics::{MonitorMetrics, MonitorMetricsSnapshot};
use crate::observer::{ObserverRegistry, StallEvent, StallObserver};
use crate::reporter::DefaultReporter;

/// Default probe cadence.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_millis(500);

/// Default stall threshold.
pub const DEFAULT_MIN_BLOCK_TIME: Duration = Duration::from_millis(3000);

/// Configuration for a [`StallMonitor`], fixed at start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Nominal spacing between probe wake-ups.
    pub check_interval: Duration,

    /// Measured gap above which a wake-up counts as a stall.
    pub min_block_time: Duration,
}

impl MonitorConfig {
    /// Checks that both durations are non-zero.
    ///
    /// No ordering between the two fields is enforced: a `min_block_time`
    /// below `check_interval` makes essentially every tick a stall, which is
    /// a caller mistake rather than an invalid configuration.
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.check_interval.is_zero() {
            return Err(MonitorError::InvalidCheckInterval);
        }
        if self.min_block_time.is_zero() {
            return Err(MonitorError::InvalidMinBlockTime);
        }
        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval: DEFAULT_CHECK_INTERVAL,
            min_block_time: DEFAULT_MIN_BLOCK_TIME,
        }
    }
}

/// Errors surfaced when starting a monitor.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Check interval was zero
    #[error("check interval must be positive")]
    InvalidCheckInterval,

    /// Stall threshold was zero
    #[error("minimum block time must be positive")]
    InvalidMinBlockTime,

    /// No runtime to spawn the probe onto
    #[error("no Tokio runtime in scope: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

/* Shared between the handle, the probe task, and anything holding a
 * subscription. The probe's measurement baseline is deliberately NOT here:
 * exactly one logical thread of control touches it, so it lives on the
 * probe's stack. */
struct MonitorInner {
    config: MonitorConfig,
    running: AtomicBool,
    registry: ObserverRegistry,
    metrics: Arc<MonitorMetrics>,
    probe: Mutex<Option<JoinHandle<()>>>,
}

/// Detects periods during which the event loop fails to return to its
/// scheduling point within the configured cadence.
///
/// The probe is an ordinary spawned task: it never pins the runtime open, and
/// dropping the runtime cancels the pending sleep. Dropping the monitor calls
/// [`stop`](Self::stop); a host that wants whole-process coverage keeps the
/// monitor alive for the life of the process.
pub struct StallMonitor {
    inner: Arc<MonitorInner>,
}

impl StallMonitor {
    /// Starts a monitor on the current runtime with the built-in reporter
    /// installed.
    ///
    /// The first wake is one `check_interval` from now. Until the host
    /// registers an observer of its own, each stall produces one warn-level
    /// line through [`DefaultReporter`].
    ///
    /// # Errors
    ///
    /// [`MonitorError::InvalidCheckInterval`] or
    /// [`MonitorError::InvalidMinBlockTime`] when a duration is zero, and
    /// [`MonitorError::NoRuntime`] when called outside a Tokio runtime.
    pub fn start(config: MonitorConfig) -> Result<Self, MonitorError> {
        Self::start_with_reporter(config, Arc::new(DefaultReporter::default()))
    }

    /// Starts a monitor with a caller-supplied built-in reporter.
    ///
    /// The reporter plays the same role as [`DefaultReporter`]: it fires only
    /// while no external observer is registered. Tests use this seam to
    /// capture the diagnostic line instead of writing it to the log.
    pub fn start_with_reporter(
        config: MonitorConfig,
        reporter: Arc<dyn StallObserver>,
    ) -> Result<Self, MonitorError> {
        config.validate()?;
        let runtime = Handle::try_current()?;

        let metrics = Arc::new(MonitorMetrics::default());
        let inner = Arc::new(MonitorInner {
            config,
            running: AtomicBool::new(true),
            registry: ObserverRegistry::new(reporter, Arc::clone(&metrics)),
            metrics,
            probe: Mutex::new(None),
        });

        let probe = runtime.spawn(probe_loop(Arc::clone(&inner)));
        *inner.probe.lock() = Some(probe);

        debug!(
            check_interval_ms = config.check_interval.as_millis() as u64,
            min_block_time_ms = config.min_block_time.as_millis() as u64,
            "stall monitor started"
        );

        Ok(Self { inner })
    }

    /// Registers an observer for every subsequent stall.
    ///
    /// Observers are invoked in subscription order, each isolated from the
    /// others. The first call permanently silences the built-in reporter.
    pub fn subscribe(&self, observer: Arc<dyn StallObserver>) {
        self.inner.registry.subscribe(observer);
    }

    /// [`subscribe`](Self::subscribe) for a plain closure.
    pub fn subscribe_fn<F>(&self, observer: F)
    where
        F: Fn(&StallEvent) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(observer));
    }

    /// Permanently stops the monitor.
    ///
    /// Cancels the pending wake-up; no stall event is emitted after this
    /// returns, even if the probe never ticked. Idempotent. Events delivered
    /// by an already-completed tick stand.
    pub fn stop(&self) {
        if self.inner.running.swap(false, Ordering::AcqRel) {
            if let Some(probe) = self.inner.probe.lock().take() {
                probe.abort();
            }
            debug!("stall monitor stopped");
        }
    }

    /// True until [`stop`](Self::stop) is called.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// The configuration the monitor was started with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> MonitorConfig {
        self.inner.config
    }

    /// Snapshot of the monitor's counters.
    #[must_use]
    pub fn metrics(&self) -> MonitorMetricsSnapshot {
        self.inner.metrics.snapshot()
    }
}

impl Drop for StallMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

/* One tick per check_interval while running. The baseline resets before any
 * notification work so time spent in observers is not charged to the next
 * window, and the next sleep is only entered while still running. */
async fn probe_loop(inner: Arc<MonitorInner>) {
    let mut last_check_at = Instant::now();

    loop {
        sleep(inner.config.check_interval).await;
        if !inner.running.load(Ordering::Acquire) {
            break;
        }

        let now = Instant::now();
        let elapsed = now - last_check_at;
        last_check_at = now;

        inner.metrics.record_tick();

        if elapsed > inner.config.min_block_time {
            inner.metrics.record_stall(elapsed);
            inner.registry.dispatch(&StallEvent { elapsed });
        }

        if !inner.running.load(Ordering::Acquire) {
            break;
        }
    }
}
