//     ______     ______   ______     __         __
//    /\  ___\   /\__  _\ /\  __ \   /\ \       /\ \
//    \ \___  \  \/_/\ \/ \ \  __ \  \ \ \____  \ \ \____
//     \/\_____\    \ \_\  \ \_\ \_\  \ \_____\  \ \_____\
//      \/_____/     \/_/   \/_/\/_/   \/_____/   \/_____/
//
// Author: Colin MacRitchie / Ripple Group
//! Built-in stall reporter
//!
//! A monitor with zero subscribers is still useful: until the host registers
//! its own observer, every stall produces one warning-level line of the form
//! `Event loop blocked for 2.5s (PID 1234)`. The process id and the warning
//! channel sit behind small traits so tests can substitute both.

use std::sync::Arc;

use tracing::warn;

use crate::observer::{StallEvent, StallObserver};

/// Process identity accessor for the built-in reporter.
pub trait ProcessInfo: Send + Sync {
    /// Identifier of the host process.
    fn pid(&self) -> u32;
}

/// Production [`ProcessInfo`] backed by the operating system.
#[derive(Debug, Default)]
pub struct HostProcess;

impl ProcessInfo for HostProcess {
    #[inline]
    fn pid(&self) -> u32 {
        std::process::id()
    }
}

/// Warning-level diagnostic sink.
pub trait WarnSink: Send + Sync {
    /// Emit one diagnostic line.
    fn warn(&self, message: &str);
}

/// Production [`WarnSink`] writing through `tracing` at warn level.
#[derive(Debug, Default)]
pub struct TracingSink;

impl WarnSink for TracingSink {
    fn warn(&self, message: &str) {
        warn!("{message}");
    }
}

/// The observer installed by [`StallMonitor::start`](crate::StallMonitor::start).
///
/// Active only while no external observer is registered; the first
/// subscription silences it for the rest of the monitor's life.
pub struct DefaultReporter {
    process: Arc<dyn ProcessInfo>,
    sink: Arc<dyn WarnSink>,
}

impl DefaultReporter {
    /// Creates a reporter with explicit collaborators.
    #[must_use]
    pub fn new(process: Arc<dyn ProcessInfo>, sink: Arc<dyn WarnSink>) -> Self {
        Self { process, sink }
    }

    /* Seconds to one decimal place, as the line has always read */
    fn line(&self, event: &StallEvent) -> String {
        format!(
            "Event loop blocked for {:.1}s (PID {})",
            event.elapsed.as_secs_f64(),
            self.process.pid()
        )
    }
}

impl Default for DefaultReporter {
    fn default() -> Self {
        Self::new(Arc::new(HostProcess), Arc::new(TracingSink))
    }
}

impl StallObserver for DefaultReporter {
    fn on_stall(&self, event: &StallEvent) {
        self.sink.warn(&self.line(event));
    }
}
