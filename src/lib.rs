//! Event-loop stall detection for the Tokio async runtime
//!
//! This crate notices when the event loop stops turning: a self-rescheduling
//! probe wakes on a fixed cadence, and a wake that arrives later than the
//! configured threshold is reported as a stall, with the measured gap.
//!
//! It answers exactly one question about a long-running service: did
//! synchronous work hold the loop, and for how long. It does not measure CPU
//! usage, attribute the block to a call site, or keep history.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use tokio_stall::{MonitorConfig, StallMonitor};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let monitor = StallMonitor::start(MonitorConfig {
//!         check_interval: Duration::from_millis(500),
//!         min_block_time: Duration::from_millis(3000),
//!     })
//!     .expect("valid config");
//!
//!     monitor.subscribe_fn(|stall| {
//!         eprintln!("event loop held for {:?}", stall.elapsed);
//!     });
//!
//!     // ... run the application; stop() when monitoring should end ...
//!     monitor.stop();
//! }
//! ```
//!
//! Without a subscriber, each stall instead produces one warn-level line of
//! the form `Event loop blocked for 2.5s (PID 1234)`.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![warn(rust_2018_idioms)]

//     ______     ______   ______     __         __
//    /\  ___\   /\__  _\ /\  __ \   /\ \       /\ \
//    \ \___  \  \/_/\ \/ \ \  __ \  \ \ \____  \ \ \____
//     \/\_____\    \ \_\  \ \_\ \_\  \ \_____\  \ \_____\
//      \/_____/     \/_/   \/_/\/_/   \/_____/   \/_____/
//
// Author: Colin MacRitchie / Ripple Group
// Stall detection for the Tokio event loop

/// Probe activity counters
pub mod metrics;
/// Monitor configuration and probe lifecycle
pub mod monitor;
/// Stall events and observer delivery
pub mod observer;
/// Built-in diagnostic reporter
pub mod reporter;

// Public API exports
pub use metrics::{MonitorMetrics, MonitorMetricsSnapshot};
pub use monitor::{
    DEFAULT_CHECK_INTERVAL, DEFAULT_MIN_BLOCK_TIME, MonitorConfig, MonitorError, StallMonitor,
};
pub use observer::{NullObserver, ObserverRegistry, StallEvent, StallObserver};
pub use reporter::{DefaultReporter, HostProcess, ProcessInfo, TracingSink, WarnSink};
