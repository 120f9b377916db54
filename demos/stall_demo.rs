//     ______     ______   ______     __         __
//    /\  ___\   /\__  _\ /\  __ \   /\ \       /\ \
//    \ \___  \  \/_/\ \/ \ \  __ \  \ \ \____  \ \ \____
//     \/\_____\    \ \_\  \ \_\ \_\  \ \_____\  \ \_____\
//      \/_____/     \/_/   \/_/\/_/   \/_____/   \/_____/
//
// Author: Colin MacRitchie / Ripple Group
//! Demonstration of stall detection on a deliberately blocked loop
//!
//! Run with: cargo run --example stall_demo

use std::time::Duration;

use tokio_stall::{MonitorConfig, StallMonitor};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    println!("🔍 Starting stall monitor (100ms cadence, 250ms threshold)");

    let monitor = StallMonitor::start(MonitorConfig {
        check_interval: Duration::from_millis(100),
        min_block_time: Duration::from_millis(250),
    })
    .expect("valid config");

    monitor.subscribe_fn(|stall| {
        println!("⚠️  event loop held for {:?}", stall.elapsed);
    });

    println!("Phase 1: cooperative work (no stalls expected)");
    for _ in 0..5 {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    println!("Phase 2: blocking the loop for 600ms");
    std::thread::sleep(Duration::from_millis(600));

    // Give the probe a tick to notice.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let snapshot = monitor.metrics();
    println!(
        "Done: {} ticks, {} stalls, longest {:?}",
        snapshot.ticks_total, snapshot.stalls_detected, snapshot.longest_stall
    );

    monitor.stop();
}
