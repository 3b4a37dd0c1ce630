//! Decision-loop instrumentation
//!
//! Tick timings go out as structured debug events under the
//! `microscalp::metrics` target, which log tooling can filter on without a
//! separate metrics pipeline.

use std::time::Duration;

/// Record one decision cycle's latency and outcome
pub fn observe_tick(elapsed: Duration, outcome: &str) {
    tracing::debug!(
        target: "microscalp::metrics",
        latency_ms = elapsed.as_secs_f64() * 1000.0,
        outcome,
        "tick"
    );
}
