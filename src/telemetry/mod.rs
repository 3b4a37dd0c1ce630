//! Logging and lightweight instrumentation

mod logging;
mod metrics;

pub use logging::init;
pub use metrics::observe_tick;
