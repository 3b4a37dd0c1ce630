//! Data persistence module

mod snapshot;

pub use snapshot::{KlineSnapshot, SnapshotError, SNAPSHOT_BARS};
