//! Signal module
//!
//! Classifier boundary and prediction-to-signal thresholding

mod model;
mod predictor;
mod types;

pub use model::{load_model, LogisticModel, NullModel, SignalModel};
pub use predictor::{SignalPredictor, BUY_THRESHOLD, SELL_THRESHOLD};
pub use types::{Direction, Side, Signal};
