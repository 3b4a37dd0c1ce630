//! Prediction-to-signal mapping

use super::model::SignalModel;
use super::types::{Direction, Signal};
use crate::features::FeatureVector;

/// Upper edge of the dead zone: predictions above this are buys
pub const BUY_THRESHOLD: f64 = 0.6;
/// Lower edge of the dead zone: predictions below this are sells
pub const SELL_THRESHOLD: f64 = 0.4;

/// Maps raw model predictions to directional signals
///
/// The 0.4/0.6 dead zone is the engine's contract, not the model's: any
/// model plugged in behind [`SignalModel`] gets the same thresholding. A
/// failing model degrades to a neutral signal, pausing trading rather than
/// crashing the loop.
pub struct SignalPredictor {
    model: Box<dyn SignalModel>,
}

impl SignalPredictor {
    /// Create a predictor around the given model
    pub fn new(model: Box<dyn SignalModel>) -> Self {
        Self { model }
    }

    /// Evaluate the model at the given price and time
    pub fn signal(&self, features: &FeatureVector, price: f64, time: f64) -> Signal {
        let p = match self.model.predict(features) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(model = self.model.name(), error = %e, "Model prediction failed");
                return Signal::neutral(price, time);
            }
        };

        if p > BUY_THRESHOLD {
            Signal {
                direction: Direction::Buy,
                confidence: p,
                price,
                time,
            }
        } else if p < SELL_THRESHOLD {
            Signal {
                direction: Direction::Sell,
                confidence: 1.0 - p,
                price,
                time,
            }
        } else {
            Signal::neutral(price, time)
        }
    }
}
