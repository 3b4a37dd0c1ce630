//! Feature extraction
//!
//! Pure transform from a bar window to the fixed feature vector the
//! classifier was trained on

use crate::feed::Bar;

/// Minimum bars required to compute a feature vector
pub const MIN_WINDOW: usize = 10;

/// The five inputs of the scalping classifier, in training order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    /// 1-second return
    pub return_1s: f64,
    /// 5-second return
    pub return_5s: f64,
    /// Sample stdev of 1s returns over the last 10 steps
    pub volatility_10s: f64,
    /// Volume sum over the last 10 bars
    pub volume_10s: f64,
    /// Second difference of close (price acceleration)
    pub acceleration: f64,
}

impl FeatureVector {
    /// Features as a fixed array, in training order
    pub fn as_array(&self) -> [f64; 5] {
        [
            self.return_1s,
            self.return_5s,
            self.volatility_10s,
            self.volume_10s,
            self.acceleration,
        ]
    }
}

/// Extract features from a bar window (oldest first)
///
/// Returns `None` when fewer than [`MIN_WINDOW`] bars are available; the
/// caller skips the tick. Closes of exactly zero are a data-integrity problem
/// upstream and are not guarded here.
pub fn extract(window: &[Bar]) -> Option<FeatureVector> {
    if window.len() < MIN_WINDOW {
        return None;
    }

    let closes: Vec<f64> = window.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = window.iter().map(|b| b.volume).collect();
    let n = closes.len();

    let return_1s = (closes[n - 1] - closes[n - 2]) / closes[n - 2];
    let return_5s = (closes[n - 1] - closes[n - 6]) / closes[n - 6];

    let returns: Vec<f64> = closes
        .windows(2)
        .map(|pair| (pair[1] - pair[0]) / pair[0])
        .collect();
    let volatility_10s = if returns.len() >= 10 {
        sample_stdev(&returns[returns.len() - 10..])
    } else {
        0.0
    };

    let volume_10s = volumes[volumes.len().saturating_sub(10)..].iter().sum();

    let acceleration = if n >= 3 {
        (closes[n - 1] - closes[n - 2]) - (closes[n - 2] - closes[n - 3])
    } else {
        0.0
    };

    Some(FeatureVector {
        return_1s,
        return_5s,
        volatility_10s,
        volume_10s,
        acceleration,
    })
}

/// Sample standard deviation (n-1 divisor)
fn sample_stdev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}
