//! Signal types

use serde::{Deserialize, Serialize};

/// Trade side of an order or position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The side that closes a position held on this side
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Exchange-facing representation
    pub fn as_order_str(self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

/// Classifier recommendation for the next move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
    Neutral,
}

impl Direction {
    /// Tradeable side for this direction, none when neutral
    pub fn as_side(self) -> Option<Side> {
        match self {
            Direction::Buy => Some(Side::Buy),
            Direction::Sell => Some(Side::Sell),
            Direction::Neutral => None,
        }
    }
}

/// One directional signal; overwritten every tick
///
/// Serialized field names match the shared-state schema the dashboard reads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Recommended direction
    #[serde(rename = "side")]
    pub direction: Direction,
    /// Confidence in [0, 1]; 0 when neutral
    pub confidence: f64,
    /// Close price the signal was evaluated at
    pub price: f64,
    /// Signal time in epoch seconds
    pub time: f64,
}

impl Signal {
    /// A neutral signal at the given price and time
    pub fn neutral(price: f64, time: f64) -> Self {
        Self {
            direction: Direction::Neutral,
            confidence: 0.0,
            price,
            time,
        }
    }
}
