//! RSI (Relative Strength Index) indicator.
//!
//! Wilder-style smoothing expressed as a recursive EMA with α = 1/length,
//! seeded on the first price change:
//! - avg_up[t]   = α·up[t]   + (1-α)·avg_up[t-1]
//! - avg_down[t] = α·down[t] + (1-α)·avg_down[t-1]
//!
//! Formula: RSI = 100 - (100 / (1 + avg_up / avg_down))
//! If avg_down == 0 (including the first bar, which has no change): RSI = 50.

use crate::domain::indicator::ema::Ema;

pub const NEUTRAL_RSI: f64 = 50.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Rsi {
    prev_close: Option<f64>,
    avg_up: Ema,
    avg_down: Ema,
}

impl Rsi {
    pub fn new(length: usize) -> Self {
        let alpha = 1.0 / length.max(1) as f64;
        Self {
            prev_close: None,
            avg_up: Ema::with_alpha(alpha),
            avg_down: Ema::with_alpha(alpha),
        }
    }

    pub fn update(&mut self, close: f64) -> f64 {
        let Some(prev) = self.prev_close.replace(close) else {
            return NEUTRAL_RSI;
        };

        let delta = close - prev;
        let avg_up = self.avg_up.update(delta.max(0.0));
        let avg_down = self.avg_down.update((-delta).max(0.0));

        if avg_down == 0.0 {
            return NEUTRAL_RSI;
        }
        let rs = avg_up / avg_down;
        100.0 - 100.0 / (1.0 + rs)
    }
}
