//! Cumulative VWAP from the start of the series.
//!
//! VWAP[t] = Σ(typical·volume) / Σ(volume) over bars 0..=t. While cumulative
//! volume is zero, or the sums overflow, the last defined VWAP carries
//! forward, and before any VWAP has been defined the bar's close stands in.

use crate::domain::ohlcv::Bar;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vwap {
    cum_price_volume: f64,
    cum_volume: f64,
    last: Option<f64>,
}

impl Vwap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, bar: &Bar) -> f64 {
        self.cum_price_volume += bar.typical_price() * bar.volume;
        self.cum_volume += bar.volume;

        let vwap = self.cum_price_volume / self.cum_volume;
        if self.cum_volume > 0.0 && vwap.is_finite() {
            self.last = Some(vwap);
            vwap
        } else {
            self.last.unwrap_or(bar.close)
        }
    }
}
