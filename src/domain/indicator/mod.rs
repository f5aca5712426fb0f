//! Technical indicator pipeline.
//!
//! Every indicator is a small streaming state machine with an `update` method.
//! [`compute_indicators`] drives them all in one forward pass over the
//! canonical bars, so each frame depends only on its own bar and earlier ones:
//! - `Ema`: fast and slow exponential moving averages of close
//! - `Rsi`: momentum oscillator, bounded in [0, 100]
//! - `Vwap`: cumulative volume-weighted typical price
//! - `VolumeAverage`: rolling mean of volume

pub mod ema;
pub mod rsi;
pub mod volume_avg;
pub mod vwap;

use std::fmt;

use crate::domain::ohlcv::Bar;
use ema::Ema;
use rsi::Rsi;
use volume_avg::VolumeAverage;
use vwap::Vwap;

/// Indicator parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    pub fast_span: usize,
    pub slow_span: usize,
    pub rsi_length: usize,
    pub vol_window: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        IndicatorConfig {
            fast_span: 9,
            slow_span: 21,
            rsi_length: 14,
            vol_window: 20,
        }
    }
}

impl fmt::Display for IndicatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EMA({}), EMA({}), RSI({}), VWAP, VOL_AVG({})",
            self.fast_span, self.slow_span, self.rsi_length, self.vol_window
        )
    }
}

/// A bar with every derived signal attached. All fields are defined from the
/// first row onward.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    pub bar: Bar,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub rsi: f64,
    pub vwap: f64,
    pub vol_avg: f64,
}

impl IndicatorFrame {
    pub fn close(&self) -> f64 {
        self.bar.close
    }
}

pub fn compute_indicators(bars: &[Bar], config: &IndicatorConfig) -> Vec<IndicatorFrame> {
    let mut ema_fast = Ema::with_span(config.fast_span);
    let mut ema_slow = Ema::with_span(config.slow_span);
    let mut rsi = Rsi::new(config.rsi_length);
    let mut vwap = Vwap::new();
    let mut vol_avg = VolumeAverage::new(config.vol_window);

    bars.iter()
        .map(|bar| IndicatorFrame {
            ema_fast: ema_fast.update(bar.close),
            ema_slow: ema_slow.update(bar.close),
            rsi: rsi.update(bar.close),
            vwap: vwap.update(bar),
            vol_avg: vol_avg.update(bar.volume),
            bar: bar.clone(),
        })
        .collect()
}
