//! Exponential Moving Average indicator.
//!
//! α = 2/(span+1), EMA[0] = x[0], then EMA[i] = α·x[i] + (1-α)·EMA[i-1].
//! Unadjusted recursive form: no SMA seed and no warmup, every bar is defined.

#[derive(Debug, Clone, PartialEq)]
pub struct Ema {
    alpha: f64,
    value: Option<f64>,
}

impl Ema {
    pub fn with_span(span: usize) -> Self {
        Self::with_alpha(2.0 / (span as f64 + 1.0))
    }

    pub fn with_alpha(alpha: f64) -> Self {
        Self { alpha, value: None }
    }

    pub fn update(&mut self, x: f64) -> f64 {
        let next = match self.value {
            None => x,
            Some(prev) => self.alpha * x + (1.0 - self.alpha) * prev,
        };
        self.value = Some(next);
        next
    }
}
