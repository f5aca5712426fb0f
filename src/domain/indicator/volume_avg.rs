//! Rolling simple mean of volume.
//!
//! Minimum one sample: the first `window - 1` bars average whatever is
//! available instead of being left undefined.

use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeAverage {
    window: usize,
    samples: VecDeque<f64>,
}

impl VolumeAverage {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            samples: VecDeque::with_capacity(window),
        }
    }

    pub fn update(&mut self, volume: f64) -> f64 {
        if self.samples.len() == self.window {
            self.samples.pop_front();
        }
        self.samples.push_back(volume);
        // Summed fresh each bar so long runs do not accumulate drift.
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }
}
