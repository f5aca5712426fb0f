//! Core domain types and logic.

pub mod ohlcv;
pub mod normalize;
pub mod indicator;
pub mod position;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
pub mod error;

