//! Configuration validation.
//!
//! Validates all config fields before a backtest runs. Non-positive
//! take-profit and stop-loss values are accepted: they are a valid way to ask
//! for a run that opens no positions.

use crate::domain::error::CrosstraderError;
use crate::ports::config_port::ConfigPort;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), CrosstraderError> {
    validate_thresholds(config)?;
    validate_commission(config)?;
    validate_indicator_periods(config)?;
    validate_output_dir(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> CrosstraderError {
    CrosstraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// A value that is present but does not parse is an error, not a silent default.
fn require_parsable_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), CrosstraderError> {
    match config.get_string(section, key) {
        Some(raw) if raw.trim().parse::<f64>().is_err() => {
            Err(invalid(section, key, &format!("{key} must be a number")))
        }
        _ => Ok(()),
    }
}

fn validate_thresholds(config: &dyn ConfigPort) -> Result<(), CrosstraderError> {
    for key in ["take_profit", "stop_loss"] {
        require_parsable_double(config, "backtest", key)?;
        let value = config.get_double("backtest", key, 0.0);
        if !value.is_finite() {
            return Err(invalid("backtest", key, &format!("{key} must be finite")));
        }
    }
    Ok(())
}

fn validate_commission(config: &dyn ConfigPort) -> Result<(), CrosstraderError> {
    require_parsable_double(config, "backtest", "commission_per_trade")?;
    let value = config.get_double("backtest", "commission_per_trade", 0.0);
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(
            "backtest",
            "commission_per_trade",
            "commission_per_trade must be non-negative",
        ));
    }
    Ok(())
}

fn validate_indicator_periods(config: &dyn ConfigPort) -> Result<(), CrosstraderError> {
    for key in ["ema_fast", "ema_slow", "rsi_length", "vol_window"] {
        if let Some(raw) = config.get_string("indicators", key) {
            match raw.trim().parse::<i64>() {
                Ok(v) if v >= 1 => {}
                _ => {
                    return Err(invalid(
                        "indicators",
                        key,
                        &format!("{key} must be a whole number of at least 1"),
                    ));
                }
            }
        }
    }
    Ok(())
}

fn validate_output_dir(config: &dyn ConfigPort) -> Result<(), CrosstraderError> {
    match config.get_string("output", "dir") {
        Some(s) if s.trim().is_empty() => Err(invalid("output", "dir", "dir must not be empty")),
        _ => Ok(()),
    }
}
