//! INI file configuration adapter.

use crate::domain::error::CrosstraderError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

/// No file: every lookup misses and callers fall back to their defaults.
impl Default for FileConfigAdapter {
    fn default() -> Self {
        Self { config: Ini::new() }
    }
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CrosstraderError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| CrosstraderError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[backtest]
take_profit = 0.005
stop_loss = 0.0025

[output]
dir = results/nifty
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("output", "dir"),
            Some("results/nifty".to_string())
        );
        assert_eq!(adapter.get_double("backtest", "take_profit", 0.0), 0.005);
    }

    #[test]
    fn default_adapter_is_empty() {
        let adapter = FileConfigAdapter::default();
        assert_eq!(adapter.get_string("backtest", "take_profit"), None);
        assert_eq!(adapter.get_double("backtest", "take_profit", 0.005), 0.005);
        assert_eq!(adapter.get_int("indicators", "vol_window", 20), 20);
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[backtest]\nstop_loss = 0.01\n").unwrap();
        assert_eq!(adapter.get_string("backtest", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_value() {
        let adapter = FileConfigAdapter::from_string("[indicators]\nvol_window = 30\n").unwrap();
        assert_eq!(adapter.get_int("indicators", "vol_window", 0), 30);
    }

    #[test]
    fn get_int_returns_default_for_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[indicators]\nvol_window = abc\n").unwrap();
        assert_eq!(adapter.get_int("indicators", "vol_window", 20), 20);
    }

    #[test]
    fn get_double_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[backtest]\n").unwrap();
        assert_eq!(adapter.get_double("backtest", "missing", 99.9), 99.9);
    }

    #[test]
    fn get_double_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\ntake_profit = half\n").unwrap();
        assert_eq!(adapter.get_double("backtest", "take_profit", 0.005), 0.005);
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[indicators]\nema_fast = 5\nema_slow = 13\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_int("indicators", "ema_fast", 9), 5);
        assert_eq!(adapter.get_int("indicators", "ema_slow", 21), 13);
    }

    #[test]
    fn from_file_missing_is_config_parse_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        match result {
            Err(CrosstraderError::ConfigParse { file, .. }) => {
                assert_eq!(file, "/nonexistent/path/config.ini");
            }
            _ => panic!("expected ConfigParse error"),
        }
    }
}
