//! INI file configuration adapter.

use crate::domain::error::TrendtraderError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TrendtraderError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| TrendtraderError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, TrendtraderError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| TrendtraderError::ConfigParse {
                file: "<inline>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
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

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_deref()
            .and_then(Self::parse_bool)
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL: &str = r#"
[backtest]
initial_capital = 50000.0
commission_per_trade = 10
allow_shorting = yes
start_date = 2020-01-01
codes = BHP, CBA

[data]
path = /var/data/asx

[strategy]
name = follow_trend
refresh_period = 5
window_length = 20

[manager]
position_size = 0.25
instructions = instructions.csv
"#;

    #[test]
    fn reads_every_section() {
        let adapter = FileConfigAdapter::from_string(FULL).unwrap();

        assert_eq!(adapter.get_double("backtest", "initial_capital", 0.0), 50000.0);
        assert_eq!(adapter.get_double("backtest", "commission_per_trade", 0.0), 10.0);
        assert!(adapter.get_bool("backtest", "allow_shorting", false));
        assert_eq!(
            adapter.get_string("backtest", "codes"),
            Some("BHP, CBA".to_string())
        );
        assert_eq!(
            adapter.get_string("data", "path"),
            Some("/var/data/asx".to_string())
        );
        assert_eq!(
            adapter.get_string("strategy", "name"),
            Some("follow_trend".to_string())
        );
        assert_eq!(adapter.get_int("strategy", "refresh_period", 1), 5);
        assert_eq!(adapter.get_usize("strategy", "window_length", 50), 20);
        assert_eq!(adapter.get_double("manager", "position_size", 1.0), 0.25);
    }

    #[test]
    fn missing_keys_return_none_or_default() {
        let adapter = FileConfigAdapter::from_string("[backtest]\n").unwrap();
        assert_eq!(adapter.get_string("backtest", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
        assert_eq!(adapter.get_int("backtest", "missing", 42), 42);
        assert_eq!(adapter.get_double("backtest", "missing", 99.9), 99.9);
        assert!(adapter.get_bool("backtest", "missing", true));
    }

    #[test]
    fn non_numeric_values_fall_back() {
        let adapter = FileConfigAdapter::from_string(
            "[strategy]\nwindow_length = abc\n[backtest]\ninitial_capital = lots\n",
        )
        .unwrap();
        assert_eq!(adapter.get_int("strategy", "window_length", 50), 50);
        assert_eq!(adapter.get_double("backtest", "initial_capital", 99.9), 99.9);
    }

    #[test]
    fn bool_spellings() {
        let adapter = FileConfigAdapter::from_string(
            "[backtest]\na = true\nb = YES\nc = 1\nd = off\ne = no\nf = maybe\n",
        )
        .unwrap();
        assert!(adapter.get_bool("backtest", "a", false));
        assert!(adapter.get_bool("backtest", "b", false));
        assert!(adapter.get_bool("backtest", "c", false));
        assert!(!adapter.get_bool("backtest", "d", true));
        assert!(!adapter.get_bool("backtest", "e", true));
        assert!(adapter.get_bool("backtest", "f", true));
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[data]\npath = ./data\n").unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_string("data", "path"), Some("./data".to_string()));
    }

    #[test]
    fn from_file_missing_is_config_parse_error() {
        let err = FileConfigAdapter::from_file("/nonexistent/path/config.ini").unwrap_err();
        assert!(
            matches!(err, TrendtraderError::ConfigParse { file, .. } if file.contains("config.ini"))
        );
    }
}
