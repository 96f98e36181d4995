use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Quality-label thresholds on the primary metric's overall average.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityThresholds {
    pub good_max: f64,
    pub light_max: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        QualityThresholds {
            good_max: 35.0,
            light_max: 75.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastDefaults {
    /// Months projected when a request does not say.
    pub horizon: usize,
}

impl Default for ForecastDefaults {
    fn default() -> Self {
        ForecastDefaults { horizon: 6 }
    }
}

/// Runtime settings, loaded from a YAML file next to the binary. Every
/// field has a default so a missing file just means the stock setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub out_dir: PathBuf,
    /// Site-cell values marking pre-computed overall rows, and the request
    /// sentinel meaning "no region filter".
    pub overall_sentinels: Vec<String>,
    pub quality: QualityThresholds,
    pub forecast: ForecastDefaults,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("data"),
            out_dir: PathBuf::from("reports"),
            overall_sentinels: vec!["全市".to_string(), "citywide".to_string()],
            quality: QualityThresholds::default(),
            forecast: ForecastDefaults::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        if !path.exists() {
            info!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// True when the requested region means "no filter".
    pub fn is_citywide(&self, region: &str) -> bool {
        let trimmed = region.trim();
        trimmed.is_empty()
            || self
                .overall_sentinels
                .iter()
                .any(|s| trimmed.eq_ignore_ascii_case(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = Config::load(Path::new("no/such/config.yaml")).unwrap();
        assert_eq!(cfg.quality.good_max, 35.0);
        assert_eq!(cfg.forecast.horizon, 6);
    }

    #[test]
    fn partial_file_overrides_some_fields() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(b"data_dir: /srv/monitoring\nquality:\n  good_max: 50\n")
            .unwrap();
        let cfg = Config::load(tmp.path()).unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("/srv/monitoring"));
        assert_eq!(cfg.quality.good_max, 50.0);
        // untouched fields keep their defaults
        assert_eq!(cfg.quality.light_max, 75.0);
        assert_eq!(cfg.out_dir, PathBuf::from("reports"));
    }

    #[test]
    fn citywide_sentinels() {
        let cfg = Config::default();
        assert!(cfg.is_citywide("全市"));
        assert!(cfg.is_citywide("Citywide"));
        assert!(cfg.is_citywide(""));
        assert!(!cfg.is_citywide("城东"));
    }
}
