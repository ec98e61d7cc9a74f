use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::filter::FilterToggles;

/// Environment variable naming an optional JSON config file.
pub const CONFIG_ENV: &str = "VEHICLE_DASH_CONFIG";

/// Dataset picked up from the working directory when none is configured.
pub const DEFAULT_DATASET: &str = "vehicles_us.csv";

// ---------------------------------------------------------------------------
// Startup configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Dataset to load at startup. A startup dataset that fails to load
    /// aborts startup.
    pub dataset: Option<PathBuf>,
    pub show_top_brands: bool,
    pub show_high_mileage: bool,
    pub window_size: [f32; 2],
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dataset: None,
            show_top_brands: false,
            show_high_mileage: false,
            window_size: [1200.0, 900.0],
        }
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Config file from [`CONFIG_ENV`] (if set), then the first positional
    /// argument as the dataset path.
    pub fn from_env_and_args(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        if let Some(dataset) = args.next() {
            config.dataset = Some(PathBuf::from(dataset));
        }
        Ok(config)
    }

    pub fn toggles(&self) -> FilterToggles {
        FilterToggles {
            show_top_brands: self.show_top_brands,
            show_high_mileage: self.show_high_mileage,
        }
    }

    /// The dataset to load at startup: the configured one, else
    /// [`DEFAULT_DATASET`] when it exists in `dir`.
    pub fn startup_dataset(&self, dir: &Path) -> Option<PathBuf> {
        match &self.dataset {
            Some(path) => Some(path.clone()),
            None => {
                let fallback = dir.join(DEFAULT_DATASET);
                fallback.is_file().then_some(fallback)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"show_high_mileage": true}}"#).unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert!(config.show_high_mileage);
        assert!(!config.show_top_brands);
        assert_eq!(config.window_size, [1200.0, 900.0]);
        assert_eq!(
            config.toggles(),
            FilterToggles {
                show_top_brands: false,
                show_high_mileage: true
            }
        );
    }

    #[test]
    fn configured_dataset_wins_over_default() {
        let config = AppConfig {
            dataset: Some(PathBuf::from("listings.parquet")),
            ..AppConfig::default()
        };
        assert_eq!(
            config.startup_dataset(Path::new(".")),
            Some(PathBuf::from("listings.parquet"))
        );
    }

    #[test]
    fn default_dataset_only_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::default();
        assert_eq!(config.startup_dataset(dir.path()), None);

        let path = dir.path().join(DEFAULT_DATASET);
        std::fs::write(&path, "model\n").unwrap();
        assert_eq!(config.startup_dataset(dir.path()), Some(path));
    }

    #[test]
    fn malformed_config_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config"));
    }
}
