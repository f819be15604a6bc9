//! Code for loading the battery configuration.
use crate::input::read_toml;
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;

/// The file name for the battery configuration within a model directory
pub const CONFIG_FILE_NAME: &str = "battery.toml";

/// Number of periods in the planning horizon (hourly steps over 31 days)
const DEFAULT_HORIZON: usize = 744;
/// Lower bound on the battery's state of charge (kW)
const DEFAULT_MIN_CAPACITY: f64 = 0.0;
/// Upper bound on the battery's state of charge (kW)
const DEFAULT_MAX_CAPACITY: f64 = 1000.0;
/// Maximum charge or discharge power within one period (kW)
const DEFAULT_MAX_RAW_POWER: f64 = 200.0;
/// State of charge at the start of the first period (kW)
const DEFAULT_INITIAL_CAPACITY: f64 = 0.0;
/// Round-trip efficiency, applied once at discharge
const DEFAULT_EFFICIENCY: f64 = 0.97;
/// Loss factor multiplier applied to revenue
const DEFAULT_MLF: f64 = 1.0;

fn default_horizon() -> usize {
    DEFAULT_HORIZON
}
fn default_min_capacity() -> f64 {
    DEFAULT_MIN_CAPACITY
}
fn default_max_capacity() -> f64 {
    DEFAULT_MAX_CAPACITY
}
fn default_max_raw_power() -> f64 {
    DEFAULT_MAX_RAW_POWER
}
fn default_initial_capacity() -> f64 {
    DEFAULT_INITIAL_CAPACITY
}
fn default_efficiency() -> f64 {
    DEFAULT_EFFICIENCY
}
fn default_mlf() -> f64 {
    DEFAULT_MLF
}

/// Physical and economic parameters of the battery, read from `battery.toml`.
///
/// Every field has a default, so a missing configuration file yields a complete, valid
/// configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BatteryConfig {
    /// Number of periods in the planning horizon
    #[serde(default = "default_horizon")]
    pub horizon: usize,
    /// Lower bound on the battery's state of charge (kW)
    #[serde(default = "default_min_capacity")]
    pub min_capacity: f64,
    /// Upper bound on the battery's state of charge (kW)
    #[serde(default = "default_max_capacity")]
    pub max_capacity: f64,
    /// Maximum charge or discharge power within one period (kW)
    #[serde(default = "default_max_raw_power")]
    pub max_raw_power: f64,
    /// State of charge at the start of the first period (kW)
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: f64,
    /// Round-trip efficiency, applied once at discharge
    #[serde(default = "default_efficiency")]
    pub efficiency: f64,
    /// Loss factor multiplier applied to revenue
    #[serde(default = "default_mlf")]
    pub mlf: f64,
    /// The program log level
    #[serde(default)]
    pub log_level: Option<String>,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            min_capacity: DEFAULT_MIN_CAPACITY,
            max_capacity: DEFAULT_MAX_CAPACITY,
            max_raw_power: DEFAULT_MAX_RAW_POWER,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            efficiency: DEFAULT_EFFICIENCY,
            mlf: DEFAULT_MLF,
            log_level: None,
        }
    }
}

impl BatteryConfig {
    /// Read the battery configuration from the specified model directory.
    ///
    /// If no configuration file is present, default values are used.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing the configuration and time series files
    pub fn from_path(model_dir: &Path) -> Result<Self> {
        let file_path = model_dir.join(CONFIG_FILE_NAME);
        let config = if file_path.is_file() {
            read_toml(&file_path)?
        } else {
            Self::default()
        };
        config.validate().with_context(|| {
            format!("Invalid battery configuration in {}", file_path.display())
        })?;

        Ok(config)
    }

    /// Check that the configuration describes a solvable battery.
    ///
    /// This must fail before any model is built, so that bad bounds never reach the solver.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.horizon > 0, "horizon must be at least one period");
        ensure!(
            self.min_capacity <= self.max_capacity,
            "min_capacity ({}) cannot exceed max_capacity ({})",
            self.min_capacity,
            self.max_capacity
        );
        ensure!(
            self.max_raw_power >= 0.0,
            "max_raw_power ({}) cannot be negative",
            self.max_raw_power
        );
        ensure!(
            (self.min_capacity..=self.max_capacity).contains(&self.initial_capacity),
            "initial_capacity ({}) must lie between min_capacity and max_capacity",
            self.initial_capacity
        );
        ensure!(
            self.efficiency > 0.0 && self.efficiency <= 1.0,
            "efficiency ({}) must be in the interval (0, 1]",
            self.efficiency
        );
        ensure!(
            self.mlf.is_finite() && self.mlf >= 0.0,
            "mlf ({}) must be finite and non-negative",
            self.mlf
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_from_path_no_file() {
        let dir = tempdir().unwrap();
        assert_eq!(
            BatteryConfig::from_path(dir.path()).unwrap(),
            BatteryConfig::default()
        );
    }

    #[test]
    fn test_from_path() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(CONFIG_FILE_NAME)).unwrap();
            writeln!(file, "horizon = 24\nmax_raw_power = 50.0").unwrap();
        }

        let config = BatteryConfig::from_path(dir.path()).unwrap();
        assert_eq!(config.horizon, 24);
        assert_eq!(config.max_raw_power, 50.0);
        // Unspecified fields fall back to defaults
        assert_eq!(config.max_capacity, 1000.0);
    }

    #[test]
    fn test_validate_default() {
        BatteryConfig::default().validate().unwrap();
    }

    #[test]
    fn test_validate_zero_horizon() {
        let config = BatteryConfig {
            horizon: 0,
            ..BatteryConfig::default()
        };
        assert_error!(config.validate(), "horizon must be at least one period");
    }

    #[test]
    fn test_validate_inverted_capacity_bounds() {
        let config = BatteryConfig {
            min_capacity: 10.0,
            max_capacity: 5.0,
            initial_capacity: 10.0,
            ..BatteryConfig::default()
        };
        assert_error!(
            config.validate(),
            "min_capacity (10) cannot exceed max_capacity (5)"
        );
    }

    #[test]
    fn test_validate_negative_power() {
        let config = BatteryConfig {
            max_raw_power: -1.0,
            ..BatteryConfig::default()
        };
        assert_error!(config.validate(), "max_raw_power (-1) cannot be negative");
    }

    #[test]
    fn test_validate_initial_capacity_out_of_bounds() {
        let config = BatteryConfig {
            initial_capacity: 2000.0,
            ..BatteryConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_efficiency() {
        for efficiency in [0.0, -0.5, 1.5] {
            let config = BatteryConfig {
                efficiency,
                ..BatteryConfig::default()
            };
            assert!(config.validate().is_err());
        }
    }
}
