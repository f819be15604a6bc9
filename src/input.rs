//! Common routines for loading input data.
use anyhow::{Context, Result, ensure};
use log::debug;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// The file name for the production and price time series within a model directory
pub const SERIES_FILE_NAME: &str = "timeseries.csv";

/// Production and spot price for a single period.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct PeriodRecord {
    /// Energy produced during the period (kW)
    pub produced: f64,
    /// Spot price for the period
    pub spot_price: f64,
}

/// Parse a TOML file at the specified path.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let contents = fs::read_to_string(file_path)
        .with_context(|| format!("Could not read file {}", file_path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("Could not parse TOML file {}", file_path.display()))
}

/// Read the production and price time series from a CSV file.
///
/// The file must contain exactly `horizon` records with `produced` and `spot_price` columns,
/// ordered by period. Any missing, surplus or non-finite record is an error; this check runs
/// before any model is built.
///
/// # Arguments
///
/// * `csv_file_path` - Path to the time series CSV file
/// * `horizon` - The expected number of periods
pub fn read_series(csv_file_path: &Path, horizon: usize) -> Result<Vec<PeriodRecord>> {
    let mut reader = csv::Reader::from_path(csv_file_path)
        .with_context(|| format!("Could not open {}", csv_file_path.display()))?;

    let mut series = Vec::with_capacity(horizon);
    for (period, record) in reader.deserialize().enumerate() {
        let record: PeriodRecord = record.with_context(|| {
            format!(
                "Invalid record for period {period} in {}",
                csv_file_path.display()
            )
        })?;
        ensure!(
            record.produced.is_finite() && record.spot_price.is_finite(),
            "Non-finite value for period {period}"
        );
        ensure!(
            record.produced >= 0.0,
            "Negative production ({}) for period {period}",
            record.produced
        );

        debug!(
            "period {period}: produced {}, spot price {}",
            record.produced, record.spot_price
        );
        series.push(record);
    }

    ensure!(
        series.len() == horizon,
        "Expected {horizon} periods in {}, found {}",
        csv_file_path.display(),
        series.len()
    );

    Ok(series)
}
