//! The module responsible for writing output data to disk.
use crate::schedule::Schedule;
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "battsched_results";

/// The output file name for the per-period schedule
const SCHEDULE_FILE_NAME: &str = "schedule.csv";

/// The output file name for the revenue summary
const SUMMARY_FILE_NAME: &str = "summary.csv";

/// Represents the single row of the summary CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct SummaryRow {
    /// Total revenue in price units
    revenue: f64,
    /// Total revenue in whole currency units
    scaled_revenue: f64,
}

/// Get the default output directory for the model in the specified directory.
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Canonicalise in case the user has specified "."
    let model_dir = model_dir
        .canonicalize()
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory, replacing an existing one only if `overwrite` is set.
///
/// # Returns
///
/// Whether an existing directory was replaced.
pub fn create_output_directory(output_dir: &Path, overwrite: bool) -> Result<bool> {
    let existed = output_dir.is_dir();
    if existed {
        ensure!(
            overwrite,
            "Output directory {} already exists (pass --overwrite to replace it)",
            output_dir.display()
        );
        fs::remove_dir_all(output_dir)?;
    }
    fs::create_dir_all(output_dir)?;

    Ok(existed)
}

/// Write the solved schedule and its revenue summary to the output directory.
pub fn write_schedule(output_dir: &Path, schedule: &Schedule) -> Result<()> {
    let file_path = output_dir.join(SCHEDULE_FILE_NAME);
    let mut writer = csv::Writer::from_path(&file_path)
        .with_context(|| format!("Could not create {}", file_path.display()))?;
    for row in &schedule.rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    let file_path = output_dir.join(SUMMARY_FILE_NAME);
    let mut writer = csv::Writer::from_path(&file_path)
        .with_context(|| format!("Could not create {}", file_path.display()))?;
    writer.serialize(SummaryRow {
        revenue: schedule.revenue,
        scaled_revenue: schedule.scaled_revenue(),
    })?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ScheduleRow;
    use tempfile::tempdir;

    #[test]
    fn test_create_output_directory() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("results");

        assert!(!create_output_directory(&output_dir, false).unwrap());
        assert!(output_dir.is_dir());

        // A second run must not clobber the directory without --overwrite
        assert!(create_output_directory(&output_dir, false).is_err());
        assert!(create_output_directory(&output_dir, true).unwrap());
    }

    #[test]
    fn test_write_schedule() {
        let dir = tempdir().unwrap();
        let schedule = Schedule::new(
            vec![ScheduleRow {
                period: 0,
                capacity: 0.0,
                produced: 100.0,
                spot_price: 10.0,
                charge_power: 0.0,
                discharge_power: 100.0,
            }],
            0.97,
            1.0,
        );

        write_schedule(dir.path(), &schedule).unwrap();

        let contents = fs::read_to_string(dir.path().join(SCHEDULE_FILE_NAME)).unwrap();
        assert_eq!(
            contents,
            "period,capacity,produced,spot_price,charge_power,discharge_power\n\
             0,0.0,100.0,10.0,0.0,100.0\n"
        );

        let contents = fs::read_to_string(dir.path().join(SUMMARY_FILE_NAME)).unwrap();
        assert_eq!(contents, "revenue,scaled_revenue\n970.0,9.7\n");
    }
}
