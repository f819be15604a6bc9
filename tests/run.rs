//! An integration test for the command line interface.
use battsched::cli::{RunOpts, handle_run_command};
use std::fs::File;
use std::io::Write;
use tempfile::tempdir;

#[test]
fn test_handle_run_command() {
    let model_dir = tempdir().unwrap();
    {
        let mut file = File::create(model_dir.path().join("battery.toml")).unwrap();
        writeln!(file, "horizon = 4\nlog_level = \"off\"").unwrap();

        let mut file = File::create(model_dir.path().join("timeseries.csv")).unwrap();
        writeln!(file, "produced,spot_price").unwrap();
        writeln!(file, "100.0,5.0").unwrap();
        writeln!(file, "100.0,-1.0").unwrap();
        writeln!(file, "0.0,20.0").unwrap();
        writeln!(file, "0.0,30.0").unwrap();
    }

    let output_dir = tempdir().unwrap();
    let output_path = output_dir.path().join("results");
    let opts = RunOpts {
        output_dir: Some(output_path.clone()),
        overwrite: false,
        time_limit: None,
    };
    handle_run_command(model_dir.path(), &opts).unwrap();

    assert!(output_path.join("schedule.csv").is_file());
    assert!(output_path.join("summary.csv").is_file());

    // A second run must refuse to clobber the output directory
    assert!(handle_run_command(model_dir.path(), &opts).is_err());
}
