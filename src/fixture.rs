//! Fixtures for tests
use crate::config::BatteryConfig;
use crate::input::PeriodRecord;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// A small battery configuration with a three-period horizon
#[fixture]
pub fn config() -> BatteryConfig {
    BatteryConfig {
        horizon: 3,
        ..BatteryConfig::default()
    }
}

/// A series of `len` periods with identical production and price
pub fn flat_series(len: usize, produced: f64, spot_price: f64) -> Vec<PeriodRecord> {
    vec![
        PeriodRecord {
            produced,
            spot_price
        };
        len
    ]
}
