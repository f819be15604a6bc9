//! The solved charge/discharge schedule.
use serde::{Deserialize, Serialize};

/// Spot prices are quoted in hundredths of a currency unit, so divide by this to report totals in
/// whole units.
const PRICE_SCALE: f64 = 100.0;

/// One period of the solved schedule.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScheduleRow {
    /// Index of the period within the horizon
    pub period: usize,
    /// State of charge at the start of the period (kW)
    pub capacity: f64,
    /// Energy produced during the period (kW)
    pub produced: f64,
    /// Spot price for the period
    pub spot_price: f64,
    /// Energy added to the battery during the period (kW)
    pub charge_power: f64,
    /// Energy sold during the period (kW)
    pub discharge_power: f64,
}

/// A complete solved schedule, as extracted from an optimal solution.
///
/// Plain data; reading it has no side effects and can be repeated freely.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    /// Per-period schedule rows, ordered by period
    pub rows: Vec<ScheduleRow>,
    /// Total revenue over the horizon, in price units
    pub revenue: f64,
}

impl Schedule {
    /// Create a schedule from extracted rows, recomputing the total revenue from them.
    pub fn new(rows: Vec<ScheduleRow>, efficiency: f64, mlf: f64) -> Self {
        let revenue = rows
            .iter()
            .map(|row| row.spot_price * row.discharge_power * efficiency * mlf)
            .sum();

        Self { rows, revenue }
    }

    /// Total revenue rescaled from price units to whole currency units.
    pub fn scaled_revenue(&self) -> f64 {
        self.revenue / PRICE_SCALE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn row(period: usize, spot_price: f64, discharge_power: f64) -> ScheduleRow {
        ScheduleRow {
            period,
            capacity: 0.0,
            produced: 0.0,
            spot_price,
            charge_power: 0.0,
            discharge_power,
        }
    }

    #[test]
    fn test_revenue() {
        let schedule = Schedule::new(vec![row(0, 10.0, 100.0), row(1, 20.0, 50.0)], 0.97, 1.0);

        // 10 * 100 * 0.97 + 20 * 50 * 0.97
        assert_approx_eq!(f64, schedule.revenue, 1940.0);
        assert_approx_eq!(f64, schedule.scaled_revenue(), 19.4);
    }

    #[test]
    fn test_revenue_no_discharge() {
        let schedule = Schedule::new(vec![row(0, 10.0, 0.0), row(1, -5.0, 0.0)], 0.97, 1.0);
        assert_eq!(schedule.revenue, 0.0);
    }
}
