//! Code for building and solving the battery schedule optimisation.
//!
//! The model maximises the revenue from selling stored energy at spot prices, given a fixed
//! production profile. It is a plain linear program: three decision variables per period and one
//! constraint family per physical rule, assembled once and solved once.
use crate::config::BatteryConfig;
use crate::input::PeriodRecord;
use crate::schedule::{Schedule, ScheduleRow};
use crate::solver::{Assignment, Constraint, Problem, Sense, Solve, VariableDefinition, VariableId};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use log::info;

/// The kind of decision variable attached to each period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    /// State of charge at the start of the period
    Capacity,
    /// Energy added to the battery during the period
    ChargePower,
    /// Energy removed from the battery during the period
    DischargePower,
}

/// A map for easy lookup of variables in the problem.
///
/// The entries are ordered (see [`IndexMap`]).
///
/// We use this data structure for two things:
///
/// 1. To define constraints over the variables of particular periods
/// 2. To find each period's variables again when reading the results of the optimisation
#[derive(Debug, Default)]
struct VariableMap(IndexMap<(VariableKind, usize), VariableId>);

impl VariableMap {
    /// Get the variable of the given kind for the given period.
    fn get(&self, kind: VariableKind, period: usize) -> VariableId {
        *self
            .0
            .get(&(kind, period))
            .expect("No variable found for given period")
    }

    /// Add a variable for the given period, which must not already be present.
    fn insert(&mut self, kind: VariableKind, period: usize, var: VariableId) {
        let existing = self.0.insert((kind, period), var).is_some();
        assert!(!existing, "Duplicate entry for var");
    }
}

/// The assembled optimisation problem for a single run.
///
/// Built once by [`build_model`]; immutable thereafter. Solving does not consume the model, so
/// results can be extracted repeatedly from repeated solves of the same instance.
#[derive(Debug)]
pub struct ScheduleModel {
    config: BatteryConfig,
    series: Vec<PeriodRecord>,
    problem: Problem,
    variables: VariableMap,
}

/// Build the battery schedule optimisation problem.
///
/// # Arguments
///
/// * `config` - The battery parameters
/// * `series` - Production and spot price for every period of the horizon
///
/// # Returns
///
/// A [`ScheduleModel`] ready for solving, or an error if the configuration is invalid or the
/// series does not cover the horizon.
pub fn build_model(config: &BatteryConfig, series: &[PeriodRecord]) -> Result<ScheduleModel> {
    config.validate().context("Invalid battery configuration")?;
    ensure!(
        series.len() == config.horizon,
        "Expected {} periods of input data, found {}",
        config.horizon,
        series.len()
    );

    let mut problem = Problem::new(Sense::Maximise);
    let variables = add_variables(&mut problem, config, series);

    add_initial_capacity_constraint(&mut problem, &variables, config);
    add_capacity_transition_constraints(&mut problem, &variables, config.horizon);
    add_overcharge_constraints(&mut problem, &variables, config);
    add_overdischarge_constraints(&mut problem, &variables, series);
    add_negative_price_constraints(&mut problem, &variables, series);
    add_charge_ceiling_constraints(&mut problem, &variables, series);

    Ok(ScheduleModel {
        config: config.clone(),
        series: series.to_vec(),
        problem,
        variables,
    })
}

impl ScheduleModel {
    /// The assembled linear program.
    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    /// The battery parameters the model was built with.
    pub fn config(&self) -> &BatteryConfig {
        &self.config
    }

    /// Hand the problem to the solver and read the schedule back from the solution.
    ///
    /// The revenue is recomputed from the extracted variable values, so the reported total always
    /// matches the reported per-period schedule.
    pub fn solve(&self, solver: &dyn Solve) -> Result<Schedule> {
        info!(
            "Solving battery schedule over {} periods",
            self.config.horizon
        );
        let assignment = solver
            .solve(&self.problem)
            .context("Failed to solve battery schedule")?;

        let rows = self
            .series
            .iter()
            .enumerate()
            .map(|(period, record)| ScheduleRow {
                period,
                capacity: assignment.value(self.variables.get(VariableKind::Capacity, period)),
                produced: record.produced,
                spot_price: record.spot_price,
                charge_power: assignment
                    .value(self.variables.get(VariableKind::ChargePower, period)),
                discharge_power: assignment
                    .value(self.variables.get(VariableKind::DischargePower, period)),
            })
            .collect();

        Ok(Schedule::new(
            rows,
            self.config.efficiency,
            self.config.mlf,
        ))
    }

    /// Re-check that a schedule satisfies every constraint and bound of this model.
    ///
    /// Feeds the schedule's values back into the problem as a feasibility check.
    pub fn check_schedule(&self, schedule: &Schedule, tolerance: f64) -> Result<()> {
        ensure!(
            schedule.rows.len() == self.config.horizon,
            "Expected {} schedule rows, found {}",
            self.config.horizon,
            schedule.rows.len()
        );

        // The variable map preserves insertion order, which matches the problem's column order
        let values = self
            .variables
            .0
            .keys()
            .map(|&(kind, period)| {
                let row = &schedule.rows[period];
                match kind {
                    VariableKind::Capacity => row.capacity,
                    VariableKind::ChargePower => row.charge_power,
                    VariableKind::DischargePower => row.discharge_power,
                }
            })
            .collect();

        self.problem
            .check_feasible(&Assignment::new(values), tolerance)
    }
}

/// Add the three decision variables for every period.
///
/// Only discharge earns revenue, so capacity and charge have zero objective coefficients; the
/// discharge coefficient is the spot price net of round-trip losses and the loss factor.
fn add_variables(
    problem: &mut Problem,
    config: &BatteryConfig,
    series: &[PeriodRecord],
) -> VariableMap {
    let mut variables = VariableMap::default();

    for (period, record) in series.iter().enumerate() {
        let capacity = problem.add_variable(VariableDefinition {
            min: config.min_capacity,
            max: config.max_capacity,
            coefficient: 0.0,
        });
        let charge = problem.add_variable(VariableDefinition {
            min: 0.0,
            max: config.max_raw_power,
            coefficient: 0.0,
        });
        let discharge = problem.add_variable(VariableDefinition {
            min: 0.0,
            max: config.max_raw_power,
            coefficient: record.spot_price * config.efficiency * config.mlf,
        });

        variables.insert(VariableKind::Capacity, period, capacity);
        variables.insert(VariableKind::ChargePower, period, charge);
        variables.insert(VariableKind::DischargePower, period, discharge);
    }

    variables
}

/// Fix the state of charge at the start of the first period.
///
/// This is a boundary condition, kept separate from the recurrence over later periods.
fn add_initial_capacity_constraint(
    problem: &mut Problem,
    variables: &VariableMap,
    config: &BatteryConfig,
) {
    let capacity = variables.get(VariableKind::Capacity, 0);
    problem.add_constraint(Constraint::equality(
        config.initial_capacity,
        vec![(capacity, 1.0)],
    ));
}

/// Link each period's state of charge to the previous period's flows:
///
/// Capacity\[t\] = Capacity\[t-1\] + ChargePower\[t-1\] - DischargePower\[t-1\]
fn add_capacity_transition_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    horizon: usize,
) {
    for period in 1..horizon {
        let terms = vec![
            (variables.get(VariableKind::Capacity, period), 1.0),
            (variables.get(VariableKind::Capacity, period - 1), -1.0),
            (variables.get(VariableKind::ChargePower, period - 1), -1.0),
            (variables.get(VariableKind::DischargePower, period - 1), 1.0),
        ];
        problem.add_constraint(Constraint::equality(0.0, terms));
    }
}

/// Keep the battery from charging above its capacity ceiling.
fn add_overcharge_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    config: &BatteryConfig,
) {
    for period in 0..config.horizon {
        let terms = vec![
            (variables.get(VariableKind::ChargePower, period), 1.0),
            (variables.get(VariableKind::Capacity, period), 1.0),
        ];
        problem.add_constraint(Constraint::upper_bound(config.max_capacity, terms));
    }
}

/// Cap discharge at stored energy plus same-period production.
///
/// The battery is co-located with the generation, so energy produced within the period can be
/// sold directly without first passing through the store.
fn add_overdischarge_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    series: &[PeriodRecord],
) {
    for (period, record) in series.iter().enumerate() {
        let terms = vec![
            (variables.get(VariableKind::DischargePower, period), 1.0),
            (variables.get(VariableKind::Capacity, period), -1.0),
        ];
        problem.add_constraint(Constraint::upper_bound(record.produced, terms));
    }
}

/// Forbid selling in periods where the spot price is not positive.
///
/// Periods with a positive price get no constraint from this rule.
fn add_negative_price_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    series: &[PeriodRecord],
) {
    for (period, record) in series.iter().enumerate() {
        if record.spot_price <= 0.0 {
            let discharge = variables.get(VariableKind::DischargePower, period);
            problem.add_constraint(Constraint::equality(0.0, vec![(discharge, 1.0)]));
        }
    }
}

/// The battery can only charge from current production, not from the grid.
fn add_charge_ceiling_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    series: &[PeriodRecord],
) {
    for (period, record) in series.iter().enumerate() {
        let charge = variables.get(VariableKind::ChargePower, period);
        problem.add_constraint(Constraint::upper_bound(
            record.produced,
            vec![(charge, 1.0)],
        ));
    }
}
