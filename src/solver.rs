//! Provides data structures and functions for performing optimisation.
//!
//! The model code builds a [`Problem`] and hands it to a [`Solve`] implementation; it never
//! depends on a particular solver's internals, so any LP backend supporting box-bounded
//! continuous variables and linear equality/inequality constraints can be substituted.
use anyhow::{Result, anyhow, ensure};
use highs::{HighsModelStatus, RowProblem};
use log::{Level, log_enabled};

/// Whether the objective is to be maximised or minimised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    /// Maximise the objective
    Maximise,
    /// Minimise the objective
    Minimise,
}

/// The definition of a variable to be optimised.
///
/// The coefficients represent the multiplying factors in the objective function to maximise or
/// minimise, i.e. the Cs in:
///
/// f = c1*x1 + c2*x2 + ...
///
/// with x1, x2... taking values between min and max.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct VariableDefinition {
    /// The variable's minimum value
    pub min: f64,
    /// The variable's maximum value
    pub max: f64,
    /// The coefficient of the variable in the objective
    pub coefficient: f64,
}

/// Refers to a particular column of a [`Problem`].
///
/// Note that this type does **not** include the value of the variable; values are read from an
/// [`Assignment`] after a successful solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableId(usize);

/// A constraint for an optimisation.
///
/// Each constraint adds an inequality equation to the problem to solve of the form:
///
/// min <= a1*x1 + a2*x2 + ... <= max
///
/// Only variables with non-zero coefficients are listed in `terms`.
#[derive(PartialEq, Debug, Clone)]
pub struct Constraint {
    /// The minimum value for the constraint
    pub min: f64,
    /// The maximum value for the constraint
    pub max: f64,
    /// The non-zero coefficients, as (variable, coefficient) pairs
    pub terms: Vec<(VariableId, f64)>,
}

impl Constraint {
    /// A constraint fixing the weighted sum of the terms to `value`.
    pub fn equality(value: f64, terms: Vec<(VariableId, f64)>) -> Self {
        Self {
            min: value,
            max: value,
            terms,
        }
    }

    /// A constraint imposing only an upper bound on the weighted sum of the terms.
    pub fn upper_bound(max: f64, terms: Vec<(VariableId, f64)>) -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max,
            terms,
        }
    }
}

/// A complete linear program, ready to hand to a [`Solve`] implementation.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    sense: Sense,
    variables: Vec<VariableDefinition>,
    constraints: Vec<Constraint>,
}

impl Problem {
    /// Create an empty problem with the given optimisation sense.
    pub fn new(sense: Sense) -> Self {
        Self {
            sense,
            variables: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// The optimisation sense.
    pub fn sense(&self) -> Sense {
        self.sense
    }

    /// Add a variable to the problem, returning its ID.
    pub fn add_variable(&mut self, definition: VariableDefinition) -> VariableId {
        self.variables.push(definition);
        VariableId(self.variables.len() - 1)
    }

    /// Add a constraint over previously added variables.
    ///
    /// # Panics
    ///
    /// Panics if the constraint refers to a variable that is not part of this problem.
    pub fn add_constraint(&mut self, constraint: Constraint) {
        for (var, _) in &constraint.terms {
            assert!(var.0 < self.variables.len(), "Unknown variable in constraint");
        }
        self.constraints.push(constraint);
    }

    /// The definitions of all variables, in the order they were added.
    pub fn variables(&self) -> &[VariableDefinition] {
        &self.variables
    }

    /// All constraints, in the order they were added.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Check that an assignment satisfies every variable bound and constraint.
    ///
    /// Used to re-check a solution returned by a solver within numerical tolerance.
    pub fn check_feasible(&self, assignment: &Assignment, tolerance: f64) -> Result<()> {
        ensure!(
            assignment.0.len() == self.variables.len(),
            "Expected {} variable values, found {}",
            self.variables.len(),
            assignment.0.len()
        );

        for (i, (definition, value)) in self.variables.iter().zip(&assignment.0).enumerate() {
            ensure!(
                (definition.min - tolerance..=definition.max + tolerance).contains(value),
                "Variable {i} out of bounds: {value} not in [{}, {}]",
                definition.min,
                definition.max
            );
        }

        for (i, constraint) in self.constraints.iter().enumerate() {
            let total: f64 = constraint
                .terms
                .iter()
                .map(|&(var, coefficient)| coefficient * assignment.0[var.0])
                .sum();
            ensure!(
                (constraint.min - tolerance..=constraint.max + tolerance).contains(&total),
                "Constraint {i} violated: {total} not in [{}, {}]",
                constraint.min,
                constraint.max
            );
        }

        Ok(())
    }
}

/// The values assigned to each variable by a successful solve.
///
/// An `Assignment` only exists once a solver has returned an optimal solution, so results cannot
/// be read before one is available.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment(Vec<f64>);

impl Assignment {
    /// Create an assignment from values ordered by column, e.g. to re-check a known solution.
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// The value assigned to the given variable.
    pub fn value(&self, var: VariableId) -> f64 {
        self.0[var.0]
    }
}

/// The interface to the external solver.
pub trait Solve {
    /// Solve the given problem, returning values for every variable.
    ///
    /// Infeasible and unbounded problems are reported as distinct errors rather than returning
    /// zero or partial values.
    fn solve(&self, problem: &Problem) -> Result<Assignment>;
}

/// A [`Solve`] implementation backed by the HiGHS solver.
#[derive(Debug, Clone, Default)]
pub struct HighsSolver {
    /// Optional wall-clock limit for the solve, in seconds
    pub time_limit: Option<f64>,
}

impl Solve for HighsSolver {
    fn solve(&self, problem: &Problem) -> Result<Assignment> {
        let mut pb = RowProblem::default();

        // Add variables
        let mut columns = Vec::with_capacity(problem.variables().len());
        for definition in problem.variables() {
            columns.push(pb.add_column(definition.coefficient, definition.min..=definition.max));
        }

        // Add constraints
        for constraint in problem.constraints() {
            let coefficients: Vec<_> = constraint
                .terms
                .iter()
                .map(|&(var, coefficient)| (columns[var.0], coefficient))
                .collect();
            pb.add_row(constraint.min..=constraint.max, coefficients);
        }

        let sense = match problem.sense() {
            Sense::Maximise => highs::Sense::Maximise,
            Sense::Minimise => highs::Sense::Minimise,
        };
        let mut model = pb.optimise(sense);

        // HiGHS writes directly to the console rather than via our logger, so only enable its
        // output when debug logging is on
        model.set_option("output_flag", log_enabled!(Level::Debug));
        if let Some(time_limit) = self.time_limit {
            model.set_option("time_limit", time_limit);
        }

        let solved = model.solve();
        match solved.status() {
            HighsModelStatus::Optimal => Ok(Assignment(solved.get_solution().columns().to_vec())),
            HighsModelStatus::Infeasible => Err(anyhow!("Problem is infeasible")),
            HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible => {
                Err(anyhow!("Problem is unbounded"))
            }
            status => Err(anyhow!("Could not solve: {status:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    /// Maximise x + 2y subject to x + y <= 4, with 0 <= x, y <= 3.
    fn small_problem() -> (Problem, VariableId, VariableId) {
        let mut problem = Problem::new(Sense::Maximise);
        let x = problem.add_variable(VariableDefinition {
            min: 0.0,
            max: 3.0,
            coefficient: 1.0,
        });
        let y = problem.add_variable(VariableDefinition {
            min: 0.0,
            max: 3.0,
            coefficient: 2.0,
        });
        problem.add_constraint(Constraint::upper_bound(4.0, vec![(x, 1.0), (y, 1.0)]));

        (problem, x, y)
    }

    #[test]
    fn test_solve_highs() {
        let (problem, x, y) = small_problem();
        let assignment = HighsSolver::default().solve(&problem).unwrap();

        assert_approx_eq!(f64, assignment.value(x), 1.0, epsilon = 1e-8);
        assert_approx_eq!(f64, assignment.value(y), 3.0, epsilon = 1e-8);
    }

    #[test]
    fn test_solve_highs_infeasible() {
        let (mut problem, x, _) = small_problem();

        // x >= 5 conflicts with its upper bound of 3
        problem.add_constraint(Constraint {
            min: 5.0,
            max: f64::INFINITY,
            terms: vec![(x, 1.0)],
        });

        let error = HighsSolver::default().solve(&problem).unwrap_err();
        assert_eq!(error.to_string(), "Problem is infeasible");
    }

    #[test]
    fn test_solve_highs_unbounded() {
        let mut problem = Problem::new(Sense::Maximise);
        problem.add_variable(VariableDefinition {
            min: 0.0,
            max: f64::INFINITY,
            coefficient: 1.0,
        });

        let error = HighsSolver::default().solve(&problem).unwrap_err();
        assert_eq!(error.to_string(), "Problem is unbounded");
    }

    #[test]
    fn test_check_feasible() {
        let (problem, _, _) = small_problem();
        let assignment = HighsSolver::default().solve(&problem).unwrap();

        problem.check_feasible(&assignment, 1e-6).unwrap();
    }

    #[test]
    fn test_check_feasible_violation() {
        let (problem, _, _) = small_problem();

        // x + y = 6 violates the row constraint
        let assignment = Assignment(vec![3.0, 3.0]);
        let error = problem.check_feasible(&assignment, 1e-6).unwrap_err();
        assert!(error.to_string().contains("Constraint 0 violated"));
    }

    #[test]
    fn test_check_feasible_out_of_bounds() {
        let (problem, _, _) = small_problem();

        let assignment = Assignment(vec![4.0, 0.0]);
        let error = problem.check_feasible(&assignment, 1e-6).unwrap_err();
        assert!(error.to_string().contains("Variable 0 out of bounds"));
    }

    #[test]
    #[should_panic(expected = "Unknown variable in constraint")]
    fn test_add_constraint_unknown_variable() {
        let (mut problem, _, _) = small_problem();
        let mut other = Problem::new(Sense::Maximise);
        for _ in 0..3 {
            other.add_variable(VariableDefinition {
                min: 0.0,
                max: 1.0,
                coefficient: 0.0,
            });
        }
        let var = other.add_variable(VariableDefinition {
            min: 0.0,
            max: 1.0,
            coefficient: 0.0,
        });

        problem.add_constraint(Constraint::equality(0.0, vec![(var, 1.0)]));
    }
}
