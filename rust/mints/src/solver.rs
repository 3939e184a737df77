//! Solve driver: validation, presolve, structure setup, and the outer
//! controller loop.

mod controller;
mod lagrange_dual;
mod local_search;
mod penalty;
mod tabu_search;

pub use lagrange_dual::*;
pub use local_search::*;
pub use penalty::*;
pub use tabu_search::*;

use crate::{
    presolve, ATol, History, Model, NamedSolution, OptionError, PresolveError, SolutionScore,
    SolverOption,
};
use std::time::Instant;
use tracing::{info, warn};

/// Terminal status of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// A feasible solution reaching the target objective was found.
    Optimal,
    /// Feasible, but a time or iteration limit fired first.
    Feasible,
    /// Proven infeasible by the presolver, or no feasible solution found.
    Infeasible,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Status::Optimal => "Optimal",
            Status::Feasible => "Feasible",
            Status::Infeasible => "Infeasible",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SolveStatistics {
    pub number_of_outer_iterations: u64,
    pub number_of_tabu_search_iterations: u64,
    pub elapsed_seconds: f64,
}

/// Everything a solve produces: the best-known solution (the feasible
/// incumbent when one exists, otherwise the lowest-violation one with its
/// violated constraints visible in `solution.violations`), the archive, and
/// run statistics.
#[derive(Debug)]
pub struct SolveResult {
    pub status: Status,
    pub solution: NamedSolution,
    pub score: SolutionScore,
    pub history: History,
    pub dual_bound: Option<f64>,
    pub statistics: SolveStatistics,
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    #[error("solve was already called on this model")]
    ModelAlreadySolved,

    #[error(transparent)]
    InvalidOption(#[from] OptionError),
}

/// Solve the model.
///
/// The model is consumed: a second call on the same object is a precondition
/// failure. Infeasibility (proven by the presolver or simply never escaped)
/// is a regular, `Ok`, outcome with [`Status::Infeasible`].
pub fn solve(model: &mut Model, option: &SolverOption) -> Result<SolveResult, SolveError> {
    let started = Instant::now();
    if model.is_consumed() {
        return Err(SolveError::ModelAlreadySolved);
    }
    option.validate()?;
    model.mark_consumed();

    let atol = ATol::default();
    match presolve(model, &option.preprocess, atol) {
        Ok(report) => {
            info!(
                passes = report.number_of_passes,
                fixed = report.number_of_fixed_variables,
                disabled = report.number_of_disabled_constraints,
                "presolve finished"
            );
        }
        Err(PresolveError::EmptyBound { .. }) | Err(PresolveError::UnsatisfiableConstraint { .. }) => {
            warn!("presolve proved infeasibility");
            let user_selections = model.user_defined_selection_names().clone();
            model.setup_structure(option.neighborhood.selection_mode, &user_selections, atol);
            return Ok(infeasible_result(model, started, atol));
        }
    }

    let user_selections = model.user_defined_selection_names().clone();
    model.setup_structure(option.neighborhood.selection_mode, &user_selections, atol);

    let outcome = controller::run(model, option, started);

    // land the model on the reportable incumbent before capturing it
    if let Some((solution, _)) = outcome.incumbent.reportable() {
        let values = solution.variable_values.clone();
        let _ = model.set_values(&values);
    }
    let score = SolutionScore::of_model(model, atol);
    let status = if outcome.incumbent.feasible().is_some() {
        if outcome.termination == controller::OuterTermination::TargetReached {
            Status::Optimal
        } else {
            Status::Feasible
        }
    } else {
        Status::Infeasible
    };

    info!(%status, objective = model.objective().user_value(), "solve finished");
    Ok(SolveResult {
        status,
        solution: NamedSolution::from_model(model, atol),
        score,
        history: outcome.history,
        dual_bound: outcome.dual_bound,
        statistics: SolveStatistics {
            number_of_outer_iterations: outcome.number_of_outer_iterations,
            number_of_tabu_search_iterations: outcome.number_of_tabu_search_iterations,
            elapsed_seconds: started.elapsed().as_secs_f64() + option.general.time_offset,
        },
    })
}

fn infeasible_result(model: &Model, started: Instant, atol: ATol) -> SolveResult {
    SolveResult {
        status: Status::Infeasible,
        solution: NamedSolution::from_model(model, atol),
        score: SolutionScore::of_model(model, atol),
        history: History::new(0),
        dual_bound: None,
        statistics: SolveStatistics {
            number_of_outer_iterations: 0,
            number_of_tabu_search_iterations: 0,
            elapsed_seconds: started.elapsed().as_secs_f64(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Expr;

    #[test]
    fn resolve_rejection_on_consumed_model() {
        let mut model = Model::new("twice");
        let x = model.create_variable("x", 0, 1).unwrap();
        model.minimize(Expr::var(x));
        let mut option = SolverOption::default();
        option.general.time_max = 1.0;
        option.tabu_search.iteration_max = 5;
        option.general.iteration_max = 20;

        assert!(solve(&mut model, &option).is_ok());
        assert!(matches!(
            solve(&mut model, &option),
            Err(SolveError::ModelAlreadySolved)
        ));
    }

    #[test]
    fn presolve_infeasibility_short_circuits() {
        let mut model = Model::new("infeasible");
        let x = model.create_variable("x", 0, 1).unwrap();
        model.add_constraint("fix", Expr::var(x).eq(2.0)).unwrap();
        let option = SolverOption::default();
        let result = solve(&mut model, &option).unwrap();
        assert_eq!(result.status, Status::Infeasible);
        assert_eq!(result.statistics.number_of_outer_iterations, 0);
        assert_eq!(result.statistics.number_of_tabu_search_iterations, 0);
    }

    #[test]
    fn invalid_option_is_rejected_before_search() {
        let mut model = Model::new("invalid");
        model.create_variable("x", 0, 1).unwrap();
        let mut option = SolverOption::default();
        option.general.time_max = -1.0;
        assert!(matches!(
            solve(&mut model, &option),
            Err(SolveError::InvalidOption(_))
        ));
        // rejected before consumption: a corrected retry must work
        option.general.time_max = 1.0;
        option.tabu_search.iteration_max = 2;
        option.general.iteration_max = 4;
        assert!(solve(&mut model, &option).is_ok());
    }
}
