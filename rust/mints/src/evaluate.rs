//! Incremental move evaluation and improvability screening.
//!
//! [`evaluate_move`] scores a candidate in time linear in the number of
//! affected constraints, using the per-(variable, constraint) sensitivities
//! frozen into the model. The parallel driver assigns each worker its own
//! scratch map keyed by constraint ID, so chunk writes stay race-free and the
//! result is deterministic for a fixed pre-move state.

use crate::{ATol, ConstraintID, Model, Move, SolutionScore};
use fnv::FnvHashMap;
use rayon::prelude::*;
use std::time::Instant;

pub type EvaluationScratch = FnvHashMap<ConstraintID, f64>;

/// Score `mv` against the model's current caches.
///
/// `current` must be the score of the present state. The returned score is
/// the hypothetical post-move score; the model is not touched.
pub fn evaluate_move(
    model: &Model,
    mv: &Move,
    current: &SolutionScore,
    atol: ATol,
    scratch: &mut EvaluationScratch,
) -> SolutionScore {
    scratch.clear();

    let mut objective_delta = 0.0;
    for &(id, new_value) in &mv.alterations {
        let variable = model.variable(id);
        let delta = (new_value - variable.value()) as f64;
        if delta == 0.0 {
            continue;
        }
        objective_delta += variable.objective_sensitivity() * delta;
        for &(constraint_id, coefficient) in variable.related() {
            *scratch.entry(constraint_id).or_insert(0.0) += coefficient * delta;
        }
    }
    objective_delta *= model.objective().sign();

    let mut violation_delta = 0.0;
    let mut local_penalty_delta = 0.0;
    let mut global_penalty_delta = 0.0;
    for (&constraint_id, &lhs_delta) in scratch.iter() {
        let constraint = model.constraint(constraint_id);
        if !constraint.is_enabled() {
            continue;
        }
        let old_violation = constraint.violation();
        let new_violation = constraint.violation_of(constraint.expression().value() + lhs_delta);
        let delta = new_violation - old_violation;
        if delta != 0.0 {
            violation_delta += delta;
            local_penalty_delta += constraint.local_penalty() * delta;
            global_penalty_delta += constraint.global_penalty() * delta;
        }
    }

    let objective = current.objective + objective_delta;
    let total_violation = (current.total_violation + violation_delta).max(0.0);
    let local_penalty = (current.local_penalty + local_penalty_delta).max(0.0);
    let global_penalty = (current.global_penalty + global_penalty_delta).max(0.0);

    SolutionScore {
        objective,
        objective_improvement: current.objective - objective,
        total_violation,
        local_penalty,
        global_penalty,
        local_augmented_objective: objective + local_penalty,
        global_augmented_objective: objective + global_penalty,
        is_feasible: total_violation <= *atol,
        is_objective_improvable: objective_delta < 0.0,
        is_feasibility_improvable: violation_delta < 0.0,
    }
}

/// Reference scoring path: apply the move to a scratch value vector and
/// recompute everything from scratch. Used when fast evaluation is disabled
/// and by tests as the ground truth for the incremental path.
pub fn evaluate_move_exhaustive(
    model: &Model,
    mv: &Move,
    current: &SolutionScore,
    atol: ATol,
) -> SolutionScore {
    let mut values = model.values();
    for &(id, new_value) in &mv.alterations {
        values[id.into_inner()] = new_value;
    }
    let sign = model.objective().sign();
    let objective = sign * model.objective().expression().evaluate(&values);

    let mut total_violation = 0.0;
    let mut local_penalty = 0.0;
    let mut global_penalty = 0.0;
    for constraint in model.constraints() {
        if !constraint.is_enabled() {
            continue;
        }
        let violation = constraint.violation_of(constraint.expression().evaluate(&values));
        if violation > 0.0 {
            total_violation += violation;
            local_penalty += constraint.local_penalty() * violation;
            global_penalty += constraint.global_penalty() * violation;
        }
    }

    SolutionScore {
        objective,
        objective_improvement: current.objective - objective,
        total_violation,
        local_penalty,
        global_penalty,
        local_augmented_objective: objective + local_penalty,
        global_augmented_objective: objective + global_penalty,
        is_feasible: total_violation <= *atol,
        is_objective_improvable: objective < current.objective,
        is_feasibility_improvable: total_violation < current.total_violation,
    }
}

/// Evaluate a candidate slice. Each worker owns a scratch map; writes go to
/// disjoint entries of the output vector. The iteration in flight always
/// completes: past `deadline` the evaluation still runs, but serially, so no
/// further pool work is forked.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_moves(
    model: &Model,
    moves: &[Move],
    scores: &mut Vec<SolutionScore>,
    current: &SolutionScore,
    atol: ATol,
    fast: bool,
    parallel: bool,
    deadline: Option<Instant>,
) {
    let parallel = parallel && !crate::neighborhood::deadline_passed(deadline);
    if parallel {
        moves
            .par_iter()
            .map_init(EvaluationScratch::default, |scratch, mv| {
                if fast {
                    evaluate_move(model, mv, current, atol, scratch)
                } else {
                    evaluate_move_exhaustive(model, mv, current, atol)
                }
            })
            .collect_into_vec(scores);
    } else {
        scores.clear();
        let mut scratch = EvaluationScratch::default();
        for mv in moves {
            scores.push(if fast {
                evaluate_move(model, mv, current, atol, &mut scratch)
            } else {
                evaluate_move_exhaustive(model, mv, current, atol)
            });
        }
    }
}

/// Refresh per-variable and per-constraint improvability marks used by the
/// screening pre-filter.
///
/// With `intensive`, feasibility marks are restricted to the most violated
/// constraints only, narrowing the neighborhood to the worst dimension.
pub fn update_improvability_marks(model: &mut Model, atol: ATol, intensive: bool) {
    let sign = model.objective().sign();
    let max_violation = model
        .constraints()
        .iter()
        .filter(|c| c.is_enabled())
        .map(|c| c.violation())
        .fold(0.0f64, f64::max);

    let mut objective_marks = vec![false; model.number_of_variables()];
    let mut feasibility_marks = vec![false; model.number_of_variables()];
    let mut constraint_marks = vec![false; model.number_of_constraints()];

    for variable in model.variables() {
        if variable.is_fixed() {
            continue;
        }
        let index = variable.id().into_inner();
        let gradient = sign * variable.objective_sensitivity();
        if gradient > 0.0 && variable.value() > variable.lower() {
            objective_marks[index] = true;
        }
        if gradient < 0.0 && variable.value() < variable.upper() {
            objective_marks[index] = true;
        }

        for &(constraint_id, coefficient) in variable.related() {
            let constraint = model.constraint(constraint_id);
            if !constraint.is_enabled() || !constraint.is_violated(atol) {
                continue;
            }
            if intensive && constraint.violation() < max_violation {
                continue;
            }
            let lhs = constraint.expression().value();
            let surplus = lhs > constraint.rhs();
            // reduce a surplus by moving against the coefficient, a deficit
            // by moving with it
            let helps = if surplus {
                (coefficient > 0.0 && variable.value() > variable.lower())
                    || (coefficient < 0.0 && variable.value() < variable.upper())
            } else {
                (coefficient > 0.0 && variable.value() < variable.upper())
                    || (coefficient < 0.0 && variable.value() > variable.lower())
            };
            if helps {
                feasibility_marks[index] = true;
                constraint_marks[constraint_id.into_inner()] = true;
            }
        }
    }

    for variable in model.variables_mut() {
        let index = variable.id().into_inner();
        variable.set_improvability(objective_marks[index], feasibility_marks[index]);
    }
    for constraint in model.constraints_mut() {
        let index = constraint.id().into_inner();
        constraint.set_improvable(constraint_marks[index]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Expr, MoveKind, SelectionMode};

    fn model() -> Model {
        let mut model = Model::new("evaluate");
        let x = model.create_variables("x", &[2], -100, 100).unwrap();
        model
            .add_constraint("g[0]", Expr::term(x[0], 66.0).plus_term(x[1], 14.0).ge(1430.0))
            .unwrap();
        model
            .add_constraint(
                "g[1]",
                Expr::term(x[0], -82.0).plus_term(x[1], 28.0).ge(1306.0),
            )
            .unwrap();
        model.minimize(Expr::term(x[0], 1.0).plus_term(x[1], 10.0));
        model.setup_structure(SelectionMode::Defined, &Default::default(), ATol::default());
        model.reset_penalties(10.0);
        model.refresh_all();
        model
    }

    fn move_to(model: &Model, values: (i64, i64)) -> Move {
        let x0 = model.variable_id_by_name("x[0]").unwrap();
        let x1 = model.variable_id_by_name("x[1]").unwrap();
        let mut mv = Move::univariate(MoveKind::Integer, x0, values.0);
        mv.alterations.push((x1, values.1));
        mv.bind(model);
        mv
    }

    #[test]
    fn incremental_matches_exhaustive() {
        let model = model();
        let atol = ATol::default();
        let current = SolutionScore::of_model(&model, atol);
        let mut scratch = EvaluationScratch::default();
        for target in [(7, 70), (0, 10), (-5, 103), (100, -100)] {
            let mv = move_to(&model, target);
            let fast = evaluate_move(&model, &mv, &current, atol, &mut scratch);
            let slow = evaluate_move_exhaustive(&model, &mv, &current, atol);
            approx::assert_abs_diff_eq!(fast.objective, slow.objective, epsilon = 1e-9);
            approx::assert_abs_diff_eq!(
                fast.total_violation,
                slow.total_violation,
                epsilon = 1e-9
            );
            approx::assert_abs_diff_eq!(
                fast.local_augmented_objective,
                slow.local_augmented_objective,
                epsilon = 1e-9
            );
            assert_eq!(fast.is_feasible, slow.is_feasible);
        }
    }

    #[test]
    fn feasible_move_is_scored_feasible() {
        let model = model();
        let atol = ATol::default();
        let current = SolutionScore::of_model(&model, atol);
        let mut scratch = EvaluationScratch::default();
        let score = evaluate_move(&model, &move_to(&model, (7, 70)), &current, atol, &mut scratch);
        assert!(score.is_feasible);
        assert!((score.objective - 707.0).abs() < 1e-9);
        assert!(score.is_feasibility_improvable);
    }

    #[test]
    fn parallel_evaluation_matches_serial() {
        let model = model();
        let atol = ATol::default();
        let current = SolutionScore::of_model(&model, atol);
        let moves: Vec<Move> = (0..50)
            .map(|i| move_to(&model, (i - 25, 2 * i)))
            .collect();
        let mut serial = Vec::new();
        let mut parallel = Vec::new();
        evaluate_moves(&model, &moves, &mut serial, &current, atol, true, false, None);
        evaluate_moves(&model, &moves, &mut parallel, &current, atol, true, true, None);
        assert_eq!(serial.len(), parallel.len());
        for (a, b) in serial.iter().zip(&parallel) {
            assert_eq!(a.local_augmented_objective, b.local_augmented_objective);
        }
    }

    #[test]
    fn improvability_marks_point_at_violation_reducers() {
        let mut model = model();
        update_improvability_marks(&mut model, ATol::default(), false);
        let x0 = model.variable_id_by_name("x[0]").unwrap();
        let x1 = model.variable_id_by_name("x[1]").unwrap();
        // both constraints are >= and violated at (0, 0); x1 has positive
        // coefficients in both, x0 mixed
        assert!(model.variable(x1).is_feasibility_improvable());
        assert!(model.variable(x0).is_feasibility_improvable());
        // objective decreases by lowering either variable
        assert!(model.variable(x0).is_objective_improvable());
        let g0 = model.constraints()[0].id();
        assert!(model.constraint(g0).is_improvable());
    }
}
