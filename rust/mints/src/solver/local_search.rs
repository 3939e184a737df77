use crate::evaluate::{evaluate_move, EvaluationScratch};
use crate::{
    ATol, LocalSearchOption, Model, Move, MoveKind, SolutionScore, VariableSense,
};
use std::time::Instant;
use tracing::trace;

/// Steepest-descent polish over univariate moves (plus selection swaps):
/// apply the best strictly improving move until none is left.
pub fn local_search(
    model: &mut Model,
    option: &LocalSearchOption,
    atol: ATol,
    deadline: Option<Instant>,
) -> u64 {
    if !option.is_enabled {
        return 0;
    }
    let mut scratch = EvaluationScratch::default();
    let mut iterations = 0;

    while iterations < option.iteration_max {
        if crate::neighborhood::deadline_passed(deadline) {
            break;
        }
        let current = SolutionScore::of_model(model, atol);
        let mut best: Option<(Move, SolutionScore)> = None;

        let mut consider = |mv: Move, model: &Model, scratch: &mut EvaluationScratch| {
            if !mv.is_within_bounds(model) || mv.is_noop(model) {
                return;
            }
            let score = evaluate_move(model, &mv, &current, atol, scratch);
            if score.local_augmented_objective < current.local_augmented_objective - f64::EPSILON
                && best
                    .as_ref()
                    .map(|(_, b)| score.local_augmented_objective < b.local_augmented_objective)
                    .unwrap_or(true)
            {
                best = Some((mv, score));
            }
        };

        for variable in model.variables() {
            if variable.is_fixed() || variable.sense().is_dependent() {
                continue;
            }
            let id = variable.id();
            match variable.sense() {
                VariableSense::Binary => {
                    consider(
                        Move::univariate(MoveKind::Binary, id, 1 - variable.value()),
                        model,
                        &mut scratch,
                    );
                }
                VariableSense::Integer => {
                    for target in [variable.value() + 1, variable.value() - 1] {
                        consider(Move::univariate(MoveKind::Integer, id, target), model, &mut scratch);
                    }
                }
                VariableSense::Selection => {}
                _ => {}
            }
        }
        for selection in model.selections() {
            let Some(selected) = selection.selected else {
                continue;
            };
            for &member in &selection.variables {
                if member == selected || model.variable(member).is_fixed() {
                    continue;
                }
                let mut mv = Move::univariate(MoveKind::Selection, selected, 0);
                mv.alterations.push((member, 1));
                mv.is_univariate = false;
                consider(mv, model, &mut scratch);
            }
        }

        let Some((mv, score)) = best else {
            break;
        };
        trace!(
            iteration = iterations,
            objective = score.objective,
            "local search step"
        );
        model
            .apply_alterations(&mv.alterations)
            .expect("bounded move applies");
        iterations += 1;
    }
    iterations
}
