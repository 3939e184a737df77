use crate::solution::update_status;
use crate::{ConstraintID, ConstraintShape, Model, PenaltyOption};
use fnv::FnvHashMap;
use tracing::debug;

/// Penalty coefficients are clamped into this range regardless of how the
/// rates compound.
const PENALTY_FLOOR: f64 = 1.0;
const PENALTY_CEILING: f64 = 1e15;

/// Mutable state of the penalty controller across outer iterations.
#[derive(Debug, Clone)]
pub struct PenaltyState {
    pub relaxing_rate: f64,
    pub inner_stagnation_count: u64,
    pub outer_stagnation_count: u64,
}

impl PenaltyState {
    pub fn new(option: &PenaltyOption) -> Self {
        Self {
            relaxing_rate: option.penalty_coefficient_relaxing_rate,
            inner_stagnation_count: 0,
            outer_stagnation_count: 0,
        }
    }
}

/// What the controller should do after the coefficient update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenaltyAction {
    Continue,
    /// Coefficients were reset; diversify from the feasible-solution
    /// archive.
    Diversify,
}

/// Update the per-constraint coefficients between episodes.
///
/// Constraints violated in the episode's best-local solution are tightened,
/// never-violated ones relaxed; the relaxing rate itself adapts to whether
/// the previous outer iteration improved the global augmented incumbent.
pub fn update_penalty_coefficients(
    model: &mut Model,
    violated_in_best_local: &[ConstraintID],
    episode_update_status: u8,
    option: &PenaltyOption,
    state: &mut PenaltyState,
    is_feasible_incumbent: bool,
    feasible_objective: f64,
) -> PenaltyAction {
    let improved_global = episode_update_status & update_status::GLOBAL_IMPROVED != 0;
    let improved_feasible = episode_update_status & update_status::FEASIBLE_IMPROVED != 0;

    // relaxing-rate adaptation
    if improved_global {
        state.relaxing_rate = (state.relaxing_rate
            * option.penalty_coefficient_relaxing_rate_increase_rate)
            .min(option.penalty_coefficient_relaxing_rate_max);
    } else {
        state.relaxing_rate = (state.relaxing_rate
            * option.penalty_coefficient_relaxing_rate_decrease_rate)
            .max(option.penalty_coefficient_relaxing_rate_min);
    }

    let violated: fnv::FnvHashSet<ConstraintID> = violated_in_best_local.iter().copied().collect();
    for index in 0..model.number_of_constraints() {
        let constraint = &model.constraints()[index];
        if !constraint.is_enabled() {
            continue;
        }
        let id = constraint.id();
        let mut coefficient = constraint.local_penalty();
        if violated.contains(&id) {
            coefficient *= option.penalty_coefficient_tightening_rate;
        } else {
            coefficient *= state.relaxing_rate;
        }
        coefficient = coefficient.clamp(PENALTY_FLOOR, PENALTY_CEILING);
        let constraint = &mut model.constraints_mut()[index];
        if violated.contains(&id) {
            constraint.increment_violation_count();
        }
        constraint.set_local_penalty(coefficient);
    }

    // shrink toward the objective scale once feasibility is in hand
    if option.is_enabled_shrink_penalty_coefficient && is_feasible_incumbent {
        let ceiling = (feasible_objective.abs().max(1.0) * 10.0).max(PENALTY_FLOOR);
        for constraint in model.constraints_mut() {
            let shrunk = constraint.local_penalty().min(ceiling);
            constraint.set_local_penalty(shrunk);
            let shrunk_global = constraint.global_penalty().min(ceiling);
            constraint.set_global_penalty(shrunk_global);
        }
    }

    if option.is_enabled_group_penalty_coefficient {
        share_group_coefficients(model);
    }

    // stagnation bookkeeping
    if improved_global || improved_feasible {
        state.inner_stagnation_count = 0;
        state.outer_stagnation_count = 0;
    } else {
        state.inner_stagnation_count += 1;
        state.outer_stagnation_count += 1;
    }

    if option.is_enabled_inner_stagnation_breaker
        && state.inner_stagnation_count >= option.inner_stagnation_threshold
    {
        debug!("inner stagnation: resetting penalty coefficients");
        state.inner_stagnation_count = 0;
        model.reset_penalties(option.initial_penalty_coefficient);
        state.relaxing_rate = option.penalty_coefficient_relaxing_rate;
    }
    if option.is_enabled_outer_stagnation_breaker
        && state.outer_stagnation_count >= option.outer_stagnation_threshold
    {
        debug!("outer stagnation: diversifying from the archive");
        state.outer_stagnation_count = 0;
        model.reset_penalties(option.initial_penalty_coefficient);
        state.relaxing_rate = option.penalty_coefficient_relaxing_rate;
        return PenaltyAction::Diversify;
    }
    PenaltyAction::Continue
}

/// Constraints of the same shape share the largest coefficient in their
/// group.
fn share_group_coefficients(model: &mut Model) {
    let mut maxima: FnvHashMap<ConstraintShape, f64> = Default::default();
    for constraint in model.constraints() {
        if !constraint.is_enabled() {
            continue;
        }
        let entry = maxima.entry(constraint.shape()).or_insert(0.0);
        *entry = entry.max(constraint.local_penalty());
    }
    for constraint in model.constraints_mut() {
        if !constraint.is_enabled() {
            continue;
        }
        if let Some(&maximum) = maxima.get(&constraint.shape()) {
            constraint.set_local_penalty(maximum);
        }
    }
}
