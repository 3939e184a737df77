use crate::evaluate::{evaluate_moves, update_improvability_marks};
use crate::solution::update_status;
use crate::utility::{RingQueue, SolverRng};
use crate::{
    ATol, ConstraintID, DenseSolution, History, ImprovabilityScreeningMode, IncumbentHolder,
    Model, Move, MoveAcceptance, Neighborhood, SolutionScore, SolverOption, TabuMode, TrendWriter,
    VariableID,
};
use std::time::Instant;
use tracing::{debug, trace};

/// Short-term memory: the iteration at which each variable was last
/// perturbed. A variable is tabu while `iteration < last + tenure`.
#[derive(Debug, Clone)]
pub struct TabuMemory {
    last_perturbed: Vec<i64>,
    tenure: u64,
}

impl TabuMemory {
    pub fn new(number_of_variables: usize, tenure: u64) -> Self {
        Self {
            last_perturbed: vec![i64::MIN / 2; number_of_variables],
            tenure,
        }
    }

    pub fn tenure(&self) -> u64 {
        self.tenure
    }

    pub fn set_tenure(&mut self, tenure: u64) {
        self.tenure = tenure;
    }

    pub fn is_variable_tabu(&self, id: VariableID, iteration: i64) -> bool {
        iteration < self.last_perturbed[id.into_inner()] + self.tenure as i64
    }

    /// Tabu status of a whole move under the given mode: `All` requires every
    /// altered variable to be tabu, `Any` a single one.
    pub fn is_move_tabu(&self, mv: &Move, iteration: i64, mode: TabuMode) -> bool {
        match mode {
            TabuMode::All => mv
                .alterations
                .iter()
                .all(|(id, _)| self.is_variable_tabu(*id, iteration)),
            TabuMode::Any => mv
                .alterations
                .iter()
                .any(|(id, _)| self.is_variable_tabu(*id, iteration)),
        }
    }

    pub fn register(&mut self, mv: &Move, iteration: i64) {
        for (id, _) in &mv.alterations {
            self.last_perturbed[id.into_inner()] = iteration;
        }
    }
}

/// Episode parameters the outer controller tunes per episode (via its UCB1
/// bandit).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeParameters {
    pub initial_tabu_tenure: u64,
    pub number_of_initial_modification: u64,
    pub move_preserve_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeTermination {
    IterationMax,
    NoMovesAvailable,
    Deadline,
    AutomaticBreak,
    TargetReached,
}

#[derive(Debug)]
pub struct EpisodeResult {
    pub number_of_iterations: u64,
    pub termination: EpisodeTermination,
    pub best_local_score: SolutionScore,
    pub best_local_solution: DenseSolution,
    /// Constraints violated in the episode's best-local solution; the
    /// penalty controller tightens exactly these.
    pub violated_in_best_local: Vec<ConstraintID>,
    pub update_status_union: u8,
    /// Average candidate count per iteration, for the automatic
    /// parallelization estimate.
    pub average_number_of_moves: f64,
}

/// Episode-wide context resolved by the controller: the effective screening
/// mode (after `Automatic` resolution), the parallelization decisions, and
/// the worker pools for the two parallel regions.
#[derive(Clone, Copy, Default)]
pub struct EpisodeEnvironment<'a> {
    pub screening: ImprovabilityScreeningMode,
    pub parallel_move_update: bool,
    pub parallel_move_evaluation: bool,
    pub update_pool: Option<&'a rayon::ThreadPool>,
    pub evaluation_pool: Option<&'a rayon::ThreadPool>,
    /// Global iteration count before this episode, for the trend log.
    pub trend_iteration_offset: u64,
}

fn acceptance_for(model: &Model, screening: ImprovabilityScreeningMode, atol: ATol) -> MoveAcceptance {
    match screening {
        ImprovabilityScreeningMode::Off => MoveAcceptance::all(),
        ImprovabilityScreeningMode::Soft => MoveAcceptance {
            accept_all: false,
            accept_objective_improvable: true,
            accept_feasibility_improvable: true,
            accept_permissible: true,
        },
        ImprovabilityScreeningMode::Aggressive | ImprovabilityScreeningMode::Intensive => {
            if model.is_feasible(atol) {
                MoveAcceptance {
                    accept_all: false,
                    accept_objective_improvable: true,
                    accept_feasibility_improvable: false,
                    accept_permissible: false,
                }
            } else {
                MoveAcceptance {
                    accept_all: false,
                    accept_objective_improvable: false,
                    accept_feasibility_improvable: true,
                    accept_permissible: false,
                }
            }
        }
        // resolved by the controller before the episode starts
        ImprovabilityScreeningMode::Automatic => MoveAcceptance::all(),
    }
}

/// Randomly perturb at least `count` perturbable variables to push the
/// episode out of the previous basin.
fn apply_initial_modification(
    model: &mut Model,
    count: u64,
    rng: &mut SolverRng,
) -> Vec<(VariableID, i64)> {
    let perturbable: Vec<VariableID> = model
        .variables()
        .iter()
        .filter(|v| !v.is_fixed() && !v.sense().is_dependent())
        .map(|v| v.id())
        .collect();
    if perturbable.is_empty() || count == 0 {
        return Vec::new();
    }
    let mut applied = Vec::new();
    for _ in 0..count {
        let id = perturbable[rng.index(perturbable.len())];
        let variable = model.variable(id);
        let perturbation: Vec<(VariableID, i64)> = if let Some(group) = variable.selection_index()
        {
            // keep the one-hot invariant: swap inside the group
            let selection = &model.selections()[group];
            let member = selection.variables[rng.index(selection.variables.len())];
            match selection.selected {
                Some(selected) if member != selected && !model.variable(member).is_fixed() => {
                    vec![(selected, 0), (member, 1)]
                }
                _ => continue,
            }
        } else {
            vec![(id, rng.integer(variable.lower(), variable.upper()))]
        };
        let _ = model.apply_alterations(&perturbation);
        applied.extend(perturbation);
        if applied.len() as u64 >= count {
            break;
        }
    }
    applied
}

/// One tabu-search episode: repeatedly evaluate the structured neighborhood
/// and apply the best admissible move.
#[allow(clippy::too_many_arguments)]
pub fn tabu_search(
    model: &mut Model,
    neighborhood: &mut Neighborhood,
    incumbent: &mut IncumbentHolder,
    history: &mut History,
    option: &SolverOption,
    parameters: &EpisodeParameters,
    environment: &EpisodeEnvironment,
    rng: &mut SolverRng,
    deadline: Option<Instant>,
    trend: Option<&mut TrendWriter>,
) -> EpisodeResult {
    let atol = ATol::default();
    let tabu_option = &option.tabu_search;

    incumbent.reset_local();
    if parameters.number_of_initial_modification > 0 {
        let applied =
            apply_initial_modification(model, parameters.number_of_initial_modification, rng);
        trace!(count = applied.len(), "initial modification applied");
    }

    let mut memory = TabuMemory::new(model.number_of_variables(), parameters.initial_tabu_tenure);
    let mut current_score = SolutionScore::of_model(model, atol);
    let mut best_local_score = current_score;
    let mut best_local_solution = DenseSolution::from_model(model, atol);
    let mut violated_in_best_local = violated_constraints(model, atol);
    let mut update_status_union = update_status::NONE;

    let mut score_window: RingQueue<f64> = RingQueue::new(tabu_option.automatic_break_window);
    let mut iterations_without_improvement: u64 = 0;
    let mut candidates: Vec<Move> = Vec::new();
    let mut scores: Vec<SolutionScore> = Vec::new();
    let mut move_count_total: f64 = 0.0;
    let mut previous_move: Option<Move> = None;
    let mut termination = EpisodeTermination::IterationMax;
    let mut iteration: u64 = 0;
    let mut trend = trend;

    while iteration < tabu_option.iteration_max {
        if crate::neighborhood::deadline_passed(deadline) {
            termination = EpisodeTermination::Deadline;
            break;
        }

        let screening = environment.screening;
        if screening != ImprovabilityScreeningMode::Off {
            update_improvability_marks(
                model,
                atol,
                screening == ImprovabilityScreeningMode::Intensive,
            );
        }
        let acceptance = acceptance_for(model, screening, atol);
        match environment.update_pool {
            Some(pool) if environment.parallel_move_update => {
                pool.install(|| neighborhood.update_moves(model, &acceptance, true, deadline))
            }
            _ => neighborhood.update_moves(
                model,
                &acceptance,
                environment.parallel_move_update,
                deadline,
            ),
        }
        neighborhood.collect_admissible(&mut candidates);

        // neighborhood pruning: random subsample of an oversized candidate set
        let threshold = tabu_option.pruning_rate_threshold.max(1.0) as usize;
        if candidates.len() > threshold {
            rng.shuffle(&mut candidates);
            candidates.truncate(threshold);
        }
        if parameters.move_preserve_rate < 1.0 {
            let keep = ((candidates.len() as f64) * parameters.move_preserve_rate).ceil() as usize;
            rng.shuffle(&mut candidates);
            candidates.truncate(keep.max(1).min(candidates.len()));
        }

        if candidates.is_empty() {
            debug!(iteration, "no moves available");
            termination = EpisodeTermination::NoMovesAvailable;
            break;
        }
        move_count_total += candidates.len() as f64;

        match environment.evaluation_pool {
            Some(pool) if environment.parallel_move_evaluation => pool.install(|| {
                evaluate_moves(
                    model,
                    &candidates,
                    &mut scores,
                    &current_score,
                    atol,
                    option.general.is_enabled_fast_evaluation,
                    true,
                    deadline,
                )
            }),
            _ => evaluate_moves(
                model,
                &candidates,
                &mut scores,
                &current_score,
                atol,
                option.general.is_enabled_fast_evaluation,
                environment.parallel_move_evaluation,
                deadline,
            ),
        }

        // selection: best admissible local augmented objective, aspiration
        // for tabu moves that beat the global incumbent
        let global_incumbent = incumbent.global_augmented_objective();
        let mut selected: Option<usize> = None;
        let mut selected_tabu_fallback: Option<usize> = None;
        for (index, (mv, score)) in candidates.iter().zip(&scores).enumerate() {
            let is_tabu = memory.is_move_tabu(mv, iteration as i64, tabu_option.tabu_mode);
            let aspires = tabu_option.ignore_tabu_if_global_incumbent
                && score.global_augmented_objective < global_incumbent;
            let slot = if is_tabu && !aspires {
                &mut selected_tabu_fallback
            } else {
                &mut selected
            };
            let better = match slot {
                Some(best) => {
                    let best_score = &scores[*best];
                    score.local_augmented_objective < best_score.local_augmented_objective
                        || (score.local_augmented_objective
                            == best_score.local_augmented_objective
                            && mv.overlap_rate < candidates[*best].overlap_rate)
                }
                None => true,
            };
            if better {
                *slot = Some(index);
            }
        }
        let Some(chosen) = selected.or(selected_tabu_fallback) else {
            termination = EpisodeTermination::NoMovesAvailable;
            break;
        };
        let chosen_move = candidates[chosen].clone();

        // compose a chain candidate from consecutive correlated univariate
        // moves
        if let Some(previous) = &previous_move {
            if previous.is_univariate
                && chosen_move.is_univariate
                && previous
                    .related_constraints
                    .iter()
                    .any(|id| chosen_move.related_constraints.contains(id))
            {
                neighborhood.chain.register(previous, &chosen_move, model);
            }
        }

        model
            .apply_alterations(&chosen_move.alterations)
            .expect("admissible move stays within bounds");
        memory.register(&chosen_move, iteration as i64);
        current_score = SolutionScore::of_model(model, atol);

        let solution = DenseSolution::from_model(model, atol);
        let status = incumbent.try_update(&solution, &current_score);
        update_status_union |= status;
        if status & update_status::LOCAL_IMPROVED != 0 {
            best_local_score = current_score;
            best_local_solution = solution.clone();
            violated_in_best_local = violated_constraints(model, atol);
        }
        if status & (update_status::GLOBAL_IMPROVED | update_status::FEASIBLE_IMPROVED) != 0 {
            iterations_without_improvement = 0;
        } else {
            iterations_without_improvement += 1;
        }
        if current_score.is_feasible && option.output.is_enabled_store_feasible_solutions {
            history.push(solution);
        }

        if let Some(writer) = trend.as_deref_mut() {
            let best = incumbent.reportable().map(|(s, _)| s);
            let _ = writer.write_line(
                environment.trend_iteration_offset + iteration,
                current_score.objective,
                current_score.total_violation,
                best.map(|s| s.objective).unwrap_or(f64::NAN),
                best.map(|s| s.total_violation).unwrap_or(f64::NAN),
                penalty_scale(model),
            );
        }

        score_window.push(current_score.local_augmented_objective);
        if tabu_option.is_enabled_automatic_tabu_tenure_adjustment && score_window.is_full() {
            adjust_tenure(&mut memory, &score_window, tabu_option.tabu_tenure_min, tabu_option.tabu_tenure_max);
        }

        iteration += 1;
        previous_move = Some(chosen_move);

        if target_reached(model, option, &current_score) {
            termination = EpisodeTermination::TargetReached;
            break;
        }
        if tabu_option.is_enabled_automatic_break
            && iterations_without_improvement >= tabu_option.automatic_break_window as u64
        {
            termination = EpisodeTermination::AutomaticBreak;
            break;
        }
    }

    let average_number_of_moves = if iteration > 0 {
        move_count_total / iteration as f64
    } else {
        0.0
    };

    EpisodeResult {
        number_of_iterations: iteration,
        termination,
        best_local_score,
        best_local_solution,
        violated_in_best_local,
        update_status_union,
        average_number_of_moves,
    }
}

fn violated_constraints(model: &Model, atol: ATol) -> Vec<ConstraintID> {
    model
        .constraints()
        .iter()
        .filter(|c| c.is_enabled() && c.is_violated(atol))
        .map(|c| c.id())
        .collect()
}

fn penalty_scale(model: &Model) -> f64 {
    model
        .constraints()
        .iter()
        .filter(|c| c.is_enabled())
        .map(|c| c.local_penalty())
        .fold(0.0, f64::max)
}

/// Low oscillation in the recent augmented objective means the search is
/// circling a basin: grow the tenure. High oscillation means it is being
/// thrown around: shrink it.
fn adjust_tenure(memory: &mut TabuMemory, window: &RingQueue<f64>, min: u64, max: u64) {
    let mean = window.average();
    let deviation = window.variance().sqrt();
    let relative = deviation / mean.abs().max(1.0);
    let tenure = memory.tenure();
    if relative < 1e-4 {
        memory.set_tenure((tenure + 1).min(max));
    } else if relative > 1.0 {
        memory.set_tenure(tenure.saturating_sub(1).max(min));
    }
}

fn target_reached(model: &Model, option: &SolverOption, score: &SolutionScore) -> bool {
    let target = option.general.target_objective_value;
    if !score.is_feasible || !target.is_finite() {
        return false;
    }
    let user_objective = model.objective().user_value();
    match model.objective().sense() {
        crate::ObjectiveSense::Minimize => user_objective <= target,
        crate::ObjectiveSense::Maximize => user_objective >= target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Expr, MoveKind, SelectionMode};

    #[test]
    fn memory_tracks_tenure_and_modes() {
        let mut memory = TabuMemory::new(3, 5);
        let a = VariableID::from(0);
        let b = VariableID::from(1);
        let mut mv = Move::univariate(MoveKind::Binary, a, 1);
        mv.alterations.push((b, 1));

        assert!(!memory.is_variable_tabu(a, 0));
        memory.register(&Move::univariate(MoveKind::Binary, a, 1), 10);
        assert!(memory.is_variable_tabu(a, 12));
        assert!(!memory.is_variable_tabu(a, 15));

        // a tabu, b not: Any considers the pair tabu, All does not
        assert!(memory.is_move_tabu(&mv, 12, TabuMode::Any));
        assert!(!memory.is_move_tabu(&mv, 12, TabuMode::All));
        memory.register(&mv, 12);
        assert!(memory.is_move_tabu(&mv, 13, TabuMode::All));
    }

    fn episode_fixture() -> (Model, Neighborhood) {
        let mut model = Model::new("episode");
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
        model.set_initial_value(x[0], 18);
        model.set_initial_value(x[1], 50);
        model.setup_structure(SelectionMode::Defined, &Default::default(), ATol::default());
        model.reset_penalties(1e7);
        model.refresh_all();
        let option = SolverOption::default();
        let neighborhood = Neighborhood::setup(&model, &option.neighborhood);
        (model, neighborhood)
    }

    #[test]
    fn episode_improves_the_incumbent() {
        let (mut model, mut neighborhood) = episode_fixture();
        let mut incumbent = IncumbentHolder::new();
        let mut history = History::new(100);
        let option = SolverOption::default();
        let parameters = EpisodeParameters {
            initial_tabu_tenure: 5,
            number_of_initial_modification: 0,
            move_preserve_rate: 1.0,
        };
        let environment = EpisodeEnvironment {
            screening: ImprovabilityScreeningMode::Off,
            ..Default::default()
        };
        let mut rng = SolverRng::seed_from(1);

        let initial_violation = model.total_violation();
        let result = tabu_search(
            &mut model,
            &mut neighborhood,
            &mut incumbent,
            &mut history,
            &option,
            &parameters,
            &environment,
            &mut rng,
            None,
            None,
        );
        assert!(result.number_of_iterations > 0);
        assert!(result.best_local_score.total_violation < initial_violation);
        assert!(incumbent.global_augmented().is_some());
    }

    #[test]
    fn empty_neighborhood_terminates_immediately() {
        // all variables fixed: no generator emits anything
        let mut model = Model::new("frozen");
        model.create_variable("x", 4, 4).unwrap();
        model.minimize(Expr::var(model.variable_id_by_name("x").unwrap()));
        model.setup_structure(SelectionMode::Defined, &Default::default(), ATol::default());
        let option = SolverOption::default();
        let mut neighborhood = Neighborhood::setup(&model, &option.neighborhood);
        let mut incumbent = IncumbentHolder::new();
        let mut history = History::new(10);
        let parameters = EpisodeParameters {
            initial_tabu_tenure: 5,
            number_of_initial_modification: 0,
            move_preserve_rate: 1.0,
        };
        let environment = EpisodeEnvironment {
            screening: ImprovabilityScreeningMode::Off,
            ..Default::default()
        };
        let mut rng = SolverRng::seed_from(1);
        let result = tabu_search(
            &mut model,
            &mut neighborhood,
            &mut incumbent,
            &mut history,
            &option,
            &parameters,
            &environment,
            &mut rng,
            None,
            None,
        );
        assert_eq!(result.termination, EpisodeTermination::NoMovesAvailable);
        assert_eq!(result.number_of_iterations, 0);
    }
}
