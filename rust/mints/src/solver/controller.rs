use super::lagrange_dual::{seed_penalties, solve_lagrange_dual};
use super::local_search::local_search;
use super::penalty::{update_penalty_coefficients, PenaltyAction, PenaltyState};
use super::tabu_search::{
    tabu_search, EpisodeEnvironment, EpisodeParameters, EpisodeTermination,
};
use crate::solution::update_status;
use crate::utility::{SolverRng, Ucb1Learner};
use crate::{
    ATol, DenseSolution, History, ImprovabilityScreeningMode, IncumbentHolder, Model,
    Neighborhood, SolutionScore, SolverOption, TrendWriter,
};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Reward discount for the episode-parameter bandit.
const BANDIT_DECAY_FACTOR: f64 = 0.95;
/// Decayed-average candidate counts above these activate the worker pools
/// when automatic parallelization is on.
const AUTO_PARALLEL_UPDATE_THRESHOLD: f64 = 5_000.0;
const AUTO_PARALLEL_EVALUATION_THRESHOLD: f64 = 1_000.0;
/// Below this decayed-average neighborhood size, screening overhead is not
/// worth paying.
const AUTO_SCREENING_THRESHOLD: f64 = 1_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OuterTermination {
    TimeMax,
    IterationMax,
    TargetReached,
    NoMovesAvailable,
}

#[derive(Debug)]
pub(crate) struct ControllerOutcome {
    pub incumbent: IncumbentHolder,
    pub history: History,
    pub dual_bound: Option<f64>,
    pub termination: OuterTermination,
    pub number_of_outer_iterations: u64,
    pub number_of_tabu_search_iterations: u64,
}

fn build_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|error| {
            warn!(%error, "falling back to the global rayon pool");
            error
        })
        .ok()
}

fn bandit_actions(option: &SolverOption, number_of_variables: usize) -> Vec<EpisodeParameters> {
    let tenure = option.tabu_search.initial_tabu_tenure.max(1);
    let preserve = option.tabu_search.move_preserve_rate;
    let base_modification = option.tabu_search.number_of_initial_modification;
    let light_shake = (number_of_variables as u64 / 20).max(1);
    let heavy_shake = (number_of_variables as u64 / 10).max(2);
    vec![
        EpisodeParameters {
            initial_tabu_tenure: tenure,
            number_of_initial_modification: base_modification,
            move_preserve_rate: preserve,
        },
        EpisodeParameters {
            initial_tabu_tenure: tenure * 2,
            number_of_initial_modification: base_modification,
            move_preserve_rate: preserve,
        },
        EpisodeParameters {
            initial_tabu_tenure: (tenure / 2).max(option.tabu_search.tabu_tenure_min),
            number_of_initial_modification: base_modification,
            move_preserve_rate: preserve,
        },
        EpisodeParameters {
            initial_tabu_tenure: tenure,
            number_of_initial_modification: light_shake,
            move_preserve_rate: preserve,
        },
        EpisodeParameters {
            initial_tabu_tenure: tenure,
            number_of_initial_modification: base_modification,
            move_preserve_rate: (preserve * 0.5).max(0.1),
        },
        EpisodeParameters {
            initial_tabu_tenure: tenure * 2,
            number_of_initial_modification: heavy_shake,
            move_preserve_rate: preserve,
        },
    ]
}

fn resolve_screening(
    configured: ImprovabilityScreeningMode,
    has_feasible: bool,
    average_moves: f64,
) -> ImprovabilityScreeningMode {
    match configured {
        ImprovabilityScreeningMode::Automatic => {
            if average_moves < AUTO_SCREENING_THRESHOLD {
                ImprovabilityScreeningMode::Off
            } else if has_feasible {
                ImprovabilityScreeningMode::Aggressive
            } else {
                ImprovabilityScreeningMode::Intensive
            }
        }
        other => other,
    }
}

/// Outer loop: alternate tabu-search episodes with penalty updates, optional
/// Lagrange-dual bounding, and local-search polish, until a termination
/// criterion fires.
pub(crate) fn run(model: &mut Model, option: &SolverOption, started: Instant) -> ControllerOutcome {
    let atol = ATol::default();
    let budget = (option.general.time_max - option.general.time_offset).max(0.0);
    let deadline = started + Duration::from_secs_f64(budget);

    model.reset_penalties(option.penalty.initial_penalty_coefficient);
    model.refresh_all();

    let mut neighborhood = Neighborhood::setup(model, &option.neighborhood);
    neighborhood
        .chain
        .seed_rng(option.general.seed.wrapping_add(0xc4a1));
    let mut incumbent = IncumbentHolder::new();
    let mut history = History::new(option.output.feasible_solutions_capacity);
    let mut rng = SolverRng::seed_from(option.general.seed);
    let mut penalty_state = PenaltyState::new(&option.penalty);
    let mut bandit = Ucb1Learner::new(
        bandit_actions(option, model.number_of_variables()),
        BANDIT_DECAY_FACTOR,
    );

    let update_pool = build_pool(option.parallel.number_of_threads_move_update);
    let evaluation_pool = build_pool(option.parallel.number_of_threads_move_evaluation);

    let mut trend = if option.output.is_enabled_write_trend {
        let path = option
            .output
            .trend_file_name
            .clone()
            .unwrap_or_else(|| format!("{}_trend.tsv", model.name()));
        match TrendWriter::create(&path) {
            Ok(writer) => Some(writer),
            Err(error) => {
                warn!(%error, %path, "cannot open trend file");
                None
            }
        }
    } else {
        None
    };

    // baseline scores for the initial state
    let initial_score = SolutionScore::of_model(model, atol);
    let initial_solution = DenseSolution::from_model(model, atol);
    incumbent.try_update(&initial_solution, &initial_score);
    if initial_score.is_feasible && option.output.is_enabled_store_feasible_solutions {
        history.push(initial_solution);
    }

    let mut dual_bound = None;
    let mut average_moves_update = 0.0;
    let mut average_moves_evaluation = 0.0;
    let mut outer_iteration: u64 = 0;
    let mut total_tabu_iterations: u64 = 0;
    let mut run_lagrange = option.lagrange_dual.is_enabled;
    let mut termination = OuterTermination::TimeMax;

    loop {
        if Instant::now() >= deadline {
            termination = OuterTermination::TimeMax;
            break;
        }
        if total_tabu_iterations >= option.general.iteration_max {
            termination = OuterTermination::IterationMax;
            break;
        }

        if run_lagrange {
            let result = solve_lagrange_dual(model, &option.lagrange_dual, Some(deadline));
            dual_bound = Some(model.objective().sign() * result.bound);
            seed_penalties(model, &result, option.penalty.initial_penalty_coefficient);
            run_lagrange = false;
        }

        let parameters = bandit.best_action().body;
        let decay_update = option.parallel.decay_factor_move_update;
        let decay_evaluation = option.parallel.decay_factor_move_evaluation;
        let parallel_update = option.parallel.is_enabled_move_update_parallelization
            && (!option.parallel.is_enabled_automatic_move_update_parallelization
                || average_moves_update > AUTO_PARALLEL_UPDATE_THRESHOLD);
        let parallel_evaluation = option.parallel.is_enabled_move_evaluation_parallelization
            && (!option
                .parallel
                .is_enabled_automatic_move_evaluation_parallelization
                || average_moves_evaluation > AUTO_PARALLEL_EVALUATION_THRESHOLD);
        let environment = EpisodeEnvironment {
            screening: resolve_screening(
                option.tabu_search.improvability_screening_mode,
                incumbent.feasible().is_some(),
                average_moves_evaluation,
            ),
            parallel_move_update: parallel_update,
            parallel_move_evaluation: parallel_evaluation,
            update_pool: update_pool.as_ref(),
            evaluation_pool: evaluation_pool.as_ref(),
            trend_iteration_offset: total_tabu_iterations,
        };

        let previous_global = incumbent.global_augmented_objective();
        let episode = tabu_search(
            model,
            &mut neighborhood,
            &mut incumbent,
            &mut history,
            option,
            &parameters,
            &environment,
            &mut rng,
            Some(deadline),
            trend.as_mut(),
        );
        total_tabu_iterations += episode.number_of_iterations;
        outer_iteration += 1;

        // decaying averages driving the automatic parallelization and
        // screening decisions
        average_moves_update = decay_update * average_moves_update
            + (1.0 - decay_update) * episode.average_number_of_moves;
        average_moves_evaluation = decay_evaluation * average_moves_evaluation
            + (1.0 - decay_evaluation) * episode.average_number_of_moves;

        // bandit reward: normalized global-augmented improvement, with a
        // bonus for feasibility progress
        let new_global = incumbent.global_augmented_objective();
        let mut reward = if previous_global.is_finite() && new_global.is_finite() {
            ((previous_global - new_global) / previous_global.abs().max(1.0)).max(0.0)
        } else if new_global.is_finite() {
            1.0
        } else {
            0.0
        };
        if episode.update_status_union & update_status::FEASIBLE_IMPROVED != 0 {
            reward += 0.5;
        }
        bandit.learn(reward);

        debug!(
            outer_iteration,
            iterations = episode.number_of_iterations,
            termination = ?episode.termination,
            best_local = episode.best_local_score.local_augmented_objective,
            global = new_global,
            "episode finished"
        );

        if episode.termination == EpisodeTermination::TargetReached {
            termination = OuterTermination::TargetReached;
            break;
        }
        if episode.termination == EpisodeTermination::Deadline {
            termination = OuterTermination::TimeMax;
            break;
        }
        if episode.number_of_iterations == 0
            && episode.termination == EpisodeTermination::NoMovesAvailable
        {
            termination = OuterTermination::NoMovesAvailable;
            break;
        }

        let action = update_penalty_coefficients(
            model,
            &episode.violated_in_best_local,
            episode.update_status_union,
            &option.penalty,
            &mut penalty_state,
            incumbent.feasible().is_some(),
            incumbent.feasible_objective(),
        );

        // polish the episode's local incumbent
        if option.local_search.is_enabled {
            let _ = model.set_values(&episode.best_local_solution.variable_values);
            local_search(model, &option.local_search, atol, Some(deadline));
            let polished_score = SolutionScore::of_model(model, atol);
            let polished = DenseSolution::from_model(model, atol);
            let status = incumbent.try_update(&polished, &polished_score);
            if polished_score.is_feasible && option.output.is_enabled_store_feasible_solutions {
                history.push(polished);
            }
            if status & update_status::FEASIBLE_IMPROVED != 0 {
                info!(
                    objective = incumbent.feasible_objective(),
                    "local search improved the feasible incumbent"
                );
            }
        }

        // choose the next episode's starting point
        match action {
            PenaltyAction::Diversify if !history.is_empty() => {
                let index = rng.index(history.len());
                if let Some(solution) = history.pick(index) {
                    let values = solution.variable_values.clone();
                    let _ = model.set_values(&values);
                }
                // a reset round also re-seeds from the dual, like the first
                run_lagrange = option.lagrange_dual.is_enabled;
            }
            _ => {
                let improved = episode.update_status_union & update_status::GLOBAL_IMPROVED != 0;
                if !improved {
                    if let Some((solution, _)) = incumbent.global_augmented() {
                        let values = solution.variable_values.clone();
                        let _ = model.set_values(&values);
                    }
                }
            }
        }

        if target_reached(model, option, &incumbent) {
            termination = OuterTermination::TargetReached;
            break;
        }
    }

    if let Some(writer) = trend.as_mut() {
        let _ = writer.flush();
    }

    ControllerOutcome {
        incumbent,
        history,
        dual_bound,
        termination,
        number_of_outer_iterations: outer_iteration,
        number_of_tabu_search_iterations: total_tabu_iterations,
    }
}

fn target_reached(model: &Model, option: &SolverOption, incumbent: &IncumbentHolder) -> bool {
    let target = option.general.target_objective_value;
    if !target.is_finite() {
        return false;
    }
    let Some((solution, _)) = incumbent.feasible() else {
        return false;
    };
    match model.objective().sense() {
        crate::ObjectiveSense::Minimize => solution.objective <= target,
        crate::ObjectiveSense::Maximize => solution.objective >= target,
    }
}
