use crate::utility::RingQueue;
use crate::{ConstraintSense, LagrangeDualOption, Model};
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LagrangeDualTermination {
    Converged,
    IterationMax,
    TimeMax,
}

/// Result of the subgradient ascent: one multiplier per constraint and the
/// best dual (lower) bound found.
#[derive(Debug, Clone)]
pub struct LagrangeDualResult {
    pub multipliers: Vec<f64>,
    pub bound: f64,
    pub number_of_iterations: u64,
    pub termination: LagrangeDualTermination,
}

/// Subgradient ascent on the dual of the continuous relaxation.
///
/// The Lagrangian is separable: for fixed multipliers each variable sits at
/// whichever bound its reduced cost points to. The ascent stops early when
/// the recent-Lagrangian window has stabilized within `tolerance`.
pub fn solve_lagrange_dual(
    model: &Model,
    option: &LagrangeDualOption,
    deadline: Option<Instant>,
) -> LagrangeDualResult {
    let sign = model.objective().sign();
    let number_of_constraints = model.number_of_constraints();
    let mut multipliers = vec![0.0; number_of_constraints];
    let mut step_size = 1.0;
    let mut best_bound = f64::NEG_INFINITY;
    let mut previous_lagrangian = f64::NEG_INFINITY;
    let queue_size = (option.queue_size.round() as usize).max(1);
    let mut window: RingQueue<f64> = RingQueue::new(queue_size);
    let started = Instant::now();

    let mut iteration = 0;
    let mut termination = LagrangeDualTermination::IterationMax;
    while iteration < option.iteration_max {
        if started.elapsed().as_secs_f64() > option.time_max
            || deadline.map(|d| Instant::now() >= d).unwrap_or(false)
        {
            termination = LagrangeDualTermination::TimeMax;
            break;
        }

        // minimize the Lagrangian termwise over the box
        let mut lagrangian = sign * model.objective().expression().constant();
        let mut relaxed_values = vec![0.0f64; model.number_of_variables()];
        for variable in model.variables() {
            let mut reduced_cost = sign * variable.objective_sensitivity();
            for &(constraint_id, coefficient) in variable.related() {
                let constraint = model.constraint(constraint_id);
                if !constraint.is_enabled() {
                    continue;
                }
                // multipliers are oriented so positive values penalize the
                // violating direction
                let orientation = match constraint.sense() {
                    ConstraintSense::Less | ConstraintSense::Equal => 1.0,
                    ConstraintSense::Greater => -1.0,
                };
                reduced_cost += multipliers[constraint_id.into_inner()] * orientation * coefficient;
            }
            let value = if reduced_cost >= 0.0 {
                variable.lower() as f64
            } else {
                variable.upper() as f64
            };
            relaxed_values[variable.id().into_inner()] = value;
            lagrangian += reduced_cost * value;
        }
        for constraint in model.constraints() {
            if !constraint.is_enabled() {
                continue;
            }
            let orientation = match constraint.sense() {
                ConstraintSense::Less | ConstraintSense::Equal => 1.0,
                ConstraintSense::Greater => -1.0,
            };
            lagrangian += multipliers[constraint.id().into_inner()]
                * orientation
                * (constraint.expression().constant() - constraint.rhs());
        }

        best_bound = best_bound.max(lagrangian);
        window.push(lagrangian);

        // step-size control: extend while ascending, reduce on a setback
        if lagrangian > previous_lagrangian {
            step_size *= option.step_size_extend_rate;
        } else {
            step_size *= option.step_size_reduce_rate;
        }
        previous_lagrangian = lagrangian;

        // subgradient step
        for constraint in model.constraints() {
            if !constraint.is_enabled() {
                continue;
            }
            let index = constraint.id().into_inner();
            let lhs = constraint
                .expression()
                .terms()
                .iter()
                .map(|(id, coefficient)| coefficient * relaxed_values[id.into_inner()])
                .sum::<f64>()
                + constraint.expression().constant();
            let subgradient = match constraint.sense() {
                ConstraintSense::Less => lhs - constraint.rhs(),
                ConstraintSense::Greater => constraint.rhs() - lhs,
                ConstraintSense::Equal => lhs - constraint.rhs(),
            };
            multipliers[index] += step_size * subgradient;
            if constraint.sense() != ConstraintSense::Equal {
                multipliers[index] = multipliers[index].max(0.0);
            }
        }

        iteration += 1;
        if window.is_full() {
            let spread = window.max().unwrap_or(0.0) - window.min().unwrap_or(0.0);
            let scale = window.average().abs().max(1.0);
            if spread <= option.tolerance * scale {
                termination = LagrangeDualTermination::Converged;
                break;
            }
        }
    }

    debug!(
        iterations = iteration,
        bound = best_bound,
        ?termination,
        "lagrange dual finished"
    );
    LagrangeDualResult {
        multipliers,
        bound: best_bound,
        number_of_iterations: iteration,
        termination,
    }
}

/// Seed the global penalty coefficients from the dual values:
/// `global_penalty = max(initial, |multiplier|)`.
pub fn seed_penalties(model: &mut Model, result: &LagrangeDualResult, initial: f64) {
    for index in 0..model.number_of_constraints() {
        let multiplier = result.multipliers[index].abs();
        let constraint = &mut model.constraints_mut()[index];
        constraint.set_global_penalty(initial.max(multiplier));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ATol, Expr, SelectionMode};

    #[test]
    fn dual_bound_stays_below_integer_optimum() {
        // min x + 10 y, 66 x + 14 y >= 1430, -82 x + 28 y >= 1306; optimum 707
        let mut model = Model::new("dual");
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
        model.setup_structure(SelectionMode::Off, &Default::default(), ATol::default());

        let mut option = LagrangeDualOption::default();
        option.iteration_max = 2000;
        let result = solve_lagrange_dual(&model, &option, None);
        assert!(result.number_of_iterations > 0);
        assert!(
            result.bound <= 707.0 + 1e-6,
            "dual bound {} must not exceed the optimum",
            result.bound
        );
        assert!(result.bound.is_finite());
    }

    #[test]
    fn seeding_respects_the_initial_floor() {
        let mut model = Model::new("seed");
        let x = model.create_variable("x", 0, 10).unwrap();
        model.add_constraint("c", Expr::var(x).le(5.0)).unwrap();
        model.setup_structure(SelectionMode::Off, &Default::default(), ATol::default());
        let result = LagrangeDualResult {
            multipliers: vec![3.0],
            bound: 0.0,
            number_of_iterations: 1,
            termination: LagrangeDualTermination::Converged,
        };
        seed_penalties(&mut model, &result, 100.0);
        assert_eq!(model.constraints()[0].global_penalty(), 100.0);

        let result = LagrangeDualResult {
            multipliers: vec![500.0],
            ..result
        };
        seed_penalties(&mut model, &result, 100.0);
        assert_eq!(model.constraints()[0].global_penalty(), 500.0);
    }
}
