//! End-to-end solves of small reference problems (seed 1 throughout).

use mints::{
    solve, Expr, Model, SelectionMode, SolveError, SolverOption, SolverRng, Status, TabuMode,
};

fn quick_option() -> SolverOption {
    let mut option = SolverOption::default();
    option.general.seed = 1;
    option.general.time_max = 10.0;
    option
}

/// minimize x1 + 10 x2
/// s.t. 66 x1 + 14 x2 >= 1430, -82 x1 + 28 x2 >= 1306, x in [-100, 100]
///
/// The optimum is (7, 70) with objective 707 (Fletcher, Practical Methods of
/// Optimization).
#[test]
fn simple_lp_integer() {
    let mut model = Model::new("simple_1");
    let x = model.create_variables("x", &[2], -100, 100).unwrap();
    model
        .add_constraint(
            "g[0]",
            Expr::term(x[0], 66.0).plus_term(x[1], 14.0).ge(1430.0),
        )
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

    let mut option = quick_option();
    option.general.target_objective_value = 707.0;
    let result = solve(&mut model, &option).unwrap();

    assert!(result.solution.is_feasible);
    assert_eq!(result.solution.values("x"), &[7, 70]);
    assert_eq!(result.solution.objective, 707.0);

    // round-trip law: reparsing the incumbent JSON keeps the assignment
    let text = serde_json::to_string(&result.solution).unwrap();
    let reparsed: mints::NamedSolution = serde_json::from_str(&text).unwrap();
    assert_eq!(reparsed.values("x"), result.solution.values("x"));
}

/// x in {0,1}^3, y in {0,1}^2; sum x >= 2; y1 + y2 = 1; x1 + y1 = 1;
/// minimize 2 x1 + 7 x2 + 9 x3 + 1 + 5 y1 + 6 y2. Optimum 16 at
/// x = (1, 1, 0), y = (0, 1).
#[test]
fn small_bip_with_selection() {
    let mut model = Model::new("simple_2");
    let x = model.create_variables("x", &[3], 0, 1).unwrap();
    let y = model.create_variables("y", &[2], 0, 1).unwrap();
    model.add_constraint("covering", x.sum().ge(2.0)).unwrap();
    model.add_constraint("one_hot", y.selection()).unwrap();
    model
        .add_constraint("link", Expr::var(x[0]).plus_term(y[0], 1.0).eq(1.0))
        .unwrap();
    model.minimize(
        Expr::term(x[0], 2.0)
            .plus_term(x[1], 7.0)
            .plus_term(x[2], 9.0)
            .plus_term(y[0], 5.0)
            .plus_term(y[1], 6.0)
            .plus_constant(1.0),
    );

    let mut option = quick_option();
    option.general.target_objective_value = 16.0;
    let result = solve(&mut model, &option).unwrap();

    assert!(result.solution.is_feasible);
    assert_eq!(result.solution.objective, 16.0);
    assert_eq!(result.solution.values("x"), &[1, 1, 0]);
    assert_eq!(result.solution.values("y"), &[0, 1]);
}

/// 10 000 items with random weights, volumes, and prices; maximize the total
/// price under two capacity constraints. The result must be feasible within
/// the 5 s budget and close at least 95% of the fractional
/// single-constraint relaxation bound.
#[test]
fn knapsack() {
    let number_of_items = 10_000;
    let mut rng = SolverRng::seed_from(1);
    let weights: Vec<f64> = (0..number_of_items)
        .map(|_| rng.integer(1, 100) as f64)
        .collect();
    let volumes: Vec<f64> = (0..number_of_items)
        .map(|_| rng.integer(1, 100) as f64)
        .collect();
    let prices: Vec<f64> = (0..number_of_items)
        .map(|_| rng.integer(1, 100) as f64)
        .collect();

    let mut model = Model::new("knapsack");
    let x = model
        .create_variables("x", &[number_of_items], 0, 1)
        .unwrap();
    model
        .add_constraint("weight", x.dot(&weights).le(30_000.0))
        .unwrap();
    model
        .add_constraint("volume", x.dot(&volumes).le(30_000.0))
        .unwrap();
    model.maximize(x.dot(&prices));

    // greedy warm start by price density, leaving headroom in both budgets
    let mut order: Vec<usize> = (0..number_of_items).collect();
    order.sort_by(|&a, &b| {
        let density_a = prices[a] / (weights[a] + volumes[a]);
        let density_b = prices[b] / (weights[b] + volumes[b]);
        density_b.partial_cmp(&density_a).unwrap()
    });
    let (mut weight_used, mut volume_used) = (0.0, 0.0);
    for &item in &order {
        if weight_used + weights[item] <= 30_000.0 && volume_used + volumes[item] <= 30_000.0 {
            weight_used += weights[item];
            volume_used += volumes[item];
            model.set_initial_value(x[item], 1);
        }
    }

    // fractional relaxation of each constraint alone is an upper bound
    let bound = |capacities: &[f64]| -> f64 {
        let mut order: Vec<usize> = (0..number_of_items).collect();
        order.sort_by(|&a, &b| {
            (prices[b] / capacities[b])
                .partial_cmp(&(prices[a] / capacities[a]))
                .unwrap()
        });
        let mut remaining = 30_000.0;
        let mut total = 0.0;
        for &item in &order {
            let take = (remaining / capacities[item]).min(1.0);
            total += take * prices[item];
            remaining -= take * capacities[item];
            if remaining <= 0.0 {
                break;
            }
        }
        total
    };
    let upper_bound = bound(&weights).min(bound(&volumes));

    let mut option = quick_option();
    option.general.time_max = 5.0;
    let result = solve(&mut model, &option).unwrap();

    assert!(result.solution.is_feasible);
    assert!(
        result.solution.objective >= 0.95 * upper_bound,
        "objective {} below 95% of bound {upper_bound}",
        result.solution.objective
    );
}

/// 100 items into 30 bins of capacity 100: a selection constraint per item,
/// cut constraints `y[m+1] <= y[m]`, and gated capacity rows.
#[test]
fn bin_packing() {
    let number_of_items = 100;
    let number_of_bins = 30;
    let bin_capacity = 100.0;
    let mut rng = SolverRng::seed_from(1);
    let item_volumes: Vec<f64> = (0..number_of_items)
        .map(|_| rng.integer(0, 49) as f64)
        .collect();

    let mut model = Model::new("bin_packing");
    let x = model
        .create_variables("x", &[number_of_items, number_of_bins], 0, 1)
        .unwrap();
    let y = model.create_variables("y", &[number_of_bins], 0, 1).unwrap();

    for n in 0..number_of_items {
        let mut row = Expr::new();
        for m in 0..number_of_bins {
            row = row.plus_term(x.at(&[n, m]), 1.0);
        }
        model
            .add_constraint(&format!("selection[{n}]"), row.eq(1.0))
            .unwrap();
    }
    for m in 0..number_of_bins - 1 {
        model
            .add_constraint(
                &format!("cut[{m}]"),
                Expr::var(y[m + 1]).plus_term(y[m], -1.0).le(0.0),
            )
            .unwrap();
    }
    for m in 0..number_of_bins {
        let mut volume = Expr::new();
        for n in 0..number_of_items {
            volume = volume.plus_term(x.at(&[n, m]), item_volumes[n]);
        }
        model
            .add_constraint(
                &format!("total_volume[{m}]"),
                volume.plus_term(y[m], -bin_capacity).le(0.0),
            )
            .unwrap();
    }

    let mut objective = y.sum();
    for m in 0..number_of_bins {
        for n in 0..number_of_items {
            objective = objective.plus_term(x.at(&[n, m]), 1e-5 * m as f64 * item_volumes[n]);
        }
    }
    model.minimize(objective);

    // random start: one bin per item, every bin open
    for n in 0..number_of_items {
        let bin = rng.index(number_of_bins);
        model.set_initial_value(x.at(&[n, bin]), 1);
    }
    for m in 0..number_of_bins {
        model.set_initial_value(y[m], 1);
    }

    let mut option = quick_option();
    option.general.time_max = 20.0;
    option.neighborhood.selection_mode = SelectionMode::Defined;
    option.tabu_search.tabu_mode = TabuMode::Any;
    let result = solve(&mut model, &option).unwrap();

    assert!(result.solution.is_feasible, "violation {}", result.solution.total_violation);
    let x_values = result.solution.values("x");
    let y_values = result.solution.values("y");
    assert!(y_values.iter().sum::<i64>() <= number_of_bins as i64);
    for m in 0..number_of_bins {
        let load: f64 = (0..number_of_items)
            .map(|n| item_volumes[n] * x_values[n * number_of_bins + m] as f64)
            .sum();
        assert!(load <= bin_capacity + 1e-6, "bin {m} overfull: {load}");
    }
}

/// `x in [0, 1], x = 2` is infeasible by presolve: the solver must return
/// immediately without running any episode.
#[test]
fn infeasible_by_presolve() {
    let mut model = Model::new("infeasible");
    let x = model.create_variable("x", 0, 1).unwrap();
    model.add_constraint("fix", Expr::var(x).eq(2.0)).unwrap();
    model.minimize(Expr::var(x));

    let result = solve(&mut model, &quick_option()).unwrap();
    assert_eq!(result.status, Status::Infeasible);
    assert_eq!(result.statistics.number_of_tabu_search_iterations, 0);
    assert_eq!(result.statistics.number_of_outer_iterations, 0);
}

/// A consumed model rejects a second solve.
#[test]
fn resolve_rejection() {
    let mut model = Model::new("twice");
    let x = model.create_variables("x", &[2], 0, 5).unwrap();
    model
        .add_constraint("cap", x.sum().le(6.0))
        .unwrap();
    model.minimize(x.sum());

    let mut option = quick_option();
    option.general.time_max = 2.0;
    option.general.iteration_max = 100;
    assert!(solve(&mut model, &option).is_ok());
    assert!(matches!(
        solve(&mut model, &option),
        Err(SolveError::ModelAlreadySolved)
    ));
}

/// With no constraints at all, one local-search polish reaches the
/// unconstrained optimum of the objective.
#[test]
fn unconstrained_model_is_polished_to_optimality() {
    let mut model = Model::new("unconstrained");
    let x = model.create_variables("x", &[3], -10, 10).unwrap();
    model.minimize(
        Expr::term(x[0], 1.0)
            .plus_term(x[1], -2.0)
            .plus_term(x[2], 3.0),
    );

    let mut option = quick_option();
    option.general.time_max = 5.0;
    option.general.target_objective_value = -60.0;
    let result = solve(&mut model, &option).unwrap();
    assert!(result.solution.is_feasible);
    // x0 -> -10, x1 -> 10, x2 -> -10
    assert_eq!(result.solution.values("x"), &[-10, 10, -10]);
    assert_eq!(result.solution.objective, -60.0);
}

/// Variable values stay within bounds and every cached figure matches a
/// scratch recompute after a full solve.
#[test]
fn post_solve_caches_are_consistent() {
    let mut model = Model::new("consistency");
    let x = model.create_variables("x", &[4], 0, 8).unwrap();
    model.add_constraint("cap", x.sum().le(10.0)).unwrap();
    model
        .add_constraint(
            "mix",
            Expr::var(x[0]).plus_term(x[1], 2.0).plus_term(x[2], -1.0).ge(3.0),
        )
        .unwrap();
    model.minimize(x.dot(&[3.0, -1.0, 2.0, -2.0]));

    let mut option = quick_option();
    option.general.time_max = 2.0;
    option.general.iteration_max = 500;
    let result = solve(&mut model, &option).unwrap();
    assert_ne!(result.status, Status::Infeasible);

    for (name, array) in &result.solution.variables {
        assert_eq!(array.values.len(), 4, "array {name}");
        for &value in &array.values {
            assert!((0..=8).contains(&value));
        }
    }
    // reported violations are exactly the per-constraint recomputation
    let x_values = result.solution.values("x");
    let cap_lhs: i64 = x_values.iter().sum();
    assert_eq!(result.solution.constraints["cap"], cap_lhs as f64);
    let cap_violation = (cap_lhs as f64 - 10.0).max(0.0);
    assert_eq!(result.solution.violations["cap"], cap_violation);
}
