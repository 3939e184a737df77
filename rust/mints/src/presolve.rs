//! Presolver: bound tightening, fixing, duplicate and redundancy
//! elimination, implicit-equality and dependent-variable extraction, and
//! initial-value correction. Each pass repeats to fixpoint before search
//! starts.

use crate::{
    ATol, ConstraintSense, DependentVariable, Expression, Model, PreprocessOption, VariableSense,
};
use fnv::FnvHashMap;
use tracing::debug;

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum PresolveError {
    #[error("Model is infeasible: bound of variable {variable} became empty ([{lower}, {upper}]) while tightening constraint {constraint}")]
    EmptyBound {
        variable: String,
        constraint: String,
        lower: i64,
        upper: i64,
    },

    #[error("Model is infeasible: constraint {constraint} cannot be satisfied within the variable bounds (best violation {violation})")]
    UnsatisfiableConstraint { constraint: String, violation: f64 },
}

/// Counters of what the presolver did; logged at debug level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresolveReport {
    pub number_of_passes: usize,
    pub number_of_tightened_bounds: usize,
    pub number_of_fixed_variables: usize,
    pub number_of_disabled_constraints: usize,
    pub number_of_implicit_equalities: usize,
    pub number_of_dependent_variables: usize,
    pub number_of_corrected_initial_values: usize,
}

const PASS_LIMIT: usize = 100;

/// Run all enabled presolve passes to fixpoint.
///
/// Must be called before [`Model::setup_structure`]; works directly on the
/// raw expressions. Proven infeasibility is reported as an error so the
/// caller can exit with the `Infeasible` status without running any episode.
pub fn presolve(
    model: &mut Model,
    option: &PreprocessOption,
    atol: ATol,
) -> Result<PresolveReport, PresolveError> {
    let mut report = PresolveReport::default();
    if !option.is_enabled_presolve {
        if option.is_enabled_initial_value_correction {
            correct_initial_values(model, &mut report);
        }
        return Ok(report);
    }

    loop {
        let mut changed = false;
        report.number_of_passes += 1;

        if option.is_enabled_bound_tightening {
            changed |= tighten_bounds(model, atol, &mut report)?;
        }
        if option.is_enabled_duplicate_constraint_removal {
            changed |= remove_duplicates(model, &mut report);
        }
        if option.is_enabled_implicit_equality_extraction {
            changed |= extract_implicit_equalities(model, &mut report);
        }
        if option.is_enabled_redundancy_elimination {
            changed |= eliminate_redundancy(model, atol, &mut report)?;
        }

        if !changed || report.number_of_passes >= PASS_LIMIT {
            break;
        }
    }

    if option.is_enabled_dependent_variable_extraction {
        extract_dependent_variables(model, atol, &mut report);
    }
    if option.is_enabled_initial_value_correction {
        correct_initial_values(model, &mut report);
    }

    debug!(?report, "presolve finished");
    Ok(report)
}

/// Interval of `sum coefficient * variable + constant` over the current
/// bounds, as `(min, max)`.
fn expression_interval(model: &Model, expression: &Expression) -> (f64, f64) {
    let mut low = expression.constant();
    let mut high = expression.constant();
    for (id, coefficient) in expression.terms() {
        let (term_low, term_high) = model.variable(*id).term_interval(*coefficient);
        low += term_low;
        high += term_high;
    }
    (low, high)
}

fn tighten_bounds(
    model: &mut Model,
    atol: ATol,
    report: &mut PresolveReport,
) -> Result<bool, PresolveError> {
    let mut changed = false;
    for constraint_index in 0..model.constraints().len() {
        let constraint = &model.constraints()[constraint_index];
        if !constraint.is_enabled() {
            continue;
        }
        let sense = constraint.sense();
        let rhs = constraint.rhs() - constraint.expression().constant();
        let terms: Vec<_> = constraint.expression().terms().to_vec();
        let constraint_name = constraint.name().to_string();

        // residual interval excluding each term in turn
        let mut total_low = 0.0;
        let mut total_high = 0.0;
        let mut term_intervals = Vec::with_capacity(terms.len());
        for (id, coefficient) in &terms {
            let interval = model.variable(*id).term_interval(*coefficient);
            total_low += interval.0;
            total_high += interval.1;
            term_intervals.push(interval);
        }

        for ((id, coefficient), (term_low, term_high)) in terms.iter().zip(&term_intervals) {
            let residual_low = total_low - term_low;
            let residual_high = total_high - term_high;
            let variable = model.variable(*id);
            let mut lower = variable.lower();
            let mut upper = variable.upper();

            if sense != ConstraintSense::Greater {
                // coefficient * x <= rhs - residual_low
                let quotient = (rhs - residual_low) / coefficient;
                if *coefficient > 0.0 {
                    upper = upper.min((quotient + *atol).floor() as i64);
                } else {
                    lower = lower.max((quotient - *atol).ceil() as i64);
                }
            }
            if sense != ConstraintSense::Less {
                // coefficient * x >= rhs - residual_high
                let quotient = (rhs - residual_high) / coefficient;
                if *coefficient > 0.0 {
                    lower = lower.max((quotient - *atol).ceil() as i64);
                } else {
                    upper = upper.min((quotient + *atol).floor() as i64);
                }
            }

            let variable = &mut model.variables_mut()[id.into_inner()];
            if lower > upper {
                return Err(PresolveError::EmptyBound {
                    variable: variable.name().to_string(),
                    constraint: constraint_name.clone(),
                    lower,
                    upper,
                });
            }
            if lower > variable.lower() || upper < variable.upper() {
                let was_fixed = variable.is_fixed();
                variable
                    .set_bound(lower, upper)
                    .expect("non-empty bound was checked");
                report.number_of_tightened_bounds += 1;
                if variable.is_fixed() && !was_fixed {
                    report.number_of_fixed_variables += 1;
                }
                changed = true;
            }
        }
    }
    Ok(changed)
}

fn remove_duplicates(model: &mut Model, report: &mut PresolveReport) -> bool {
    let mut seen: FnvHashMap<_, ()> = Default::default();
    let mut to_disable = Vec::new();
    for constraint in model.constraints() {
        if !constraint.is_enabled() {
            continue;
        }
        if seen.insert(constraint.fingerprint(), ()).is_some() {
            to_disable.push(constraint.id());
        }
    }
    let changed = !to_disable.is_empty();
    for id in to_disable {
        model.constraints_mut()[id.into_inner()].disable();
        report.number_of_disabled_constraints += 1;
    }
    changed
}

/// `a.x <= b` plus `a.x >= b` over the same terms collapses into `a.x = b`.
fn extract_implicit_equalities(model: &mut Model, report: &mut PresolveReport) -> bool {
    let mut by_terms: FnvHashMap<(Vec<_>, i64), Vec<_>> = Default::default();
    for constraint in model.constraints() {
        if !constraint.is_enabled() || constraint.sense() == ConstraintSense::Equal {
            continue;
        }
        let (terms, _, rhs) = constraint.fingerprint();
        by_terms
            .entry((terms, rhs))
            .or_default()
            .push((constraint.id(), constraint.sense()));
    }
    let mut changed = false;
    for group in by_terms.values() {
        let less = group
            .iter()
            .find(|(_, sense)| *sense == ConstraintSense::Less);
        let greater = group
            .iter()
            .find(|(_, sense)| *sense == ConstraintSense::Greater);
        if let (Some((less_id, _)), Some((greater_id, _))) = (less, greater) {
            model.constraints_mut()[less_id.into_inner()].set_sense(ConstraintSense::Equal);
            model.constraints_mut()[greater_id.into_inner()].disable();
            report.number_of_implicit_equalities += 1;
            report.number_of_disabled_constraints += 1;
            changed = true;
        }
    }
    changed
}

/// Disable constraints satisfied for every assignment within bounds, reject
/// constraints satisfiable by none, and fix variables referenced by no
/// enabled constraint and absent from the objective.
fn eliminate_redundancy(
    model: &mut Model,
    atol: ATol,
    report: &mut PresolveReport,
) -> Result<bool, PresolveError> {
    let mut changed = false;

    let mut always_satisfied = Vec::new();
    for constraint in model.constraints() {
        if !constraint.is_enabled() {
            continue;
        }
        let (low, high) = expression_interval(model, constraint.expression());
        let rhs = constraint.rhs();
        let best_violation = match constraint.sense() {
            ConstraintSense::Less => (low - rhs).max(0.0),
            ConstraintSense::Greater => (rhs - high).max(0.0),
            ConstraintSense::Equal => {
                if rhs < low {
                    low - rhs
                } else {
                    (rhs - high).max(0.0)
                }
            }
        };
        if best_violation > *atol {
            return Err(PresolveError::UnsatisfiableConstraint {
                constraint: constraint.name().to_string(),
                violation: best_violation,
            });
        }
        let satisfied = match constraint.sense() {
            ConstraintSense::Less => high <= rhs + *atol,
            ConstraintSense::Greater => low >= rhs - *atol,
            ConstraintSense::Equal => {
                (high - rhs).abs() <= *atol && (low - rhs).abs() <= *atol
            }
        };
        if satisfied {
            always_satisfied.push(constraint.id());
        }
    }
    for id in always_satisfied {
        model.constraints_mut()[id.into_inner()].disable();
        report.number_of_disabled_constraints += 1;
        changed = true;
    }

    let mut referenced = vec![false; model.number_of_variables()];
    for constraint in model.constraints() {
        if !constraint.is_enabled() {
            continue;
        }
        for (id, _) in constraint.expression().terms() {
            referenced[id.into_inner()] = true;
        }
    }
    let objective_terms: Vec<_> = model
        .objective()
        .expression()
        .variable_ids()
        .collect();
    for id in objective_terms {
        referenced[id.into_inner()] = true;
    }
    for index in 0..model.number_of_variables() {
        let variable = &model.variables()[index];
        if referenced[index] || variable.is_fixed() {
            continue;
        }
        let value = variable.value();
        model.variables_mut()[index]
            .fix_to(value)
            .expect("current value is within bounds");
        report.number_of_fixed_variables += 1;
        changed = true;
    }
    Ok(changed)
}

/// Solve an equality for a unit-coefficient member which appears nowhere
/// else: the member becomes a dependent variable and the equality is
/// disabled.
fn extract_dependent_variables(model: &mut Model, atol: ATol, report: &mut PresolveReport) {
    let mut occurrences = vec![0usize; model.number_of_variables()];
    for constraint in model.constraints() {
        if !constraint.is_enabled() {
            continue;
        }
        for (id, _) in constraint.expression().terms() {
            occurrences[id.into_inner()] += 1;
        }
    }
    let objective_ids: Vec<_> = model
        .objective()
        .expression()
        .variable_ids()
        .collect();

    let candidates: Vec<_> = model
        .constraints()
        .iter()
        .filter(|c| c.is_enabled() && c.sense() == ConstraintSense::Equal)
        .map(|c| c.id())
        .collect();

    for constraint_id in candidates {
        let constraint = model.constraint(constraint_id);
        let terms: Vec<_> = constraint.expression().terms().to_vec();
        let rhs = constraint.rhs() - constraint.expression().constant();
        if terms.len() < 2 {
            continue;
        }
        let candidate = terms.iter().position(|(id, coefficient)| {
            coefficient.abs() == 1.0
                && occurrences[id.into_inner()] == 1
                && !objective_ids.contains(id)
                && !model.variable(*id).is_fixed()
        });
        let Some(candidate_index) = candidate else {
            continue;
        };
        let (candidate_id, candidate_coefficient) = terms[candidate_index];

        // definition: candidate = (rhs - sum of other terms) / coefficient
        let definition_terms: Vec<_> = terms
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != candidate_index)
            .map(|(_, (id, coefficient))| (*id, -coefficient / candidate_coefficient))
            .collect();
        let definition = Expression::new(definition_terms, rhs / candidate_coefficient);

        // only extract when the definition's range fits inside the bound
        let (low, high) = expression_interval(model, &definition);
        let variable = model.variable(candidate_id);
        if (low - *atol).ceil() < variable.lower() as f64
            || (high + *atol).floor() > variable.upper() as f64
        {
            continue;
        }

        let current = definition.evaluate(&model.values()).round() as i64;
        let sense = if variable.sense().is_binary() {
            VariableSense::DependentBinary
        } else {
            VariableSense::DependentInteger
        };
        let variable = &mut model.variables_mut()[candidate_id.into_inner()];
        variable
            .set_value(current)
            .expect("definition range fits the bound");
        variable.set_sense(sense);
        model.constraints_mut()[constraint_id.into_inner()].disable();
        model.push_dependent(DependentVariable {
            variable: candidate_id,
            constraint: constraint_id,
            expression: definition,
        });
        report.number_of_dependent_variables += 1;
        report.number_of_disabled_constraints += 1;
    }
}

fn correct_initial_values(model: &mut Model, report: &mut PresolveReport) {
    for variable in model.variables_mut() {
        if variable.correct_initial_value() {
            report.number_of_corrected_initial_values += 1;
        }
    }
}
