use crate::{
    ATol, Constraint, ConstraintID, ConstraintSense, ConstraintShape, Variable, VariableID,
    VariableSense,
};
use fnv::FnvHashSet;
use num::integer::gcd;

/// How selection constraints are promoted into one-hot groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    Off,
    #[default]
    Defined,
    Smaller,
    Larger,
    Independent,
    UserDefined,
}

/// One-hot group extracted from a `sum x_i = 1` constraint.
///
/// Membership is exclusive: a variable belongs to at most one group, and all
/// members have sense [`VariableSense::Selection`]. The originating
/// constraint is disabled because selection moves preserve it by
/// construction.
#[derive(Debug, Clone)]
pub struct Selection {
    pub constraint: ConstraintID,
    pub variables: Vec<VariableID>,
    pub selected: Option<VariableID>,
}

/// Classify one constraint by the shape of its normalized form.
///
/// The normalized form moves the expression constant to the right-hand side
/// and requires integral coefficients for every shape except the capacity
/// classes. The first matching pattern wins; anything unmatched is
/// `GeneralLinear`.
pub fn classify_constraint(constraint: &Constraint, variables: &[Variable], atol: ATol) -> ConstraintShape {
    let expression = constraint.expression();
    let terms = expression.terms();
    let n = terms.len();
    if n == 0 {
        return ConstraintShape::GeneralLinear;
    }
    let rhs = constraint.rhs() - expression.constant();
    let sense = constraint.sense();

    if n == 1 {
        return ConstraintShape::Singleton;
    }

    let integral = terms.iter().all(|(_, c)| atol.is_integer(*c)) && atol.is_integer(rhs);
    let is_binary =
        |id: &VariableID| variables[id.into_inner()].sense().is_binary();
    let all_binary = terms.iter().all(|(id, _)| is_binary(id));
    let binary_count = terms.iter().filter(|(id, _)| is_binary(id)).count();

    if n == 2 && integral {
        let (a, b) = (terms[0].1.round() as i64, terms[1].1.round() as i64);
        let r = rhs.round() as i64;

        if sense == ConstraintSense::Equal {
            if all_binary {
                if a == 1 && b == 1 && r == 1 {
                    return ConstraintShape::ExclusiveOr;
                }
                if a * b == -1 && r == 0 {
                    return ConstraintShape::ExclusiveNor;
                }
            }
            if binary_count == 1 {
                return ConstraintShape::VariableBound;
            }
            if a == 1 && b == 1 {
                return if r == 0 {
                    ConstraintShape::InvertedIntegers
                } else {
                    ConstraintShape::ConstantSumIntegers
                };
            }
            if a * b == -1 {
                return if r == 0 {
                    ConstraintShape::BalancedIntegers
                } else {
                    ConstraintShape::ConstantDifferenceIntegers
                };
            }
            if a * b < 0 && r == 0 {
                return ConstraintShape::ConstantRatioIntegers;
            }
            if a != 0 && b != 0 && r % gcd(a.abs(), b.abs()) == 0 {
                return ConstraintShape::Aggregation;
            }
            return ConstraintShape::GeneralLinear;
        }

        // x - y <= 0 or x - y >= 0; binary pairs join the same co-shift family
        if a * b == -1 && r == 0 {
            return ConstraintShape::Precedence;
        }
        if binary_count == 1 {
            return ConstraintShape::VariableBound;
        }
    }

    if n == 3 && all_binary && integral && sense == ConstraintSense::Equal {
        let mut coefficients: Vec<i64> = terms.iter().map(|(_, c)| c.round() as i64).collect();
        coefficients.sort_unstable();
        if coefficients == [-2, 1, 1] && rhs.round() as i64 == 0 {
            return ConstraintShape::TrinomialExclusiveNor;
        }
    }

    if all_binary && integral {
        let coefficients: Vec<i64> = terms.iter().map(|(_, c)| c.round() as i64).collect();
        let r = rhs.round() as i64;
        let all_unit = coefficients.iter().all(|&c| c == 1);
        let negative_units = coefficients.iter().filter(|&&c| c == -1).count();
        let positive_units = coefficients.iter().filter(|&&c| c == 1).count();

        match sense {
            ConstraintSense::Equal => {
                if all_unit && r == 1 {
                    return ConstraintShape::Selection;
                }
                if all_unit && r >= 2 {
                    return ConstraintShape::Cardinality;
                }
                if negative_units == 1 && positive_units == n - 1 && r == 0 && n >= 3 {
                    return ConstraintShape::SoftSelection;
                }
                if coefficients.iter().all(|&c| c > 0) {
                    return ConstraintShape::EquationKnapsack;
                }
            }
            ConstraintSense::Less => {
                if all_unit && r == 1 {
                    return ConstraintShape::SetPacking;
                }
                if all_unit && r >= 2 && r < n as i64 {
                    return ConstraintShape::InvariantKnapsack;
                }
                if coefficients.iter().all(|&c| c > 0) {
                    return ConstraintShape::Knapsack;
                }
                if coefficients.iter().filter(|&&c| c < 0).count() == 1 && r == 0 {
                    return ConstraintShape::BinPacking;
                }
            }
            ConstraintSense::Greater => {
                if all_unit && r == 1 {
                    return ConstraintShape::SetCovering;
                }
            }
        }
        return ConstraintShape::GeneralLinear;
    }

    if sense == ConstraintSense::Less
        && terms.iter().all(|(_, c)| *c > 0.0)
        && !all_binary
    {
        return ConstraintShape::IntegerKnapsack;
    }

    ConstraintShape::GeneralLinear
}

/// Promote selection-shaped constraints into one-hot groups.
///
/// Each promoted group claims its member variables exclusively; members get
/// sense `Selection` and the originating constraint is disabled. Groups
/// containing a variable fixed at one adopt it as the selected member; a
/// group with two variables fixed at one is left unpromoted for the
/// evaluator to report as violated.
pub fn extract_selections(
    constraints: &mut [Constraint],
    variables: &mut [Variable],
    mode: SelectionMode,
    user_defined: &FnvHashSet<String>,
) -> Vec<Selection> {
    if mode == SelectionMode::Off {
        return Vec::new();
    }

    let mut candidates: Vec<ConstraintID> = constraints
        .iter()
        .filter(|c| {
            c.is_enabled()
                && (c.shape() == ConstraintShape::Selection
                    || c.shape() == ConstraintShape::ExclusiveOr)
        })
        .map(|c| c.id())
        .collect();

    match mode {
        SelectionMode::Smaller => {
            candidates.sort_by_key(|id| constraints[id.into_inner()].expression().number_of_terms());
        }
        SelectionMode::Larger => {
            candidates.sort_by_key(|id| {
                std::cmp::Reverse(constraints[id.into_inner()].expression().number_of_terms())
            });
        }
        SelectionMode::UserDefined => {
            candidates.retain(|id| user_defined.contains(constraints[id.into_inner()].name()));
        }
        SelectionMode::Independent => {
            let mut appearance: fnv::FnvHashMap<VariableID, usize> = Default::default();
            for id in &candidates {
                for variable_id in constraints[id.into_inner()].expression().variable_ids() {
                    *appearance.entry(variable_id).or_insert(0) += 1;
                }
            }
            candidates.retain(|id| {
                constraints[id.into_inner()]
                    .expression()
                    .variable_ids()
                    .all(|variable_id| appearance[&variable_id] == 1)
            });
        }
        SelectionMode::Defined | SelectionMode::Off => {}
    }

    let mut claimed: FnvHashSet<VariableID> = Default::default();
    let mut selections = Vec::new();

    'candidate: for id in candidates {
        let constraint = &constraints[id.into_inner()];
        let members: Vec<VariableID> = constraint.expression().variable_ids().collect();
        if members.iter().any(|m| claimed.contains(m)) {
            continue;
        }
        let mut fixed_on: Option<VariableID> = None;
        for &member in &members {
            let variable = &variables[member.into_inner()];
            if variable.is_fixed() && variable.value() == 1 {
                if fixed_on.is_some() {
                    continue 'candidate;
                }
                fixed_on = Some(member);
            }
        }

        let index = selections.len();
        for &member in &members {
            claimed.insert(member);
            let variable = &mut variables[member.into_inner()];
            variable.set_sense(VariableSense::Selection);
            variable.set_selection_index(Some(index));
        }
        constraints[id.into_inner()].disable();
        selections.push(Selection {
            constraint: id,
            variables: members,
            selected: fixed_on,
        });
    }
    selections
}

/// Repair the member values of each selection group so exactly one member is
/// one, preferring a member that is already one.
pub fn initialize_selections(selections: &mut [Selection], variables: &mut [Variable]) {
    for selection in selections.iter_mut() {
        let already_selected = selection.selected.or_else(|| {
            selection
                .variables
                .iter()
                .copied()
                .find(|id| variables[id.into_inner()].value() == 1)
        });
        let chosen = already_selected.unwrap_or_else(|| {
            selection
                .variables
                .iter()
                .copied()
                .find(|id| !variables[id.into_inner()].is_fixed())
                .unwrap_or(selection.variables[0])
        });
        for &member in &selection.variables {
            let variable = &mut variables[member.into_inner()];
            if variable.is_fixed() {
                continue;
            }
            let target = if member == chosen { 1 } else { 0 };
            // bounds are [0, 1] for selection members
            let _ = variable.set_value(target);
        }
        selection.selected = Some(chosen);
    }
}
