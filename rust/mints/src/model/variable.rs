use crate::{saturate, ConstraintID};
use derive_more::{Deref, From};
use getset::CopyGetters;
use tracing::warn;

/// ID for a decision variable; index into the model's variable arena.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Deref)]
pub struct VariableID(usize);

impl VariableID {
    pub fn into_inner(&self) -> usize {
        self.0
    }
}

impl std::fmt::Debug for VariableID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VariableID({})", self.0)
    }
}

impl std::fmt::Display for VariableID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Structural role of a decision variable, assigned by
/// [`Model::setup_structure`](crate::Model::setup_structure).
///
/// - A `Selection` variable is binary and belongs to exactly one selection
///   group.
/// - A `DependentBinary`/`DependentInteger` variable is algebraically
///   determined by an equality extracted in the presolver and is never
///   perturbed directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VariableSense {
    Binary,
    Integer,
    Selection,
    DependentBinary,
    DependentInteger,
}

impl VariableSense {
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary | Self::Selection | Self::DependentBinary)
    }

    pub fn is_dependent(&self) -> bool {
        matches!(self, Self::DependentBinary | Self::DependentInteger)
    }
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum VariableError {
    #[error("Bound of {name} is empty: lower({lower}) > upper({upper})")]
    EmptyBound {
        name: String,
        lower: i64,
        upper: i64,
    },

    #[error("Value {value} for {name} is out of bound [{lower}, {upper}]")]
    ValueOutOfBound {
        name: String,
        value: i64,
        lower: i64,
        upper: i64,
    },

    #[error("Fixed variable {name} cannot be mutated to {value} (fixed at {fixed})")]
    FixedMutation {
        name: String,
        value: i64,
        fixed: i64,
    },
}

/// Integer decision variable.
///
/// Invariants
/// ----------
/// - `lower <= value <= upper`
/// - a fixed variable has `lower == upper == value`
/// - bounds stay within `[INT_MIN, INT_MAX]`
#[derive(Debug, Clone, CopyGetters)]
pub struct Variable {
    #[getset(get_copy = "pub")]
    id: VariableID,
    name: String,
    #[getset(get_copy = "pub")]
    value: i64,
    #[getset(get_copy = "pub")]
    lower: i64,
    #[getset(get_copy = "pub")]
    upper: i64,
    #[getset(get_copy = "pub")]
    is_fixed: bool,
    #[getset(get_copy = "pub")]
    sense: VariableSense,

    /// Constraints referencing this variable, with the coefficient of this
    /// variable in each (the linear sensitivity). Built by
    /// `setup_structure`.
    related: Vec<(ConstraintID, f64)>,
    #[getset(get_copy = "pub")]
    objective_sensitivity: f64,

    /// Index of the selection group this variable belongs to, if any.
    #[getset(get_copy = "pub")]
    selection_index: Option<usize>,

    // Improvability screening marks, refreshed per iteration.
    #[getset(get_copy = "pub")]
    is_objective_improvable: bool,
    #[getset(get_copy = "pub")]
    is_feasibility_improvable: bool,
}

impl Variable {
    pub fn new(id: VariableID, name: &str, lower: i64, upper: i64) -> Result<Self, VariableError> {
        let (lower, upper) = saturate_bound(name, lower, upper);
        if lower > upper {
            return Err(VariableError::EmptyBound {
                name: name.to_string(),
                lower,
                upper,
            });
        }
        let sense = if lower >= 0 && upper <= 1 {
            VariableSense::Binary
        } else {
            VariableSense::Integer
        };
        Ok(Self {
            id,
            name: name.to_string(),
            value: lower.max(0).min(upper),
            lower,
            upper,
            is_fixed: lower == upper,
            sense,
            related: Vec::new(),
            objective_sensitivity: 0.0,
            selection_index: None,
            is_objective_improvable: false,
            is_feasibility_improvable: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn related(&self) -> &[(ConstraintID, f64)] {
        &self.related
    }

    pub fn set_value(&mut self, value: i64) -> Result<(), VariableError> {
        if self.is_fixed && value != self.value {
            return Err(VariableError::FixedMutation {
                name: self.name.clone(),
                value,
                fixed: self.value,
            });
        }
        if value < self.lower || value > self.upper {
            return Err(VariableError::ValueOutOfBound {
                name: self.name.clone(),
                value,
                lower: self.lower,
                upper: self.upper,
            });
        }
        self.value = value;
        Ok(())
    }

    /// Snap an out-of-bound starting value into `[lower, upper]`.
    pub fn correct_initial_value(&mut self) -> bool {
        let corrected = self.value.clamp(self.lower, self.upper);
        let changed = corrected != self.value;
        self.value = corrected;
        changed
    }

    pub fn set_bound(&mut self, lower: i64, upper: i64) -> Result<(), VariableError> {
        let (lower, upper) = saturate_bound(&self.name, lower, upper);
        if lower > upper {
            return Err(VariableError::EmptyBound {
                name: self.name.clone(),
                lower,
                upper,
            });
        }
        self.lower = lower;
        self.upper = upper;
        self.value = self.value.clamp(lower, upper);
        if self.lower == self.upper {
            self.is_fixed = true;
        }
        if self.sense == VariableSense::Integer && lower >= 0 && upper <= 1 {
            self.sense = VariableSense::Binary;
        }
        Ok(())
    }

    /// Fix the variable at `value`, collapsing its bound.
    pub fn fix_to(&mut self, value: i64) -> Result<(), VariableError> {
        if value < self.lower || value > self.upper {
            return Err(VariableError::ValueOutOfBound {
                name: self.name.clone(),
                value,
                lower: self.lower,
                upper: self.upper,
            });
        }
        self.lower = value;
        self.upper = value;
        self.value = value;
        self.is_fixed = true;
        Ok(())
    }

    pub fn set_sense(&mut self, sense: VariableSense) {
        self.sense = sense;
    }

    pub fn set_selection_index(&mut self, index: Option<usize>) {
        self.selection_index = index;
    }

    pub(crate) fn set_related(&mut self, related: Vec<(ConstraintID, f64)>) {
        self.related = related;
    }

    pub(crate) fn set_objective_sensitivity(&mut self, sensitivity: f64) {
        self.objective_sensitivity = sensitivity;
    }

    pub(crate) fn set_improvability(&mut self, objective: bool, feasibility: bool) {
        self.is_objective_improvable = objective;
        self.is_feasibility_improvable = feasibility;
    }

    /// Range of the term `coefficient * self` over the variable's bound.
    pub fn term_interval(&self, coefficient: f64) -> (f64, f64) {
        let a = coefficient * self.lower as f64;
        let b = coefficient * self.upper as f64;
        (a.min(b), a.max(b))
    }
}

/// Clamp a requested bound into the representable value range, warning when
/// saturation actually bites.
fn saturate_bound(name: &str, lower: i64, upper: i64) -> (i64, i64) {
    let saturated = (saturate(lower), saturate(upper));
    if saturated != (lower, upper) {
        warn!(name, lower, upper, "bound saturated to the representable range");
    }
    saturated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variable(lower: i64, upper: i64) -> Variable {
        Variable::new(VariableID::from(0), "x", lower, upper).unwrap()
    }

    #[test]
    fn binary_sense_is_inferred() {
        assert_eq!(variable(0, 1).sense(), VariableSense::Binary);
        assert_eq!(variable(0, 2).sense(), VariableSense::Integer);
        assert_eq!(variable(-1, 1).sense(), VariableSense::Integer);
    }

    #[test]
    fn empty_bound_is_rejected() {
        assert!(Variable::new(VariableID::from(0), "x", 3, 2).is_err());
    }

    #[test]
    fn set_value_checks_bound() {
        let mut x = variable(-2, 5);
        assert!(x.set_value(5).is_ok());
        assert_eq!(x.value(), 5);
        assert!(matches!(
            x.set_value(6),
            Err(VariableError::ValueOutOfBound { .. })
        ));
    }

    #[test]
    fn fixed_variable_rejects_mutation() {
        let mut x = variable(0, 10);
        x.fix_to(4).unwrap();
        assert!(x.is_fixed());
        assert_eq!((x.lower(), x.upper(), x.value()), (4, 4, 4));
        assert!(matches!(
            x.set_value(5),
            Err(VariableError::FixedMutation { .. })
        ));
        assert!(x.set_value(4).is_ok());
    }

    #[test]
    fn tightening_to_point_fixes() {
        let mut x = variable(0, 10);
        x.set_bound(7, 7).unwrap();
        assert!(x.is_fixed());
        assert_eq!(x.value(), 7);
    }

    #[test]
    fn term_interval_handles_negative_coefficient() {
        let x = variable(-2, 5);
        assert_eq!(x.term_interval(3.0), (-6.0, 15.0));
        assert_eq!(x.term_interval(-3.0), (-15.0, 6.0));
    }
}
