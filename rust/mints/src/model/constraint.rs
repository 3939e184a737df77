use crate::{ATol, ConstraintSense, Expression, VariableID};
use derive_more::{Deref, From};
use getset::CopyGetters;

/// ID for a constraint; index into the model's constraint arena.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Deref)]
pub struct ConstraintID(usize);

impl ConstraintID {
    pub fn into_inner(&self) -> usize {
        self.0
    }
}

impl std::fmt::Debug for ConstraintID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConstraintID({})", self.0)
    }
}

impl std::fmt::Display for ConstraintID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Structural shape of a constraint, assigned by the classifier from its
/// normalized form. Each shape except the capacity/covering family and
/// `GeneralLinear` unlocks a dedicated move-generator family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConstraintShape {
    /// `a*x (sense) b`
    Singleton,
    /// `x + y = 1`, both binary
    ExclusiveOr,
    /// `x - y = 0`, both binary
    ExclusiveNor,
    /// `x + y = 0`, integers
    InvertedIntegers,
    /// `x - y = 0`, integers
    BalancedIntegers,
    /// `x + y = c`, integers, `c != 0`
    ConstantSumIntegers,
    /// `x - y = c`, integers, `c != 0`
    ConstantDifferenceIntegers,
    /// `a*x = b*y`, integers
    ConstantRatioIntegers,
    /// `a*x + b*y = c` with `gcd(a, b)` dividing `c`
    Aggregation,
    /// `x <= y` (as `x - y <= 0`), integers
    Precedence,
    /// `a*x + b*y (sense) c` with exactly one binary member
    VariableBound,
    /// `sum x_i = 1`, binary, three or more members
    Selection,
    /// `sum x_i = y`, binary
    SoftSelection,
    /// `x + y = 2 z`, binary
    TrinomialExclusiveNor,
    /// `sum x_i <= k`, binary, unit coefficients, `2 <= k < n`
    InvariantKnapsack,
    /// `sum x_i <= 1`, binary, unit coefficients
    SetPacking,
    /// `sum x_i = k`, binary, unit coefficients, `k >= 2`
    Cardinality,
    /// `sum x_i >= 1`, binary, unit coefficients
    SetCovering,
    /// `sum a_i x_i <= b`, binary, positive coefficients
    Knapsack,
    /// `sum a_i x_i = b`, binary, positive coefficients
    EquationKnapsack,
    /// `sum a_i x_i - c y <= 0`, binary, one negative gate coefficient
    BinPacking,
    /// `sum a_i x_i <= b`, integers, positive coefficients
    IntegerKnapsack,
    /// anything else
    GeneralLinear,
}

impl ConstraintShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Singleton => "Singleton",
            Self::ExclusiveOr => "Exclusive OR",
            Self::ExclusiveNor => "Exclusive NOR",
            Self::InvertedIntegers => "Inverted Integers",
            Self::BalancedIntegers => "Balanced Integers",
            Self::ConstantSumIntegers => "Constant Sum Integers",
            Self::ConstantDifferenceIntegers => "Constant Difference Integers",
            Self::ConstantRatioIntegers => "Constant Ratio Integers",
            Self::Aggregation => "Aggregation",
            Self::Precedence => "Precedence",
            Self::VariableBound => "Variable Bound",
            Self::Selection => "Selection",
            Self::SoftSelection => "Soft Selection",
            Self::TrinomialExclusiveNor => "Trinomial Exclusive NOR",
            Self::InvariantKnapsack => "Invariant Knapsack",
            Self::SetPacking => "Set Packing",
            Self::Cardinality => "Cardinality",
            Self::SetCovering => "Set Covering",
            Self::Knapsack => "Knapsack",
            Self::EquationKnapsack => "Equation Knapsack",
            Self::BinPacking => "Bin Packing",
            Self::IntegerKnapsack => "Integer Knapsack",
            Self::GeneralLinear => "General Linear",
        }
    }
}

impl std::fmt::Display for ConstraintShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Linear constraint `expression (sense) rhs`.
///
/// Invariants
/// ----------
/// - `violation` equals the violation of the cached expression value:
///   `max(0, lhs - rhs)` for `<=`, `max(0, rhs - lhs)` for `>=`,
///   `|lhs - rhs|` for `=`.
/// - Disabled constraints keep `violation == 0` and are skipped by the
///   evaluator.
#[derive(Debug, Clone, CopyGetters)]
pub struct Constraint {
    #[getset(get_copy = "pub")]
    id: ConstraintID,
    name: String,
    expression: Expression,
    #[getset(get_copy = "pub")]
    sense: ConstraintSense,
    #[getset(get_copy = "pub")]
    rhs: f64,
    #[getset(get_copy = "pub")]
    is_enabled: bool,
    #[getset(get_copy = "pub")]
    shape: ConstraintShape,

    #[getset(get_copy = "pub")]
    local_penalty: f64,
    #[getset(get_copy = "pub")]
    global_penalty: f64,

    #[getset(get_copy = "pub")]
    violation: f64,
    #[getset(get_copy = "pub")]
    is_improvable: bool,

    /// Number of recent episodes whose best-local solution violated this
    /// constraint; drives penalty tightening pressure.
    #[getset(get_copy = "pub")]
    violation_count: u64,
}

impl Constraint {
    pub fn new(
        id: ConstraintID,
        name: &str,
        expression: Expression,
        sense: ConstraintSense,
        rhs: f64,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            expression,
            sense,
            rhs,
            is_enabled: true,
            shape: ConstraintShape::GeneralLinear,
            local_penalty: 0.0,
            global_penalty: 0.0,
            violation: 0.0,
            is_improvable: false,
            violation_count: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub(crate) fn expression_mut(&mut self) -> &mut Expression {
        &mut self.expression
    }

    /// Violation of a hypothetical left-hand value under this constraint's
    /// sense.
    pub fn violation_of(&self, lhs: f64) -> f64 {
        match self.sense {
            ConstraintSense::Less => (lhs - self.rhs).max(0.0),
            ConstraintSense::Greater => (self.rhs - lhs).max(0.0),
            ConstraintSense::Equal => (lhs - self.rhs).abs(),
        }
    }

    /// Recompute the cached violation from the cached expression value.
    pub fn update_violation(&mut self) {
        self.violation = if self.is_enabled {
            self.violation_of(self.expression.value())
        } else {
            0.0
        };
    }

    pub fn is_violated(&self, atol: ATol) -> bool {
        self.violation > *atol
    }

    /// Fingerprint of the normalized form, used for duplicate elimination.
    pub fn fingerprint(&self) -> (Vec<(VariableID, i64)>, &'static str, i64) {
        let scale = 1e9;
        let terms = self
            .expression
            .terms()
            .iter()
            .map(|(id, coefficient)| (*id, (coefficient * scale).round() as i64))
            .collect();
        let sense = match self.sense {
            ConstraintSense::Less => "<=",
            ConstraintSense::Equal => "=",
            ConstraintSense::Greater => ">=",
        };
        let rhs = ((self.rhs - self.expression.constant()) * scale).round() as i64;
        (terms, sense, rhs)
    }

    pub fn disable(&mut self) {
        self.is_enabled = false;
        self.violation = 0.0;
    }

    pub fn enable(&mut self) {
        self.is_enabled = true;
    }

    pub fn set_shape(&mut self, shape: ConstraintShape) {
        self.shape = shape;
    }

    pub fn set_sense(&mut self, sense: ConstraintSense) {
        self.sense = sense;
    }

    pub fn set_rhs(&mut self, rhs: f64) {
        self.rhs = rhs;
    }

    pub fn set_local_penalty(&mut self, value: f64) {
        self.local_penalty = value;
    }

    pub fn set_global_penalty(&mut self, value: f64) {
        self.global_penalty = value;
    }

    pub(crate) fn set_improvable(&mut self, value: bool) {
        self.is_improvable = value;
    }

    pub(crate) fn reset_violation_count(&mut self) {
        self.violation_count = 0;
    }

    pub(crate) fn increment_violation_count(&mut self) {
        self.violation_count += 1;
    }
}
