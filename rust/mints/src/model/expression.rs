use crate::VariableID;
use std::ops::{Add, Mul, Neg, Sub};

/// Frozen linear form `sum(coefficient_i * variable_i) + constant` with an
/// incrementally maintained value cache.
///
/// Invariants
/// ----------
/// - `terms` is sorted by variable ID and contains no duplicates and no zero
///   coefficients.
/// - After [`Expression::refresh`], `value` equals the form evaluated at the
///   given assignment; [`Expression::shift`] keeps it consistent across
///   single-term updates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expression {
    terms: Vec<(VariableID, f64)>,
    constant: f64,
    value: f64,
}

impl Expression {
    pub fn new(terms: Vec<(VariableID, f64)>, constant: f64) -> Self {
        let mut merged: Vec<(VariableID, f64)> = Vec::with_capacity(terms.len());
        let mut terms = terms;
        terms.sort_by_key(|(id, _)| *id);
        for (id, coefficient) in terms {
            match merged.last_mut() {
                Some((last_id, last_coefficient)) if *last_id == id => {
                    *last_coefficient += coefficient;
                }
                _ => merged.push((id, coefficient)),
            }
        }
        merged.retain(|(_, coefficient)| *coefficient != 0.0);
        Self {
            terms: merged,
            constant,
            value: constant,
        }
    }

    pub fn terms(&self) -> &[(VariableID, f64)] {
        &self.terms
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn coefficient(&self, id: VariableID) -> f64 {
        self.terms
            .binary_search_by_key(&id, |(term_id, _)| *term_id)
            .map(|index| self.terms[index].1)
            .unwrap_or(0.0)
    }

    pub fn number_of_terms(&self) -> usize {
        self.terms.len()
    }

    pub fn variable_ids(&self) -> impl Iterator<Item = VariableID> + '_ {
        self.terms.iter().map(|(id, _)| *id)
    }

    /// Evaluate from scratch against a dense value assignment.
    pub fn evaluate(&self, values: &[i64]) -> f64 {
        self.terms
            .iter()
            .map(|(id, coefficient)| coefficient * values[id.into_inner()] as f64)
            .sum::<f64>()
            + self.constant
    }

    /// Recompute the cached value from scratch.
    pub fn refresh(&mut self, values: &[i64]) {
        self.value = self.evaluate(values);
    }

    /// Adjust the cached value by `coefficient(id) * (new - old)`.
    pub fn shift(&mut self, id: VariableID, old: i64, new: i64) {
        let coefficient = self.coefficient(id);
        if coefficient != 0.0 {
            self.value += coefficient * (new - old) as f64;
        }
    }

    pub(crate) fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    /// Multiply every term and the constant in place.
    pub fn scale(&mut self, factor: f64) {
        for (_, coefficient) in &mut self.terms {
            *coefficient *= factor;
        }
        self.constant *= factor;
        self.value *= factor;
    }
}

/// Constraint comparison sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConstraintSense {
    Less,
    Equal,
    Greater,
}

impl std::fmt::Display for ConstraintSense {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConstraintSense::Less => "<=",
            ConstraintSense::Equal => "=",
            ConstraintSense::Greater => ">=",
        };
        write!(f, "{s}")
    }
}

/// Fluent builder for linear expressions.
///
/// ```rust
/// use mints::{Expr, VariableID};
///
/// let x0 = VariableID::from(0);
/// let x1 = VariableID::from(1);
/// let proto = Expr::term(x0, 66.0).plus_term(x1, 14.0).ge(1430.0);
/// assert_eq!(proto.rhs, 1430.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Expr {
    terms: Vec<(VariableID, f64)>,
    constant: f64,
}

/// Constraint under construction: `expression (sense) rhs`.
#[derive(Debug, Clone)]
pub struct ConstraintProto {
    pub expression: Expr,
    pub sense: ConstraintSense,
    pub rhs: f64,
}

impl Expr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn var(id: VariableID) -> Self {
        Self::term(id, 1.0)
    }

    pub fn term(id: VariableID, coefficient: f64) -> Self {
        Self {
            terms: vec![(id, coefficient)],
            constant: 0.0,
        }
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    pub fn plus_term(mut self, id: VariableID, coefficient: f64) -> Self {
        self.terms.push((id, coefficient));
        self
    }

    pub fn plus_constant(mut self, value: f64) -> Self {
        self.constant += value;
        self
    }

    pub fn le(self, rhs: f64) -> ConstraintProto {
        ConstraintProto {
            expression: self,
            sense: ConstraintSense::Less,
            rhs,
        }
    }

    pub fn eq(self, rhs: f64) -> ConstraintProto {
        ConstraintProto {
            expression: self,
            sense: ConstraintSense::Equal,
            rhs,
        }
    }

    pub fn ge(self, rhs: f64) -> ConstraintProto {
        ConstraintProto {
            expression: self,
            sense: ConstraintSense::Greater,
            rhs,
        }
    }

    pub fn build(self) -> Expression {
        Expression::new(self.terms, self.constant)
    }
}

impl Add for Expr {
    type Output = Expr;
    fn add(mut self, rhs: Self) -> Self::Output {
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
        self
    }
}

impl Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Self) -> Self::Output {
        self + (-rhs)
    }
}

impl Neg for Expr {
    type Output = Expr;
    fn neg(mut self) -> Self::Output {
        for (_, coefficient) in &mut self.terms {
            *coefficient = -*coefficient;
        }
        self.constant = -self.constant;
        self
    }
}

impl Mul<f64> for Expr {
    type Output = Expr;
    fn mul(mut self, rhs: f64) -> Self::Output {
        for (_, coefficient) in &mut self.terms {
            *coefficient *= rhs;
        }
        self.constant *= rhs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: usize) -> VariableID {
        VariableID::from(raw)
    }

    #[test]
    fn new_sorts_merges_and_drops_zero() {
        let expression = Expression::new(
            vec![(id(2), 3.0), (id(0), 1.0), (id(2), -3.0), (id(1), 2.0)],
            5.0,
        );
        assert_eq!(expression.terms(), &[(id(0), 1.0), (id(1), 2.0)]);
        assert_eq!(expression.constant(), 5.0);
    }

    #[test]
    fn evaluate_and_refresh() {
        let mut expression = Expression::new(vec![(id(0), 2.0), (id(1), -1.0)], 1.0);
        let values = vec![3, 4];
        assert_eq!(expression.evaluate(&values), 2.0 * 3.0 - 4.0 + 1.0);
        expression.refresh(&values);
        assert_eq!(expression.value(), 3.0);
    }

    #[test]
    fn shift_matches_full_recompute() {
        let mut expression = Expression::new(vec![(id(0), 2.0), (id(1), -1.0)], 1.0);
        let mut values = vec![3, 4];
        expression.refresh(&values);
        values[1] = 7;
        expression.shift(id(1), 4, 7);
        assert_eq!(expression.value(), expression.evaluate(&values));
    }

    #[test]
    fn shift_of_unrelated_variable_is_noop() {
        let mut expression = Expression::new(vec![(id(0), 2.0)], 0.0);
        expression.refresh(&[5, 9]);
        expression.shift(id(1), 9, 100);
        assert_eq!(expression.value(), 10.0);
    }

    #[test]
    fn expr_builder_combines() {
        let expr = (Expr::term(id(0), 2.0) + Expr::term(id(1), 3.0) - Expr::var(id(0))) * 2.0;
        let expression = expr.build();
        assert_eq!(expression.terms(), &[(id(0), 2.0), (id(1), 6.0)]);
    }

    #[test]
    fn proto_carries_sense_and_rhs() {
        let proto = Expr::var(id(0)).eq(4.0);
        assert_eq!(proto.sense, ConstraintSense::Equal);
        assert_eq!(proto.rhs, 4.0);
    }

    mod properties {
        use super::*;
        use crate::{arbitrary_expression, arbitrary_values};
        use proptest::prelude::*;

        proptest! {
            /// The cache stays equal to a scratch evaluation across any
            /// sequence of single-variable shifts.
            #[test]
            fn shifted_cache_equals_scratch_recompute(
                mut expression in arbitrary_expression(6),
                values in arbitrary_values(6, 50),
                updates in proptest::collection::vec((0usize..6, -50i64..=50), 0..10),
            ) {
                let mut values = values;
                expression.refresh(&values);
                for (index, new_value) in updates {
                    let old_value = values[index];
                    values[index] = new_value;
                    expression.shift(VariableID::from(index), old_value, new_value);
                    prop_assert!(
                        (expression.value() - expression.evaluate(&values)).abs() < 1e-6
                    );
                }
            }
        }
    }
}
