use crate::Expression;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ObjectiveSense {
    #[default]
    Minimize,
    Maximize,
}

/// Linear objective. The engine always minimizes internally; a maximization
/// objective contributes through [`Objective::sign`].
#[derive(Debug, Clone, Default)]
pub struct Objective {
    expression: Expression,
    sense: ObjectiveSense,
}

impl Objective {
    pub fn new(expression: Expression, sense: ObjectiveSense) -> Self {
        Self { expression, sense }
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub(crate) fn expression_mut(&mut self) -> &mut Expression {
        &mut self.expression
    }

    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    /// `+1` for minimization, `-1` for maximization.
    pub fn sign(&self) -> f64 {
        match self.sense {
            ObjectiveSense::Minimize => 1.0,
            ObjectiveSense::Maximize => -1.0,
        }
    }

    /// Canonicalized (minimized) objective value at the cached expression
    /// value.
    pub fn internal_value(&self) -> f64 {
        self.sign() * self.expression.value()
    }

    /// Objective value in the user's original sense.
    pub fn user_value(&self) -> f64 {
        self.expression.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Expr, VariableID};

    #[test]
    fn maximization_is_canonicalized_by_sign() {
        let expression = Expr::term(VariableID::from(0), 2.0).build();
        let mut objective = Objective::new(expression, ObjectiveSense::Maximize);
        objective.expression_mut().refresh(&[3]);
        assert_eq!(objective.user_value(), 6.0);
        assert_eq!(objective.internal_value(), -6.0);
    }
}
