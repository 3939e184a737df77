use super::{
    deadline_passed, pair_terms, Alterations, Move, MoveAcceptance, MoveKind, MovePool,
    MoveUpdater,
};
use crate::{ConstraintID, ConstraintSense, Model};
use std::time::Instant;

/// Conditional moves for `a*x + b*y (sense) c` with one binary member: flip
/// the binary to its other value and pull the companion to the nearest value
/// satisfying the constraint under the new gate state.
#[derive(Debug, Clone)]
pub struct VariableBoundMoveGenerator {
    is_enabled: bool,
    constraints: Vec<ConstraintID>,
    pool: MovePool,
}

impl VariableBoundMoveGenerator {
    pub fn new(is_enabled: bool, constraints: Vec<ConstraintID>) -> Self {
        Self {
            is_enabled,
            constraints,
            pool: MovePool::default(),
        }
    }
}

impl MoveUpdater for VariableBoundMoveGenerator {
    fn update_moves(
        &mut self,
        model: &Model,
        acceptance: &MoveAcceptance,
        deadline: Option<Instant>,
    ) {
        self.pool.clear();
        if !self.is_enabled || deadline_passed(deadline) {
            return;
        }
        for &id in &self.constraints {
            let Some(pair) = pair_terms(model, id) else {
                continue;
            };
            // identify the binary gate
            let (gate, gate_coefficient, companion, companion_coefficient) =
                if model.variable(pair.x).sense().is_binary()
                    && !model.variable(pair.y).sense().is_binary()
                {
                    (pair.x, pair.a, pair.y, pair.b)
                } else if model.variable(pair.y).sense().is_binary() {
                    (pair.y, pair.b, pair.x, pair.a)
                } else {
                    continue;
                };
            let gate_value = model.variable(gate).value();
            let new_gate = 1 - gate_value;
            let companion_variable = model.variable(companion);
            let companion_value = companion_variable.value();

            // companion bound implied by the flipped gate:
            //   companion_coefficient * companion (sense) rhs - gate_coefficient * new_gate
            let budget = pair.rhs - gate_coefficient * new_gate as f64;
            let quotient = budget / companion_coefficient;
            let sense = model.constraint(id).sense();
            let implied = match (sense, companion_coefficient > 0.0) {
                (ConstraintSense::Less, true) | (ConstraintSense::Greater, false) => {
                    // companion <= quotient
                    (companion_variable.lower(), quotient.floor() as i64)
                }
                (ConstraintSense::Less, false) | (ConstraintSense::Greater, true) => {
                    // companion >= quotient
                    (quotient.ceil() as i64, companion_variable.upper())
                }
                (ConstraintSense::Equal, _) => {
                    let exact = quotient.round();
                    if (quotient - exact).abs() > 1e-9 {
                        continue;
                    }
                    (exact as i64, exact as i64)
                }
            };
            let (implied_lower, implied_upper) = implied;
            let lower = implied_lower.max(companion_variable.lower());
            let upper = implied_upper.min(companion_variable.upper());
            if lower > upper {
                continue;
            }
            let new_companion = companion_value.clamp(lower, upper);

            let mut alterations = Alterations::new();
            alterations.push((gate, new_gate));
            if new_companion != companion_value {
                alterations.push((companion, new_companion));
            }
            let mut mv = Move::new(MoveKind::VariableBound, alterations);
            mv.is_special = true;
            self.pool.push(mv, model, acceptance);
        }
    }

    fn pool(&self) -> &MovePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ATol, Expr, Model, SelectionMode};

    #[test]
    fn gate_flip_pulls_companion_into_range() {
        // x <= 30 y, i.e. x - 30 y <= 0, x in [0, 50]
        let mut model = Model::new("variable_bound");
        let x = model.create_variable("x", 0, 50).unwrap();
        let y = model.create_variable("y", 0, 1).unwrap();
        let c = model
            .add_constraint("vb", Expr::var(x).plus_term(y, -30.0).le(0.0))
            .unwrap();
        model.set_initial_value(x, 20);
        model.set_initial_value(y, 1);
        model.setup_structure(SelectionMode::Off, &Default::default(), ATol::default());

        let mut generator = VariableBoundMoveGenerator::new(true, vec![c]);
        generator.update_moves(&model, &MoveAcceptance::all(), None);
        let pool = generator.pool();
        assert_eq!(pool.len(), 1);
        // flipping y to 0 forces x down to 0
        let mv = &pool.moves[0];
        assert_eq!(mv.alterations[0], (y, 0));
        assert_eq!(mv.alterations[1], (x, 0));
    }
}
