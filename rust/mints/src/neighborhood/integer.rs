use super::{deadline_passed, Move, MoveAcceptance, MoveKind, MovePool, MoveUpdater};
use crate::{Model, VariableID};
use std::time::Instant;

/// Univariate moves for non-fixed integer variables: `v+1`, `v-1`, and the
/// two half-way jumps toward the bounds.
///
/// The half-way jumps are flagged inadmissible when the variable is within
/// four units of the corresponding bound, where they degenerate into the
/// unit steps.
#[derive(Debug, Clone)]
pub struct IntegerMoveGenerator {
    is_enabled: bool,
    variables: Vec<VariableID>,
    pool: MovePool,
}

impl IntegerMoveGenerator {
    pub fn new(is_enabled: bool, variables: Vec<VariableID>) -> Self {
        Self {
            is_enabled,
            variables,
            pool: MovePool::default(),
        }
    }
}

impl MoveUpdater for IntegerMoveGenerator {
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
        for &id in &self.variables {
            let variable = model.variable(id);
            if variable.is_fixed() {
                continue;
            }
            let value = variable.value();
            let lower = variable.lower();
            let upper = variable.upper();

            self.pool.push_flagged(
                Move::univariate(MoveKind::Integer, id, (value + 1).min(upper)),
                model,
                acceptance,
                value < upper,
            );
            self.pool.push_flagged(
                Move::univariate(MoveKind::Integer, id, (value - 1).max(lower)),
                model,
                acceptance,
                value > lower,
            );
            self.pool.push_flagged(
                Move::univariate(MoveKind::Integer, id, midpoint(value, upper)),
                model,
                acceptance,
                value < upper - 4,
            );
            self.pool.push_flagged(
                Move::univariate(MoveKind::Integer, id, midpoint(value, lower)),
                model,
                acceptance,
                value > lower + 4,
            );
        }
    }

    fn pool(&self) -> &MovePool {
        &self.pool
    }

    fn is_special(&self) -> bool {
        false
    }
}

/// Truncating midpoint, matching integer division semantics.
fn midpoint(a: i64, b: i64) -> i64 {
    (a + b) / 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ATol, Model, SelectionMode};

    #[test]
    fn four_moves_per_unfixed_variable_with_flags() {
        let mut model = Model::new("integer");
        let x = model.create_variables("x", &[10], 0, 20).unwrap();
        for i in 0..10 {
            model.set_initial_value(x[i], 2 * i as i64);
        }
        model.setup_structure(SelectionMode::Defined, &Default::default(), ATol::default());

        let mut generator = IntegerMoveGenerator::new(true, x.ids().to_vec());
        generator.update_moves(&model, &MoveAcceptance::all(), None);
        let pool = generator.pool();
        assert_eq!(pool.len(), 40);

        for i in 0..10 {
            let value = 2 * i as i64;
            let base = 4 * i;
            // v + 1
            assert_eq!(pool.flags[base], u8::from(value < 20));
            if value < 20 {
                assert_eq!(pool.moves[base].alterations[0].1, value + 1);
            }
            // v - 1
            assert_eq!(pool.flags[base + 1], u8::from(value > 0));
            if value > 0 {
                assert_eq!(pool.moves[base + 1].alterations[0].1, value - 1);
            }
            // (v + upper) / 2
            assert_eq!(pool.flags[base + 2], u8::from(value < 20 - 4));
            if value < 20 - 4 {
                assert_eq!(pool.moves[base + 2].alterations[0].1, (value + 20) / 2);
            }
            // (v + lower) / 2
            assert_eq!(pool.flags[base + 3], u8::from(value > 4));
            if value > 4 {
                assert_eq!(pool.moves[base + 3].alterations[0].1, value / 2);
            }
        }
    }

    #[test]
    fn fixed_variable_produces_no_moves() {
        let mut model = Model::new("integer");
        let x = model.create_variables("x", &[1], 3, 3).unwrap();
        model.setup_structure(SelectionMode::Defined, &Default::default(), ATol::default());

        let mut generator = IntegerMoveGenerator::new(true, x.ids().to_vec());
        generator.update_moves(&model, &MoveAcceptance::all(), None);
        assert!(generator.pool().is_empty());
    }
}
