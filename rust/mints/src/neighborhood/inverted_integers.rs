use super::{
    deadline_passed, pair_terms, Alterations, Move, MoveAcceptance, MoveKind, MovePool,
    MoveUpdater,
};
use crate::{ConstraintID, Model};
use std::time::Instant;

/// Symmetric steps for `x + y = 0`: `(x+k, y-k)` for `k` in `{+1, -1}`.
#[derive(Debug, Clone)]
pub struct InvertedIntegersMoveGenerator {
    is_enabled: bool,
    constraints: Vec<ConstraintID>,
    pool: MovePool,
}

impl InvertedIntegersMoveGenerator {
    pub fn new(is_enabled: bool, constraints: Vec<ConstraintID>) -> Self {
        Self {
            is_enabled,
            constraints,
            pool: MovePool::default(),
        }
    }
}

impl MoveUpdater for InvertedIntegersMoveGenerator {
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
            let x_value = model.variable(pair.x).value();
            let y_value = model.variable(pair.y).value();
            for step in [1i64, -1] {
                let mut alterations = Alterations::new();
                alterations.push((pair.x, x_value + step));
                alterations.push((pair.y, y_value - step));
                let mut mv = Move::new(MoveKind::InvertedIntegers, alterations);
                mv.is_special = true;
                self.pool.push(mv, model, acceptance);
            }
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
    fn steps_preserve_the_zero_sum() {
        let mut model = Model::new("inverted");
        let x = model.create_variables("x", &[2], -10, 10).unwrap();
        let c = model
            .add_constraint("zero_sum", Expr::var(x[0]).plus_term(x[1], 1.0).eq(0.0))
            .unwrap();
        model.set_initial_value(x[0], 3);
        model.set_initial_value(x[1], -3);
        model.setup_structure(SelectionMode::Off, &Default::default(), ATol::default());

        let mut generator = InvertedIntegersMoveGenerator::new(true, vec![c]);
        generator.update_moves(&model, &MoveAcceptance::all(), None);
        let pool = generator.pool();
        assert_eq!(pool.len(), 2);
        for mv in &pool.moves {
            let sum: i64 = mv.alterations.iter().map(|(_, v)| *v).sum();
            assert_eq!(sum, 0);
        }
    }
}
