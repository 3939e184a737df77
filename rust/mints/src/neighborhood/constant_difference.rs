use super::{
    deadline_passed, pair_terms, Alterations, Move, MoveAcceptance, MoveKind, MovePool,
    MoveUpdater,
};
use crate::{ConstraintID, Model};
use std::time::Instant;

/// Difference-preserving steps for `x - y = c`: co-move both members by the
/// same `k` in `{+1, -1}`.
#[derive(Debug, Clone)]
pub struct ConstantDifferenceIntegersMoveGenerator {
    is_enabled: bool,
    constraints: Vec<ConstraintID>,
    pool: MovePool,
}

impl ConstantDifferenceIntegersMoveGenerator {
    pub fn new(is_enabled: bool, constraints: Vec<ConstraintID>) -> Self {
        Self {
            is_enabled,
            constraints,
            pool: MovePool::default(),
        }
    }
}

impl MoveUpdater for ConstantDifferenceIntegersMoveGenerator {
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
                alterations.push((pair.y, y_value + step));
                let mut mv = Move::new(MoveKind::ConstantDifferenceIntegers, alterations);
                mv.is_special = true;
                self.pool.push(mv, model, acceptance);
            }
        }
    }

    fn pool(&self) -> &MovePool {
        &self.pool
    }
}
