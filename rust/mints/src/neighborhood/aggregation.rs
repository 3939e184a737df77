use super::{
    deadline_passed, pair_terms, Alterations, Move, MoveAcceptance, MoveKind, MovePool,
    MoveUpdater,
};
use crate::{ConstraintID, Model};
use std::time::Instant;

/// Moves along `a*x + b*y = c`: perturb each member by one unit and solve the
/// equality for the other, keeping only exact-integer solutions.
#[derive(Debug, Clone)]
pub struct AggregationMoveGenerator {
    is_enabled: bool,
    constraints: Vec<ConstraintID>,
    pool: MovePool,
}

impl AggregationMoveGenerator {
    pub fn new(is_enabled: bool, constraints: Vec<ConstraintID>) -> Self {
        Self {
            is_enabled,
            constraints,
            pool: MovePool::default(),
        }
    }
}

impl MoveUpdater for AggregationMoveGenerator {
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
            let a = pair.a.round() as i64;
            let b = pair.b.round() as i64;
            let c = pair.rhs.round() as i64;
            if a == 0 || b == 0 {
                continue;
            }
            let x_value = model.variable(pair.x).value();
            let y_value = model.variable(pair.y).value();

            // perturb x, solve for y
            for step in [1i64, -1] {
                let new_x = x_value + step;
                let remainder = c - a * new_x;
                if remainder % b != 0 {
                    continue;
                }
                let mut alterations = Alterations::new();
                alterations.push((pair.x, new_x));
                alterations.push((pair.y, remainder / b));
                let mut mv = Move::new(MoveKind::Aggregation, alterations);
                mv.is_special = true;
                self.pool.push(mv, model, acceptance);
            }
            // perturb y, solve for x
            for step in [1i64, -1] {
                let new_y = y_value + step;
                let remainder = c - b * new_y;
                if remainder % a != 0 {
                    continue;
                }
                let mut alterations = Alterations::new();
                alterations.push((pair.x, remainder / a));
                alterations.push((pair.y, new_y));
                let mut mv = Move::new(MoveKind::Aggregation, alterations);
                mv.is_special = true;
                self.pool.push(mv, model, acceptance);
            }
        }
    }

    fn pool(&self) -> &MovePool {
        &self.pool
    }
}
