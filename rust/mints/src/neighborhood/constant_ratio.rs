use super::{
    deadline_passed, pair_terms, Alterations, Move, MoveAcceptance, MoveKind, MovePool,
    MoveUpdater,
};
use crate::{ConstraintID, Model};
use num::integer::gcd;
use std::time::Instant;

/// Lattice walk for `a*x = b*y` (stored as `a*x - b*y = 0`): the smallest
/// integer step preserving the ratio is `(x + b/g, y + a/g)` with
/// `g = gcd(a, b)`; emit it in both directions.
#[derive(Debug, Clone)]
pub struct ConstantRatioIntegersMoveGenerator {
    is_enabled: bool,
    constraints: Vec<ConstraintID>,
    pool: MovePool,
}

impl ConstantRatioIntegersMoveGenerator {
    pub fn new(is_enabled: bool, constraints: Vec<ConstraintID>) -> Self {
        Self {
            is_enabled,
            constraints,
            pool: MovePool::default(),
        }
    }
}

impl MoveUpdater for ConstantRatioIntegersMoveGenerator {
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
            if a == 0 || b == 0 {
                continue;
            }
            let g = gcd(a.abs(), b.abs());
            // a*dx + b*dy = 0  =>  (dx, dy) = t * (-b/g, a/g)
            let dx = -b / g;
            let dy = a / g;
            let x_value = model.variable(pair.x).value();
            let y_value = model.variable(pair.y).value();
            for t in [1i64, -1] {
                let mut alterations = Alterations::new();
                alterations.push((pair.x, x_value + t * dx));
                alterations.push((pair.y, y_value + t * dy));
                let mut mv = Move::new(MoveKind::ConstantRatioIntegers, alterations);
                mv.is_special = true;
                self.pool.push(mv, model, acceptance);
            }
        }
    }

    fn pool(&self) -> &MovePool {
        &self.pool
    }
}
