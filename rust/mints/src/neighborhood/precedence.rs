use super::{
    deadline_passed, pair_terms, Alterations, Move, MoveAcceptance, MoveKind, MovePool,
    MoveUpdater,
};
use crate::{ConstraintID, Model};
use std::time::Instant;

/// Co-shift for `x <= y` (stored as `x - y <= 0` or `x - y >= 0`): move both
/// members by the same unit so the slack is preserved.
#[derive(Debug, Clone)]
pub struct PrecedenceMoveGenerator {
    is_enabled: bool,
    constraints: Vec<ConstraintID>,
    pool: MovePool,
}

impl PrecedenceMoveGenerator {
    pub fn new(is_enabled: bool, constraints: Vec<ConstraintID>) -> Self {
        Self {
            is_enabled,
            constraints,
            pool: MovePool::default(),
        }
    }
}

impl MoveUpdater for PrecedenceMoveGenerator {
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
                let mut mv = Move::new(MoveKind::Precedence, alterations);
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
    fn co_shift_preserves_slack() {
        let mut model = Model::new("precedence");
        let x = model.create_variables("x", &[2], 0, 10).unwrap();
        let c = model
            .add_constraint("prec", Expr::var(x[0]).plus_term(x[1], -1.0).le(0.0))
            .unwrap();
        model.set_initial_value(x[0], 2);
        model.set_initial_value(x[1], 5);
        model.setup_structure(SelectionMode::Off, &Default::default(), ATol::default());

        let mut generator = PrecedenceMoveGenerator::new(true, vec![c]);
        generator.update_moves(&model, &MoveAcceptance::all(), None);
        let pool = generator.pool();
        assert_eq!(pool.len(), 2);
        for mv in &pool.moves {
            let dx = mv.alterations[0].1 - 2;
            let dy = mv.alterations[1].1 - 5;
            assert_eq!(dx, dy);
        }
    }
}
