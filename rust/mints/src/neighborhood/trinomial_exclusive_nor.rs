use super::{deadline_passed, Alterations, Move, MoveAcceptance, MoveKind, MovePool, MoveUpdater};
use crate::{ConstraintID, Model};
use std::time::Instant;

/// All-zero / all-one moves for `x + y = 2 z` over binaries.
#[derive(Debug, Clone)]
pub struct TrinomialExclusiveNorMoveGenerator {
    is_enabled: bool,
    constraints: Vec<ConstraintID>,
    pool: MovePool,
}

impl TrinomialExclusiveNorMoveGenerator {
    pub fn new(is_enabled: bool, constraints: Vec<ConstraintID>) -> Self {
        Self {
            is_enabled,
            constraints,
            pool: MovePool::default(),
        }
    }
}

impl MoveUpdater for TrinomialExclusiveNorMoveGenerator {
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
            let constraint = model.constraint(id);
            let terms = constraint.expression().terms();
            if terms.len() != 3 {
                continue;
            }
            for target in [0, 1] {
                let mut alterations = Alterations::new();
                for (variable_id, _) in terms {
                    alterations.push((*variable_id, target));
                }
                let mut mv = Move::new(MoveKind::TrinomialExclusiveNor, alterations);
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
    fn anchors_preserve_the_equality() {
        let mut model = Model::new("trinomial");
        let x = model.create_variables("x", &[3], 0, 1).unwrap();
        let c = model
            .add_constraint(
                "tri",
                Expr::var(x[0])
                    .plus_term(x[1], 1.0)
                    .plus_term(x[2], -2.0)
                    .eq(0.0),
            )
            .unwrap();
        model.set_initial_value(x[0], 1);
        model.set_initial_value(x[1], 1);
        model.set_initial_value(x[2], 1);
        model.setup_structure(SelectionMode::Off, &Default::default(), ATol::default());

        let mut generator = TrinomialExclusiveNorMoveGenerator::new(true, vec![c]);
        generator.update_moves(&model, &MoveAcceptance::all(), None);
        let pool = generator.pool();
        assert_eq!(pool.len(), 2);
        // current state is all-one, so only the all-zero anchor is admissible
        assert_eq!(pool.flags[0], 1);
        assert_eq!(pool.flags[1], 0);
        assert!(pool.moves[0]
            .alterations
            .iter()
            .all(|(_, value)| *value == 0));
    }
}
