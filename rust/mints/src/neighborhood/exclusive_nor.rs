use super::{
    deadline_passed, pair_terms, Alterations, Move, MoveAcceptance, MoveKind, MovePool,
    MoveUpdater,
};
use crate::{ConstraintID, Model};
use std::time::Instant;

/// Both-zero / both-one moves for `x - y = 0` over binaries.
#[derive(Debug, Clone)]
pub struct ExclusiveNorMoveGenerator {
    is_enabled: bool,
    constraints: Vec<ConstraintID>,
    pool: MovePool,
}

impl ExclusiveNorMoveGenerator {
    pub fn new(is_enabled: bool, constraints: Vec<ConstraintID>) -> Self {
        Self {
            is_enabled,
            constraints,
            pool: MovePool::default(),
        }
    }
}

impl MoveUpdater for ExclusiveNorMoveGenerator {
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
            for target in [0, 1] {
                let mut alterations = Alterations::new();
                alterations.push((pair.x, target));
                alterations.push((pair.y, target));
                let mut mv = Move::new(MoveKind::ExclusiveNor, alterations);
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
    fn emits_both_anchor_states() {
        let mut model = Model::new("xnor");
        let x = model.create_variables("x", &[2], 0, 1).unwrap();
        let c = model
            .add_constraint("xnor", Expr::var(x[0]).plus_term(x[1], -1.0).eq(0.0))
            .unwrap();
        model.setup_structure(SelectionMode::Off, &Default::default(), ATol::default());

        let mut generator = ExclusiveNorMoveGenerator::new(true, vec![c]);
        generator.update_moves(&model, &MoveAcceptance::all(), None);
        let pool = generator.pool();
        assert_eq!(pool.len(), 2);
        // current state is (0, 0); the both-zero anchor is a no-op
        assert_eq!(pool.flags[0], 0);
        assert_eq!(pool.flags[1], 1);
        assert_eq!(pool.moves[1].alterations[0].1, 1);
        assert_eq!(pool.moves[1].alterations[1].1, 1);
    }
}
