use super::{deadline_passed, Alterations, Move, MoveAcceptance, MoveKind, MovePool, MoveUpdater};
use crate::{Model, VariableID};
use std::time::Instant;

/// Simultaneous flips of explicitly registered binary pairs.
#[derive(Debug, Clone)]
pub struct TwoFlipMoveGenerator {
    is_enabled: bool,
    pairs: Vec<(VariableID, VariableID)>,
    pool: MovePool,
}

impl TwoFlipMoveGenerator {
    pub fn new(is_enabled: bool, pairs: Vec<(VariableID, VariableID)>) -> Self {
        Self {
            is_enabled,
            pairs,
            pool: MovePool::default(),
        }
    }
}

impl MoveUpdater for TwoFlipMoveGenerator {
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
        for &(first, second) in &self.pairs {
            let mut alterations = Alterations::new();
            alterations.push((first, 1 - model.variable(first).value()));
            alterations.push((second, 1 - model.variable(second).value()));
            let mv = Move::new(MoveKind::TwoFlip, alterations);
            self.pool.push(mv, model, acceptance);
        }
    }

    fn pool(&self) -> &MovePool {
        &self.pool
    }

    fn is_special(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ATol, Model, SelectionMode};

    #[test]
    fn flips_both_members() {
        let mut model = Model::new("two_flip");
        let x = model.create_variables("x", &[2], 0, 1).unwrap();
        model.register_flippable_pair(x[0], x[1]);
        model.set_initial_value(x[1], 1);
        model.setup_structure(SelectionMode::Off, &Default::default(), ATol::default());

        let mut generator = TwoFlipMoveGenerator::new(true, model.flippable_pairs().to_vec());
        generator.update_moves(&model, &MoveAcceptance::all(), None);
        let pool = generator.pool();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.moves[0].alterations[0], (x[0], 1));
        assert_eq!(pool.moves[0].alterations[1], (x[1], 0));
    }
}
