use super::{deadline_passed, Alterations, Move, MoveAcceptance, MoveKind, MovePool, MoveUpdater};
use crate::Model;
use std::time::Instant;

/// One-hot swaps: for each selection group with selected member `x*`, a move
/// `(x* <- 0, x_i <- 1)` for every other member.
#[derive(Debug, Clone)]
pub struct SelectionMoveGenerator {
    is_enabled: bool,
    selection_indices: Vec<usize>,
    pool: MovePool,
}

impl SelectionMoveGenerator {
    pub fn new(is_enabled: bool, selection_indices: Vec<usize>) -> Self {
        Self {
            is_enabled,
            selection_indices,
            pool: MovePool::default(),
        }
    }
}

impl MoveUpdater for SelectionMoveGenerator {
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
        for &index in &self.selection_indices {
            let selection = &model.selections()[index];
            let Some(selected) = selection.selected else {
                continue;
            };
            for &member in &selection.variables {
                if member == selected || model.variable(member).is_fixed() {
                    continue;
                }
                let mut alterations = Alterations::new();
                alterations.push((selected, 0));
                alterations.push((member, 1));
                let mut mv = Move::new(MoveKind::Selection, alterations);
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
    use crate::{ATol, Model, SelectionMode};

    #[test]
    fn swap_per_non_selected_member() {
        let mut model = Model::new("selection");
        let x = model.create_variables("x", &[4], 0, 1).unwrap();
        model.add_constraint("one_hot", x.selection()).unwrap();
        model.minimize(x.sum());
        model.setup_structure(SelectionMode::Defined, &Default::default(), ATol::default());
        assert_eq!(model.selections().len(), 1);
        let selected = model.selections()[0].selected.unwrap();

        let mut generator = SelectionMoveGenerator::new(true, vec![0]);
        generator.update_moves(&model, &MoveAcceptance::all(), None);
        let pool = generator.pool();
        assert_eq!(pool.len(), 3);
        for (mv, flag) in pool.moves.iter().zip(&pool.flags) {
            assert_eq!(*flag, 1);
            assert!(mv.is_special);
            assert_eq!(mv.alterations.len(), 2);
            assert_eq!(mv.alterations[0], (selected, 0));
            assert_eq!(mv.alterations[1].1, 1);
        }
    }
}
