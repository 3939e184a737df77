use super::{deadline_passed, Move, MoveAcceptance, MoveKind, MovePool, MoveUpdater};
use crate::{Model, VariableID};
use std::time::Instant;

/// Flip moves for every non-fixed binary variable.
#[derive(Debug, Clone)]
pub struct BinaryMoveGenerator {
    is_enabled: bool,
    variables: Vec<VariableID>,
    pool: MovePool,
}

impl BinaryMoveGenerator {
    pub fn new(is_enabled: bool, variables: Vec<VariableID>) -> Self {
        Self {
            is_enabled,
            variables,
            pool: MovePool::default(),
        }
    }
}

impl MoveUpdater for BinaryMoveGenerator {
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
            let mv = Move::univariate(MoveKind::Binary, id, 1 - variable.value());
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
    fn one_flip_per_unfixed_binary() {
        let mut model = Model::new("binary");
        let x = model.create_variables("x", &[3], 0, 1).unwrap();
        model.minimize(x.sum());
        model.setup_structure(SelectionMode::Defined, &Default::default(), ATol::default());

        let mut generator = BinaryMoveGenerator::new(true, x.ids().to_vec());
        generator.update_moves(&model, &MoveAcceptance::all(), None);

        assert_eq!(generator.pool().len(), 3);
        for (mv, flag) in generator
            .pool()
            .moves
            .iter()
            .zip(&generator.pool().flags)
        {
            assert_eq!(mv.kind, MoveKind::Binary);
            assert!(mv.is_univariate);
            assert_eq!(*flag, 1);
            assert_eq!(mv.alterations[0].1, 1); // all start at 0
        }
    }

    #[test]
    fn disabled_family_is_empty() {
        let mut model = Model::new("binary");
        let x = model.create_variables("x", &[3], 0, 1).unwrap();
        model.minimize(x.sum());
        model.setup_structure(SelectionMode::Defined, &Default::default(), ATol::default());

        let mut generator = BinaryMoveGenerator::new(false, x.ids().to_vec());
        generator.update_moves(&model, &MoveAcceptance::all(), None);
        assert!(generator.pool().is_empty());
    }
}
