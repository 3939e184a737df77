use super::{
    deadline_passed, pair_terms, Alterations, Move, MoveAcceptance, MoveKind, MovePool,
    MoveUpdater,
};
use crate::{ConstraintID, Model};
use std::time::Instant;

/// Two-valued swap for `x + y = 1` over binaries: exchange the pair's
/// values. A no-op swap (both members equal) is flagged inadmissible.
#[derive(Debug, Clone)]
pub struct ExclusiveOrMoveGenerator {
    is_enabled: bool,
    constraints: Vec<ConstraintID>,
    pool: MovePool,
}

impl ExclusiveOrMoveGenerator {
    pub fn new(is_enabled: bool, constraints: Vec<ConstraintID>) -> Self {
        Self {
            is_enabled,
            constraints,
            pool: MovePool::default(),
        }
    }
}

impl MoveUpdater for ExclusiveOrMoveGenerator {
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
            let mut alterations = Alterations::new();
            alterations.push((pair.x, y_value));
            alterations.push((pair.y, x_value));
            let mut mv = Move::new(MoveKind::ExclusiveOr, alterations);
            mv.is_special = true;
            self.pool.push(mv, model, acceptance);
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
    fn swap_preserves_the_pair_sum() {
        let mut model = Model::new("xor");
        let x = model.create_variables("x", &[2], 0, 1).unwrap();
        let c = model
            .add_constraint("xor", Expr::var(x[0]).plus_term(x[1], 1.0).eq(1.0))
            .unwrap();
        model.set_initial_value(x[0], 1);
        model.setup_structure(SelectionMode::Off, &Default::default(), ATol::default());

        let mut generator = ExclusiveOrMoveGenerator::new(true, vec![c]);
        generator.update_moves(&model, &MoveAcceptance::all(), None);
        let pool = generator.pool();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.flags[0], 1);
        assert_eq!(pool.moves[0].alterations[0], (x[0], 0));
        assert_eq!(pool.moves[0].alterations[1], (x[1], 1));

        let violation_before = model.constraint(c).violation();
        let mut model = model;
        model
            .apply_alterations(&pool.moves[0].alterations)
            .unwrap();
        assert_eq!(model.constraint(c).violation(), violation_before);
    }
}
