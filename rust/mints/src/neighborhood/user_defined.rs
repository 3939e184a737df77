use super::{deadline_passed, Move, MoveAcceptance, MovePool, MoveUpdater};
use crate::Model;
use std::time::Instant;

pub type MoveUpdaterFn = dyn Fn(&Model) -> Vec<Move> + Send + Sync;

/// Externally installed move source. The closure receives the model and
/// returns raw candidate moves; binding and admissibility are handled here.
pub struct UserDefinedMoveGenerator {
    is_enabled: bool,
    updater: Option<Box<MoveUpdaterFn>>,
    pool: MovePool,
}

impl UserDefinedMoveGenerator {
    pub fn new(is_enabled: bool) -> Self {
        Self {
            is_enabled,
            updater: None,
            pool: MovePool::default(),
        }
    }

    pub fn install(&mut self, updater: Box<MoveUpdaterFn>) {
        self.updater = Some(updater);
    }

    pub fn has_updater(&self) -> bool {
        self.updater.is_some()
    }
}

impl MoveUpdater for UserDefinedMoveGenerator {
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
        let Some(updater) = &self.updater else {
            return;
        };
        for mv in updater(model) {
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
