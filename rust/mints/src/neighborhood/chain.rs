use super::{deadline_passed, Alterations, Move, MoveAcceptance, MoveKind, MovePool, MoveUpdater};
use crate::{ChainMoveReduceMode, Model};
use crate::utility::SolverRng;
use fnv::FnvHashSet;
use std::time::Instant;

/// Composite moves synthesized at runtime from pairs of conflict-reducing
/// univariate moves.
///
/// The tabu loop registers a pair when two consecutively selected univariate
/// moves shared a related constraint; the composition cancels violations the
/// parents only shifted around. The registry is bounded: over capacity it is
/// reduced either by keeping the most correlated compositions (smallest
/// overlap rate) or by random subsampling.
pub struct ChainMoveGenerator {
    is_enabled: bool,
    reduce_mode: ChainMoveReduceMode,
    capacity: usize,
    registry: Vec<Move>,
    fingerprints: FnvHashSet<Vec<(usize, i64)>>,
    rng: SolverRng,
    pool: MovePool,
}

impl ChainMoveGenerator {
    pub fn new(is_enabled: bool, reduce_mode: ChainMoveReduceMode, capacity: usize) -> Self {
        Self {
            is_enabled,
            reduce_mode,
            capacity,
            registry: Vec::new(),
            fingerprints: Default::default(),
            rng: SolverRng::seed_from(0),
            pool: MovePool::default(),
        }
    }

    pub fn seed_rng(&mut self, seed: u64) {
        self.rng = SolverRng::seed_from(seed);
    }

    pub fn number_of_registered_moves(&self) -> usize {
        self.registry.len()
    }

    /// Compose two moves into one chain candidate. Returns `false` when the
    /// parents conflict on a variable, the composition is already
    /// registered, or composition is disabled.
    pub fn register(&mut self, first: &Move, second: &Move, model: &Model) -> bool {
        if !self.is_enabled {
            return false;
        }
        let mut alterations = Alterations::new();
        alterations.extend(first.alterations.iter().copied());
        for &(id, value) in &second.alterations {
            match alterations.iter().position(|(existing, _)| *existing == id) {
                Some(index) if alterations[index].1 != value => return false,
                Some(_) => {}
                None => alterations.push((id, value)),
            }
        }
        if alterations.len() < 2 {
            return false;
        }
        alterations.sort_by_key(|(id, _)| *id);
        let fingerprint: Vec<(usize, i64)> = alterations
            .iter()
            .map(|(id, value)| (id.into_inner(), *value))
            .collect();
        if !self.fingerprints.insert(fingerprint) {
            return false;
        }
        let mut mv = Move::new(MoveKind::Chain, alterations);
        mv.bind(model);
        self.registry.push(mv);
        if self.registry.len() > self.capacity {
            self.reduce();
        }
        true
    }

    fn reduce(&mut self) {
        match self.reduce_mode {
            ChainMoveReduceMode::OverlapRate => {
                self.registry.sort_by(|a, b| {
                    a.overlap_rate
                        .partial_cmp(&b.overlap_rate)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
            }
            ChainMoveReduceMode::Shuffle => {
                self.rng.shuffle(&mut self.registry);
            }
        }
        self.registry.truncate(self.capacity / 2);
        self.fingerprints = self
            .registry
            .iter()
            .map(|mv| {
                mv.alterations
                    .iter()
                    .map(|(id, value)| (id.into_inner(), *value))
                    .collect()
            })
            .collect();
    }
}

impl MoveUpdater for ChainMoveGenerator {
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
        for mv in &self.registry {
            self.pool.push(mv.clone(), model, acceptance);
        }
    }

    fn pool(&self) -> &MovePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ATol, Model, MoveKind, SelectionMode};

    fn model() -> Model {
        let mut model = Model::new("chain");
        let x = model.create_variables("x", &[4], 0, 1).unwrap();
        model.add_constraint("cover", x.sum().ge(2.0)).unwrap();
        model.minimize(x.sum());
        model.setup_structure(SelectionMode::Off, &Default::default(), ATol::default());
        model
    }

    fn flip(model: &Model, index: usize, value: i64) -> Move {
        let id = model.variable_id_by_name(&format!("x[{index}]")).unwrap();
        Move::univariate(MoveKind::Binary, id, value)
    }

    #[test]
    fn register_composes_and_dedupes() {
        let model = model();
        let mut chain = ChainMoveGenerator::new(true, ChainMoveReduceMode::OverlapRate, 100);
        let first = flip(&model, 0, 1);
        let second = flip(&model, 1, 1);
        assert!(chain.register(&first, &second, &model));
        assert!(!chain.register(&first, &second, &model));
        assert_eq!(chain.number_of_registered_moves(), 1);

        chain.update_moves(&model, &MoveAcceptance::all(), None);
        assert_eq!(chain.pool().len(), 1);
        assert_eq!(chain.pool().moves[0].kind, MoveKind::Chain);
        assert_eq!(chain.pool().moves[0].alterations.len(), 2);
    }

    #[test]
    fn conflicting_parents_are_rejected() {
        let model = model();
        let mut chain = ChainMoveGenerator::new(true, ChainMoveReduceMode::OverlapRate, 100);
        let first = flip(&model, 0, 1);
        let conflicting = flip(&model, 0, 0);
        assert!(!chain.register(&first, &conflicting, &model));
    }

    #[test]
    fn registry_is_bounded() {
        let model = model();
        let mut chain = ChainMoveGenerator::new(true, ChainMoveReduceMode::Shuffle, 4);
        chain.seed_rng(1);
        for i in 0..4usize {
            for j in 0..4usize {
                if i != j {
                    let _ = chain.register(&flip(&model, i, 1), &flip(&model, j, 1), &model);
                }
            }
        }
        assert!(chain.number_of_registered_moves() <= 4);
    }
}
