//! Move catalogue: one generator family per structural shape, plus the
//! generic univariate families and the runtime-composed chain moves.
//!
//! Each family owns a [`MovePool`]: the candidate list and a parallel 0/1
//! admissibility bitmap. `update_moves` rebuilds the pool from the current
//! variable values; pools are disjoint slots, so the per-family updates run
//! in parallel without synchronization.

mod aggregation;
mod balanced_integers;
mod binary;
mod chain;
mod constant_difference;
mod constant_ratio;
mod constant_sum;
mod exclusive_nor;
mod exclusive_or;
mod integer;
mod inverted_integers;
mod precedence;
mod selection;
mod soft_selection;
mod trinomial_exclusive_nor;
mod two_flip;
mod user_defined;
mod variable_bound;

pub use aggregation::*;
pub use balanced_integers::*;
pub use binary::*;
pub use chain::*;
pub use constant_difference::*;
pub use constant_ratio::*;
pub use constant_sum::*;
pub use exclusive_nor::*;
pub use exclusive_or::*;
pub use integer::*;
pub use inverted_integers::*;
pub use precedence::*;
pub use selection::*;
pub use soft_selection::*;
pub use trinomial_exclusive_nor::*;
pub use two_flip::*;
pub use user_defined::*;
pub use variable_bound::*;

use crate::{ConstraintID, ConstraintShape, Model, NeighborhoodOption, VariableID};
use rayon::prelude::*;
use smallvec::SmallVec;
use std::time::Instant;

/// Family tag of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MoveKind {
    Binary,
    Integer,
    Selection,
    ExclusiveOr,
    ExclusiveNor,
    InvertedIntegers,
    BalancedIntegers,
    ConstantSumIntegers,
    ConstantDifferenceIntegers,
    ConstantRatioIntegers,
    Aggregation,
    Precedence,
    VariableBound,
    SoftSelection,
    TrinomialExclusiveNor,
    Chain,
    TwoFlip,
    UserDefined,
    General,
}

pub type Alterations = SmallVec<[(VariableID, i64); 4]>;

/// Candidate move: a set of variable alterations with metadata.
#[derive(Debug, Clone)]
pub struct Move {
    pub kind: MoveKind,
    pub alterations: Alterations,
    /// Union of the altered variables' related-constraint lists.
    pub related_constraints: Vec<ConstraintID>,
    pub is_available: bool,
    pub is_univariate: bool,
    /// Feasibility-neutral for its originating constraint by construction.
    pub is_special: bool,
    /// Distinct related constraints divided by the sum of per-variable
    /// related counts; smaller means the altered variables are more
    /// correlated. Tie-breaker for chain reduction and selection.
    pub overlap_rate: f64,
}

impl Move {
    pub fn new(kind: MoveKind, alterations: Alterations) -> Self {
        Self {
            kind,
            alterations,
            related_constraints: Vec::new(),
            is_available: true,
            is_univariate: false,
            is_special: false,
            overlap_rate: 0.0,
        }
    }

    pub fn univariate(kind: MoveKind, variable: VariableID, value: i64) -> Self {
        let mut alterations = Alterations::new();
        alterations.push((variable, value));
        let mut mv = Self::new(kind, alterations);
        mv.is_univariate = true;
        mv
    }

    /// Fill `related_constraints` and `overlap_rate` from the model's cross
    /// references.
    pub fn bind(&mut self, model: &Model) {
        let mut related: Vec<ConstraintID> = Vec::new();
        let mut touch_total = 0usize;
        for (id, _) in &self.alterations {
            let list = model.variable(*id).related();
            touch_total += list.len();
            related.extend(list.iter().map(|(cid, _)| *cid));
        }
        related.sort_unstable();
        related.dedup();
        self.overlap_rate = if touch_total == 0 {
            0.0
        } else {
            related.len() as f64 / touch_total as f64
        };
        self.related_constraints = related;
    }

    /// Every altered variable is unfixed and every target value is within
    /// bounds.
    pub fn is_within_bounds(&self, model: &Model) -> bool {
        self.alterations.iter().all(|(id, value)| {
            let variable = model.variable(*id);
            !variable.is_fixed() && *value >= variable.lower() && *value <= variable.upper()
        })
    }

    /// Every alteration is a no-op at the current values.
    pub fn is_noop(&self, model: &Model) -> bool {
        self.alterations
            .iter()
            .all(|(id, value)| model.variable(*id).value() == *value)
    }

    /// The inverse move (current values of the altered variables).
    pub fn inverse(&self, model: &Model) -> Move {
        let alterations = self
            .alterations
            .iter()
            .map(|(id, _)| (*id, model.variable(*id).value()))
            .collect();
        let mut mv = Move::new(self.kind, alterations);
        mv.is_univariate = self.is_univariate;
        mv.is_special = self.is_special;
        mv
    }

    fn is_objective_improvable(&self, model: &Model) -> bool {
        self.alterations
            .iter()
            .any(|(id, _)| model.variable(*id).is_objective_improvable())
    }

    fn is_feasibility_improvable(&self, model: &Model) -> bool {
        self.alterations
            .iter()
            .any(|(id, _)| model.variable(*id).is_feasibility_improvable())
    }
}

/// Admissibility filter passed to every `update_moves`.
#[derive(Debug, Clone, Copy)]
pub struct MoveAcceptance {
    pub accept_all: bool,
    pub accept_objective_improvable: bool,
    pub accept_feasibility_improvable: bool,
    /// Admit moves that are neither objective- nor feasibility-improvable.
    pub accept_permissible: bool,
}

impl MoveAcceptance {
    pub fn all() -> Self {
        Self {
            accept_all: true,
            accept_objective_improvable: false,
            accept_feasibility_improvable: false,
            accept_permissible: false,
        }
    }
}

/// Candidate list plus its parallel 0/1 admissibility bitmap.
#[derive(Debug, Clone, Default)]
pub struct MovePool {
    pub moves: Vec<Move>,
    pub flags: Vec<u8>,
}

impl MovePool {
    pub fn clear(&mut self) {
        self.moves.clear();
        self.flags.clear();
    }

    /// Push a bound move, computing its admissibility flag.
    pub fn push(&mut self, mut mv: Move, model: &Model, acceptance: &MoveAcceptance) {
        mv.bind(model);
        let flag = admissibility_flag(&mv, model, acceptance);
        mv.is_available = flag == 1;
        self.moves.push(mv);
        self.flags.push(flag);
    }

    /// Push with a forced flag (still zeroed when out of bounds).
    pub fn push_flagged(
        &mut self,
        mut mv: Move,
        model: &Model,
        acceptance: &MoveAcceptance,
        admissible: bool,
    ) {
        mv.bind(model);
        let flag = if admissible {
            admissibility_flag(&mv, model, acceptance)
        } else {
            0
        };
        mv.is_available = flag == 1;
        self.moves.push(mv);
        self.flags.push(flag);
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

/// 0/1 admissibility of a move under the acceptance filter.
pub fn admissibility_flag(mv: &Move, model: &Model, acceptance: &MoveAcceptance) -> u8 {
    if !mv.is_within_bounds(model) || mv.is_noop(model) {
        return 0;
    }
    if acceptance.accept_all {
        return 1;
    }
    let objective = mv.is_objective_improvable(model);
    let feasibility = mv.is_feasibility_improvable(model);
    let admitted = (acceptance.accept_objective_improvable && objective)
        || (acceptance.accept_feasibility_improvable && feasibility)
        || (acceptance.accept_permissible && !objective && !feasibility);
    admitted as u8
}

/// The full move catalogue.
pub struct Neighborhood {
    pub binary: BinaryMoveGenerator,
    pub integer: IntegerMoveGenerator,
    pub selection: SelectionMoveGenerator,
    pub exclusive_or: ExclusiveOrMoveGenerator,
    pub exclusive_nor: ExclusiveNorMoveGenerator,
    pub inverted_integers: InvertedIntegersMoveGenerator,
    pub balanced_integers: BalancedIntegersMoveGenerator,
    pub constant_sum: ConstantSumIntegersMoveGenerator,
    pub constant_difference: ConstantDifferenceIntegersMoveGenerator,
    pub constant_ratio: ConstantRatioIntegersMoveGenerator,
    pub aggregation: AggregationMoveGenerator,
    pub precedence: PrecedenceMoveGenerator,
    pub variable_bound: VariableBoundMoveGenerator,
    pub soft_selection: SoftSelectionMoveGenerator,
    pub trinomial_exclusive_nor: TrinomialExclusiveNorMoveGenerator,
    pub chain: ChainMoveGenerator,
    pub two_flip: TwoFlipMoveGenerator,
    pub user_defined: UserDefinedMoveGenerator,
}

impl std::fmt::Debug for Neighborhood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Neighborhood")
            .field("number_of_moves", &self.number_of_moves())
            .finish()
    }
}

impl Neighborhood {
    /// Bind every family to the frozen model structure.
    pub fn setup(model: &Model, option: &NeighborhoodOption) -> Self {
        let shape_constraints = |shape: ConstraintShape| -> Vec<ConstraintID> {
            model
                .constraints()
                .iter()
                .filter(|c| c.is_enabled() && c.shape() == shape)
                .map(|c| c.id())
                .collect()
        };
        // a selection group fully owns its members; keep them out of the
        // generic binary family
        let binary_variables: Vec<VariableID> = model
            .variables()
            .iter()
            .filter(|v| {
                !v.is_fixed() && v.sense() == crate::VariableSense::Binary
            })
            .map(|v| v.id())
            .collect();
        let integer_variables: Vec<VariableID> = model
            .variables()
            .iter()
            .filter(|v| !v.is_fixed() && v.sense() == crate::VariableSense::Integer)
            .map(|v| v.id())
            .collect();

        Self {
            binary: BinaryMoveGenerator::new(option.is_enabled_binary_move, binary_variables),
            integer: IntegerMoveGenerator::new(option.is_enabled_integer_move, integer_variables),
            selection: SelectionMoveGenerator::new(
                option.is_enabled_selection_move,
                (0..model.selections().len()).collect(),
            ),
            exclusive_or: ExclusiveOrMoveGenerator::new(
                option.is_enabled_exclusive_or_move,
                shape_constraints(ConstraintShape::ExclusiveOr),
            ),
            exclusive_nor: ExclusiveNorMoveGenerator::new(
                option.is_enabled_exclusive_nor_move,
                shape_constraints(ConstraintShape::ExclusiveNor),
            ),
            inverted_integers: InvertedIntegersMoveGenerator::new(
                option.is_enabled_inverted_integers_move,
                shape_constraints(ConstraintShape::InvertedIntegers),
            ),
            balanced_integers: BalancedIntegersMoveGenerator::new(
                option.is_enabled_balanced_integers_move,
                shape_constraints(ConstraintShape::BalancedIntegers),
            ),
            constant_sum: ConstantSumIntegersMoveGenerator::new(
                option.is_enabled_constant_sum_integers_move,
                shape_constraints(ConstraintShape::ConstantSumIntegers),
            ),
            constant_difference: ConstantDifferenceIntegersMoveGenerator::new(
                option.is_enabled_constant_difference_integers_move,
                shape_constraints(ConstraintShape::ConstantDifferenceIntegers),
            ),
            constant_ratio: ConstantRatioIntegersMoveGenerator::new(
                option.is_enabled_constant_ratio_integers_move,
                shape_constraints(ConstraintShape::ConstantRatioIntegers),
            ),
            aggregation: AggregationMoveGenerator::new(
                option.is_enabled_aggregation_move,
                shape_constraints(ConstraintShape::Aggregation),
            ),
            precedence: PrecedenceMoveGenerator::new(
                option.is_enabled_precedence_move,
                shape_constraints(ConstraintShape::Precedence),
            ),
            variable_bound: VariableBoundMoveGenerator::new(
                option.is_enabled_variable_bound_move,
                shape_constraints(ConstraintShape::VariableBound),
            ),
            soft_selection: SoftSelectionMoveGenerator::new(
                option.is_enabled_soft_selection_move,
                shape_constraints(ConstraintShape::SoftSelection),
            ),
            trinomial_exclusive_nor: TrinomialExclusiveNorMoveGenerator::new(
                option.is_enabled_trinomial_exclusive_nor_move,
                shape_constraints(ConstraintShape::TrinomialExclusiveNor),
            ),
            chain: ChainMoveGenerator::new(
                option.is_enabled_chain_move,
                option.chain_move_reduce_mode,
                option.chain_move_capacity,
            ),
            two_flip: TwoFlipMoveGenerator::new(
                option.is_enabled_two_flip_move,
                model.flippable_pairs().to_vec(),
            ),
            user_defined: UserDefinedMoveGenerator::new(option.is_enabled_user_defined_move),
        }
    }

    fn slots(&mut self) -> Vec<&mut dyn MoveUpdater> {
        vec![
            &mut self.binary,
            &mut self.integer,
            &mut self.selection,
            &mut self.exclusive_or,
            &mut self.exclusive_nor,
            &mut self.inverted_integers,
            &mut self.balanced_integers,
            &mut self.constant_sum,
            &mut self.constant_difference,
            &mut self.constant_ratio,
            &mut self.aggregation,
            &mut self.precedence,
            &mut self.variable_bound,
            &mut self.soft_selection,
            &mut self.trinomial_exclusive_nor,
            &mut self.chain,
            &mut self.two_flip,
            &mut self.user_defined,
        ]
    }

    fn slots_ref(&self) -> Vec<&dyn MoveUpdater> {
        vec![
            &self.binary,
            &self.integer,
            &self.selection,
            &self.exclusive_or,
            &self.exclusive_nor,
            &self.inverted_integers,
            &self.balanced_integers,
            &self.constant_sum,
            &self.constant_difference,
            &self.constant_ratio,
            &self.aggregation,
            &self.precedence,
            &self.variable_bound,
            &self.soft_selection,
            &self.trinomial_exclusive_nor,
            &self.chain,
            &self.two_flip,
            &self.user_defined,
        ]
    }

    /// Rebuild every enabled family's pool. With `parallel`, the family
    /// updates are distributed over the rayon pool; slots are disjoint.
    /// Families skip the rebuild once `deadline` has passed.
    pub fn update_moves(
        &mut self,
        model: &Model,
        acceptance: &MoveAcceptance,
        parallel: bool,
        deadline: Option<Instant>,
    ) {
        let mut slots = self.slots();
        if parallel {
            slots
                .par_iter_mut()
                .for_each(|generator| generator.update_moves(model, acceptance, deadline));
        } else {
            for generator in &mut slots {
                generator.update_moves(model, acceptance, deadline);
            }
        }
    }

    pub fn number_of_moves(&self) -> usize {
        self.slots_ref()
            .iter()
            .map(|generator| generator.pool().len())
            .sum()
    }

    /// Snapshot all admissible moves into a flat candidate vector.
    pub fn collect_admissible(&self, out: &mut Vec<Move>) {
        out.clear();
        for generator in self.slots_ref() {
            let pool = generator.pool();
            for (mv, flag) in pool.moves.iter().zip(&pool.flags) {
                if *flag == 1 {
                    out.push(mv.clone());
                }
            }
        }
    }

    /// True when at least one special (structure-derived) family has moves.
    pub fn has_special_moves(&self) -> bool {
        self.slots_ref()
            .iter()
            .any(|generator| generator.is_special() && !generator.pool().is_empty())
    }
}

/// Object-safe face of a generator family: the slot contract used by the
/// parallel update region.
pub trait MoveUpdater: Send + Sync {
    fn update_moves(&mut self, model: &Model, acceptance: &MoveAcceptance, deadline: Option<Instant>);
    fn pool(&self) -> &MovePool;
    /// Whether this family emits structure-derived (feasibility-neutral)
    /// moves.
    fn is_special(&self) -> bool {
        true
    }
}

pub(crate) fn deadline_passed(deadline: Option<Instant>) -> bool {
    deadline.map(|d| Instant::now() >= d).unwrap_or(false)
}

/// Two-term view of a binomial constraint: `a*x + b*y (sense) rhs`, with the
/// expression constant folded into `rhs`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PairTerms {
    pub x: VariableID,
    pub a: f64,
    pub y: VariableID,
    pub b: f64,
    pub rhs: f64,
}

pub(crate) fn pair_terms(model: &Model, id: ConstraintID) -> Option<PairTerms> {
    let constraint = model.constraint(id);
    let terms = constraint.expression().terms();
    if terms.len() != 2 {
        return None;
    }
    Some(PairTerms {
        x: terms[0].0,
        a: terms[0].1,
        y: terms[1].0,
        b: terms[1].1,
        rhs: constraint.rhs() - constraint.expression().constant(),
    })
}
