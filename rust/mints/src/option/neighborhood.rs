use crate::SelectionMode;

/// Reduction strategy when the chain-move pool exceeds its capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainMoveReduceMode {
    /// Keep the moves with the smallest per-variable overlap rate.
    #[default]
    OverlapRate,
    /// Keep a random subset.
    Shuffle,
}

/// Per-family enablement of the move catalogue.
#[derive(Debug, Clone)]
pub struct NeighborhoodOption {
    pub is_enabled_binary_move: bool,
    pub is_enabled_integer_move: bool,
    pub is_enabled_selection_move: bool,
    pub is_enabled_exclusive_or_move: bool,
    pub is_enabled_exclusive_nor_move: bool,
    pub is_enabled_inverted_integers_move: bool,
    pub is_enabled_balanced_integers_move: bool,
    pub is_enabled_constant_sum_integers_move: bool,
    pub is_enabled_constant_difference_integers_move: bool,
    pub is_enabled_constant_ratio_integers_move: bool,
    pub is_enabled_aggregation_move: bool,
    pub is_enabled_precedence_move: bool,
    pub is_enabled_variable_bound_move: bool,
    pub is_enabled_soft_selection_move: bool,
    pub is_enabled_trinomial_exclusive_nor_move: bool,
    pub is_enabled_chain_move: bool,
    pub is_enabled_two_flip_move: bool,
    pub is_enabled_user_defined_move: bool,

    pub selection_mode: SelectionMode,
    pub chain_move_reduce_mode: ChainMoveReduceMode,
    pub chain_move_capacity: usize,
}

impl Default for NeighborhoodOption {
    fn default() -> Self {
        Self {
            is_enabled_binary_move: true,
            is_enabled_integer_move: true,
            is_enabled_selection_move: true,
            is_enabled_exclusive_or_move: true,
            is_enabled_exclusive_nor_move: true,
            is_enabled_inverted_integers_move: true,
            is_enabled_balanced_integers_move: true,
            is_enabled_constant_sum_integers_move: true,
            is_enabled_constant_difference_integers_move: true,
            is_enabled_constant_ratio_integers_move: true,
            is_enabled_aggregation_move: true,
            is_enabled_precedence_move: true,
            is_enabled_variable_bound_move: true,
            is_enabled_soft_selection_move: true,
            is_enabled_trinomial_exclusive_nor_move: true,
            is_enabled_chain_move: true,
            is_enabled_two_flip_move: false,
            is_enabled_user_defined_move: false,
            selection_mode: SelectionMode::Defined,
            chain_move_reduce_mode: ChainMoveReduceMode::OverlapRate,
            chain_move_capacity: 10_000,
        }
    }
}
