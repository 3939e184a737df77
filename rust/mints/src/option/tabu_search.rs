/// Whether a multi-variable move is tabu when *all* of its altered variables
/// are tabu, or when *any* of them is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TabuMode {
    #[default]
    All,
    Any,
}

/// Neighborhood pre-filter strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImprovabilityScreeningMode {
    Off,
    Soft,
    Aggressive,
    Intensive,
    /// Pick between the other modes from recent-episode statistics.
    #[default]
    Automatic,
}

#[derive(Debug, Clone)]
pub struct TabuSearchOption {
    pub iteration_max: u64,
    pub initial_tabu_tenure: u64,
    pub tabu_mode: TabuMode,
    pub improvability_screening_mode: ImprovabilityScreeningMode,

    /// Candidate-move count above which the neighborhood is randomly
    /// subsampled down to the threshold.
    pub pruning_rate_threshold: f64,
    /// Fraction of candidate moves retained by the subsample.
    pub move_preserve_rate: f64,

    /// Variables randomly perturbed at episode start to escape the previous
    /// basin.
    pub number_of_initial_modification: u64,

    pub is_enabled_automatic_tabu_tenure_adjustment: bool,
    pub is_enabled_automatic_break: bool,
    pub ignore_tabu_if_global_incumbent: bool,

    pub tabu_tenure_min: u64,
    pub tabu_tenure_max: u64,
    /// Window for the automatic break and the tenure oscillation estimate.
    pub automatic_break_window: usize,
}

impl Default for TabuSearchOption {
    fn default() -> Self {
        Self {
            iteration_max: 200,
            initial_tabu_tenure: 10,
            tabu_mode: TabuMode::All,
            improvability_screening_mode: ImprovabilityScreeningMode::Automatic,
            pruning_rate_threshold: 3e4,
            move_preserve_rate: 1.0,
            number_of_initial_modification: 0,
            is_enabled_automatic_tabu_tenure_adjustment: true,
            is_enabled_automatic_break: true,
            ignore_tabu_if_global_incumbent: true,
            tabu_tenure_min: 2,
            tabu_tenure_max: 100,
            automatic_break_window: 30,
        }
    }
}
