#[derive(Debug, Clone)]
pub struct GeneralOption {
    pub iteration_max: u64,
    /// Wall-clock budget in seconds.
    pub time_max: f64,
    /// Time already consumed before `solve` was entered, e.g. by parsing.
    pub time_offset: f64,
    /// Stop as soon as a feasible solution reaches this (user-sense)
    /// objective value.
    pub target_objective_value: f64,
    pub seed: u64,
    /// Use incremental move evaluation; turned off only for debugging against
    /// full re-evaluation.
    pub is_enabled_fast_evaluation: bool,
}

impl Default for GeneralOption {
    fn default() -> Self {
        Self {
            iteration_max: 1_000_000_000,
            time_max: 300.0,
            time_offset: 0.0,
            target_objective_value: f64::NEG_INFINITY,
            seed: 1,
            is_enabled_fast_evaluation: true,
        }
    }
}
