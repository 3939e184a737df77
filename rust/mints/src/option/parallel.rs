#[derive(Debug, Clone)]
pub struct ParallelOption {
    pub is_enabled_move_update_parallelization: bool,
    pub is_enabled_move_evaluation_parallelization: bool,

    /// Let the solver grow the pools online when the decayed average of the
    /// candidate-move count exceeds its activation threshold.
    pub is_enabled_automatic_move_update_parallelization: bool,
    pub is_enabled_automatic_move_evaluation_parallelization: bool,
    pub decay_factor_move_update: f64,
    pub decay_factor_move_evaluation: f64,

    /// Worker counts; `0` means one worker per available core.
    pub number_of_threads_move_update: usize,
    pub number_of_threads_move_evaluation: usize,
}

impl Default for ParallelOption {
    fn default() -> Self {
        Self {
            is_enabled_move_update_parallelization: true,
            is_enabled_move_evaluation_parallelization: true,
            is_enabled_automatic_move_update_parallelization: true,
            is_enabled_automatic_move_evaluation_parallelization: true,
            decay_factor_move_update: 0.5,
            decay_factor_move_evaluation: 0.5,
            number_of_threads_move_update: 0,
            number_of_threads_move_evaluation: 0,
        }
    }
}
