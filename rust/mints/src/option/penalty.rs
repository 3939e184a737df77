#[derive(Debug, Clone)]
pub struct PenaltyOption {
    pub initial_penalty_coefficient: f64,
    /// Multiplier (`< 1`) applied to never-violated constraints between
    /// episodes.
    pub penalty_coefficient_relaxing_rate: f64,
    /// Multiplier (`> 1`) applied to constraints violated in the episode's
    /// best-local solution.
    pub penalty_coefficient_tightening_rate: f64,

    // Online adaptation bounds for the relaxing rate itself.
    pub penalty_coefficient_relaxing_rate_min: f64,
    pub penalty_coefficient_relaxing_rate_max: f64,
    pub penalty_coefficient_relaxing_rate_increase_rate: f64,
    pub penalty_coefficient_relaxing_rate_decrease_rate: f64,

    /// Share one coefficient among all constraints of the same shape.
    pub is_enabled_group_penalty_coefficient: bool,
    /// After the first feasible solution, pull coefficients toward the
    /// smallest value that kept it feasible.
    pub is_enabled_shrink_penalty_coefficient: bool,

    pub is_enabled_inner_stagnation_breaker: bool,
    pub is_enabled_outer_stagnation_breaker: bool,
    /// Episodes without local-incumbent improvement before coefficients are
    /// reset.
    pub inner_stagnation_threshold: u64,
    /// Outer iterations without global-incumbent improvement before the
    /// search diversifies from the feasible-solution archive.
    pub outer_stagnation_threshold: u64,
}

impl Default for PenaltyOption {
    fn default() -> Self {
        Self {
            initial_penalty_coefficient: 1e7,
            penalty_coefficient_relaxing_rate: 0.9,
            penalty_coefficient_tightening_rate: 1.1,
            penalty_coefficient_relaxing_rate_min: 0.1,
            penalty_coefficient_relaxing_rate_max: 0.99,
            penalty_coefficient_relaxing_rate_increase_rate: 1.1,
            penalty_coefficient_relaxing_rate_decrease_rate: 0.9,
            is_enabled_group_penalty_coefficient: false,
            is_enabled_shrink_penalty_coefficient: true,
            is_enabled_inner_stagnation_breaker: true,
            is_enabled_outer_stagnation_breaker: true,
            inner_stagnation_threshold: 20,
            outer_stagnation_threshold: 80,
        }
    }
}
