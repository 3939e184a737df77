#[derive(Debug, Clone)]
pub struct LagrangeDualOption {
    pub is_enabled: bool,
    pub iteration_max: u64,
    pub time_max: f64,
    pub step_size_extend_rate: f64,
    pub step_size_reduce_rate: f64,
    /// Relative stabilization tolerance of the recent-Lagrangian window.
    pub tolerance: f64,
    /// Window length for the stabilization check. Kept as a float for
    /// compatibility with the original option surface; rounded to an integer
    /// queue length at setup.
    pub queue_size: f64,
}

impl Default for LagrangeDualOption {
    fn default() -> Self {
        Self {
            is_enabled: false,
            iteration_max: 10_000,
            time_max: 120.0,
            step_size_extend_rate: 1.05,
            step_size_reduce_rate: 0.95,
            tolerance: 1e-3,
            queue_size: 100.0,
        }
    }
}
