#[derive(Debug, Clone)]
pub struct LocalSearchOption {
    pub is_enabled: bool,
    pub iteration_max: u64,
}

impl Default for LocalSearchOption {
    fn default() -> Self {
        Self {
            is_enabled: true,
            iteration_max: 10_000,
        }
    }
}
