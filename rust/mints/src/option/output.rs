/// Logging verbosity, mapped onto `tracing` levels by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbose {
    #[default]
    Off,
    Warning,
    Outer,
    Full,
    Debug,
}

#[derive(Debug, Clone)]
pub struct OutputOption {
    pub verbose: Verbose,
    pub is_enabled_write_trend: bool,
    pub is_enabled_store_feasible_solutions: bool,
    pub feasible_solutions_capacity: usize,
    pub trend_file_name: Option<String>,
}

impl Default for OutputOption {
    fn default() -> Self {
        Self {
            verbose: Verbose::Off,
            is_enabled_write_trend: false,
            is_enabled_store_feasible_solutions: true,
            feasible_solutions_capacity: 1000,
            trend_file_name: None,
        }
    }
}
