/// Per-pass toggles for the presolver. Everything defaults to enabled.
#[derive(Debug, Clone)]
pub struct PreprocessOption {
    pub is_enabled_presolve: bool,
    pub is_enabled_bound_tightening: bool,
    pub is_enabled_fix_on_tight_bound: bool,
    pub is_enabled_duplicate_constraint_removal: bool,
    pub is_enabled_redundancy_elimination: bool,
    pub is_enabled_implicit_equality_extraction: bool,
    pub is_enabled_dependent_variable_extraction: bool,
    pub is_enabled_initial_value_correction: bool,
}

impl Default for PreprocessOption {
    fn default() -> Self {
        Self {
            is_enabled_presolve: true,
            is_enabled_bound_tightening: true,
            is_enabled_fix_on_tight_bound: true,
            is_enabled_duplicate_constraint_removal: true,
            is_enabled_redundancy_elimination: true,
            is_enabled_implicit_equality_extraction: true,
            is_enabled_dependent_variable_extraction: true,
            is_enabled_initial_value_correction: true,
        }
    }
}
