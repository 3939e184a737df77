//! Solver configuration, grouped by concern. All fields have defaults;
//! [`SolverOption::validate`] rejects inconsistent settings before a solve
//! starts.

mod general;
mod lagrange_dual;
mod local_search;
mod neighborhood;
mod output;
mod parallel;
mod penalty;
mod preprocess;
mod tabu_search;

pub use general::*;
pub use lagrange_dual::*;
pub use local_search::*;
pub use neighborhood::*;
pub use output::*;
pub use parallel::*;
pub use penalty::*;
pub use preprocess::*;
pub use tabu_search::*;

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum OptionError {
    #[error("{name} must be positive: {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("{name} must be in [{low}, {high}]: {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        low: f64,
        high: f64,
    },

    #[error("penalty_coefficient_relaxing_rate_min({min}) must not exceed max({max})")]
    InvertedRelaxingRateRange { min: f64, max: f64 },
}

#[derive(Debug, Clone, Default)]
pub struct SolverOption {
    pub general: GeneralOption,
    pub preprocess: PreprocessOption,
    pub neighborhood: NeighborhoodOption,
    pub penalty: PenaltyOption,
    pub tabu_search: TabuSearchOption,
    pub lagrange_dual: LagrangeDualOption,
    pub local_search: LocalSearchOption,
    pub output: OutputOption,
    pub parallel: ParallelOption,
}

impl SolverOption {
    pub fn validate(&self) -> Result<(), OptionError> {
        fn positive(name: &'static str, value: f64) -> Result<(), OptionError> {
            if value <= 0.0 {
                return Err(OptionError::NonPositive { name, value });
            }
            Ok(())
        }
        fn in_range(
            name: &'static str,
            value: f64,
            low: f64,
            high: f64,
        ) -> Result<(), OptionError> {
            if !(low..=high).contains(&value) {
                return Err(OptionError::OutOfRange {
                    name,
                    value,
                    low,
                    high,
                });
            }
            Ok(())
        }

        positive("time_max", self.general.time_max)?;
        positive(
            "initial_penalty_coefficient",
            self.penalty.initial_penalty_coefficient,
        )?;
        in_range(
            "penalty_coefficient_relaxing_rate",
            self.penalty.penalty_coefficient_relaxing_rate,
            0.0,
            1.0,
        )?;
        if self.penalty.penalty_coefficient_tightening_rate < 1.0 {
            return Err(OptionError::OutOfRange {
                name: "penalty_coefficient_tightening_rate",
                value: self.penalty.penalty_coefficient_tightening_rate,
                low: 1.0,
                high: f64::INFINITY,
            });
        }
        if self.penalty.penalty_coefficient_relaxing_rate_min
            > self.penalty.penalty_coefficient_relaxing_rate_max
        {
            return Err(OptionError::InvertedRelaxingRateRange {
                min: self.penalty.penalty_coefficient_relaxing_rate_min,
                max: self.penalty.penalty_coefficient_relaxing_rate_max,
            });
        }
        in_range(
            "move_preserve_rate",
            self.tabu_search.move_preserve_rate,
            0.0,
            1.0,
        )?;
        in_range(
            "decay_factor_move_update",
            self.parallel.decay_factor_move_update,
            0.0,
            1.0,
        )?;
        in_range(
            "decay_factor_move_evaluation",
            self.parallel.decay_factor_move_evaluation,
            0.0,
            1.0,
        )?;
        positive("lagrange_dual.tolerance", self.lagrange_dual.tolerance)?;
        positive("lagrange_dual.queue_size", self.lagrange_dual.queue_size)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(SolverOption::default().validate().is_ok());
    }

    #[test]
    fn non_positive_time_max_is_rejected() {
        let mut option = SolverOption::default();
        option.general.time_max = 0.0;
        assert!(matches!(
            option.validate(),
            Err(OptionError::NonPositive { name: "time_max", .. })
        ));
    }

    #[test]
    fn tightening_rate_below_one_is_rejected() {
        let mut option = SolverOption::default();
        option.penalty.penalty_coefficient_tightening_rate = 0.5;
        assert!(option.validate().is_err());
    }

    #[test]
    fn inverted_relaxing_range_is_rejected() {
        let mut option = SolverOption::default();
        option.penalty.penalty_coefficient_relaxing_rate_min = 0.9;
        option.penalty.penalty_coefficient_relaxing_rate_max = 0.2;
        assert!(matches!(
            option.validate(),
            Err(OptionError::InvertedRelaxingRateRange { .. })
        ));
    }
}
