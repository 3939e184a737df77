use super::{DenseSolution, SolutionScore};

/// Update-status bitmask returned by [`IncumbentHolder::try_update`].
pub mod update_status {
    pub const NONE: u8 = 0;
    pub const LOCAL_IMPROVED: u8 = 1;
    pub const GLOBAL_IMPROVED: u8 = 1 << 1;
    pub const FEASIBLE_IMPROVED: u8 = 1 << 2;
}

/// Best-known solutions of a run.
///
/// Three incumbents are tracked: best local augmented objective (reset at
/// each episode start), best global augmented objective, and best feasible
/// objective. Incumbents never worsen; once set they only improve.
#[derive(Debug, Clone, Default)]
pub struct IncumbentHolder {
    local_augmented: Option<(DenseSolution, SolutionScore)>,
    global_augmented: Option<(DenseSolution, SolutionScore)>,
    feasible: Option<(DenseSolution, SolutionScore)>,
}

impl IncumbentHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local_augmented(&self) -> Option<&(DenseSolution, SolutionScore)> {
        self.local_augmented.as_ref()
    }

    pub fn global_augmented(&self) -> Option<&(DenseSolution, SolutionScore)> {
        self.global_augmented.as_ref()
    }

    pub fn feasible(&self) -> Option<&(DenseSolution, SolutionScore)> {
        self.feasible.as_ref()
    }

    pub fn global_augmented_objective(&self) -> f64 {
        self.global_augmented
            .as_ref()
            .map(|(_, score)| score.global_augmented_objective)
            .unwrap_or(f64::INFINITY)
    }

    pub fn feasible_objective(&self) -> f64 {
        self.feasible
            .as_ref()
            .map(|(_, score)| score.objective)
            .unwrap_or(f64::INFINITY)
    }

    /// Forget the local incumbent; called at each episode start.
    pub fn reset_local(&mut self) {
        self.local_augmented = None;
    }

    /// Offer a solution; each incumbent is replaced when strictly improved.
    /// Returns the bitmask of which incumbents improved.
    pub fn try_update(&mut self, solution: &DenseSolution, score: &SolutionScore) -> u8 {
        let mut status = update_status::NONE;

        let local_improved = self
            .local_augmented
            .as_ref()
            .map(|(_, s)| score.local_augmented_objective < s.local_augmented_objective)
            .unwrap_or(true);
        if local_improved {
            self.local_augmented = Some((solution.clone(), *score));
            status |= update_status::LOCAL_IMPROVED;
        }

        let global_improved = self
            .global_augmented
            .as_ref()
            .map(|(_, s)| score.global_augmented_objective < s.global_augmented_objective)
            .unwrap_or(true);
        if global_improved {
            self.global_augmented = Some((solution.clone(), *score));
            status |= update_status::GLOBAL_IMPROVED;
        }

        if score.is_feasible {
            let feasible_improved = self
                .feasible
                .as_ref()
                .map(|(_, s)| score.objective < s.objective)
                .unwrap_or(true);
            if feasible_improved {
                self.feasible = Some((solution.clone(), *score));
                status |= update_status::FEASIBLE_IMPROVED;
            }
        }

        status
    }

    /// The solution to report: the feasible incumbent when one exists,
    /// otherwise the lowest-violation (global augmented) incumbent.
    pub fn reportable(&self) -> Option<&(DenseSolution, SolutionScore)> {
        self.feasible.as_ref().or(self.global_augmented.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(objective: f64, violation: f64) -> (DenseSolution, SolutionScore) {
        let score = SolutionScore {
            objective,
            total_violation: violation,
            local_penalty: violation * 10.0,
            global_penalty: violation * 10.0,
            local_augmented_objective: objective + violation * 10.0,
            global_augmented_objective: objective + violation * 10.0,
            is_feasible: violation == 0.0,
            ..Default::default()
        };
        let solution = DenseSolution {
            variable_values: vec![objective as i64],
            objective,
            total_violation: violation,
            is_feasible: violation == 0.0,
        };
        (solution, score)
    }

    #[test]
    fn first_offer_sets_all_applicable() {
        let mut holder = IncumbentHolder::new();
        let (solution, score) = candidate(5.0, 0.0);
        let status = holder.try_update(&solution, &score);
        assert_eq!(
            status,
            update_status::LOCAL_IMPROVED
                | update_status::GLOBAL_IMPROVED
                | update_status::FEASIBLE_IMPROVED
        );
        assert_eq!(holder.feasible_objective(), 5.0);
    }

    #[test]
    fn incumbents_never_worsen() {
        let mut holder = IncumbentHolder::new();
        let (solution, score) = candidate(5.0, 0.0);
        holder.try_update(&solution, &score);

        let (worse_solution, worse_score) = candidate(7.0, 0.0);
        let status = holder.try_update(&worse_solution, &worse_score);
        assert_eq!(status, update_status::NONE);
        assert_eq!(holder.feasible_objective(), 5.0);

        let (better_solution, better_score) = candidate(3.0, 0.0);
        let status = holder.try_update(&better_solution, &better_score);
        assert_ne!(status & update_status::FEASIBLE_IMPROVED, 0);
        assert_eq!(holder.feasible_objective(), 3.0);
    }

    #[test]
    fn infeasible_solution_never_takes_feasible_slot() {
        let mut holder = IncumbentHolder::new();
        let (solution, score) = candidate(1.0, 2.0);
        let status = holder.try_update(&solution, &score);
        assert_eq!(status & update_status::FEASIBLE_IMPROVED, 0);
        assert!(holder.feasible().is_none());
        assert!(holder.reportable().is_some());
    }

    #[test]
    fn reset_local_only_clears_local() {
        let mut holder = IncumbentHolder::new();
        let (solution, score) = candidate(5.0, 0.0);
        holder.try_update(&solution, &score);
        holder.reset_local();
        assert!(holder.local_augmented().is_none());
        assert!(holder.global_augmented().is_some());
    }
}
