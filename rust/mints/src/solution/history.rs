use super::DenseSolution;
use fnv::FnvHashSet;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::Write;
use std::path::Path;

/// Bounded FIFO archive of distinct feasible solutions, kept for
/// diversification restarts and for the history JSON output.
#[derive(Debug, Clone)]
pub struct History {
    capacity: usize,
    solutions: VecDeque<DenseSolution>,
    seen: FnvHashSet<Vec<i64>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct HistoryRecord {
    name: String,
    number_of_variables: usize,
    number_of_constraints: usize,
    solutions: Vec<HistorySolutionRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct HistorySolutionRecord {
    is_feasible: bool,
    objective: f64,
    variables: Vec<i64>,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            solutions: VecDeque::with_capacity(capacity),
            seen: Default::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    pub fn solutions(&self) -> impl Iterator<Item = &DenseSolution> {
        self.solutions.iter()
    }

    /// Archive a feasible solution. Duplicates (same variable assignment) are
    /// ignored; on overflow the oldest entry is dropped.
    pub fn push(&mut self, solution: DenseSolution) {
        if !solution.is_feasible || !self.seen.insert(solution.variable_values.clone()) {
            return;
        }
        if self.solutions.len() == self.capacity {
            if let Some(removed) = self.solutions.pop_front() {
                self.seen.remove(&removed.variable_values);
            }
        }
        self.solutions.push_back(solution);
    }

    /// Pick one archived solution for a diversification restart.
    pub fn pick(&self, index: usize) -> Option<&DenseSolution> {
        self.solutions.get(index)
    }

    pub fn to_json(
        &self,
        name: &str,
        number_of_variables: usize,
        number_of_constraints: usize,
    ) -> serde_json::Value {
        let record = HistoryRecord {
            name: name.to_string(),
            number_of_variables,
            number_of_constraints,
            solutions: self
                .solutions
                .iter()
                .map(|s| HistorySolutionRecord {
                    is_feasible: s.is_feasible,
                    objective: s.objective,
                    variables: s.variable_values.clone(),
                })
                .collect(),
        };
        serde_json::to_value(record).expect("history record serializes")
    }

    pub fn write_json(
        &self,
        path: impl AsRef<Path>,
        name: &str,
        number_of_variables: usize,
        number_of_constraints: usize,
    ) -> std::io::Result<()> {
        let mut file = std::fs::File::create(path)?;
        let value = self.to_json(name, number_of_variables, number_of_constraints);
        writeln!(file, "{}", serde_json::to_string_pretty(&value)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feasible(values: Vec<i64>, objective: f64) -> DenseSolution {
        DenseSolution {
            variable_values: values,
            objective,
            total_violation: 0.0,
            is_feasible: true,
        }
    }

    #[test]
    fn rejects_duplicates_and_infeasible() {
        let mut history = History::new(4);
        history.push(feasible(vec![1, 2], 3.0));
        history.push(feasible(vec![1, 2], 3.0));
        history.push(DenseSolution {
            variable_values: vec![9, 9],
            objective: 0.0,
            total_violation: 1.0,
            is_feasible: false,
        });
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn bounded_fifo_reclaims_dedup_slots() {
        let mut history = History::new(2);
        history.push(feasible(vec![1], 1.0));
        history.push(feasible(vec![2], 2.0));
        history.push(feasible(vec![3], 3.0));
        assert_eq!(history.len(), 2);
        // the evicted assignment may be archived again
        history.push(feasible(vec![1], 1.0));
        assert_eq!(history.len(), 2);
        assert_eq!(history.pick(1).unwrap().variable_values, vec![1]);
    }

    #[test]
    fn json_shape() {
        let mut history = History::new(4);
        history.push(feasible(vec![1, 2], 3.0));
        let json = history.to_json("problem", 2, 1);
        assert_eq!(json["name"], "problem");
        assert_eq!(json["number_of_variables"], 2);
        assert_eq!(json["solutions"][0]["is_feasible"], true);
        assert_eq!(json["solutions"][0]["variables"][1], 2);
    }
}
