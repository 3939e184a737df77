//! Solution records: scores, dense and name-indexed solutions, incumbents,
//! and the feasible-solution archive.

mod history;
mod incumbent;
mod named;
mod score;
mod trend;

pub use history::*;
pub use incumbent::*;
pub use named::*;
pub use score::*;
pub use trend::*;

use crate::{ATol, Model};

/// Flat snapshot of all variable values with summary figures.
///
/// `objective` is in the user's original sense.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseSolution {
    pub variable_values: Vec<i64>,
    pub objective: f64,
    pub total_violation: f64,
    pub is_feasible: bool,
}

impl DenseSolution {
    pub fn from_model(model: &Model, atol: ATol) -> Self {
        Self {
            variable_values: model.values(),
            objective: model.objective().user_value(),
            total_violation: model.total_violation(),
            is_feasible: model.is_feasible(atol),
        }
    }
}
