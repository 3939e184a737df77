use crate::{ATol, Model};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// Values of one named variable array, flat in row-major order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedArrayValues {
    pub values: Vec<i64>,
    pub shape: Vec<usize>,
}

/// Name-indexed solution record; the JSON surface of a solve.
///
/// `objective` is in the user's original sense. `constraints` maps each
/// constraint name to its left-hand value and `violations` to its violation
/// magnitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSolution {
    pub name: String,
    pub objective: f64,
    pub is_feasible: bool,
    pub total_violation: f64,
    pub variables: BTreeMap<String, NamedArrayValues>,
    pub constraints: BTreeMap<String, f64>,
    pub violations: BTreeMap<String, f64>,
}

impl NamedSolution {
    /// Capture the model's current state.
    pub fn from_model(model: &Model, atol: ATol) -> Self {
        let mut variables = BTreeMap::new();
        for array in model.variable_arrays() {
            let values = array
                .ids()
                .iter()
                .map(|id| model.variable(*id).value())
                .collect();
            variables.insert(
                array.name().to_string(),
                NamedArrayValues {
                    values,
                    shape: array.shape().to_vec(),
                },
            );
        }
        let mut constraints = BTreeMap::new();
        let mut violations = BTreeMap::new();
        for constraint in model.constraints() {
            constraints.insert(
                constraint.name().to_string(),
                constraint.expression().value(),
            );
            violations.insert(constraint.name().to_string(), constraint.violation());
        }
        Self {
            name: model.name().to_string(),
            objective: model.objective().user_value(),
            is_feasible: model.is_feasible(atol),
            total_violation: model.total_violation(),
            variables,
            constraints,
            violations,
        }
    }

    /// Flat value of a named element, e.g. `values("x")[0]`.
    pub fn values(&self, array_name: &str) -> &[i64] {
        self.variables
            .get(array_name)
            .map(|array| array.values.as_slice())
            .unwrap_or(&[])
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let mut file = std::fs::File::create(path)?;
        writeln!(file, "{}", serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
