//! Parse pseudo-Boolean OPB/WBO format into a [`Model`](crate::Model).
//!
//! ```no_run
//! # fn main() -> Result<(), mints::pb::PbParseError> {
//! let model = mints::pb::load_file("problem.opb")?;
//! # Ok(()) }
//! ```
//!
//! Supported surface
//! -----------------
//! - an objective line `min: ±k x_i ... ;`
//! - constraint lines `±k x_i ... >= n ;`, `= n ;`, or `<= n ;`
//! - a WBO top-cost line `soft: k ;`
//! - `*` comment lines
//!
//! Product terms `k x_i x_j ...` are linearized by introducing a fresh
//! binary `z = x_i /\ x_j /\ ...` with the standard linking constraints
//! `z <= x_i` and `z >= sum x_i - (n - 1)`. Identical products share one
//! auxiliary variable.

mod parser;

pub use parser::{load_str, PbMetadata};

use crate::Model;
use std::path::Path;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum PbParseError {
    #[error("{file}:{line}: constraint without relational operator")]
    MissingRelation { file: String, line: usize },

    #[error("{file}:{line}: cannot parse token: {token}")]
    InvalidToken {
        file: String,
        line: usize,
        token: String,
    },

    #[error("{file}:{line}: term without coefficient")]
    MissingCoefficient { file: String, line: usize },

    #[error("{file}:{line}: statement is not terminated by ';'")]
    UnterminatedStatement { file: String, line: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Read an OPB/WBO file and build the solver model.
pub fn load_file(path: impl AsRef<Path>) -> Result<Model, PbParseError> {
    let file = path.as_ref().display().to_string();
    let text = std::fs::read_to_string(path)?;
    let (model, metadata) = load_str(&file, &text)?;
    debug!(
        top_cost = ?metadata.top_cost,
        products = metadata.number_of_products,
        "pseudo-Boolean file loaded"
    );
    Ok(model)
}
