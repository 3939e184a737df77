//! Parse MPS format into a [`Model`](crate::Model).
//!
//! ```no_run
//! # fn main() -> Result<(), mints::mps::MpsParseError> {
//! let model = mints::mps::load_file("problem.mps")?;
//! # Ok(()) }
//! ```
//!
//! Differences from the original fixed format
//! -------------------------------------------
//! MPS is an old fixed-column format, but most data in the wild (including
//! the MIPLIB benchmark set) does not respect the column positions, so the
//! sections are parsed as whitespace-separated fields:
//!
//! - `LI` is accepted as a lower (negative) integer bound and `UI` as an
//!   upper (positive) integer bound in the `BOUNDS` section.
//! - `PL` is treated as `FR`.
//! - An integer column bounded to `[0, 1]` is promoted to binary.
//!
//! Since the solver is integer-only, columns left continuous after the
//! `BOUNDS` section are rejected.

mod convert;
mod parser;

pub use parser::{Mps, MpsObjectiveSense};

use crate::Model;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum MpsParseError {
    #[error("{file}:{line}: unknown row name: {name}")]
    UnknownRowName {
        file: String,
        line: usize,
        name: String,
    },

    #[error("{file}:{line}: invalid row type: {field}")]
    InvalidRowType {
        file: String,
        line: usize,
        field: String,
    },

    #[error("{file}:{line}: invalid bound type: {field}")]
    InvalidBoundType {
        file: String,
        line: usize,
        field: String,
    },

    #[error("{file}:{line}: invalid section header: {header}")]
    InvalidHeader {
        file: String,
        line: usize,
        header: String,
    },

    #[error("{file}:{line}: invalid marker in COLUMNS section: {field}")]
    InvalidMarker {
        file: String,
        line: usize,
        field: String,
    },

    #[error("{file}:{line}: invalid OBJSENSE: {field}")]
    InvalidObjSense {
        file: String,
        line: usize,
        field: String,
    },

    #[error("{file}:{line}: truncated record")]
    TruncatedRecord { file: String, line: usize },

    #[error("{file}:{line}: cannot parse number: {field}")]
    InvalidNumber {
        file: String,
        line: usize,
        field: String,
    },

    #[error("column {name} is continuous; only integer and binary variables are supported")]
    ContinuousVariable { name: String },

    #[error("column {name} has an empty bound [{lower}, {upper}]")]
    EmptyBound {
        name: String,
        lower: f64,
        upper: f64,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Read an MPS file and build the solver model.
pub fn load_file(path: impl AsRef<Path>) -> Result<Model, MpsParseError> {
    let mps = Mps::load(path)?;
    convert::convert(mps)
}

/// Parse MPS text already in memory.
pub fn load_str(name: &str, text: &str) -> Result<Model, MpsParseError> {
    let mps = Mps::parse_lines(name, text.lines())?;
    convert::convert(mps)
}
