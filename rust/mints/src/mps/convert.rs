use super::parser::{Mps, MpsObjectiveSense};
use super::MpsParseError;
use crate::{Expr, Model, INT_MAX, INT_MIN};

/// Build a solver [`Model`] from parsed MPS content.
///
/// Every column becomes a scalar integer variable named after the column;
/// binary columns get `[0, 1]`. A column with neither an integer marker nor
/// a `BV`/`UI`/`LI` bound is continuous and rejected.
pub(super) fn convert(mps: Mps) -> Result<Model, MpsParseError> {
    let mut model = Model::new(&mps.name);

    for column in &mps.columns {
        if mps.continuous.contains(column) && !mps.binary.contains(column) {
            return Err(MpsParseError::ContinuousVariable {
                name: column.clone(),
            });
        }
        let (lower, upper) = if mps.binary.contains(column) {
            (0.0, 1.0)
        } else {
            let lower = mps.lower.get(column).copied().unwrap_or(0.0);
            let upper = mps.upper.get(column).copied().unwrap_or(f64::INFINITY);
            (lower, upper)
        };
        if lower > upper {
            return Err(MpsParseError::EmptyBound {
                name: column.clone(),
                lower,
                upper,
            });
        }
        let lower = clamp_bound(lower);
        let upper = clamp_bound(upper);
        model
            .create_variable(column, lower, upper)
            .expect("bounds were checked and names are unique");
    }

    for row in &mps.row_order {
        let Some(terms) = mps.rows.get(row) else {
            continue;
        };
        let mut expr = Expr::new();
        for (column, coefficient) in terms {
            let id = model
                .variable_id_by_name(column)
                .expect("all columns were registered");
            expr = expr.plus_term(id, *coefficient);
        }
        let rhs = mps.rhs.get(row).copied().unwrap_or(0.0);
        let proto = if mps.equal.contains(row) {
            expr.eq(rhs)
        } else if mps.greater.contains(row) {
            expr.ge(rhs)
        } else {
            expr.le(rhs)
        };
        model
            .add_constraint(row, proto)
            .expect("row names are unique");
    }

    let mut objective = Expr::new();
    for (column, coefficient) in &mps.objective {
        let id = model
            .variable_id_by_name(column)
            .expect("all columns were registered");
        objective = objective.plus_term(id, *coefficient);
    }
    match mps.objective_sense {
        MpsObjectiveSense::Minimize => model.minimize(objective),
        MpsObjectiveSense::Maximize => model.maximize(objective),
    }
    Ok(model)
}

fn clamp_bound(bound: f64) -> i64 {
    if bound <= INT_MIN as f64 {
        INT_MIN
    } else if bound >= INT_MAX as f64 {
        INT_MAX
    } else {
        bound.round() as i64
    }
}
