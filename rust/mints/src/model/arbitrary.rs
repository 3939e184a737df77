//! [`proptest`] strategies for model components, used by the property tests
//! of the expression cache and the move round-trip law.

use crate::{Expression, VariableID};
use proptest::prelude::*;

/// Linear expressions over variables `0..number_of_variables` with small
/// integer coefficients.
pub fn arbitrary_expression(number_of_variables: usize) -> impl Strategy<Value = Expression> {
    let term = (0..number_of_variables, -5i64..=5).prop_map(|(id, c)| (VariableID::from(id), c as f64));
    (
        proptest::collection::vec(term, 0..=number_of_variables * 2),
        -10i64..=10,
    )
        .prop_map(|(terms, constant)| Expression::new(terms, constant as f64))
}

/// Dense value assignments within `[-bound, bound]`.
pub fn arbitrary_values(
    number_of_variables: usize,
    bound: i64,
) -> impl Strategy<Value = Vec<i64>> {
    proptest::collection::vec(-bound..=bound, number_of_variables)
}
