use crate::{Expr, VariableID};
use itertools::Itertools;
use std::ops::Index;

/// Name-indexed multidimensional array of decision variables.
///
/// Storage is flat in row-major order; element names render as
/// `name[i]` / `name[i,j]` / ... so that solution files and MPS round-trips
/// stay human readable. A zero-dimensional array is a scalar variable whose
/// name carries no subscripts.
#[derive(Debug, Clone)]
pub struct VariableArray {
    name: String,
    shape: Vec<usize>,
    ids: Vec<VariableID>,
}

impl VariableArray {
    pub(crate) fn new(name: &str, shape: Vec<usize>, ids: Vec<VariableID>) -> Self {
        debug_assert_eq!(shape.iter().product::<usize>().max(1), ids.len());
        Self {
            name: name.to_string(),
            shape,
            ids,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[VariableID] {
        &self.ids
    }

    /// Flat row-major index of `subscripts`.
    pub fn flat_index(&self, subscripts: &[usize]) -> usize {
        assert_eq!(
            subscripts.len(),
            self.shape.len(),
            "subscript rank mismatch for {}",
            self.name
        );
        let mut index = 0;
        for (subscript, extent) in subscripts.iter().zip(&self.shape) {
            assert!(
                subscript < extent,
                "subscript out of range for {}: {subscript} >= {extent}",
                self.name
            );
            index = index * extent + subscript;
        }
        index
    }

    /// Variable at the given multidimensional subscripts.
    pub fn at(&self, subscripts: &[usize]) -> VariableID {
        self.ids[self.flat_index(subscripts)]
    }

    /// Render the element name, e.g. `x[1,2]`.
    pub fn element_name(&self, flat: usize) -> String {
        if self.shape.is_empty() {
            return self.name.clone();
        }
        let mut subscripts = vec![0; self.shape.len()];
        let mut remainder = flat;
        for axis in (0..self.shape.len()).rev() {
            subscripts[axis] = remainder % self.shape[axis];
            remainder /= self.shape[axis];
        }
        format!("{}[{}]", self.name, subscripts.iter().join(","))
    }

    /// `sum_i x_i`
    pub fn sum(&self) -> Expr {
        let mut expr = Expr::new();
        for &id in &self.ids {
            expr = expr.plus_term(id, 1.0);
        }
        expr
    }

    /// `sum_i w_i x_i`
    pub fn dot(&self, weights: &[f64]) -> Expr {
        assert_eq!(weights.len(), self.ids.len());
        let mut expr = Expr::new();
        for (&id, &weight) in self.ids.iter().zip(weights) {
            expr = expr.plus_term(id, weight);
        }
        expr
    }

    /// One-hot constraint `sum_i x_i = 1` over all elements.
    pub fn selection(&self) -> crate::ConstraintProto {
        self.sum().eq(1.0)
    }
}

impl Index<usize> for VariableArray {
    type Output = VariableID;
    fn index(&self, index: usize) -> &Self::Output {
        &self.ids[index]
    }
}
