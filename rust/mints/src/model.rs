//! Model arena: variables, constraints, objective, and the frozen structure
//! used by the search engine.

mod arbitrary;
mod constraint;
mod expression;
mod multi_array;
mod objective;
mod structure;
mod variable;

pub use arbitrary::*;
pub use constraint::*;
pub use expression::*;
pub use multi_array::*;
pub use objective::*;
pub use structure::*;
pub use variable::*;

use crate::{utility::BidirectionalMap, ATol};
use fnv::FnvHashSet;
use smallvec::SmallVec;

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error(transparent)]
    Variable(#[from] VariableError),

    #[error("Variable name {0} is already defined")]
    DuplicateVariableName(String),

    #[error("Constraint name {0} is already defined")]
    DuplicateConstraintName(String),

    #[error("Unknown variable name: {0}")]
    UnknownVariableName(String),
}

/// Dependent variable definition extracted by the presolver.
///
/// The variable's value is `expression` evaluated over its defining
/// variables; the defining equality is disabled because the definition keeps
/// it satisfied. Extraction guarantees the dependent variable appears in no
/// other enabled constraint and not in the objective, so its updates never
/// cascade.
#[derive(Debug, Clone)]
pub struct DependentVariable {
    pub variable: VariableID,
    pub constraint: ConstraintID,
    pub expression: Expression,
}

/// A complete integer linear program.
///
/// Invariants (after [`Model::setup_structure`])
/// ----------
/// - Arena indices equal IDs: `variables[i].id() == VariableID::from(i)`.
/// - Every variable's `related` list names exactly the constraints whose
///   expressions reference it, with the referencing coefficient.
/// - Expression value caches and constraint violations are consistent with
///   the current variable values; `total_violation` is their sum.
#[derive(Debug, Clone, Default)]
pub struct Model {
    name: String,
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: Objective,

    variable_names: BidirectionalMap,
    constraint_names: BidirectionalMap,
    variable_arrays: Vec<VariableArray>,

    selections: Vec<Selection>,
    dependents: Vec<DependentVariable>,
    flippable_pairs: Vec<(VariableID, VariableID)>,
    user_defined_selection_names: FnvHashSet<String>,

    total_violation: f64,
    is_structure_ready: bool,
    is_consumed: bool,
}

impl Model {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    // ------------------------------------------------------------------
    // construction
    // ------------------------------------------------------------------

    pub fn create_variable(
        &mut self,
        name: &str,
        lower: i64,
        upper: i64,
    ) -> Result<VariableID, ModelError> {
        let array = self.create_variables(name, &[], lower, upper)?;
        Ok(array[0])
    }

    /// Create a named multidimensional variable array. An empty shape creates
    /// a scalar.
    pub fn create_variables(
        &mut self,
        name: &str,
        shape: &[usize],
        lower: i64,
        upper: i64,
    ) -> Result<VariableArray, ModelError> {
        let count = shape.iter().product::<usize>().max(1);
        let mut ids = Vec::with_capacity(count);
        let array = VariableArray::new(name, shape.to_vec(), vec![VariableID::from(0); count]);
        for flat in 0..count {
            let element = array.element_name(flat);
            if self.variable_names.contains(&element) {
                return Err(ModelError::DuplicateVariableName(element));
            }
            let id = VariableID::from(self.variables.len());
            self.variable_names.insert(&element);
            self.variables
                .push(Variable::new(id, &element, lower, upper)?);
            ids.push(id);
        }
        let array = VariableArray::new(name, shape.to_vec(), ids);
        self.variable_arrays.push(array.clone());
        Ok(array)
    }

    pub fn add_constraint(
        &mut self,
        name: &str,
        proto: ConstraintProto,
    ) -> Result<ConstraintID, ModelError> {
        if self.constraint_names.contains(name) {
            return Err(ModelError::DuplicateConstraintName(name.to_string()));
        }
        let id = ConstraintID::from(self.constraints.len());
        self.constraint_names.insert(name);
        self.constraints.push(Constraint::new(
            id,
            name,
            proto.expression.build(),
            proto.sense,
            proto.rhs,
        ));
        Ok(id)
    }

    pub fn minimize(&mut self, expression: Expr) {
        self.objective = Objective::new(expression.build(), ObjectiveSense::Minimize);
    }

    pub fn maximize(&mut self, expression: Expr) {
        self.objective = Objective::new(expression.build(), ObjectiveSense::Maximize);
    }

    /// Set a starting value, clipping into the variable's bound.
    pub fn set_initial_value(&mut self, id: VariableID, value: i64) {
        let variable = &mut self.variables[id.into_inner()];
        if variable.is_fixed() {
            return;
        }
        let clipped = value.clamp(variable.lower(), variable.upper());
        variable
            .set_value(clipped)
            .expect("clipped value is in bound");
    }

    pub fn set_initial_value_by_name(&mut self, name: &str, value: i64) -> Result<(), ModelError> {
        let id = self
            .variable_id_by_name(name)
            .ok_or_else(|| ModelError::UnknownVariableName(name.to_string()))?;
        self.set_initial_value(id, value);
        Ok(())
    }

    pub fn register_flippable_pair(&mut self, first: VariableID, second: VariableID) {
        self.flippable_pairs.push((first, second));
    }

    /// Fix a variable at `value` before the solve, collapsing its bound.
    pub fn fix_variable(&mut self, id: VariableID, value: i64) -> Result<(), VariableError> {
        self.variables[id.into_inner()].fix_to(value)
    }

    /// Name a constraint whose one-hot group should be promoted under
    /// [`SelectionMode::UserDefined`].
    pub fn register_user_defined_selection(&mut self, constraint_name: &str) {
        self.user_defined_selection_names
            .insert(constraint_name.to_string());
    }

    pub fn user_defined_selection_names(&self) -> &FnvHashSet<String> {
        &self.user_defined_selection_names
    }

    // ------------------------------------------------------------------
    // accessors
    // ------------------------------------------------------------------

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub(crate) fn variables_mut(&mut self) -> &mut [Variable] {
        &mut self.variables
    }

    pub(crate) fn constraints_mut(&mut self) -> &mut [Constraint] {
        &mut self.constraints
    }

    pub fn variable(&self, id: VariableID) -> &Variable {
        &self.variables[id.into_inner()]
    }

    pub fn constraint(&self, id: ConstraintID) -> &Constraint {
        &self.constraints[id.into_inner()]
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    pub fn dependents(&self) -> &[DependentVariable] {
        &self.dependents
    }

    pub(crate) fn push_dependent(&mut self, dependent: DependentVariable) {
        self.dependents.push(dependent);
    }

    pub fn flippable_pairs(&self) -> &[(VariableID, VariableID)] {
        &self.flippable_pairs
    }

    pub fn variable_arrays(&self) -> &[VariableArray] {
        &self.variable_arrays
    }

    pub fn variable_id_by_name(&self, name: &str) -> Option<VariableID> {
        self.variable_names.index_of(name).map(VariableID::from)
    }

    pub fn number_of_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn number_of_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn number_of_enabled_constraints(&self) -> usize {
        self.constraints.iter().filter(|c| c.is_enabled()).count()
    }

    pub fn total_violation(&self) -> f64 {
        self.total_violation
    }

    pub fn is_feasible(&self, atol: ATol) -> bool {
        self.total_violation <= *atol
    }

    pub fn is_structure_ready(&self) -> bool {
        self.is_structure_ready
    }

    pub fn is_consumed(&self) -> bool {
        self.is_consumed
    }

    pub(crate) fn mark_consumed(&mut self) {
        self.is_consumed = true;
    }

    // ------------------------------------------------------------------
    // structure
    // ------------------------------------------------------------------

    /// Freeze the model: build cross references and sensitivities, classify
    /// every constraint, extract selection groups, and refresh all caches.
    /// Idempotent; called by the solver after presolve.
    pub fn setup_structure(
        &mut self,
        mode: SelectionMode,
        user_defined_selections: &FnvHashSet<String>,
        atol: ATol,
    ) {
        // normalize: a negative leading coefficient flips the whole row
        for constraint in &mut self.constraints {
            let leading = constraint
                .expression()
                .terms()
                .first()
                .map(|(_, c)| *c)
                .unwrap_or(1.0);
            if leading < 0.0 {
                let rhs = constraint.rhs();
                constraint.expression_mut().scale(-1.0);
                constraint.set_rhs(-rhs);
                let flipped = match constraint.sense() {
                    ConstraintSense::Less => ConstraintSense::Greater,
                    ConstraintSense::Greater => ConstraintSense::Less,
                    ConstraintSense::Equal => ConstraintSense::Equal,
                };
                constraint.set_sense(flipped);
            }
        }

        // per-variable related-constraint lists with sensitivities
        let mut related: Vec<Vec<(ConstraintID, f64)>> = vec![Vec::new(); self.variables.len()];
        for constraint in &self.constraints {
            for (id, coefficient) in constraint.expression().terms() {
                related[id.into_inner()].push((constraint.id(), *coefficient));
            }
        }
        for (variable, related) in self.variables.iter_mut().zip(related) {
            variable.set_related(related);
        }
        let objective = self.objective.expression().clone();
        for variable in &mut self.variables {
            variable.set_objective_sensitivity(objective.coefficient(variable.id()));
        }

        for index in 0..self.constraints.len() {
            let shape = classify_constraint(&self.constraints[index], &self.variables, atol);
            self.constraints[index].set_shape(shape);
        }

        self.selections = extract_selections(
            &mut self.constraints,
            &mut self.variables,
            mode,
            user_defined_selections,
        );
        initialize_selections(&mut self.selections, &mut self.variables);

        self.refresh_all();
        self.is_structure_ready = true;
    }

    /// Recompute every cache from scratch: expression values, constraint
    /// violations, the violation total, and selection membership.
    pub fn refresh_all(&mut self) {
        let values = self.values();
        let mut total = 0.0;
        for constraint in &mut self.constraints {
            constraint.expression_mut().refresh(&values);
            constraint.update_violation();
            total += constraint.violation();
        }
        self.total_violation = total;
        self.objective.expression_mut().refresh(&values);
        for selection in &mut self.selections {
            selection.selected = selection
                .variables
                .iter()
                .copied()
                .find(|id| self.variables[id.into_inner()].value() == 1);
        }
    }

    pub fn values(&self) -> Vec<i64> {
        self.variables.iter().map(|v| v.value()).collect()
    }

    /// Overwrite all variable values (e.g. restoring an archived solution)
    /// and refresh caches.
    pub fn set_values(&mut self, values: &[i64]) -> Result<(), VariableError> {
        debug_assert_eq!(values.len(), self.variables.len());
        for (variable, &value) in self.variables.iter_mut().zip(values) {
            variable.set_value(value)?;
        }
        self.refresh_all();
        Ok(())
    }

    // ------------------------------------------------------------------
    // move application
    // ------------------------------------------------------------------

    /// Apply a set of alterations, updating all caches incrementally.
    /// Returns the inverse alterations (original values); applying them
    /// restores the exact pre-move state including caches.
    pub fn apply_alterations(
        &mut self,
        alterations: &[(VariableID, i64)],
    ) -> Result<Vec<(VariableID, i64)>, VariableError> {
        let mut inverse = Vec::with_capacity(alterations.len());
        let mut affected: SmallVec<[ConstraintID; 16]> = SmallVec::new();

        for &(id, new_value) in alterations {
            let index = id.into_inner();
            let old_value = self.variables[index].value();
            self.variables[index].set_value(new_value)?;
            inverse.push((id, old_value));
            if old_value == new_value {
                continue;
            }
            self.shift_caches(index, old_value, new_value, &mut affected);
        }

        // dependent variables whose defining set moved
        for dependent_index in 0..self.dependents.len() {
            let touches = {
                let dependent = &self.dependents[dependent_index];
                alterations
                    .iter()
                    .any(|(id, _)| dependent.expression.coefficient(*id) != 0.0)
            };
            if !touches {
                continue;
            }
            let (variable_id, new_value) = {
                let dependent = &self.dependents[dependent_index];
                let value = dependent
                    .expression
                    .terms()
                    .iter()
                    .map(|(id, coefficient)| {
                        coefficient * self.variables[id.into_inner()].value() as f64
                    })
                    .sum::<f64>()
                    + dependent.expression.constant();
                (dependent.variable, value.round() as i64)
            };
            let index = variable_id.into_inner();
            let old_value = self.variables[index].value();
            if old_value != new_value {
                self.variables[index].set_value(new_value)?;
                self.shift_caches(index, old_value, new_value, &mut affected);
            }
        }

        affected.sort_unstable();
        affected.dedup();
        for constraint_id in affected {
            let constraint = &mut self.constraints[constraint_id.into_inner()];
            let old_violation = constraint.violation();
            constraint.update_violation();
            self.total_violation += constraint.violation() - old_violation;
        }

        // keep selection bookkeeping in sync
        for &(id, new_value) in alterations {
            if let Some(group) = self.variables[id.into_inner()].selection_index() {
                let selection = &mut self.selections[group];
                if new_value == 1 {
                    selection.selected = Some(id);
                } else if selection.selected == Some(id) {
                    selection.selected = selection
                        .variables
                        .iter()
                        .copied()
                        .find(|member| self.variables[member.into_inner()].value() == 1);
                }
            }
        }

        Ok(inverse)
    }

    fn shift_caches(
        &mut self,
        variable_index: usize,
        old_value: i64,
        new_value: i64,
        affected: &mut SmallVec<[ConstraintID; 16]>,
    ) {
        let Model {
            variables,
            constraints,
            objective,
            ..
        } = self;
        let variable = &variables[variable_index];
        for &(constraint_id, coefficient) in variable.related() {
            let constraint = &mut constraints[constraint_id.into_inner()];
            let expression = constraint.expression_mut();
            expression.set_value(expression.value() + coefficient * (new_value - old_value) as f64);
            affected.push(constraint_id);
        }
        let sensitivity = variable.objective_sensitivity();
        if sensitivity != 0.0 {
            let expression = objective.expression_mut();
            expression
                .set_value(expression.value() + sensitivity * (new_value - old_value) as f64);
        }
    }

    // ------------------------------------------------------------------
    // penalties
    // ------------------------------------------------------------------

    /// Set both penalty coefficients of every constraint to `value`.
    pub fn reset_penalties(&mut self, value: f64) {
        for constraint in &mut self.constraints {
            constraint.set_local_penalty(value);
            constraint.set_global_penalty(value);
            constraint.reset_violation_count();
        }
    }
}
