use super::{deadline_passed, Alterations, Move, MoveAcceptance, MoveKind, MovePool, MoveUpdater};
use crate::{ConstraintID, Model, VariableID};
use std::time::Instant;

/// Moves for `sum x_i = y` over binaries (gated one-hot): swap the selected
/// member while the gate is open, open the gate together with one member,
/// or close the gate together with the selected member.
#[derive(Debug, Clone)]
pub struct SoftSelectionMoveGenerator {
    is_enabled: bool,
    constraints: Vec<ConstraintID>,
    pool: MovePool,
}

impl SoftSelectionMoveGenerator {
    pub fn new(is_enabled: bool, constraints: Vec<ConstraintID>) -> Self {
        Self {
            is_enabled,
            constraints,
            pool: MovePool::default(),
        }
    }
}

impl MoveUpdater for SoftSelectionMoveGenerator {
    fn update_moves(
        &mut self,
        model: &Model,
        acceptance: &MoveAcceptance,
        deadline: Option<Instant>,
    ) {
        self.pool.clear();
        if !self.is_enabled || deadline_passed(deadline) {
            return;
        }
        for &id in &self.constraints {
            let constraint = model.constraint(id);
            let mut gate: Option<VariableID> = None;
            let mut members: Vec<VariableID> = Vec::new();
            for (variable_id, coefficient) in constraint.expression().terms() {
                if *coefficient < 0.0 {
                    gate = Some(*variable_id);
                } else {
                    members.push(*variable_id);
                }
            }
            let Some(gate) = gate else { continue };
            let gate_value = model.variable(gate).value();
            let selected = members
                .iter()
                .copied()
                .find(|member| model.variable(*member).value() == 1);

            match (gate_value, selected) {
                (1, Some(selected)) => {
                    // one-hot swap under an open gate
                    for &member in &members {
                        if member == selected {
                            continue;
                        }
                        let mut alterations = Alterations::new();
                        alterations.push((selected, 0));
                        alterations.push((member, 1));
                        let mut mv = Move::new(MoveKind::SoftSelection, alterations);
                        mv.is_special = true;
                        self.pool.push(mv, model, acceptance);
                    }
                    // close the gate and drop the selection
                    let mut alterations = Alterations::new();
                    alterations.push((gate, 0));
                    alterations.push((selected, 0));
                    let mut mv = Move::new(MoveKind::SoftSelection, alterations);
                    mv.is_special = true;
                    self.pool.push(mv, model, acceptance);
                }
                (0, None) => {
                    // open the gate with each candidate member
                    for &member in &members {
                        let mut alterations = Alterations::new();
                        alterations.push((gate, 1));
                        alterations.push((member, 1));
                        let mut mv = Move::new(MoveKind::SoftSelection, alterations);
                        mv.is_special = true;
                        self.pool.push(mv, model, acceptance);
                    }
                }
                // the constraint is currently violated; the repair belongs to
                // the generic binary family
                _ => {}
            }
        }
    }

    fn pool(&self) -> &MovePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ATol, Model, SelectionMode};

    fn fixture(gate_open: bool) -> (Model, ConstraintID, Vec<VariableID>, VariableID) {
        let mut model = Model::new("soft_selection");
        let x = model.create_variables("x", &[3], 0, 1).unwrap();
        let y = model.create_variable("y", 0, 1).unwrap();
        let c = model
            .add_constraint("soft", x.sum().plus_term(y, -1.0).eq(0.0))
            .unwrap();
        if gate_open {
            model.set_initial_value(y, 1);
            model.set_initial_value(x[0], 1);
        }
        model.setup_structure(SelectionMode::Off, &Default::default(), ATol::default());
        (model, c, x.ids().to_vec(), y)
    }

    #[test]
    fn open_gate_emits_swaps_and_close() {
        let (model, c, x, y) = fixture(true);
        let mut generator = SoftSelectionMoveGenerator::new(true, vec![c]);
        generator.update_moves(&model, &MoveAcceptance::all(), None);
        let pool = generator.pool();
        // two swaps plus the gate-close move
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.moves[2].alterations[0], (y, 0));
        assert_eq!(pool.moves[2].alterations[1], (x[0], 0));
    }

    #[test]
    fn closed_gate_emits_openings() {
        let (model, c, x, y) = fixture(false);
        let mut generator = SoftSelectionMoveGenerator::new(true, vec![c]);
        generator.update_moves(&model, &MoveAcceptance::all(), None);
        let pool = generator.pool();
        assert_eq!(pool.len(), 3);
        for (index, mv) in pool.moves.iter().enumerate() {
            assert_eq!(mv.alterations[0], (y, 1));
            assert_eq!(mv.alterations[1], (x[index], 1));
        }
    }
}
