use super::{
    query_builder::{format_table_name, SqlBuilder, SqlCommand},
    validate::{validate_instruction, SchemaMismatchError},
    PlanCompiler, UpdatePlan, UpdateStrategy,
};
use crate::instruction::UpdateInstruction;

/// One `UPDATE` per instruction, run in batch order.
///
/// Atomicity across the batch belongs to the caller's transaction. Instructions
/// are not required to share a column layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtomCompiler;

pub fn build_atom_update(formatted_table_name: &str, instruction: &UpdateInstruction) -> SqlCommand {
    let mut builder = SqlBuilder::new();
    builder
        .push_str("UPDATE ")
        .push_str(formatted_table_name)
        .push_str(" SET ")
        .push_assignments(&instruction.set, ", ")
        .push_str(" WHERE ")
        .push_assignments(&instruction.where_, " AND ");
    builder.finish()
}

impl PlanCompiler for AtomCompiler {
    fn strategy(&self) -> UpdateStrategy {
        UpdateStrategy::Atom
    }

    fn compile(
        &self,
        table_name: &str,
        batch: &[UpdateInstruction],
    ) -> Result<UpdatePlan, SchemaMismatchError> {
        for (index, instruction) in batch.iter().enumerate() {
            validate_instruction(index, instruction)?;
        }

        let formatted_table_name = format_table_name(table_name);
        let commands = batch
            .iter()
            .map(|instruction| build_atom_update(&formatted_table_name, instruction))
            .collect();

        Ok(UpdatePlan { strategy: self.strategy(), commands })
    }
}
