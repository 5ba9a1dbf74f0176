use super::{
    query_builder::{format_table_name, SqlBuilder},
    validate::{canonical_rows, validate_uniform_batch, SchemaMismatchError},
    PlanCompiler, UpdatePlan, UpdateStrategy,
};
use crate::instruction::{SqlValue, UpdateInstruction};

/// Single `UPDATE` with one `CASE` expression per SET column:
///
/// ```sql
/// UPDATE `t` SET `c` = CASE WHEN `w` = ? THEN ? ... END, ... WHERE (`w` = ?) OR ...
/// ```
///
/// Each instruction's WHERE values are bound twice, once in every CASE branch
/// guard and once in the top-level disjunction.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseCompiler;

fn push_where_predicate(builder: &mut SqlBuilder, columns: &[String], values: &[&SqlValue]) {
    for (i, (column, value)) in columns.iter().zip(values).enumerate() {
        if i > 0 {
            builder.push_str(" AND ");
        }
        builder.push_identifier(column).push_str(" = ").push_param(value);
    }
}

impl PlanCompiler for CaseCompiler {
    fn strategy(&self) -> UpdateStrategy {
        UpdateStrategy::Case
    }

    fn compile(
        &self,
        table_name: &str,
        batch: &[UpdateInstruction],
    ) -> Result<UpdatePlan, SchemaMismatchError> {
        let Some(schema) = validate_uniform_batch(batch)? else {
            return Ok(UpdatePlan::empty(self.strategy()));
        };
        let rows = canonical_rows(batch);

        let set_count = schema.set_columns.len();
        let where_count = schema.where_columns.len();
        let mut builder = SqlBuilder::with_capacity(
            32 * batch.len() * (set_count + 1) * where_count,
            batch.len() * ((where_count + 1) * set_count + where_count),
        );

        builder.push_str("UPDATE ").push_str(&format_table_name(table_name)).push_str(" SET ");

        for (column_index, column) in schema.set_columns.iter().enumerate() {
            if column_index > 0 {
                builder.push_str(", ");
            }
            builder.push_identifier(column).push_str(" = CASE");

            // the first matching WHEN wins, so the newest instruction goes first
            for row in rows.iter().rev() {
                builder.push_str(" WHEN ");
                push_where_predicate(&mut builder, &schema.where_columns, &row.where_);
                builder.push_str(" THEN ").push_param(row.set[column_index]);
            }

            builder.push_str(" END");
        }

        builder.push_str(" WHERE ");
        builder.push_separated(&rows, " OR ", |builder, row| {
            builder.push_str("(");
            push_where_predicate(builder, &schema.where_columns, &row.where_);
            builder.push_str(")");
        });

        Ok(UpdatePlan { strategy: self.strategy(), commands: vec![builder.finish()] })
    }
}
