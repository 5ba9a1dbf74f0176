use std::collections::HashMap;

use super::{
    query_builder::{format_table_name, quote_identifier, SqlBuilder},
    validate::{canonical_rows, validate_uniform_batch, CanonicalRow, SchemaMismatchError},
    JoinCollisionPolicy, PlanCompiler, UpdatePlan, UpdateStrategy,
};
use crate::instruction::{SqlValue, UpdateInstruction};

/// Prefix of derived-table columns carrying SET values.
pub const SET_ALIAS_PREFIX: &str = "s$";
/// Prefix of derived-table columns carrying WHERE values.
pub const WHERE_ALIAS_PREFIX: &str = "w$";
pub const DERIVED_TABLE_ALIAS: &str = "$u";

/// Single `UPDATE ... INNER JOIN` against a derived table of literal rows:
///
/// ```sql
/// UPDATE `t` INNER JOIN (SELECT ? AS `s$c`, ? AS `w$w` UNION ALL SELECT ...) AS `$u`
/// ON `t`.`w` = `$u`.`w$w` SET `t`.`c` = `$u`.`s$c`
/// ```
///
/// Each instruction's values are bound exactly once. The AND of all WHERE
/// columns is the join key; when two derived rows share it, which one updates
/// the target row is up to the engine unless [`JoinCollisionPolicy::LastWriteWins`]
/// removes the duplicates first.
#[derive(Debug, Clone, Copy, Default)]
pub struct JoinCompiler {
    collisions: JoinCollisionPolicy,
}

impl JoinCompiler {
    pub fn new(collisions: JoinCollisionPolicy) -> Self {
        JoinCompiler { collisions }
    }
}

fn alias(prefix: &str, column: &str) -> String {
    quote_identifier(&format!("{}{}", prefix, column))
}

/// WHERE value as the engine compares it: a non-negative unsigned integer
/// matches the signed integer of the same value.
fn join_key_value(value: &SqlValue) -> SqlValue {
    match value {
        SqlValue::UInt(v) => i64::try_from(*v).map(SqlValue::Int).unwrap_or(SqlValue::UInt(*v)),
        other => other.clone(),
    }
}

/// Keeps only the last row for every distinct WHERE tuple, in batch order.
fn keep_last_per_key(rows: Vec<CanonicalRow<'_>>) -> Vec<CanonicalRow<'_>> {
    let keys: Vec<Vec<SqlValue>> = rows
        .iter()
        .map(|row| row.where_.iter().map(|value| join_key_value(value)).collect())
        .collect();

    let mut last_seen: HashMap<&[SqlValue], usize> = HashMap::with_capacity(rows.len());
    for (index, key) in keys.iter().enumerate() {
        last_seen.insert(key.as_slice(), index);
    }

    rows.into_iter()
        .enumerate()
        .filter(|(index, _)| last_seen.get(keys[*index].as_slice()) == Some(index))
        .map(|(_, row)| row)
        .collect()
}

impl PlanCompiler for JoinCompiler {
    fn strategy(&self) -> UpdateStrategy {
        UpdateStrategy::Join
    }

    fn compile(
        &self,
        table_name: &str,
        batch: &[UpdateInstruction],
    ) -> Result<UpdatePlan, SchemaMismatchError> {
        let Some(schema) = validate_uniform_batch(batch)? else {
            return Ok(UpdatePlan::empty(self.strategy()));
        };

        let rows = match self.collisions {
            JoinCollisionPolicy::Unresolved => canonical_rows(batch),
            JoinCollisionPolicy::LastWriteWins => keep_last_per_key(canonical_rows(batch)),
        };

        let set_aliases: Vec<String> =
            schema.set_columns.iter().map(|column| alias(SET_ALIAS_PREFIX, column)).collect();
        let where_aliases: Vec<String> =
            schema.where_columns.iter().map(|column| alias(WHERE_ALIAS_PREFIX, column)).collect();
        let formatted_table_name = format_table_name(table_name);
        let derived_table = quote_identifier(DERIVED_TABLE_ALIAS);

        let row_width = set_aliases.len() + where_aliases.len();
        let mut builder = SqlBuilder::with_capacity(24 * rows.len() * row_width, rows.len() * row_width);

        builder.push_str("UPDATE ").push_str(&formatted_table_name).push_str(" INNER JOIN (");

        // UNION ALL lines columns up by position, so every row uses schema order
        builder.push_separated(&rows, " UNION ALL ", |builder, row| {
            builder.push_str("SELECT ");
            let values = row.set.iter().zip(&set_aliases).chain(row.where_.iter().zip(&where_aliases));
            for (i, (value, alias)) in values.enumerate() {
                if i > 0 {
                    builder.push_str(", ");
                }
                builder.push_param(value).push_str(" AS ").push_str(alias);
            }
        });

        builder.push_str(") AS ").push_str(&derived_table).push_str(" ON ");

        let on_clauses: Vec<String> = schema
            .where_columns
            .iter()
            .zip(&where_aliases)
            .map(|(column, alias)| {
                format!(
                    "{}.{} = {}.{}",
                    formatted_table_name,
                    quote_identifier(column),
                    derived_table,
                    alias
                )
            })
            .collect();
        builder.push_str(&on_clauses.join(" AND "));

        let set_clauses: Vec<String> = schema
            .set_columns
            .iter()
            .zip(&set_aliases)
            .map(|(column, alias)| {
                format!(
                    "{}.{} = {}.{}",
                    formatted_table_name,
                    quote_identifier(column),
                    derived_table,
                    alias
                )
            })
            .collect();
        builder.push_str(" SET ").push_str(&set_clauses.join(", "));

        Ok(UpdatePlan { strategy: self.strategy(), commands: vec![builder.finish()] })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::KeyValue;

    fn unit_by_age(unit: i64, age: i64) -> UpdateInstruction {
        UpdateInstruction::new(vec![KeyValue::new("unit", unit)], vec![KeyValue::new("age", age)])
    }

    fn select_branches(sql: &str) -> usize {
        sql.matches("SELECT ").count()
    }

    #[test]
    fn test_two_instruction_statement() {
        let plan = JoinCompiler::default()
            .compile("people", &[unit_by_age(1, 10), unit_by_age(2, 20)])
            .unwrap();
        let command = &plan.commands[0];

        assert_eq!(
            command.sql,
            "UPDATE `people` INNER JOIN (\
             SELECT ? AS `s$unit`, ? AS `w$age` UNION ALL SELECT ? AS `s$unit`, ? AS `w$age`\
             ) AS `$u` ON `people`.`age` = `$u`.`w$age` SET `people`.`unit` = `$u`.`s$unit`"
        );
        assert_eq!(
            command.params,
            vec![SqlValue::Int(1), SqlValue::Int(10), SqlValue::Int(2), SqlValue::Int(20)]
        );
    }

    #[test]
    fn test_parameter_and_branch_counts_scale_with_batch() {
        let batch: Vec<UpdateInstruction> = (0..40)
            .map(|i| {
                UpdateInstruction::new(
                    vec![KeyValue::new("unit", i), KeyValue::new("age", i + 1)],
                    vec![KeyValue::new("id", i), KeyValue::new("name", "n"), KeyValue::new("x", 0)],
                )
            })
            .collect();

        let plan = JoinCompiler::default().compile("people", &batch).unwrap();

        assert_eq!(plan.statement_count(), 1);
        assert_eq!(plan.parameter_count(), 40 * (2 + 3));
        assert_eq!(select_branches(&plan.commands[0].sql), 40);
        assert_eq!(plan.commands[0].placeholder_count(), plan.parameter_count());
    }

    #[test]
    fn test_rows_follow_schema_order_and_join_on_every_where_column() {
        let batch = vec![
            UpdateInstruction::new(
                vec![KeyValue::new("unit", 1), KeyValue::new("age", 2)],
                vec![KeyValue::new("name", "a"), KeyValue::new("id", 3)],
            ),
            UpdateInstruction::new(
                vec![KeyValue::new("age", 5), KeyValue::new("unit", 4)],
                vec![KeyValue::new("id", 6), KeyValue::new("name", "b")],
            ),
        ];

        let plan = JoinCompiler::default().compile("db.people", &batch).unwrap();
        let command = &plan.commands[0];

        assert_eq!(
            command.sql,
            "UPDATE `db`.`people` INNER JOIN (\
             SELECT ? AS `s$age`, ? AS `s$unit`, ? AS `w$id`, ? AS `w$name` UNION ALL \
             SELECT ? AS `s$age`, ? AS `s$unit`, ? AS `w$id`, ? AS `w$name`\
             ) AS `$u` ON `db`.`people`.`id` = `$u`.`w$id` AND `db`.`people`.`name` = `$u`.`w$name` \
             SET `db`.`people`.`age` = `$u`.`s$age`, `db`.`people`.`unit` = `$u`.`s$unit`"
        );
        assert_eq!(
            command.params,
            vec![
                SqlValue::Int(2),
                SqlValue::Int(1),
                SqlValue::Int(3),
                SqlValue::from("a"),
                SqlValue::Int(5),
                SqlValue::Int(4),
                SqlValue::Int(6),
                SqlValue::from("b"),
            ]
        );
    }

    #[test]
    fn test_colliding_keys_are_passed_through_by_default() {
        let batch = vec![unit_by_age(1, 10), unit_by_age(2, 10), unit_by_age(3, 11)];

        let plan = JoinCompiler::default().compile("people", &batch).unwrap();

        assert_eq!(select_branches(&plan.commands[0].sql), 3);
        assert_eq!(plan.parameter_count(), 6);
    }

    #[test]
    fn test_last_write_wins_collapses_colliding_keys() {
        let batch =
            vec![unit_by_age(1, 10), unit_by_age(2, 11), unit_by_age(3, 10), unit_by_age(4, 12)];

        let plan = JoinCompiler::new(JoinCollisionPolicy::LastWriteWins)
            .compile("people", &batch)
            .unwrap();

        assert_eq!(select_branches(&plan.commands[0].sql), 3);
        assert_eq!(
            plan.commands[0].params,
            vec![
                SqlValue::Int(2),
                SqlValue::Int(11),
                SqlValue::Int(3),
                SqlValue::Int(10),
                SqlValue::Int(4),
                SqlValue::Int(12),
            ]
        );
    }

    #[test]
    fn test_mismatched_where_columns_are_rejected() {
        let batch = vec![
            unit_by_age(1, 10),
            UpdateInstruction::new(vec![KeyValue::new("unit", 1)], vec![KeyValue::new("id", 1)]),
        ];

        assert!(matches!(
            JoinCompiler::default().compile("people", &batch),
            Err(SchemaMismatchError::ColumnSetMismatch { index: 1, .. })
        ));
    }

    #[test]
    fn test_last_write_wins_treats_signed_and_unsigned_keys_alike() {
        let batch = vec![
            unit_by_age(1, 3),
            UpdateInstruction::new(
                vec![KeyValue::new("unit", 2)],
                vec![KeyValue::new("age", 3_u32)],
            ),
            UpdateInstruction::new(
                vec![KeyValue::new("unit", 5)],
                vec![KeyValue::new("age", u64::MAX)],
            ),
        ];

        let plan = JoinCompiler::new(JoinCollisionPolicy::LastWriteWins)
            .compile("people", &batch)
            .unwrap();

        assert_eq!(select_branches(&plan.commands[0].sql), 2);
        assert_eq!(
            plan.commands[0].params,
            vec![SqlValue::Int(2), SqlValue::UInt(3), SqlValue::Int(5), SqlValue::UInt(u64::MAX)]
        );
    }
}
