use std::{collections::BTreeSet, fmt};

use crate::instruction::{KeyValue, SqlValue, UpdateInstruction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    Set,
    Where,
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Set => write!(f, "SET"),
            Clause::Where => write!(f, "WHERE"),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SchemaMismatchError {
    #[error("Instruction {index} has an empty {clause} clause")]
    EmptyClause { index: usize, clause: Clause },

    #[error("Instruction {index} names column `{column}` twice in its {clause} clause")]
    DuplicateColumn { index: usize, clause: Clause, column: String },

    #[error(
        "Instruction {index} {clause} columns {found:?} differ from the batch columns {expected:?}"
    )]
    ColumnSetMismatch { index: usize, clause: Clause, expected: Vec<String>, found: Vec<String> },
}

/// Column layout shared by every instruction of a uniform batch.
///
/// Column names are kept lexically sorted; this order drives every
/// column-ordered fragment the CASE and JOIN compilers emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSchema {
    pub set_columns: Vec<String>,
    pub where_columns: Vec<String>,
}

fn sorted_columns(
    index: usize,
    clause: Clause,
    pairs: &[KeyValue],
) -> Result<Vec<String>, SchemaMismatchError> {
    if pairs.is_empty() {
        return Err(SchemaMismatchError::EmptyClause { index, clause });
    }

    let mut columns = BTreeSet::new();
    for kv in pairs {
        if !columns.insert(kv.column.as_str()) {
            return Err(SchemaMismatchError::DuplicateColumn {
                index,
                clause,
                column: kv.column.clone(),
            });
        }
    }

    Ok(columns.into_iter().map(str::to_string).collect())
}

/// Checks a single instruction: both clauses non-empty, no column repeated.
pub fn validate_instruction(
    index: usize,
    instruction: &UpdateInstruction,
) -> Result<BatchSchema, SchemaMismatchError> {
    Ok(BatchSchema {
        set_columns: sorted_columns(index, Clause::Set, &instruction.set)?,
        where_columns: sorted_columns(index, Clause::Where, &instruction.where_)?,
    })
}

/// Checks that every instruction uses the same SET and WHERE column sets.
///
/// Returns `None` for an empty batch.
pub fn validate_uniform_batch(
    batch: &[UpdateInstruction],
) -> Result<Option<BatchSchema>, SchemaMismatchError> {
    let Some(first) = batch.first() else {
        return Ok(None);
    };

    let expected = validate_instruction(0, first)?;

    for (index, instruction) in batch.iter().enumerate().skip(1) {
        let found = validate_instruction(index, instruction)?;

        if found.set_columns != expected.set_columns {
            return Err(SchemaMismatchError::ColumnSetMismatch {
                index,
                clause: Clause::Set,
                expected: expected.set_columns,
                found: found.set_columns,
            });
        }

        if found.where_columns != expected.where_columns {
            return Err(SchemaMismatchError::ColumnSetMismatch {
                index,
                clause: Clause::Where,
                expected: expected.where_columns,
                found: found.where_columns,
            });
        }
    }

    Ok(Some(expected))
}

/// One instruction's values laid out in [`BatchSchema`] column order.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRow<'a> {
    pub set: Vec<&'a SqlValue>,
    pub where_: Vec<&'a SqlValue>,
}

fn values_by_column(pairs: &[KeyValue]) -> Vec<&SqlValue> {
    let mut sorted: Vec<&KeyValue> = pairs.iter().collect();
    sorted.sort_by(|a, b| a.column.cmp(&b.column));
    sorted.into_iter().map(|kv| &kv.value).collect()
}

/// Reorders each instruction of a batch already accepted by
/// [`validate_uniform_batch`], so position `i` holds the value of the schema's
/// `i`-th column.
pub fn canonical_rows(batch: &[UpdateInstruction]) -> Vec<CanonicalRow<'_>> {
    batch
        .iter()
        .map(|instruction| CanonicalRow {
            set: values_by_column(&instruction.set),
            where_: values_by_column(&instruction.where_),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_rows_follow_sorted_columns() {
        let batch = vec![UpdateInstruction::new(
            vec![KeyValue::new("unit", 1), KeyValue::new("age", 2)],
            vec![KeyValue::new("id", 3)],
        )];

        let rows = canonical_rows(&batch);
        assert_eq!(rows[0].set, vec![&SqlValue::Int(2), &SqlValue::Int(1)]);
        assert_eq!(rows[0].where_, vec![&SqlValue::Int(3)]);
    }

    fn instruction(set: &[&str], where_: &[&str]) -> UpdateInstruction {
        UpdateInstruction::new(
            set.iter().map(|c| KeyValue::new(*c, 1)).collect(),
            where_.iter().map(|c| KeyValue::new(*c, 2)).collect(),
        )
    }

    #[test]
    fn test_uniform_batch_sorts_columns() {
        let batch = vec![instruction(&["b", "a"], &["y", "x"]), instruction(&["a", "b"], &["x", "y"])];

        let schema = validate_uniform_batch(&batch).unwrap().unwrap();
        assert_eq!(schema.set_columns, vec!["a", "b"]);
        assert_eq!(schema.where_columns, vec!["x", "y"]);
    }

    #[test]
    fn test_empty_batch_has_no_schema() {
        assert_eq!(validate_uniform_batch(&[]), Ok(None));
    }

    #[test]
    fn test_mismatched_set_columns_are_rejected() {
        let batch = vec![instruction(&["a", "b"], &["x"]), instruction(&["a", "c"], &["x"])];

        assert_eq!(
            validate_uniform_batch(&batch),
            Err(SchemaMismatchError::ColumnSetMismatch {
                index: 1,
                clause: Clause::Set,
                expected: vec!["a".to_string(), "b".to_string()],
                found: vec!["a".to_string(), "c".to_string()],
            })
        );
    }

    #[test]
    fn test_mismatched_where_columns_are_rejected() {
        let batch = vec![instruction(&["a"], &["x"]), instruction(&["a"], &["x", "y"])];

        assert!(matches!(
            validate_uniform_batch(&batch),
            Err(SchemaMismatchError::ColumnSetMismatch { index: 1, clause: Clause::Where, .. })
        ));
    }

    #[test]
    fn test_empty_and_duplicate_clauses_are_rejected() {
        assert_eq!(
            validate_instruction(3, &instruction(&[], &["x"])),
            Err(SchemaMismatchError::EmptyClause { index: 3, clause: Clause::Set })
        );
        assert_eq!(
            validate_instruction(0, &instruction(&["a"], &[])),
            Err(SchemaMismatchError::EmptyClause { index: 0, clause: Clause::Where })
        );
        assert_eq!(
            validate_instruction(1, &instruction(&["a", "a"], &["x"])),
            Err(SchemaMismatchError::DuplicateColumn {
                index: 1,
                clause: Clause::Set,
                column: "a".to_string(),
            })
        );
    }
}
