use std::collections::BTreeSet;

use anyhow::{anyhow, Result};
use bulk_update::{
    generator::{ID_COLUMN, SET_COLUMN, WHERE_COLUMN},
    SqlValue, UpdateInstruction,
};

/// One row of the `people` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonRow {
    pub id: i64,
    pub age: i64,
    pub unit: i64,
}

impl PersonRow {
    fn value(&self, column: &str) -> Option<SqlValue> {
        match column {
            ID_COLUMN => Some(SqlValue::Int(self.id)),
            WHERE_COLUMN => Some(SqlValue::Int(self.age)),
            SET_COLUMN => Some(SqlValue::Int(self.unit)),
            _ => None,
        }
    }

    fn matches(&self, instruction: &UpdateInstruction) -> bool {
        instruction
            .where_
            .iter()
            .all(|condition| self.value(&condition.column).as_ref() == Some(&condition.value))
    }
}

fn unit_of(instruction: &UpdateInstruction) -> Option<i64> {
    match instruction.set_value(SET_COLUMN) {
        Some(SqlValue::Int(unit)) => Some(*unit),
        _ => None,
    }
}

/// Applies the batch in order, so the last matching instruction decides each row.
pub fn apply_last_write_wins(rows: &[PersonRow], batch: &[UpdateInstruction]) -> Vec<PersonRow> {
    rows.iter()
        .map(|row| {
            let mut row = *row;
            for instruction in batch {
                if !row.matches(instruction) {
                    continue;
                }
                if let Some(unit) = unit_of(instruction) {
                    row.unit = unit;
                }
            }
            row
        })
        .collect()
}

/// Units any matching instruction could have written to `row`.
pub fn candidate_units(row: &PersonRow, batch: &[UpdateInstruction]) -> BTreeSet<i64> {
    batch
        .iter()
        .filter(|instruction| row.matches(instruction))
        .filter_map(unit_of)
        .collect()
}

pub fn assert_rows_equal(expected: &[PersonRow], actual: &[PersonRow]) -> Result<()> {
    if expected.len() != actual.len() {
        return Err(anyhow!("expected {} rows, found {}", expected.len(), actual.len()));
    }

    for (expected, actual) in expected.iter().zip(actual) {
        if expected != actual {
            return Err(anyhow!("row mismatch: expected {:?}, found {:?}", expected, actual));
        }
    }

    Ok(())
}

/// Rows nobody targets stay untouched, every other row holds one of the units
/// written for it.
pub fn assert_rows_within_candidates(
    initial: &[PersonRow],
    actual: &[PersonRow],
    batch: &[UpdateInstruction],
) -> Result<()> {
    if initial.len() != actual.len() {
        return Err(anyhow!("expected {} rows, found {}", initial.len(), actual.len()));
    }

    for (before, after) in initial.iter().zip(actual) {
        let candidates = candidate_units(before, batch);
        let accepted = if candidates.is_empty() {
            before == after
        } else {
            before.id == after.id && before.age == after.age && candidates.contains(&after.unit)
        };

        if !accepted {
            return Err(anyhow!(
                "row {:?} ended as {:?}, expected one of {:?}",
                before,
                after,
                candidates
            ));
        }
    }

    Ok(())
}
