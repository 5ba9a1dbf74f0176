//! Compiles a batch of [`UpdateInstruction`]s into the statements of one of
//! three update strategies.
//!
//! - [`UpdateStrategy::Atom`]: one `UPDATE` per instruction.
//! - [`UpdateStrategy::Case`]: one `UPDATE` whose SET columns are `CASE`
//!   expressions keyed by each instruction's WHERE predicate.
//! - [`UpdateStrategy::Join`]: one `UPDATE ... INNER JOIN` against a derived
//!   table built from a `UNION ALL` of literal rows.
//!
//! Where WHERE predicates overlap inside a batch, the atom and CASE plans are
//! last-write-wins in batch order. The JOIN plan only is when built with
//! [`JoinCollisionPolicy::LastWriteWins`].

use std::{fmt, str::FromStr};

use crate::instruction::UpdateInstruction;

mod atom;
mod case;
mod executor;
mod join;
pub mod query_builder;
mod validate;

pub use atom::AtomCompiler;
pub use case::CaseCompiler;
pub use executor::{apply_batch, execute_plan, ExecutionError, PlanError, PrepareError};
pub use join::{JoinCompiler, DERIVED_TABLE_ALIAS, SET_ALIAS_PREFIX, WHERE_ALIAS_PREFIX};
pub use query_builder::{format_table_name, quote_identifier, SqlCommand};
pub use validate::{
    validate_instruction, validate_uniform_batch, BatchSchema, Clause, SchemaMismatchError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UpdateStrategy {
    Join,
    Case,
    Atom,
}

impl UpdateStrategy {
    /// Report and run order.
    pub const ALL: [UpdateStrategy; 3] =
        [UpdateStrategy::Join, UpdateStrategy::Case, UpdateStrategy::Atom];

    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateStrategy::Join => "join",
            UpdateStrategy::Case => "case",
            UpdateStrategy::Atom => "atom",
        }
    }

    /// Whether a single statement applies the whole batch.
    pub fn is_single_statement(&self) -> bool {
        !matches!(self, UpdateStrategy::Atom)
    }

    pub fn compiler(&self, options: &PlanOptions) -> Box<dyn PlanCompiler + Send + Sync> {
        match self {
            UpdateStrategy::Join => Box::new(JoinCompiler::new(options.join_collisions)),
            UpdateStrategy::Case => Box::new(CaseCompiler),
            UpdateStrategy::Atom => Box::new(AtomCompiler),
        }
    }
}

impl fmt::Display for UpdateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("Unknown update strategy `{0}`, expected one of join, case, atom")]
pub struct UnknownStrategyError(pub String);

impl FromStr for UpdateStrategy {
    type Err = UnknownStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "join" => Ok(UpdateStrategy::Join),
            "case" => Ok(UpdateStrategy::Case),
            "atom" | "row" => Ok(UpdateStrategy::Atom),
            _ => Err(UnknownStrategyError(s.to_string())),
        }
    }
}

/// How the JOIN plan treats instructions that share the same WHERE values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JoinCollisionPolicy {
    /// Every instruction becomes a derived-table row. When WHERE values repeat,
    /// the engine updates the matching rows from an arbitrary one of them.
    #[default]
    Unresolved,
    /// Instructions sharing WHERE values collapse to the last one in the batch
    /// before the derived table is built. Signed and unsigned integers of the
    /// same value count as the same key.
    LastWriteWins,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanOptions {
    pub join_collisions: JoinCollisionPolicy,
}

/// The ordered statements that apply one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePlan {
    pub strategy: UpdateStrategy,
    pub commands: Vec<SqlCommand>,
}

impl UpdatePlan {
    pub fn empty(strategy: UpdateStrategy) -> Self {
        UpdatePlan { strategy, commands: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn statement_count(&self) -> usize {
        self.commands.len()
    }

    pub fn parameter_count(&self) -> usize {
        self.commands.iter().map(|command| command.params.len()).sum()
    }

    pub fn sql_len(&self) -> usize {
        self.commands.iter().map(|command| command.sql.len()).sum()
    }
}

/// Turns a batch into an [`UpdatePlan`]. Pure: no I/O.
pub trait PlanCompiler {
    fn strategy(&self) -> UpdateStrategy;

    fn compile(
        &self,
        table_name: &str,
        batch: &[UpdateInstruction],
    ) -> Result<UpdatePlan, SchemaMismatchError>;
}

pub fn compile_plan(
    strategy: UpdateStrategy,
    table_name: &str,
    batch: &[UpdateInstruction],
    options: &PlanOptions,
) -> Result<UpdatePlan, SchemaMismatchError> {
    strategy.compiler(options).compile(table_name, batch)
}
