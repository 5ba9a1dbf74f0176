use std::time::Instant;

use tracing::{debug, error, info};

use super::{
    compile_plan, query_builder::statement_preview, PlanOptions, SchemaMismatchError, UpdatePlan,
    UpdateStrategy,
};
use crate::{database::Connection, instruction::UpdateInstruction};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(thiserror::Error, Debug)]
#[error("Could not prepare statement {index} `{statement}`: {source}")]
pub struct PrepareError {
    pub index: usize,
    pub statement: String,
    pub source: BoxError,
}

#[derive(thiserror::Error, Debug)]
#[error("Could not execute statement {index} `{statement}`: {source}")]
pub struct ExecutionError {
    pub index: usize,
    pub statement: String,
    pub source: BoxError,
}

#[derive(thiserror::Error, Debug)]
pub enum PlanError {
    #[error("{0}")]
    SchemaMismatch(#[from] SchemaMismatchError),

    #[error("{0}")]
    Prepare(#[from] PrepareError),

    #[error("{0}")]
    Execution(#[from] ExecutionError),
}

impl PlanError {
    /// Index of the statement that failed, if one was sent.
    pub fn failed_statement(&self) -> Option<usize> {
        match self {
            PlanError::SchemaMismatch(_) => None,
            PlanError::Prepare(e) => Some(e.index),
            PlanError::Execution(e) => Some(e.index),
        }
    }
}

/// Prepares and executes the plan's statements in order, stopping at the first
/// failure. Nothing is retried or rolled back here; wrap the call in a
/// transaction for all-or-nothing multi-statement plans.
pub async fn execute_plan<C>(connection: &mut C, plan: &UpdatePlan) -> Result<u64, PlanError>
where
    C: Connection + ?Sized,
{
    let mut rows_affected = 0;

    for (index, command) in plan.commands.iter().enumerate() {
        debug!(
            "{} statement {} ({} params): {}",
            plan.strategy,
            index,
            command.params.len(),
            statement_preview(&command.sql)
        );

        let statement = connection.prepare(&command.sql).await.map_err(|e| PrepareError {
            index,
            statement: statement_preview(&command.sql),
            source: Box::new(e),
        })?;

        rows_affected += connection.execute(&statement, &command.params).await.map_err(|e| {
            ExecutionError { index, statement: statement_preview(&command.sql), source: Box::new(e) }
        })?;
    }

    Ok(rows_affected)
}

/// Compiles `batch` with `strategy` and runs it on `connection`.
pub async fn apply_batch<C>(
    connection: &mut C,
    strategy: UpdateStrategy,
    table_name: &str,
    batch: &[UpdateInstruction],
    options: &PlanOptions,
) -> Result<u64, PlanError>
where
    C: Connection + ?Sized,
{
    let start = Instant::now();
    let plan = compile_plan(strategy, table_name, batch, options)?;

    debug!(
        "{} plan for {} instructions: {} statements, {} params, {} bytes of SQL",
        strategy,
        batch.len(),
        plan.statement_count(),
        plan.parameter_count(),
        plan.sql_len()
    );

    match execute_plan(connection, &plan).await {
        Ok(rows_affected) => {
            info!(
                "{} applied {} instructions to {} - {} rows affected in {:?}",
                strategy,
                batch.len(),
                table_name,
                rows_affected,
                start.elapsed()
            );
            Ok(rows_affected)
        }
        Err(e) => {
            error!("{} failed on {}: {}", strategy, table_name, e);
            Err(e)
        }
    }
}
