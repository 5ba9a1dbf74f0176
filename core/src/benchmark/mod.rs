use std::{
    future::Future,
    time::{Duration, Instant},
};

use mysql_async::TxOpts;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{error, info};

use crate::{
    database::{
        mysql::{
            client::{MySqlClient, MySqlError},
            setup::{generate_seed_inserts, recreate_table, seed_table, BootstrapError},
        },
        Connection,
    },
    generator::{generate_with_id_with_rng, generate_with_rng, GeneratorError},
    helpers::format_duration,
    instruction::UpdateInstruction,
    plan::{apply_batch, PlanOptions, UpdateStrategy},
};

mod report;

pub use report::{write_report, write_report_to_path, ReportError};

#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    pub table_name: String,
    /// Batch size step: iteration `i` runs `multiplier * i` instructions.
    pub multiplier: usize,
    pub iterations: usize,
    /// Target rows by primary key instead of the `age` column.
    pub by_id: bool,
    pub include_atom: bool,
    pub collision_rate: f64,
    pub seed_rows: usize,
    pub seed_collision_rate: f64,
    /// Fixes the random draws for seed rows and batches.
    pub seed: Option<u64>,
    pub plan_options: PlanOptions,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            table_name: "people".to_string(),
            multiplier: 100,
            iterations: 10,
            by_id: false,
            include_atom: true,
            collision_rate: 0.3,
            seed_rows: 100_000,
            seed_collision_rate: 0.5,
            seed: None,
            plan_options: PlanOptions::default(),
        }
    }
}

impl BenchmarkConfig {
    pub fn strategies(&self) -> Vec<UpdateStrategy> {
        UpdateStrategy::ALL
            .into_iter()
            .filter(|strategy| self.include_atom || *strategy != UpdateStrategy::Atom)
            .collect()
    }

    pub fn batch_sizes(&self) -> impl Iterator<Item = usize> + '_ {
        (1..=self.iterations).map(|i| self.multiplier * i)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum BenchmarkError {
    #[error("Benchmark needs a multiplier of at least 1")]
    InvalidMultiplier,

    #[error("Could not generate instructions: {0}")]
    Generator(#[from] GeneratorError),

    #[error("{0}")]
    Bootstrap(#[from] BootstrapError),

    #[error("{0}")]
    MySql(#[from] MySqlError),
}

/// Outcome of one strategy on one batch size. `duration` is `None` when the
/// plan failed.
#[derive(Debug, Clone, PartialEq)]
pub struct RunData {
    pub strategy: UpdateStrategy,
    pub count: usize,
    pub duration: Option<Duration>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkReport {
    pub runs: Vec<RunData>,
}

impl BenchmarkReport {
    pub fn push(&mut self, run: RunData) {
        self.runs.push(run);
    }

    /// Distinct batch sizes, ascending.
    pub fn counts(&self) -> Vec<usize> {
        let mut counts: Vec<usize> = self.runs.iter().map(|run| run.count).collect();
        counts.sort_unstable();
        counts.dedup();
        counts
    }

    /// Strategies present in the report, in [`UpdateStrategy::ALL`] order.
    pub fn strategies(&self) -> Vec<UpdateStrategy> {
        UpdateStrategy::ALL
            .into_iter()
            .filter(|strategy| self.runs.iter().any(|run| run.strategy == *strategy))
            .collect()
    }

    /// The last recorded run for a strategy and batch size.
    pub fn get(&self, strategy: UpdateStrategy, count: usize) -> Option<&RunData> {
        self.runs.iter().rev().find(|run| run.strategy == strategy && run.count == count)
    }

    pub fn failed_count(&self) -> usize {
        self.runs.iter().filter(|run| run.duration.is_none()).count()
    }
}

pub fn generate_batch<R: Rng + ?Sized>(
    rng: &mut R,
    config: &BenchmarkConfig,
    count: usize,
) -> Result<Vec<UpdateInstruction>, GeneratorError> {
    if config.by_id {
        generate_with_id_with_rng(rng, count, config.collision_rate)
    } else {
        generate_with_rng(rng, count, config.collision_rate)
    }
}

/// Applies one plan on `connection` and measures it. A failed plan is logged
/// and comes back as `None`.
pub async fn time_plan<C>(
    connection: &mut C,
    config: &BenchmarkConfig,
    strategy: UpdateStrategy,
    batch: &[UpdateInstruction],
) -> Option<Duration>
where
    C: Connection + ?Sized,
{
    let start = Instant::now();

    match apply_batch(connection, strategy, &config.table_name, batch, &config.plan_options).await
    {
        Ok(_) => Some(start.elapsed()),
        Err(e) => {
            error!("{} run with {} instructions failed: {}", strategy, batch.len(), e);
            None
        }
    }
}

/// Times one strategy on a freshly prepared table. The atom strategy runs in a
/// transaction that is committed on success and rolled back on failure; its
/// duration includes the commit.
///
/// Only failing to get a connection is an error. Plan and transaction failures
/// are failed runs.
pub async fn run_strategy(
    client: &MySqlClient,
    config: &BenchmarkConfig,
    strategy: UpdateStrategy,
    batch: &[UpdateInstruction],
) -> Result<Option<Duration>, BenchmarkError> {
    let mut conn = client.get_conn().await?;

    if strategy.is_single_statement() {
        return Ok(time_plan(&mut conn, config, strategy, batch).await);
    }

    let start = Instant::now();
    let mut transaction = match conn.start_transaction(TxOpts::default()).await {
        Ok(transaction) => transaction,
        Err(e) => {
            error!("{} could not start a transaction: {}", strategy, e);
            return Ok(None);
        }
    };

    let applied = time_plan(&mut transaction, config, strategy, batch).await.is_some();
    let finished = if applied { transaction.commit().await } else { transaction.rollback().await };

    match finished {
        Ok(()) if applied => Ok(Some(start.elapsed())),
        Ok(()) => Ok(None),
        Err(e) => {
            error!(
                "{} transaction could not {}: {}",
                strategy,
                if applied { "commit" } else { "roll back" },
                e
            );
            Ok(None)
        }
    }
}

/// Walks every batch size and strategy, recording what `run` reports. A `None`
/// duration is a failed run and the walk goes on; an `Err` stops it.
async fn collect_runs<F, Fut>(
    config: &BenchmarkConfig,
    rng: &mut StdRng,
    mut run: F,
) -> Result<BenchmarkReport, BenchmarkError>
where
    F: FnMut(UpdateStrategy, Vec<UpdateInstruction>) -> Fut,
    Fut: Future<Output = Result<Option<Duration>, BenchmarkError>>,
{
    let strategies = config.strategies();
    let mut report = BenchmarkReport::default();

    for count in config.batch_sizes() {
        let batch = generate_batch(rng, config, count)?;

        for strategy in &strategies {
            let duration = run(*strategy, batch.clone()).await?;

            match duration {
                Some(duration) => {
                    info!("{}: {} [{}]", strategy, format_duration(duration), count)
                }
                None => info!("{}: failed [{}]", strategy, count),
            }

            report.push(RunData { strategy: *strategy, count, duration });
        }
    }

    Ok(report)
}

/// Runs every configured strategy over increasing batch sizes.
///
/// Plan failures are recorded as failed runs and the benchmark moves on.
/// Connection and bootstrap failures abort it.
pub async fn run_benchmark(
    client: &MySqlClient,
    config: &BenchmarkConfig,
) -> Result<BenchmarkReport, BenchmarkError> {
    if config.multiplier == 0 {
        return Err(BenchmarkError::InvalidMultiplier);
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let seed_statements = generate_seed_inserts(
        &mut rng,
        &config.table_name,
        config.seed_rows,
        config.seed_collision_rate,
    );

    let seed_statements = &seed_statements;

    collect_runs(config, &mut rng, move |strategy, batch| async move {
        recreate_table(client, &config.table_name).await?;
        seed_table(client, &config.table_name, seed_statements).await?;
        run_strategy(client, config, strategy, &batch).await
    })
    .await
}
