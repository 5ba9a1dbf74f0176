use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[allow(clippy::upper_case_acronyms)]
#[derive(Parser, Debug)]
#[clap(name = "bulk_update", about = "Benchmarks row-at-a-time, CASE and JOIN bulk updates against MySQL", version)]
pub struct CLI {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Runs every strategy over increasing batch sizes and writes a CSV report.
    ///
    /// The connection string is read from `DATABASE_URL` (a `.env` file is
    /// honoured).
    ///
    /// Example:
    /// `bulk_update run --iter 5 results.csv`
    #[clap(name = "run")]
    Run(RunArgs),

    /// Prints the SQL a strategy compiles for a generated batch without
    /// touching a database.
    ///
    /// Example:
    /// `bulk_update explain --strategy case --count 3`
    #[clap(name = "explain")]
    Explain(ExplainArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Where the CSV report is written.
    pub output: PathBuf,

    /// Target rows by primary key instead of the `age` column.
    #[clap(long)]
    pub id: bool,

    /// Skip the row-at-a-time strategy, it dominates the run time on big batches.
    #[clap(long)]
    pub no_atom: bool,

    /// Batch size step, iteration `i` runs `multiplier * i` instructions.
    #[clap(long, default_value_t = 100)]
    pub multiplier: usize,

    /// Number of batch sizes to run.
    #[clap(long = "iter", default_value_t = 10)]
    pub iterations: usize,

    /// Share of a batch expected to repeat a WHERE value, between 0 and 1.
    #[clap(long, default_value_t = 0.3)]
    pub collision_rate: f64,

    #[clap(long, default_value = "people")]
    pub table: String,

    /// Rows inserted before every run.
    #[clap(long, default_value_t = 100_000)]
    pub seed_rows: usize,

    /// Collapse JOIN instructions sharing WHERE values to the last one.
    #[clap(long)]
    pub join_last_write_wins: bool,

    /// Fixes the random draws so runs can be repeated.
    #[clap(long)]
    pub seed: Option<u64>,

    /// Log every generated statement.
    #[clap(long, short)]
    pub verbose: bool,
}

#[derive(Args, Debug)]
pub struct ExplainArgs {
    /// join, case or atom
    #[clap(long, short)]
    pub strategy: String,

    #[clap(long, default_value_t = 5)]
    pub count: usize,

    #[clap(long, default_value_t = 0.3)]
    pub collision_rate: f64,

    /// Target rows by primary key instead of the `age` column.
    #[clap(long)]
    pub id: bool,

    #[clap(long)]
    pub seed: Option<u64>,

    #[clap(long, default_value = "people")]
    pub table: String,

    /// Collapse JOIN instructions sharing WHERE values to the last one.
    #[clap(long)]
    pub join_last_write_wins: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_defaults() {
        let cli = CLI::parse_from(["bulk_update", "run", "out.csv"]);

        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.output, PathBuf::from("out.csv"));
                assert_eq!(args.multiplier, 100);
                assert_eq!(args.iterations, 10);
                assert_eq!(args.collision_rate, 0.3);
                assert_eq!(args.table, "people");
                assert!(!args.id && !args.no_atom && !args.join_last_write_wins);
            }
            other => panic!("expected run, got {:?}", other),
        }
    }

    #[test]
    fn test_run_flags() {
        let cli = CLI::parse_from([
            "bulk_update",
            "run",
            "--id",
            "--no-atom",
            "--iter",
            "3",
            "--multiplier",
            "50",
            "--join-last-write-wins",
            "out.csv",
        ]);

        match cli.command {
            Commands::Run(args) => {
                assert!(args.id && args.no_atom && args.join_last_write_wins);
                assert_eq!(args.iterations, 3);
                assert_eq!(args.multiplier, 50);
            }
            other => panic!("expected run, got {:?}", other),
        }
    }

    #[test]
    fn test_explain_requires_strategy() {
        assert!(CLI::try_parse_from(["bulk_update", "explain"]).is_err());
        assert!(CLI::try_parse_from(["bulk_update", "explain", "--strategy", "join"]).is_ok());
    }
}
