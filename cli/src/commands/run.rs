use bulk_update::{
    benchmark::{run_benchmark, write_report_to_path, BenchmarkConfig},
    MySqlClient,
};

use super::plan_options;
use crate::{
    cli_interface::RunArgs,
    console::{print_error_message, print_success_message, print_warn_message},
};

pub fn benchmark_config(args: &RunArgs) -> BenchmarkConfig {
    BenchmarkConfig {
        table_name: args.table.clone(),
        multiplier: args.multiplier,
        iterations: args.iterations,
        by_id: args.id,
        include_atom: !args.no_atom,
        collision_rate: args.collision_rate,
        seed_rows: args.seed_rows,
        seed: args.seed,
        plan_options: plan_options(args.join_last_write_wins),
        ..Default::default()
    }
}

pub async fn handle_run_command(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = benchmark_config(&args);

    let client = MySqlClient::new().await.map_err(|e| {
        print_error_message(&format!("Could not connect to MySQL, make sure DATABASE_URL is set in the .env correctly: trace: {}", e));
        e
    })?;

    let report = run_benchmark(&client, &config).await.map_err(|e| {
        print_error_message(&format!("Benchmark aborted: {}", e));
        e
    })?;

    let failed = report.failed_count();
    if failed > 0 {
        print_warn_message(&format!("{} runs failed and are left empty in the report", failed));
    }

    write_report_to_path(&args.output, &report).await.map_err(|e| {
        print_error_message(&format!("Could not write report to {}: {}", args.output.display(), e));
        e
    })?;

    client.disconnect().await?;

    print_success_message(&format!("Report written to {}", args.output.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli_interface::{Commands, CLI};
    use bulk_update::plan::{JoinCollisionPolicy, UpdateStrategy};

    fn run_args(args: &[&str]) -> RunArgs {
        match CLI::parse_from(args).command {
            Commands::Run(args) => args,
            other => panic!("expected run, got {:?}", other),
        }
    }

    #[test]
    fn test_benchmark_config_from_flags() {
        let config = benchmark_config(&run_args(&[
            "bulk_update",
            "run",
            "--no-atom",
            "--table",
            "staff",
            "--join-last-write-wins",
            "--seed",
            "7",
            "out.csv",
        ]));

        assert_eq!(config.table_name, "staff");
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.strategies(), vec![UpdateStrategy::Join, UpdateStrategy::Case]);
        assert_eq!(config.plan_options.join_collisions, JoinCollisionPolicy::LastWriteWins);
        assert_eq!(config.seed_collision_rate, BenchmarkConfig::default().seed_collision_rate);
    }
}
