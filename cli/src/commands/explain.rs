use bulk_update::{
    benchmark::{generate_batch, BenchmarkConfig},
    plan::{compile_plan, UpdatePlan, UpdateStrategy},
};
use rand::{rngs::StdRng, SeedableRng};

use super::plan_options;
use crate::{cli_interface::ExplainArgs, console::print_success_message};

pub fn explain_plan(args: &ExplainArgs) -> Result<UpdatePlan, Box<dyn std::error::Error>> {
    let strategy: UpdateStrategy = args.strategy.parse()?;
    let config = BenchmarkConfig {
        table_name: args.table.clone(),
        by_id: args.id,
        collision_rate: args.collision_rate,
        plan_options: plan_options(args.join_last_write_wins),
        ..Default::default()
    };

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let batch = generate_batch(&mut rng, &config, args.count)?;

    Ok(compile_plan(strategy, &config.table_name, &batch, &config.plan_options)?)
}

pub fn handle_explain_command(args: ExplainArgs) -> Result<(), Box<dyn std::error::Error>> {
    let plan = explain_plan(&args)?;

    for command in &plan.commands {
        println!("{};", command.sql);
        let params: Vec<String> = command.params.iter().map(|param| param.to_string()).collect();
        println!("-- params: [{}]\n", params.join(", "));
    }

    print_success_message(&format!(
        "{}: {} statements, {} parameters",
        plan.strategy,
        plan.statement_count(),
        plan.parameter_count()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(strategy: &str, count: usize) -> ExplainArgs {
        ExplainArgs {
            strategy: strategy.to_string(),
            count,
            collision_rate: 0.3,
            id: false,
            seed: Some(11),
            table: "people".to_string(),
            join_last_write_wins: false,
        }
    }

    #[test]
    fn test_explain_case_is_one_statement() {
        let plan = explain_plan(&args("case", 4)).unwrap();

        assert_eq!(plan.strategy, UpdateStrategy::Case);
        assert_eq!(plan.statement_count(), 1);
        assert_eq!(plan.parameter_count(), 4 * 3);
    }

    #[test]
    fn test_explain_atom_is_one_statement_per_instruction() {
        let plan = explain_plan(&args("atom", 4)).unwrap();

        assert_eq!(plan.statement_count(), 4);
        assert_eq!(plan.parameter_count(), 8);
    }

    #[test]
    fn test_explain_rejects_unknown_strategy() {
        assert!(explain_plan(&args("merge", 4)).is_err());
    }
}
