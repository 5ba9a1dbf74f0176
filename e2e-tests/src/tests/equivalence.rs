use std::{future::Future, pin::Pin};

use anyhow::{anyhow, Result};
use bulk_update::{generator::generate_with_rng, JoinCollisionPolicy, PlanOptions, UpdateStrategy};
use tracing::info;

use crate::{
    reference::assert_rows_equal,
    test_suite::{TestContext, BATCH_COLLISION_RATE, BATCH_SIZE},
    tests::registry::{TestDefinition, TestModule},
};

pub struct EquivalenceTests;

impl TestModule for EquivalenceTests {
    fn get_tests() -> Vec<TestDefinition> {
        vec![TestDefinition::new(
            "test_6_cross_strategy_equivalence",
            "All strategies leave identical tables for the same seed and batch",
            cross_strategy_equivalence_test,
        )
        .with_timeout(120)]
    }
}

fn cross_strategy_equivalence_test(
    context: &mut TestContext,
) -> Pin<Box<dyn Future<Output = Result<()>> + '_>> {
    Box::pin(async move {
        let statements = context.seed_statements();
        let options = PlanOptions { join_collisions: JoinCollisionPolicy::LastWriteWins };

        // several batches so at least one carries WHERE collisions
        for round in 0..5 {
            let batch = generate_with_rng(&mut context.rng, BATCH_SIZE, BATCH_COLLISION_RATE)?;
            let mut tables = Vec::new();

            for strategy in UpdateStrategy::ALL {
                context.reset_people(&statements).await?;
                context.apply(strategy, &batch, &options).await?;
                tables.push((strategy, context.read_people().await?));
            }

            let (baseline_strategy, baseline) = &tables[0];
            for (strategy, table) in &tables[1..] {
                assert_rows_equal(baseline, table).map_err(|e| {
                    anyhow!("round {}: {} and {} differ: {}", round, baseline_strategy, strategy, e)
                })?;
            }
            info!("Round {}: all strategies agree", round);
        }

        Ok(())
    })
}
