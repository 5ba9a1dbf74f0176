use anyhow::Result;
use bulk_update::{
    apply_batch, drop_table_sql, generate_seed_inserts, plan::format_table_name, recreate_table,
    seed_table, MySqlClient, PlanOptions, UpdateInstruction, UpdateStrategy,
};
use rand::{rngs::StdRng, SeedableRng};
use tracing::info;

use crate::reference::PersonRow;

pub const SEED_ROWS: usize = 100;
pub const SEED_COLLISION_RATE: f64 = 0.5;
pub const BATCH_SIZE: usize = 10;
pub const BATCH_COLLISION_RATE: f64 = 0.3;

pub struct TestContext {
    pub client: MySqlClient,
    pub table_name: String,
    pub rng: StdRng,
}

impl TestContext {
    pub async fn new(database_url: &str, table_name: &str, seed: u64) -> Result<Self> {
        info!("Setting up fresh test context on table {}...", table_name);
        let client = MySqlClient::connect(database_url).await?;

        Ok(Self { client, table_name: table_name.to_string(), rng: StdRng::seed_from_u64(seed) })
    }

    pub fn seed_statements(&mut self) -> Vec<String> {
        generate_seed_inserts(&mut self.rng, &self.table_name, SEED_ROWS, SEED_COLLISION_RATE)
    }

    /// Recreates the table from `statements` and returns its rows.
    pub async fn reset_people(&self, statements: &[String]) -> Result<Vec<PersonRow>> {
        recreate_table(&self.client, &self.table_name).await?;
        seed_table(&self.client, &self.table_name, statements).await?;
        self.read_people().await
    }

    pub async fn seed_people(&mut self) -> Result<Vec<PersonRow>> {
        let statements = self.seed_statements();
        self.reset_people(&statements).await
    }

    pub async fn read_people(&self) -> Result<Vec<PersonRow>> {
        let rows: Vec<(i64, i64, i64)> = self
            .client
            .query(&format!(
                "SELECT `id`, `age`, `unit` FROM {} ORDER BY `id`",
                format_table_name(&self.table_name)
            ))
            .await?;

        Ok(rows.into_iter().map(|(id, age, unit)| PersonRow { id, age, unit }).collect())
    }

    pub async fn apply(
        &self,
        strategy: UpdateStrategy,
        batch: &[UpdateInstruction],
        options: &PlanOptions,
    ) -> Result<u64> {
        let mut conn = self.client.get_conn().await?;
        Ok(apply_batch(&mut conn, strategy, &self.table_name, batch, options).await?)
    }

    pub async fn cleanup(self) -> Result<()> {
        self.client.batch_execute(&drop_table_sql(&self.table_name)).await?;
        self.client.disconnect().await?;
        Ok(())
    }
}
