use rand::Rng;
use tracing::{debug, info};

use crate::{
    database::mysql::client::{MySqlClient, MySqlError},
    generator::{collision_domain, ID_COLUMN, SET_COLUMN, WHERE_COLUMN},
    plan::format_table_name,
};

/// Rows per seed `INSERT`, keeping each statement well under `max_allowed_packet`.
pub const SEED_CHUNK_ROWS: usize = 10_000;

#[derive(thiserror::Error, Debug)]
pub enum BootstrapError {
    #[error("Could not recreate table {table}: {source}")]
    RecreateTable { table: String, source: MySqlError },

    #[error("Could not seed table {table}: {source}")]
    SeedTable { table: String, source: MySqlError },
}

pub fn drop_table_sql(table_name: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", format_table_name(table_name))
}

pub fn create_table_sql(table_name: &str) -> String {
    format!(
        "CREATE TABLE {} (\
         `{}` INT NOT NULL AUTO_INCREMENT PRIMARY KEY, \
         `{}` INT NOT NULL, \
         `{}` INT NOT NULL)",
        format_table_name(table_name),
        ID_COLUMN,
        WHERE_COLUMN,
        SET_COLUMN
    )
}

/// Literal `INSERT` statements for `rows` rows with `unit = 0` and `age`
/// drawn from the collision domain.
pub fn generate_seed_inserts<R: Rng + ?Sized>(
    rng: &mut R,
    table_name: &str,
    rows: usize,
    collision_rate: f64,
) -> Vec<String> {
    let domain = collision_domain(rows, collision_rate);
    let header = format!(
        "INSERT INTO {} (`{}`, `{}`) VALUES ",
        format_table_name(table_name),
        WHERE_COLUMN,
        SET_COLUMN
    );

    let mut statements = Vec::with_capacity(rows.div_ceil(SEED_CHUNK_ROWS));
    let mut remaining = rows;
    while remaining > 0 {
        let chunk = remaining.min(SEED_CHUNK_ROWS);
        let values: Vec<String> =
            (0..chunk).map(|_| format!("({}, 0)", rng.random_range(0..domain))).collect();
        statements.push(format!("{}{}", header, values.join(",\n")));
        remaining -= chunk;
    }

    statements
}

pub async fn recreate_table(client: &MySqlClient, table_name: &str) -> Result<(), BootstrapError> {
    let recreate = |source| BootstrapError::RecreateTable { table: table_name.to_string(), source };

    client.batch_execute(&drop_table_sql(table_name)).await.map_err(recreate)?;
    client.batch_execute(&create_table_sql(table_name)).await.map_err(recreate)?;

    debug!("Recreated table {}", table_name);
    Ok(())
}

pub async fn seed_table(
    client: &MySqlClient,
    table_name: &str,
    statements: &[String],
) -> Result<(), BootstrapError> {
    for statement in statements {
        client.batch_execute(statement).await.map_err(|source| BootstrapError::SeedTable {
            table: table_name.to_string(),
            source,
        })?;
    }

    info!("Seeded table {} with {} insert statements", table_name, statements.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn test_table_ddl() {
        assert_eq!(drop_table_sql("people"), "DROP TABLE IF EXISTS `people`");
        assert_eq!(
            create_table_sql("people"),
            "CREATE TABLE `people` (`id` INT NOT NULL AUTO_INCREMENT PRIMARY KEY, \
             `age` INT NOT NULL, `unit` INT NOT NULL)"
        );
    }

    #[test]
    fn test_seed_inserts_are_chunked() {
        let mut rng = StdRng::seed_from_u64(1);
        let statements = generate_seed_inserts(&mut rng, "people", SEED_CHUNK_ROWS + 5, 0.5);

        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("INSERT INTO `people` (`age`, `unit`) VALUES ("));
        assert_eq!(statements[0].matches(", 0)").count(), SEED_CHUNK_ROWS);
        assert_eq!(statements[1].matches(", 0)").count(), 5);
    }

    #[test]
    fn test_seed_ages_stay_in_domain() {
        let mut rng = StdRng::seed_from_u64(2);
        let statements = generate_seed_inserts(&mut rng, "people", 100, 0.5);
        let domain = collision_domain(100, 0.5);

        let ages: Vec<i64> = statements[0]
            .split("VALUES ")
            .nth(1)
            .unwrap()
            .split(",\n")
            .map(|tuple| tuple.trim_matches(|c| c == '(' || c == ')').split(", ").next().unwrap())
            .map(|age| age.parse().unwrap())
            .collect();

        assert_eq!(ages.len(), 100);
        assert!(ages.iter().all(|age| (0..domain).contains(age)));
    }

    #[test]
    fn test_zero_rows_need_no_statements() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(generate_seed_inserts(&mut rng, "people", 0, 0.5).is_empty());
    }
}
