use std::{env, time::Duration};

use dotenv::dotenv;
use mysql_async::{prelude::FromRow, prelude::Queryable, Conn, Opts, Pool};
use tokio::time::timeout;
use tracing::{debug, error, info};

pub const DEFAULT_CONNECTION_STRING: &str = "mysql://root@localhost:3306/db";

pub fn connection_string() -> String {
    dotenv().ok();
    env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_CONNECTION_STRING.to_string())
}

#[derive(thiserror::Error, Debug)]
pub enum MySqlConnectionError {
    #[error("Could not parse connection string make sure it is correctly formatted: {0}")]
    CouldNotParseConnectionString(#[from] mysql_async::UrlError),

    #[error("Can not connect to the database please make sure your connection string is correct")]
    CanNotConnectToDatabase,
}

#[derive(thiserror::Error, Debug)]
pub enum MySqlError {
    #[error("MySqlError {0}")]
    MySqlError(#[from] mysql_async::Error),
}

pub struct MySqlClient {
    pool: Pool,
}

impl MySqlClient {
    /// Connects using `DATABASE_URL`.
    pub async fn new() -> Result<Self, MySqlConnectionError> {
        Self::connect(&connection_string()).await
    }

    pub async fn connect(url: &str) -> Result<Self, MySqlConnectionError> {
        let opts = Opts::from_url(url)?;
        let pool = Pool::new(opts);

        let mut conn = match timeout(Duration::from_millis(5000), pool.get_conn()).await {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => {
                error!("Error connecting to database: {}", e);
                return Err(MySqlConnectionError::CanNotConnectToDatabase);
            }
            Err(e) => {
                error!("Timeout connecting to database: {}", e);
                return Err(MySqlConnectionError::CanNotConnectToDatabase);
            }
        };

        if let Err(e) = conn.query_drop("SELECT 1").await {
            error!("Database did not answer a test query: {}", e);
            return Err(MySqlConnectionError::CanNotConnectToDatabase);
        }
        drop(conn);

        info!("Connected to MySQL");
        Ok(MySqlClient { pool })
    }

    pub async fn get_conn(&self) -> Result<Conn, MySqlError> {
        Ok(self.pool.get_conn().await?)
    }

    pub async fn batch_execute(&self, sql: &str) -> Result<(), MySqlError> {
        let mut conn = self.get_conn().await?;
        debug!("Executing {} bytes of SQL", sql.len());
        conn.query_drop(sql).await?;
        Ok(())
    }

    pub async fn query<T>(&self, sql: &str) -> Result<Vec<T>, MySqlError>
    where
        T: FromRow + Send + 'static,
    {
        let mut conn = self.get_conn().await?;
        Ok(conn.query(sql).await?)
    }

    pub async fn disconnect(self) -> Result<(), MySqlError> {
        self.pool.disconnect().await?;
        Ok(())
    }
}
