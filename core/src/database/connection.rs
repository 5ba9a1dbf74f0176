use async_trait::async_trait;
use mysql_async::{prelude::Queryable, Conn, Params, Statement, Transaction, Value};

use crate::instruction::SqlValue;

/// The prepare/execute capability the update plans run against.
///
/// A transaction implements it too, so the atom plan can run inside one.
#[async_trait]
pub trait Connection: Send {
    type Statement: Send + Sync;
    type Error: std::error::Error + Send + Sync + 'static;

    async fn prepare(&mut self, sql: &str) -> Result<Self::Statement, Self::Error>;

    /// Returns the number of rows affected.
    async fn execute(
        &mut self,
        statement: &Self::Statement,
        params: &[SqlValue],
    ) -> Result<u64, Self::Error>;
}

pub fn to_mysql_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::NULL,
        SqlValue::Int(v) => Value::Int(*v),
        SqlValue::UInt(v) => Value::UInt(*v),
        SqlValue::Float(v) => Value::Double(*v),
        SqlValue::Text(v) => Value::Bytes(v.as_bytes().to_vec()),
        SqlValue::Bytes(v) => Value::Bytes(v.clone()),
    }
}

pub fn to_mysql_params(params: &[SqlValue]) -> Params {
    if params.is_empty() {
        Params::Empty
    } else {
        Params::Positional(params.iter().map(to_mysql_value).collect())
    }
}

macro_rules! impl_mysql_connection {
    ($($lt:lifetime)?; $target:ty) => {
        #[async_trait]
        impl<$($lt)?> Connection for $target {
            type Statement = Statement;
            type Error = mysql_async::Error;

            async fn prepare(&mut self, sql: &str) -> Result<Statement, mysql_async::Error> {
                self.prep(sql).await
            }

            async fn execute(
                &mut self,
                statement: &Statement,
                params: &[SqlValue],
            ) -> Result<u64, mysql_async::Error> {
                self.exec_drop(statement, to_mysql_params(params)).await?;
                Ok(self.affected_rows())
            }
        }
    };
}

impl_mysql_connection!(; Conn);
impl_mysql_connection!('t; Transaction<'t>);
