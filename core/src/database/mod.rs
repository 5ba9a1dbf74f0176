mod connection;
pub mod mysql;

pub use connection::{to_mysql_params, to_mysql_value, Connection};

#[cfg(test)]
pub(crate) use connection::testing;
