pub mod benchmark;
pub mod generator;
pub mod instruction;
pub mod plan;

mod database;
pub use database::{
    mysql::{
        client::{connection_string, MySqlClient, MySqlConnectionError, MySqlError},
        setup::{
            create_table_sql, drop_table_sql, generate_seed_inserts, recreate_table, seed_table,
            BootstrapError,
        },
    },
    to_mysql_params, to_mysql_value, Connection,
};

mod helpers;
pub use helpers::format_duration;

mod logger;
pub use logger::{setup_info_logger, setup_logger};

pub use instruction::{KeyValue, SqlValue, UpdateInstruction};
pub use plan::{
    apply_batch, compile_plan, execute_plan, JoinCollisionPolicy, PlanCompiler, PlanError,
    PlanOptions, SchemaMismatchError, UpdatePlan, UpdateStrategy,
};

// export 3rd party dependencies
pub use async_trait::async_trait;
pub use tracing::level_filters::LevelFilter;
