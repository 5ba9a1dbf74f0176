use std::env;

use tracing::{debug, level_filters::LevelFilter};
use tracing_subscriber::{
    fmt::{
        format::{Format, Writer},
        time::FormatTime,
    },
    EnvFilter,
};

/// Local wall-clock time down to microseconds, so consecutive run lines can be
/// compared by eye.
struct RunClock;

impl FormatTime for RunClock {
    fn format_time(&self, writer: &mut Writer<'_>) -> std::fmt::Result {
        write!(writer, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.6f"))
    }
}

fn run_filter(log_level: LevelFilter) -> EnvFilter {
    let filter = EnvFilter::from_default_env().add_directive(log_level.into());

    // driver pool chatter buries the per-run lines unless RUST_LOG asks for it
    if env::var_os("RUST_LOG").is_some() {
        return filter;
    }
    match "mysql_async=warn".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Installs the global subscriber. Generated SQL previews are logged at
/// `debug`, run outcomes at `info`.
pub fn setup_logger(log_level: LevelFilter) {
    let format = Format::default().with_timer(RunClock).with_level(true).with_target(false);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(run_filter(log_level))
        .event_format(format)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        debug!("Global subscriber already installed, keeping it");
    }
}

pub fn setup_info_logger() {
    setup_logger(LevelFilter::INFO);
}
