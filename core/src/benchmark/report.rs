use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use csv::Writer;

use super::BenchmarkReport;

#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error("Could not write report: {0}")]
    Csv(#[from] csv::Error),

    #[error("Could not write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("Report writer task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Writes the report as CSV: a header of batch sizes, then one row per
/// strategy with milliseconds per batch size. Failed or missing runs are empty
/// cells.
pub fn write_report<W: Write>(writer: W, report: &BenchmarkReport) -> Result<(), ReportError> {
    let counts = report.counts();
    let mut writer = Writer::from_writer(writer);

    let mut header = vec![String::new()];
    header.extend(counts.iter().map(|count| count.to_string()));
    writer.write_record(&header)?;

    for strategy in report.strategies() {
        let mut record = vec![strategy.to_string()];
        record.extend(counts.iter().map(|count| {
            report
                .get(strategy, *count)
                .and_then(|run| run.duration)
                .map(|duration| duration.as_millis().to_string())
                .unwrap_or_default()
        }));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

pub async fn write_report_to_path(path: &Path, report: &BenchmarkReport) -> Result<(), ReportError> {
    let path = PathBuf::from(path);
    let report = report.clone();

    tokio::task::spawn_blocking(move || {
        let file = File::create(&path)?;
        write_report(file, &report)
    })
    .await?
}
