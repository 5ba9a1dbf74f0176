use std::time::Duration;

/// Human readable duration for run logs, keeping sub-millisecond precision
/// for fast single-statement plans.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let minutes = secs / 60;
    let seconds = secs % 60;
    let millis = duration.subsec_millis();

    match (minutes, secs) {
        (m, _) if m > 0 => format!("{}m {}s", m, seconds),
        (0, s) if s >= 10 => format!("{}s", s),
        (0, s) if s > 0 => format!("{}s {}ms", s, millis),
        _ if duration.as_micros() >= 1000 => format!("{}ms", duration.as_millis()),
        _ => format!("{:.3}ms", duration.as_secs_f64() * 1000.0),
    }
}
