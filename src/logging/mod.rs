//! Logging setup built on `env_logger`, matching the `log` facade the
//! teacher crate already calls through (`log::error!` in
//! [`crate::server`]). Initializes once per process; safe to call from
//! tests, which may call it more than once.

use crate::config::LogLevel;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

pub fn init(level: LogLevel, log_file: Option<&Path>) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level.to_level_filter());

    if let Some(path) = log_file {
        if let Ok(file) = OpenOptions::new().create(true).append(true).open(path) {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
    }

    builder.format(|buf, record| {
        writeln!(
            buf,
            "[{}] {} {}: {}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        )
    });

    let _ = builder.try_init();
}

/// Per-client log prefix, matching the original C's `client->number` tag
/// so grep-friendly logs correlate requests across a connection.
pub fn client_tag(client_id: u64) -> String {
    format!("[Client {client_id}]")
}

/// Per-job log prefix, used by the processing worker (spec.md §5).
pub fn job_tag(printer_id: i32, job_id: i32) -> String {
    format!("[Job {job_id} on Printer {printer_id}]")
}
