//! CLI surface for the test harness (spec.md §6): spool dir, logging,
//! listen port, driver selection, startup mode, auth, and device options.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Fatal | LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
        }
    }
}

/// Parsed command-line configuration for a printer application binary
/// built on this core.
#[derive(Debug, Parser)]
#[command(name = "pappl-core", about = "IPP printer application framework")]
pub struct Config {
    /// Directory holding spooled jobs and the persisted state file.
    #[arg(long, default_value = "/var/spool/pappl-core")]
    pub spool_dir: PathBuf,

    /// Write log output to this file instead of stderr.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// IPP listen port.
    #[arg(long, default_value_t = 8000)]
    pub port: u16,

    /// Driver name to pre-register a printer with; repeatable.
    #[arg(long = "driver")]
    pub drivers: Vec<String>,

    /// Discard any persisted state and start with an empty printer table.
    #[arg(long)]
    pub clean_start: bool,

    /// Refuse unencrypted connections.
    #[arg(long, conflicts_with = "no_tls")]
    pub tls_only: bool,

    /// Never offer ipps:// URIs.
    #[arg(long)]
    pub no_tls: bool,

    /// PAM service name used to authenticate admin/print-group requests.
    #[arg(long)]
    pub auth_service: Option<String>,

    /// Expose an implementation-registered USB gadget device.
    #[arg(long)]
    pub usb_gadget: bool,

    /// Restrict the system to a single, always-default printer queue.
    #[arg(long)]
    pub single_queue: bool,

    /// Directory driver callbacks write rendered output into (test harness
    /// hook for the `file://` device).
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Name of a specific end-to-end scenario to run, for the test
    /// harness; absent means "serve forever".
    #[arg(long)]
    pub test: Option<String>,
}

impl Config {
    pub fn tls_mode(&self) -> crate::system::TlsMode {
        if self.no_tls {
            crate::system::TlsMode::Off
        } else if self.tls_only {
            crate::system::TlsMode::Required
        } else {
            crate::system::TlsMode::Optional
        }
    }
}
