use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::VehicleClass;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Vehicle sales ingestion and analytics API
#[derive(Parser, Debug, Clone)]
#[command(
    name = "vahan-dashboard",
    about = "Vehicle sales ingestion and analytics API",
    version
)]
pub struct Settings {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the persisted record collections
    #[arg(long, global = true, env = "VAHAN_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Logging level
    #[arg(long, global = true, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Top-level operations.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Serve the analytics HTTP API
    Serve {
        /// Interface to bind
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(long, env = "PORT", default_value_t = 5000)]
        port: u16,
    },
    /// Load <root>/<YYYY>/<state>.xlsx spreadsheets into a record collection
    Ingest {
        /// Directory containing the year folders
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Collection the records are written to
        #[arg(long, value_enum, default_value_t = VehicleClass::Ev)]
        class: VehicleClass,
    },
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments and apply derived overrides.
    pub fn load() -> Self {
        Self::resolve(Settings::parse())
    }

    /// Same as [`load`](Self::load) but with an explicit argument list.
    pub fn load_from<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::resolve(Settings::parse_from(args))
    }

    /// `--debug` overrides the log level.
    fn resolve(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// The configured data directory, or `~/.vahan-dashboard/data`.
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }
}

/// Default location of the persisted collections.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".vahan-dashboard")
        .join("data")
}

// ── Tests ──────────────────────────────────────────────────────────────────────
