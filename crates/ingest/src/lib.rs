#![deny(unsafe_code)]

/// Command-line parsing and the batch ingestion run.
pub mod runner;
/// Persisted ingestion settings.
pub mod settings;

pub use runner::{CliError, CliResult, RunnerArgs, ingest_batch, parse_args, parse_batch, run};
pub use settings::{IngestSettings, SettingsError, SettingsStore};
