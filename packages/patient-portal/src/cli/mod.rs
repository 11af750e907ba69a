use crate::{
    config::{LogConfig, LogFormat, LogLevel, PortalConfig, StoreBackend, DEFAULT_CONFIG_FILE_PATH},
    error::Error,
    log::{CONFIG, RECORDS},
    store::PostgresStore,
};
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};

#[derive(Clone, Debug, Parser)]
#[command(version, about, verbatim_doc_comment)]
///
/// Patient Portal
///
/// Patient records behind a per-record access password, shared as a scannable link.
///
pub struct Args {
    /// Optional path to a Patient Portal configuration file.
    ///
    /// Default is "patient-portal.toml".
    /// Configuration is loaded from this file, if present.
    /// Environment variables are used instead of the file or to override any values defined in the file.
    #[arg(short = 'p', long, default_value = DEFAULT_CONFIG_FILE_PATH, verbatim_doc_comment, global = true)]
    pub config_file_path: String,

    ///
    /// Optional log level.
    ///
    #[arg(short, long, value_enum, default_value_t = LogConfig::default_log_level(), env = "PP_LOG__LEVEL", global = true)]
    pub log_level: LogLevel,

    ///
    /// Optional log format. Default level is "pretty" if running in a terminal session, otherwise "structured".
    ///
    #[arg(short='f', long, value_enum, default_value_t = LogConfig::default_log_format(), env = "PP_LOG__FORMAT", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Create the record tables in the configured PostgreSQL database and exit
    Migrate,
}

///
/// Runs command specified in command line
/// Returns Ok(true) if the caller should exit
///
pub async fn run(args: &Args, config: &PortalConfig) -> Result<bool, Error> {
    match args.command {
        Some(Commands::Migrate) => {
            debug!(target: CONFIG, msg = "Running migrate");
            migrate(config).await?;
            Ok(true)
        }
        None => Ok(false),
    }
}

async fn migrate(config: &PortalConfig) -> Result<(), Error> {
    if config.database.backend == StoreBackend::Memory {
        warn!(
            target: CONFIG,
            msg = "The in-memory record store has no schema. Set database.backend to postgres"
        );
        return Ok(());
    }

    let store = PostgresStore::connect(&config.database).await?;
    store.migrate().await?;

    info!(target: RECORDS, msg = "Schema applied", database = %config.database);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_migrate_with_global_options() {
        let args = Args::try_parse_from([
            "patient-portal",
            "migrate",
            "--config-file-path",
            "other.toml",
        ])
        .unwrap();
        assert!(matches!(args.command, Some(Commands::Migrate)));
        assert_eq!(args.config_file_path, "other.toml");
    }

    #[test]
    fn defaults_to_serving() {
        let args = Args::try_parse_from(["patient-portal"]).unwrap();
        assert!(args.command.is_none());
        assert_eq!(args.config_file_path, DEFAULT_CONFIG_FILE_PATH);
    }

    #[tokio::test]
    async fn migrate_is_a_no_op_for_memory_store() {
        let args = Args::try_parse_from(["patient-portal", "migrate"]).unwrap();
        let exit = run(&args, &PortalConfig::default()).await.unwrap();
        assert!(exit);
    }
}
