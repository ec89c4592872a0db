//! snowflake-export - Drive the Snowflake export connector from the shell
//!
//! # Usage
//!
//! ```bash
//! # Create a table
//! snowflake-export create Orders -C OriginEntityCode -C Name -C Total:number
//!
//! # Load newline-delimited JSON records and flush them
//! snowflake-export load Orders orders.ndjson
//! cat orders.ndjson | snowflake-export load Orders -
//!
//! # Inspect the schema
//! snowflake-export tables
//! snowflake-export columns Orders
//! ```

mod cmd;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use snowflake_export::{Config, LogConfig, LogFormat, LogLevel};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// snowflake-export - Buffered Snowflake export connector
#[derive(Parser, Debug)]
#[command(name = "snowflake-export")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file
    #[arg(short, long, default_value = "configs/config.toml", global = true)]
    config: std::path::PathBuf,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<LogLevel>,

    /// Named connection from the config file (optional with one connection)
    #[arg(long, global = true)]
    connection: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a table from a column list
    Create(cmd::container::CreateArgs),

    /// Load newline-delimited JSON records into a table
    Load(cmd::load::LoadArgs),

    /// Delete every row of a table
    Empty(cmd::container::NameArgs),

    /// Rename a table
    Rename(cmd::container::RenameArgs),

    /// Rename a table aside with a timestamp suffix
    Archive(cmd::container::NameArgs),

    /// Drop a table
    Drop(cmd::container::NameArgs),

    /// List tables in the connection's schema
    Tables,

    /// List the columns of a table
    Columns(cmd::container::NameArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::from_file(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;
    init_logging(&config.log, cli.log_level)?;

    let target = cmd::Target::connect(&config, cli.connection.as_deref())?;

    let result = match cli.command {
        Command::Create(args) => cmd::container::create(&target, args).await,
        Command::Load(args) => cmd::load::run(&target, &config, args).await,
        Command::Empty(args) => cmd::container::empty(&target, args).await,
        Command::Rename(args) => cmd::container::rename(&target, args).await,
        Command::Archive(args) => cmd::container::archive(&target, args).await,
        Command::Drop(args) => cmd::container::remove(&target, args).await,
        Command::Tables => cmd::container::tables(&target).await,
        Command::Columns(args) => cmd::container::columns(&target, args).await,
    };

    // Sessions are released even when the command failed
    if let Err(e) = target.connector.close().await {
        tracing::warn!(error = %e, "failed to close warehouse sessions");
    }
    result
}

/// Initialize the tracing subscriber for logging.
///
/// Level precedence: CLI flag, then config file. Logs go to stderr so
/// command output on stdout stays clean.
fn init_logging(log: &LogConfig, cli_level: Option<LogLevel>) -> Result<()> {
    let directive = log.directive(cli_level);
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("invalid log filter '{}'", directive))?;

    match log.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init(),
        LogFormat::Console => tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .init(),
    }

    Ok(())
}
