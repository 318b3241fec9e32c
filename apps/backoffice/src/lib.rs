//! # Kirana Back-Office Library
//!
//! ## Module Organization
//! ```text
//! kirana_backoffice/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── commands.rs     ◄─── Argument parsing and dispatch
//! └── error.rs        ◄─── Error envelope printed on failure
//! ```

pub mod commands;
pub mod error;

use std::path::PathBuf;

use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use commands::Command;
use error::CommandError;
use kirana_db::Database;
use kirana_ledger::{Ledger, LedgerConfig};

/// Runs one back-office command.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. Initialize logging (stderr; stdout carries command output)          │
/// │  2. Split global options (--config, --db) from the command              │
/// │  3. Load ledger.toml, apply KIRANA_* overrides, then --db               │
/// │  4. Open the store (creates the file, runs migrations)                  │
/// │  5. Seed settings from config on a fresh store                          │
/// │  6. Execute the command and print its output                            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(args: Vec<String>) -> Result<(), CommandError> {
    init_tracing();

    let (options, rest) = split_global_options(args)?;
    let command = Command::parse(&rest)?;

    let mut config = LedgerConfig::load(options.config)?;
    if let Some(path) = options.db {
        config.database.path = path;
    }

    if let Some(parent) = config.database.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    info!(db_path = ?config.database.path, "Opening ledger");

    let db = Database::new(config.db_config()).await?;
    let ledger = Ledger::new(db);
    ledger.ensure_settings(&config).await?;

    let result = commands::execute(&ledger, command).await;
    ledger.database().close().await;

    let output = result?;
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=kirana=trace` - Show trace for kirana crates only
/// - Default: INFO level
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kirana=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug, Default, PartialEq)]
struct GlobalOptions {
    config: Option<PathBuf>,
    db: Option<PathBuf>,
}

/// Pulls leading `--config`/`--db` (or `-c`/`-d`) pairs off the front.
fn split_global_options(args: Vec<String>) -> Result<(GlobalOptions, Vec<String>), CommandError> {
    let mut options = GlobalOptions::default();
    let mut i = 0;

    while i < args.len() {
        let slot = match args[i].as_str() {
            "--config" | "-c" => &mut options.config,
            "--db" | "-d" => &mut options.db,
            _ => break,
        };
        let value = args
            .get(i + 1)
            .ok_or_else(|| CommandError::usage(format!("{} needs a value", args[i])))?;
        *slot = Some(PathBuf::from(value));
        i += 2;
    }

    Ok((options, args[i..].to_vec()))
}
