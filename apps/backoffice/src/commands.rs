//! # Back-Office Commands
//!
//! Argument parsing and dispatch. Every command is one call into a
//! `kirana-ledger` service; output is JSON for structured results and raw
//! CSV for exports.

use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::CommandError;
use kirana_core::Money;
use kirana_ledger::Ledger;

/// Default `low-stock` threshold.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// A parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Report { date: NaiveDate, filter: Option<String> },
    ExportReport { date: NaiveDate },
    ImportProducts { file: PathBuf },
    Export { dir: PathBuf },
    LowStock { threshold: i64 },
    Payroll { month: u32, year: i32 },
    OpeningBalance { date: NaiveDate, amount: Money },
}

impl Command {
    /// Parses `<command> [args]` (global options already removed).
    pub fn parse(args: &[String]) -> Result<Self, CommandError> {
        let (name, rest) = args
            .split_first()
            .ok_or_else(|| CommandError::usage("missing command"))?;

        match name.as_str() {
            "report" => {
                let date = parse_date(positional(rest, 0, "<date>")?)?;
                let filter = flag_value(rest, "--filter")?.map(str::to_string);
                Ok(Command::Report { date, filter })
            }
            "export-report" => Ok(Command::ExportReport {
                date: parse_date(positional(rest, 0, "<date>")?)?,
            }),
            "import-products" => Ok(Command::ImportProducts {
                file: PathBuf::from(positional(rest, 0, "<file.csv>")?),
            }),
            "export" => Ok(Command::Export {
                dir: PathBuf::from(positional(rest, 0, "<dir>")?),
            }),
            "low-stock" => {
                let threshold = match flag_value(rest, "--threshold")? {
                    Some(raw) => raw
                        .parse()
                        .map_err(|_| CommandError::usage(format!("invalid threshold '{}'", raw)))?,
                    None => DEFAULT_LOW_STOCK_THRESHOLD,
                };
                Ok(Command::LowStock { threshold })
            }
            "payroll" => {
                let month = positional(rest, 0, "<month>")?;
                let year = positional(rest, 1, "<year>")?;
                Ok(Command::Payroll {
                    month: month
                        .parse()
                        .map_err(|_| CommandError::usage(format!("invalid month '{}'", month)))?,
                    year: year
                        .parse()
                        .map_err(|_| CommandError::usage(format!("invalid year '{}'", year)))?,
                })
            }
            "opening-balance" => {
                let date = parse_date(positional(rest, 0, "<date>")?)?;
                let amount = Money::parse_decimal(positional(rest, 1, "<amount>")?)
                    .map_err(|e| CommandError::usage(e.to_string()))?;
                Ok(Command::OpeningBalance { date, amount })
            }
            other => Err(CommandError::usage(format!("unknown command '{}'", other))),
        }
    }
}

/// Runs a command and returns what should be printed.
pub async fn execute(ledger: &Ledger, command: Command) -> Result<String, CommandError> {
    debug!(?command, "Executing command");

    match command {
        Command::Report { date, filter } => {
            let report = ledger.reports().daily_report(date, filter.as_deref()).await?;
            Ok(serde_json::to_string_pretty(&report)?)
        }
        Command::ExportReport { date } => Ok(ledger.reports().export_report(date).await?),
        Command::ImportProducts { file } => {
            let text = std::fs::read_to_string(&file)?;
            let summary = ledger.transfer().import_products(&text).await?;
            Ok(serde_json::to_string_pretty(&summary)?)
        }
        Command::Export { dir } => {
            std::fs::create_dir_all(&dir)?;
            let mut written = Vec::new();
            for sheet in ledger.transfer().export_workbook().await? {
                let path = dir.join(format!("{}.csv", sheet.name.to_lowercase()));
                std::fs::write(&path, sheet.csv)?;
                written.push(path.display().to_string());
            }
            info!(?dir, files = written.len(), "Workbook written");
            Ok(written.join("\n"))
        }
        Command::LowStock { threshold } => {
            let products = ledger.catalog().low_stock(threshold).await?;
            Ok(products
                .iter()
                .map(|p| format!("{}\t{} {}", p.name, p.stock, p.unit))
                .collect::<Vec<_>>()
                .join("\n"))
        }
        Command::Payroll { month, year } => {
            let lines = ledger.payroll().payroll_summary(month, year).await?;
            Ok(serde_json::to_string_pretty(&lines)?)
        }
        Command::OpeningBalance { date, amount } => {
            let log = ledger.reports().set_opening_balance(date, amount).await?;
            Ok(serde_json::to_string_pretty(&log)?)
        }
    }
}

// =============================================================================
// Argument Helpers
// =============================================================================

/// The `index`-th argument that is neither a flag nor a flag's value.
fn positional<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str, CommandError> {
    let mut found = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i].starts_with("--") {
            i += 2;
            continue;
        }
        found.push(args[i].as_str());
        i += 1;
    }
    found
        .get(index)
        .copied()
        .ok_or_else(|| CommandError::usage(format!("missing {}", name)))
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Result<Option<&'a str>, CommandError> {
    match args.iter().position(|a| a == flag) {
        Some(i) => args
            .get(i + 1)
            .map(|v| Some(v.as_str()))
            .ok_or_else(|| CommandError::usage(format!("{} needs a value", flag))),
        None => Ok(None),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| CommandError::usage(format!("invalid date '{}', expected YYYY-MM-DD", raw)))
}
