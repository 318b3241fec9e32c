//! # Kirana Back-Office Entry Point
//!
//! ```text
//! kirana [--config <ledger.toml>] [--db <kirana.db>] <command> [args]
//!
//!   report <date> [--filter <text>]     daily report as JSON
//!   export-report <date>                daily report as CSV sections
//!   import-products <file.csv>          upsert products from a sheet
//!   export <dir>                        one CSV per collection
//!   low-stock [--threshold N]           products at or below N (default 5)
//!   payroll <month> <year>              payable salary per staff member
//!   opening-balance <date> <amount>     set the day's opening cash
//! ```
//!
//! Setup lives in lib.rs so commands can be exercised from tests.

#[tokio::main]
async fn main() {
    if let Err(err) = kirana_backoffice::run(std::env::args().skip(1).collect()).await {
        eprintln!("{}", err.to_json());
        std::process::exit(1);
    }
}
