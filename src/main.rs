use anyhow::{Context, Result};
use std::env;
use std::process::ExitCode;
use tracing::info;

use account_service::{init_logging, verify_count, Account, Database, ServerConfig};

const USAGE: &str = "usage: account-service <init|list>";

fn main() -> Result<ExitCode> {
    let config = ServerConfig::from_env()?;
    init_logging(config.log_format);

    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("init") => run_init(&config)?,
        Some("list") => run_list(&config)?,
        _ => {
            eprintln!("{}", USAGE);
            return Ok(ExitCode::from(2));
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn open(config: &ServerConfig) -> Result<Database> {
    Database::open(&config.database_path)
        .with_context(|| format!("failed to open database at {}", config.database_path))
}

/// Create the schema (opening the database does it) and report the row count.
fn run_init(config: &ServerConfig) -> Result<()> {
    let db = open(config)?;
    let count = db.with_transaction(|tx| verify_count(tx))?;
    info!(path = %config.database_path, accounts = count, "database ready");
    Ok(())
}

fn run_list(config: &ServerConfig) -> Result<()> {
    let db = open(config)?;
    let accounts = db.with_transaction(|tx| Account::all(tx))?;

    let json: Vec<serde_json::Value> = accounts.iter().map(Account::serialize).collect();
    println!("{}", serde_json::to_string_pretty(&json)?);

    info!(accounts = accounts.len(), "listed accounts");
    Ok(())
}
