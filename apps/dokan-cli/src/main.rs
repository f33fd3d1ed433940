//! # dokan: Operator CLI
//!
//! Command-line access to the shop's local record.
//!
//! ## Usage
//! ```bash
//! dokan summary                    # today's dashboard and all-time totals
//! dokan low-stock                  # products at or under their threshold
//! dokan history                    # transactions, newest first
//! dokan export                     # writes shop_backup_YYYY-MM-DD.json
//! dokan export --out backup.json
//! dokan import backup.json         # replaces the shop with a backup
//! dokan config                     # prints the resolved configuration
//! ```
//!
//! ## Environment
//! - `RUST_LOG` - log filter (default `info,dokan=debug,sqlx=warn`)
//! - `DOKAN_DB_PATH` - database file (default `<data dir>/dokan.db`)

use std::error::Error;
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dokan_core::snapshot::{backup_file_name, export_snapshot};
use dokan_core::{reports, AppState};
use dokan_db::{Database, DbConfig};
use dokan_sync::{AuthSession, MemoryRemote, Shop, SqliteLocalStore, SyncConfig};

/// Dokan shop ledger
#[derive(Parser, Debug)]
#[command(name = "dokan")]
#[command(about = "Inspect and back up the Dokan shop ledger", long_about = None)]
struct CliArgs {
    /// Sync config file (default: <config dir>/sync.toml)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Today's dashboard and all-time totals
    Summary,

    /// Products at or under their low-stock threshold
    LowStock,

    /// Transactions grouped by checkout, newest first
    History {
        /// Show at most this many transactions
        #[arg(long, short = 'n')]
        limit: Option<usize>,
    },

    /// Write a backup file
    Export {
        /// Output path (default: shop_backup_YYYY-MM-DD.json)
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Replace the shop with a backup file
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print the resolved configuration
    Config,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let args = CliArgs::parse();
    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: CliArgs) -> Result<(), Box<dyn Error>> {
    let config = SyncConfig::load(args.config)?;

    if let Command::Config = args.command {
        print!("{}", resolved_config(&config)?);
        return Ok(());
    }

    let db_path = config
        .db_path()
        .ok_or("could not determine a data directory; set DOKAN_DB_PATH")?;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = Database::new(DbConfig::new(db_path)).await?;

    let result = match args.command {
        Command::Import { file } => import(&db, &config, &file).await,
        command => {
            let state = db
                .snapshots()
                .load_state(&config.storage.key)
                .await?
                .unwrap_or_default();
            report(&state, command)
        }
    };

    db.close().await;
    result
}

// =============================================================================
// Commands
// =============================================================================

fn report(state: &AppState, command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Summary => {
            let dashboard = reports::dashboard(state, Utc::now());
            let totals = reports::totals(state);
            println!("{}", serde_json::to_string_pretty(&dashboard)?);
            println!("{}", serde_json::to_string_pretty(&totals)?);
        }
        Command::LowStock => {
            for product in reports::low_stock(state) {
                println!(
                    "{:<32} {:>6} {}",
                    product.name,
                    product.stock,
                    product.unit
                );
            }
        }
        Command::History { limit } => {
            let history = reports::transaction_history(state);
            let shown = limit.unwrap_or(history.len());
            for tx in history.iter().take(shown) {
                println!(
                    "{}  {:<24} total {}  paid {}  due {}",
                    tx.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    tx.customer_name,
                    tx.total,
                    tx.paid,
                    tx.due
                );
            }
        }
        Command::Export { out } => {
            let path = out.unwrap_or_else(|| {
                PathBuf::from(backup_file_name(Utc::now().date_naive()))
            });
            std::fs::write(&path, export_snapshot(state)?)?;
            info!(path = %path.display(), "Backup written");
            println!("{}", path.display());
        }
        Command::Import { .. } | Command::Config => {}
    }
    Ok(())
}

/// Restores through the same path the app uses, so the owner link survives
/// and the record is written exactly once.
async fn import(db: &Database, config: &SyncConfig, file: &Path) -> Result<(), Box<dyn Error>> {
    let raw = std::fs::read_to_string(file)?;

    let store = SqliteLocalStore::new(db.clone(), config.storage.key.clone());
    let auth = AuthSession::new();
    let (shop, task) = Shop::open(store, MemoryRemote::new(), auth.subscribe(), config, None).await?;

    shop.import(&raw)?;
    shop.shutdown();
    task.await?;

    let state = shop.snapshot();
    info!(
        products = state.products.len(),
        sales = state.sales.len(),
        "Backup imported"
    );
    println!(
        "Imported {} products, {} sales, {} credit accounts",
        state.products.len(),
        state.sales.len(),
        state.credits.len()
    );
    Ok(())
}

/// The config as TOML, with the database path resolved.
fn resolved_config(config: &SyncConfig) -> Result<String, Box<dyn Error>> {
    let mut resolved = config.clone();
    resolved.storage.db_path = config.db_path();
    Ok(toml::to_string_pretty(&resolved)?)
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=dokan_sync=trace` - Trace the sync coordinator only
/// - Default: INFO, with debug for dokan crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,dokan=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
