//! AgentTrust indexer binary.
//!
//! Watches the five registry contracts, applies their events to SQLite, and
//! keeps a per-chain cursor so restarts resume where they stopped. Queries
//! are served by the separate `agenttrust-api` service.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use agenttrust_indexer::config::Config;
use agenttrust_indexer::listener::{RpcProvider, SyncEngine, TickOutcome};
use agenttrust_indexer::storage::Storage;

#[derive(Parser)]
#[command(name = "agenttrust-indexer")]
#[command(version, about = "AgentTrust indexer for registry events", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "indexer.toml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the indexer service (continuous sync)
    Run,

    /// Process a single block range and exit
    SyncOnce,

    /// Show sync progress and table counts
    Status,

    /// Create the database schema and exit
    InitDb {
        /// Database URL
        #[arg(long, default_value = "sqlite://agenttrust.db")]
        database_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.debug);

    info!("agenttrust-indexer {}", env!("CARGO_PKG_VERSION"));

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_indexer(&cli.config).await?,
        Commands::SyncOnce => sync_once(&cli.config).await?,
        Commands::Status => show_status(&cli.config).await?,
        Commands::InitDb { database_url } => init_database(&database_url).await?,
    }

    Ok(())
}

fn init_logging(debug: bool) {
    let env_filter = if debug {
        EnvFilter::new("agenttrust_indexer=debug,sqlx=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("agenttrust_indexer=info"))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_line_number(true))
        .init();
}

/// Connect to the configured database and bring its schema up to date.
async fn open_storage(config: &Config) -> Result<Storage> {
    let storage = Storage::new(
        &config.database.url,
        Some(config.database.max_connections),
        Some(config.database.min_connections),
    )
    .await
    .context("Could not open database")?;

    storage
        .run_migrations()
        .await
        .context("Could not apply migrations")?;

    Ok(storage)
}

fn build_engine(config: &Config, storage: Storage) -> Result<SyncEngine<RpcProvider>> {
    let provider = RpcProvider::new(&config.network.rpc_url, config.contracts.clone())
        .context("Could not create RPC provider")?;

    Ok(SyncEngine::new(
        provider,
        storage,
        config.sync.clone(),
        config.network.chain_id,
    ))
}

/// Run the sync loop until interrupted.
async fn run_indexer(config_path: &str) -> Result<()> {
    let config = Config::from_file(config_path)
        .with_context(|| format!("Could not load {}", config_path))?;

    info!(
        chain_id = config.network.chain_id,
        rpc_url = %config.network.rpc_url,
        database = %config.database.url,
        start_block = config.sync.start_block,
        "Configuration loaded"
    );

    let storage = open_storage(&config).await?;
    let sync_engine = build_engine(&config, storage.clone())?;

    let sync_handle = tokio::spawn(async move { sync_engine.run().await });

    info!("Indexing. Press Ctrl+C to stop; queries are served by agenttrust-api.");

    tokio::select! {
        result = sync_handle => {
            storage.close().await;
            match result {
                Ok(Ok(())) => {
                    warn!("Sync loop returned without an error");
                    Ok(())
                }
                Ok(Err(e)) => Err(e).context("Sync loop failed"),
                Err(e) => Err(anyhow::anyhow!("Sync task panicked: {}", e)),
            }
        }
        result = tokio::signal::ctrl_c() => {
            result.context("Could not listen for Ctrl+C")?;
            info!("Shutdown signal received");
            storage.close().await;
            Ok(())
        }
    }
}

/// Process one block range and exit. Fits cron-style deployments.
async fn sync_once(config_path: &str) -> Result<()> {
    let config = Config::from_file(config_path)
        .with_context(|| format!("Could not load {}", config_path))?;
    let storage = open_storage(&config).await?;
    let sync_engine = build_engine(&config, storage.clone())?;

    let started = std::time::Instant::now();
    let outcome = sync_engine.tick().await;
    let elapsed = started.elapsed();

    match outcome {
        Ok(TickOutcome::Processed {
            from_block,
            to_block,
            events,
        }) => {
            info!(
                "Processed blocks {}..={} ({} events) in {}ms",
                from_block,
                to_block,
                events,
                elapsed.as_millis()
            );
        }
        Ok(TickOutcome::AtHead { head }) => {
            info!("Nothing to do, cursor is at head block {}", head);
        }
        Err(e) => {
            storage.close().await;
            return Err(e).context("Sync pass failed");
        }
    }

    storage.close().await;

    Ok(())
}

/// Print sync progress and per-table counts.
async fn show_status(config_path: &str) -> Result<()> {
    // A missing config file falls back to the default database; any other
    // load failure is reported. The io::Error sits below layers of context.
    let (database_url, max_conn, min_conn) = match Config::from_file(config_path) {
        Ok(config) => (
            config.database.url,
            Some(config.database.max_connections),
            Some(config.database.min_connections),
        ),
        Err(e) => {
            let missing_file = e.chain().any(|cause| {
                cause
                    .downcast_ref::<std::io::Error>()
                    .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
            });
            if !missing_file {
                return Err(e).with_context(|| format!("Could not load {}", config_path));
            }
            info!("No config at {}, reading sqlite://agenttrust.db", config_path);
            ("sqlite://agenttrust.db".to_string(), None, None)
        }
    };

    let storage = Storage::new(&database_url, max_conn, min_conn)
        .await
        .context("Could not open database")?;
    storage
        .run_migrations()
        .await
        .context("Could not apply migrations")?;

    let cursors = storage.list_cursors().await?;
    let stats = storage.stats().await?;

    println!("\n=== AgentTrust Indexer Status ===\n");
    println!("Sync progress:");
    if cursors.is_empty() {
        println!("  no chains indexed yet");
    }
    for cursor in &cursors {
        println!(
            "  chain {}: last processed block {}",
            cursor.chain_id, cursor.last_processed_block
        );
    }

    println!("\nRecords:");
    println!("  dids:         {}", stats.did_count);
    println!("  schemas:      {}", stats.schema_count);
    println!("  attestations: {}", stats.attestation_count);
    println!("  delegations:  {}", stats.delegation_count);
    println!("  revocations:  {}", stats.revocation_count);
    println!();

    storage.close().await;

    Ok(())
}

/// Create the schema in a fresh (or existing) database.
async fn init_database(database_url: &str) -> Result<()> {
    let storage = Storage::new(database_url, None, None)
        .await
        .context("Could not open database")?;

    storage
        .run_migrations()
        .await
        .context("Could not apply migrations")?;
    storage
        .health_check()
        .await
        .context("Health check failed after migration")?;

    let stats = storage.stats().await?;
    info!(
        dids = stats.did_count,
        schemas = stats.schema_count,
        attestations = stats.attestation_count,
        delegations = stats.delegation_count,
        revocations = stats.revocation_count,
        "Database ready at {}",
        database_url
    );

    storage.close().await;

    Ok(())
}
