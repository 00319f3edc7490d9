//! Reward Sync CLI - Database migrations and manual syncs.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! rs-cli migrate
//!
//! # Sync every category that has a Shopify collection
//! rs-cli sync
//!
//! # Sync selected collections
//! rs-cli sync -c 441234567890
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `sync` - Recompute rewards and push them to Shopify

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "rs-cli")]
#[command(author, version, about = "Reward Sync CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Sync collections, products and variants and push reward metafields
    Sync {
        /// Collection to sync (numeric ID or GID); repeatable. Defaults to all.
        #[arg(short, long = "collection")]
        collections: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rs_cli=info,reward_sync_admin=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Sync { collections } => commands::sync::run(&collections).await?,
    }
    Ok(())
}
