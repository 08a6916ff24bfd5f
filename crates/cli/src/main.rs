//! Shop CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! shop-cli migrate
//!
//! # Load the demo catalog (or a catalog of your own)
//! shop-cli seed
//! shop-cli seed --file catalog.yaml
//!
//! # Grant admin rights to an existing account
//! shop-cli user promote --email admin@example.com
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Insert categories and products that are not there yet
//! - `user promote` - Make an account an administrator

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "shop-cli")]
#[command(author, version, about = "Shop backend CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the catalog with categories and products
    Seed {
        /// YAML catalog to load instead of the built-in demo catalog
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Grant admin rights to an existing account
    Promote {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

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
        Commands::Seed { file } => {
            let summary = commands::seed::run(file.as_deref()).await?;
            tracing::info!(
                categories = summary.categories_created,
                products = summary.products_created,
                skipped = summary.products_skipped,
                "Seeding complete"
            );
        }
        Commands::User { action } => match action {
            UserAction::Promote { email } => commands::user::promote(&email).await?,
        },
    }
    Ok(())
}
