//! QuickBasket CLI - Inspect and edit a stored cart.
//!
//! # Usage
//!
//! ```bash
//! # Print the stored cart
//! qb-cli show
//!
//! # Add two mangoes at 20.00 each
//! qb-cli add -n Mango -p 20 -q 2
//!
//! # Remove a line by name
//! qb-cli remove -n Mango
//!
//! # Storage diagnostics
//! qb-cli info
//!
//! # Use a different storage directory
//! qb-cli --dir /tmp/cart show
//! ```
//!
//! # Commands
//!
//! - `show` - Print the stored cart
//! - `add` - Add an item (merged by name)
//! - `remove` - Remove an item by name
//! - `clear` - Delete the stored cart
//! - `info` - Print storage diagnostics
//! - `migrate` - Move a legacy cart to the current key

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "qb-cli")]
#[command(author, version, about = "QuickBasket cart storage tools")]
struct Cli {
    /// Storage directory (overrides `QUICKBASKET_STORAGE_DIR`)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the stored cart
    Show,
    /// Add an item, merging with an existing line of the same name
    Add {
        /// Item name
        #[arg(short, long)]
        name: String,

        /// Unit price
        #[arg(short, long)]
        price: String,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u64,

        /// Image reference
        #[arg(long)]
        image: Option<String>,

        /// Caller-supplied identifier
        #[arg(long)]
        id: Option<String>,
    },
    /// Remove an item by name
    Remove {
        /// Item name
        #[arg(short, long)]
        name: String,
    },
    /// Delete the stored cart
    Clear,
    /// Print storage diagnostics
    Info,
    /// Move a legacy cart to the current key
    Migrate,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CommandError> {
    let store = commands::open_store(cli.dir)?;

    match cli.command {
        Commands::Show => commands::cart::show(&store),
        Commands::Add {
            name,
            price,
            quantity,
            image,
            id,
        } => commands::cart::add(
            &store,
            &commands::cart::AddItem {
                name,
                price,
                quantity,
                image,
                id,
            },
        ),
        Commands::Remove { name } => commands::cart::remove(&store, &name),
        Commands::Clear => commands::cart::clear(&store),
        Commands::Info => commands::storage::info(&store),
        Commands::Migrate => commands::storage::migrate(&store),
    }
}
