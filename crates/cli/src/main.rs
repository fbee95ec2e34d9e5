//! Pantry CLI - Cart session tools.
//!
//! # Usage
//!
//! ```bash
//! # Add a product to the cart (repeat to increment)
//! pantry-cli cart add --id 1 --name "Sparkling Water" --price 1.99 --image water.png
//!
//! # Set a line's quantity (0 or less removes the line)
//! pantry-cli cart update --id 1 --quantity 6
//!
//! # Remove a line
//! pantry-cli cart remove --id 1
//!
//! # Empty the cart
//! pantry-cli cart clear
//!
//! # Print lines and totals
//! pantry-cli cart show
//! ```
//!
//! # Commands
//!
//! - `cart` - Inspect and mutate the persisted session cart

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use pantry_core::ProductId;
use rust_decimal::Decimal;

mod commands;

#[derive(Parser)]
#[command(name = "pantry-cli")]
#[command(author, version, about = "Pantry CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the session cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add one unit of a product
    Add {
        /// Product ID
        #[arg(short, long)]
        id: ProductId,

        /// Product display name
        #[arg(short, long)]
        name: String,

        /// Unit price (e.g. 19.99)
        #[arg(short, long)]
        price: Decimal,

        /// Product image URL
        #[arg(long, default_value = "")]
        image: String,
    },
    /// Set the quantity of a line
    Update {
        /// Product ID
        #[arg(short, long)]
        id: ProductId,

        /// New quantity (0 or less removes the line)
        #[arg(short, long, allow_hyphen_values = true)]
        quantity: String,
    },
    /// Remove a line
    Remove {
        /// Product ID
        #[arg(short, long)]
        id: ProductId,
    },
    /// Remove every line
    Clear,
    /// Show lines and totals
    Show,
}

#[tokio::main]
async fn main() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pantry_cart=info,pantry_cli=info".into());
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
        Commands::Cart { action } => match action {
            CartAction::Add {
                id,
                name,
                price,
                image,
            } => commands::cart::add(id, name, price, image).await?,
            CartAction::Update { id, quantity } => {
                commands::cart::update(id, &quantity).await?;
            }
            CartAction::Remove { id } => commands::cart::remove(id).await?,
            CartAction::Clear => commands::cart::clear().await?,
            CartAction::Show => commands::cart::show()?,
        },
    }
    Ok(())
}
