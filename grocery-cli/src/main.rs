//! grocery — command-line driver for the grocery ordering client
//!
//! Fridge commands (`register`, `login`, `order`, ...) act on the device
//! session cached under `GROCERY_CACHE_DIR`; truck commands (`truck-register`,
//! `restock`) are unauthenticated.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use grocery_client::{ClientConfig, ClientError, OrderLine};
use tokio_util::sync::CancellationToken;

/// Smart-fridge and supplier-truck client for the grocery ordering service
#[derive(Parser)]
#[command(name = "grocery", version, about)]
struct Cli {
    /// Ordering service base URL (overrides ORDERING_API_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Directory for the cached session (overrides GROCERY_CACHE_DIR)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register this fridge with the ordering service
    Register {
        device_id: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
    },

    /// Log in and cache the session
    Login {
        device_id: String,
        #[arg(long)]
        password: String,
    },

    /// Forget the cached session
    Logout,

    /// Show the logged-in device
    Whoami,

    /// Reserve, confirm and follow an order until it settles
    Order {
        /// Cart line as SKU=QTY (repeatable)
        #[arg(long = "item", required = true, value_parser = parse_line)]
        items: Vec<OrderLine>,
        /// Release the reservation right after preview instead of confirming
        #[arg(long)]
        cancel: bool,
    },

    /// List past orders
    History,

    /// Show the most recent order
    Last,

    /// Register a delivery truck
    TruckRegister {
        truck_id: String,
        #[arg(long)]
        plate: String,
        #[arg(long)]
        driver: String,
    },

    /// Submit a restock batch from a JSON file and follow it
    Restock {
        /// Batch file: supplier, truck and manifest lines
        manifest: PathBuf,
    },
}

/// `MILK-1=2` → line; a bare SKU means quantity 1
fn parse_line(s: &str) -> Result<OrderLine, String> {
    let (sku, qty) = match s.split_once('=') {
        Some((sku, qty)) => (sku.trim(), qty.trim()),
        None => (s.trim(), "1"),
    };
    if sku.is_empty() {
        return Err(format!("missing SKU in '{s}'"));
    }
    let quantity = qty
        .parse::<u32>()
        .map_err(|_| format!("invalid quantity '{qty}' for {sku}"))?;
    Ok(OrderLine::new(sku, quantity))
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grocery_client=info,grocery_cli=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url.trim_end_matches('/').to_string();
    }
    if let Some(dir) = cli.cache_dir {
        config = config.with_cache_dir(dir);
    }

    // Ctrl-C stops an in-flight poll
    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, stopping");
            signal.cancel();
        }
    });

    match commands::run(cli.command, config, &shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ClientError>() {
                Some(client_err) => eprintln!("Error: {}", client_err.user_message()),
                None => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
