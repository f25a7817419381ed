//! Swap engine command line
//!
//! Runs one operation against the RocksDB world state and prints the
//! response as JSON.
//!
//! ```text
//! swapctl [--config swap.toml] <operation> [args...]
//! swapctl operations
//! ```

use anyhow::Context;
use battery_swap::{Config, SwapContract};
use clap::Parser;
use ledger_core::RocksStore;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "swapctl")]
#[command(about = "Run one battery swap operation against the world state")]
struct Cli {
    /// Path to a TOML configuration file; `SWAP_*` variables otherwise
    #[arg(short, long, env = "SWAP_CONFIG")]
    config: Option<String>,

    /// Operation name, or `operations` to list them
    operation: String,

    /// Positional operation arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn load_config(path: Option<&str>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path).with_context(|| format!("loading {}", path))?,
        None => Config::from_env().context("loading config from environment")?,
    };
    Ok(config)
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_tracing(config.log.json);

    let contract = SwapContract::new(config)?;

    if cli.operation == "operations" {
        for name in contract.operations() {
            println!("{}", name);
        }
        return Ok(());
    }

    info!(
        "Opening world state at: {:?}",
        contract.config().ledger.data_dir
    );
    let store = RocksStore::open(&contract.config().ledger)?;

    let response = contract.invoke(&store, &cli.operation, &cli.args)?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    store.close()?;
    Ok(())
}
