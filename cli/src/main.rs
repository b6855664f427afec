//! rpindex — Rocket Pool withdrawal-address index.
//!
//! # Commands
//! ```text
//! rpindex serve   [--port <PORT>] [--poll-interval-ms <MS>]
//! rpindex sync    [--target <BLOCK>]
//! rpindex status
//! rpindex info
//! ```
//!
//! Every option can also be given through the environment (or a `.env` file).

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use rpindex_core::config::{DEFAULT_MAX_QUERY_RANGE, ROCKET_STORAGE_GENESIS_BLOCK};
use rpindex_core::Address;

mod cmd_info;
mod cmd_serve;
mod cmd_sync;
mod context;
mod logging;

#[derive(Parser)]
#[command(
    name = "rpindex",
    about = "Rocket Pool withdrawal-address index and lookup API",
    version
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// JSON-RPC endpoint of an Ethereum node
    #[arg(long, env = "RPC", default_value = "http://localhost:8545", global = true)]
    pub rpc: String,

    /// Directory holding the index database
    #[arg(long, env = "DB_DIR", default_value = "db", global = true)]
    pub db_dir: PathBuf,

    /// Maximum number of blocks per eth_getLogs query
    #[arg(long, env = "MAX_QUERY_RANGE", default_value_t = DEFAULT_MAX_QUERY_RANGE, global = true)]
    pub max_query_range: u64,

    /// Block the index starts from on an empty database
    #[arg(long, env = "GENESIS_BLOCK", default_value_t = ROCKET_STORAGE_GENESIS_BLOCK, global = true)]
    pub genesis_block: u64,

    /// Per-request timeout for JSON-RPC calls, in seconds
    #[arg(long, env = "RPC_TIMEOUT_SECS", default_value_t = 30, global = true)]
    pub rpc_timeout_secs: u64,

    /// RocketStorage address (resolved from rocketstorage.eth when unset)
    #[arg(long, env = "ROCKET_STORAGE", global = true)]
    pub rocket_storage: Option<Address>,

    /// Retries of a failed sync run before waiting for the next block
    #[arg(long, env = "SYNC_RETRIES", default_value_t = 3, global = true)]
    pub sync_retries: u32,

    /// Emit JSON logs
    #[arg(long, env = "LOG_JSON", global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow the chain and serve the lookup API
    Serve {
        /// HTTP port
        #[arg(long, env = "PORT", default_value_t = 8888)]
        port: u16,
        /// How often to poll the node for new blocks, in milliseconds
        #[arg(long, env = "POLL_INTERVAL_MS", default_value_t = 2000)]
        poll_interval_ms: u64,
    },

    /// Run one catch-up pass and exit
    Sync {
        /// Sync up to this block instead of the finalized height
        #[arg(long)]
        target: Option<u64>,
    },

    /// Show the local index cursor and size
    Status,

    /// Show contract addresses and sync lag
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before parsing so env fallbacks see it
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init_tracing(cli.global.log_json);

    match cli.command {
        Commands::Serve { port, poll_interval_ms } => {
            cmd_serve::run(&cli.global, port, poll_interval_ms).await
        }
        Commands::Sync { target } => cmd_sync::run_sync(&cli.global, target).await,
        Commands::Status => cmd_sync::run_status(&cli.global).await,
        Commands::Info => cmd_info::run(&cli.global).await,
    }
}
