//! Entry point for running a Helix node and its operator tools.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use helix_chain::{BlockDriver, BlockLog, StateStore};
use helix_crypto::generate_keypair;
use helix_node::{init_logging, LogFormat, NodeConfig, NodeError};
use helix_types::{AccountName, BlockId, INITIAL_POW_TARGET};
use helix_work::WorkGenerator;

#[derive(Parser)]
#[command(name = "helixd", about = "Helix protocol node daemon")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, env = "HELIX_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "HELIX_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "HELIX_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the node with a fresh in-memory chain state.
    Run,
    /// Generate an Ed25519 keypair and print it as hex.
    Keygen,
    /// Search for a proof-of-work nonce on the local machine.
    Mine {
        /// Miner account name.
        #[arg(long)]
        account: String,
        /// Head block id to extend, as 64 hex characters.
        #[arg(long)]
        prev_block: String,
        /// Difficulty target as a hex u128; defaults to the genesis target.
        #[arg(long)]
        target: Option<String>,
    },
    /// Validate the configuration and print the effective settings.
    CheckConfig,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(&path.display().to_string())?,
        None => NodeConfig::default(),
    };
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    init_logging(LogFormat::parse(&config.log_format), &config.log_level);

    match cli.command {
        Command::Run => run(&config)?,
        Command::Keygen => keygen(),
        Command::Mine {
            account,
            prev_block,
            target,
        } => mine(&config, &account, &prev_block, target.as_deref())?,
        Command::CheckConfig => println!("{}", config.to_toml_string()?),
    }
    Ok(())
}

fn run(config: &NodeConfig) -> Result<(), NodeError> {
    let driver = BlockDriver::new(config.schedule);
    let _blocks = BlockLog::new();
    let _state = StateStore::new();
    info!(
        total_producers = driver.state.schedule.params.total_producers(),
        data_dir = %config.data_dir.display(),
        "helix node initialised"
    );
    // No peer transport ships with this build; the process idles until
    // killed so operators can probe logging and configuration.
    info!("no peer transport configured; idling");
    loop {
        std::thread::park();
    }
}

fn keygen() {
    let keys = generate_keypair();
    println!("public:  {}", hex::encode(keys.public.0));
    println!("private: {}", hex::encode(keys.private.0));
}

fn mine(
    config: &NodeConfig,
    account: &str,
    prev_block: &str,
    target: Option<&str>,
) -> Result<(), NodeError> {
    let account = AccountName::new(account);
    if !account.is_valid() {
        return Err(NodeError::Other(format!(
            "invalid account name {account}"
        )));
    }
    let bytes = hex::decode(prev_block)
        .map_err(|e| NodeError::Other(format!("bad block id hex: {e}")))?;
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|_| NodeError::Other("block id must be 32 bytes".to_string()))?;
    let prev_block = BlockId::from_bytes(bytes);
    let target = match target {
        Some(hex_target) => u128::from_str_radix(hex_target.trim_start_matches("0x"), 16)
            .map_err(|e| NodeError::Other(format!("bad target: {e}")))?,
        None => INITIAL_POW_TARGET,
    };

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.work_threads)
        .build_global()
        .map_err(|e| NodeError::Other(e.to_string()))?;

    info!(account = %account, threads = config.work_threads, "searching for work");
    let proof = WorkGenerator::new().generate(&account, prev_block, target)?;
    println!("nonce: {}", proof.nonce);
    println!("work:  {:#034x}", proof.work_value());
    Ok(())
}
