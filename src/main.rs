//! delvebot - entry point
//!
//! Wires the chain client, session credentials, telemetry, and the game
//! runner together, then plays one game to completion. Ctrl-C asks the
//! runner to stop at the next decision boundary.

use std::sync::Arc;

use clap::Parser;
use starknet_types_core::felt::Felt;
use tokio::sync::watch;

use delvebot::chain::ChainClient;
use delvebot::core::config::EngineConfig;
use delvebot::core::error::{DelveError, Result};
use delvebot::executor::Executor;
use delvebot::runner::GameRunner;
use delvebot::signing::{short_string, SessionCredentials};
use delvebot::telemetry::TelemetrySink;

#[derive(Parser, Debug)]
#[command(name = "delvebot", about = "Autonomous on-chain dungeon-crawler agent")]
struct Args {
    /// The game id to play
    #[arg(long)]
    game_id: u64,

    /// JSON-RPC node endpoint
    #[arg(long)]
    rpc_url: String,

    /// Relayer endpoint for gas-sponsored submission
    #[arg(long)]
    relayer_url: String,

    /// Game contract address as a hex field element
    #[arg(long)]
    game_address: String,

    /// Chain id short string
    #[arg(long, default_value = "SN_MAIN")]
    chain_id: String,

    /// Override the Monte Carlo sample count
    #[arg(long)]
    samples: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "delvebot=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut cfg = EngineConfig::default();
    if let Some(samples) = args.samples {
        cfg.sim_samples = samples;
    }

    let game_address = Felt::from_hex(&args.game_address)
        .map_err(|_| DelveError::ChainRead(format!("bad game address: {}", args.game_address)))?;
    let chain_id = short_string(&args.chain_id);

    let creds = Arc::new(SessionCredentials::from_env()?);
    let chain = Arc::new(ChainClient::new(args.rpc_url, args.relayer_url, game_address));

    let (telemetry, mut events) = TelemetrySink::channel();
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "unserializable telemetry event"),
            }
        }
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("ctrl-c received, stopping after the current decision");
            let _ = shutdown_tx.send(true);
        }
    });

    let executor = Executor::new(
        chain.clone(),
        creds,
        chain_id,
        cfg.clone(),
        telemetry.clone(),
        args.game_id,
    );
    let runner = GameRunner::new(
        chain,
        executor,
        cfg,
        telemetry,
        game_address,
        args.game_id,
        shutdown_rx,
    );

    tracing::info!(game_id = args.game_id, "delvebot starting");
    runner.run().await
}
