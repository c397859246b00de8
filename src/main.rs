mod config;
mod contracts;
mod error;
mod models;
mod services;
mod session;

#[cfg(test)]
mod testing;

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::contracts::{AlloyExecutor, AlloyStatusSource, ArtifactStore, AtomicBatchBuilder};
use crate::services::{ConfirmationMonitor, DeploymentOrchestrator};
use crate::session::{wallet_from_key, ChainSession};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting arena contender deployment");

    // Load configuration
    let config = AppConfig::load().await?;
    info!("Configuration loaded successfully");

    // Resolve every artifact before touching the chain
    let mut store = ArtifactStore::new(&config.deployer.artifacts_dir);
    let artifacts = store.load_all(config.contracts.iter().map(|c| c.artifact.as_str()))?;
    info!("Loaded {} artifacts from {}", artifacts.len(), config.deployer.artifacts_dir);

    let session = Arc::new(ChainSession::new(&config)?);
    session.verify_connectivity().await?;

    let (wallet, signer_address) = wallet_from_key(&config.deployer.private_key, config.chain.chain_id)?;
    info!("Deployer account: {}", signer_address);

    let executor = Arc::new(AlloyExecutor::new(session.clone(), wallet.clone()));
    let status_source = Arc::new(AlloyStatusSource::new(
        session.clone(),
        config.registry.multicall_address,
        config.confirmation.poll_interval(),
    ));
    let monitor = ConfirmationMonitor::new(status_source)
        .with_timeout(config.confirmation.timeout())
        .with_event_logging(config.confirmation.log_events);

    let mut orchestrator = DeploymentOrchestrator::new(
        executor.clone(),
        Arc::new(AtomicBatchBuilder::new(config.registry.arena_address)),
        monitor,
        wallet,
        artifacts,
    )
    .with_concurrency(config.deployer.concurrent);

    if config.registry.verify_owner {
        orchestrator = orchestrator.with_owner_check(executor);
    }

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("🛑 Interrupt received, no longer waiting for registration"),
            Err(e) => {
                error!("Could not listen for interrupts: {}", e);
                std::future::pending::<()>().await
            }
        }
    };

    match orchestrator.run_until(&config.contracts, shutdown).await {
        Ok(report) => {
            match report.registration.tx_hash() {
                Some(tx_hash) => info!("✅ Deployment complete, registered in {}", tx_hash),
                None => info!("✅ Deployment complete"),
            }
            info!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => {
            error!("❌ Deployment failed: {}", e);
            Err(e.into())
        }
    }
}
