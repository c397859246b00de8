use alloy::network::{EthereumWallet, TxSigner};
use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info};

use crate::contracts::encoding::BatchBuilder;
use crate::contracts::execution::{ContractDeployer, OwnershipReader};
use crate::contracts::ContractArtifact;
use crate::error::{DeploymentError, OrchestrationError, RegistrationError};
use crate::models::{ContractSpec, DeployedContract, TransactionOutcome};
use crate::services::ConfirmationMonitor;

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentReport {
    pub contracts: Vec<DeployedContract>,
    pub registration: TransactionOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Deploys the contender set and registers it with the arena in one batch.
///
/// Every step is fail-fast: the first error aborts the run and nothing is
/// retried. A partially deployed or partially registered set is of no use
/// to the caller, so there is no partial-success path.
pub struct DeploymentOrchestrator {
    deployer: Arc<dyn ContractDeployer>,
    batch_builder: Arc<dyn BatchBuilder>,
    monitor: ConfirmationMonitor,
    signer: EthereumWallet,
    artifacts: HashMap<String, ContractArtifact>,
    owners: Option<Arc<dyn OwnershipReader>>,
    concurrent: bool,
}

impl DeploymentOrchestrator {
    pub fn new(
        deployer: Arc<dyn ContractDeployer>,
        batch_builder: Arc<dyn BatchBuilder>,
        monitor: ConfirmationMonitor,
        signer: EthereumWallet,
        artifacts: HashMap<String, ContractArtifact>,
    ) -> Self {
        info!("🏭 Creating DeploymentOrchestrator");
        info!("  Deployer: {} ({})", deployer.description(), deployer.deployer_address());
        info!("  Batch builder: {}", batch_builder.description());

        Self {
            deployer,
            batch_builder,
            monitor,
            signer,
            artifacts,
            owners: None,
            concurrent: false,
        }
    }

    /// Issue all deployments before awaiting any of them.
    pub fn with_concurrency(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    /// Check that the signer owns every contract before registering it.
    pub fn with_owner_check(mut self, owners: Arc<dyn OwnershipReader>) -> Self {
        self.owners = Some(owners);
        self
    }

    /// Deploy every spec; results come back in `specs` order.
    pub async fn deploy_all(&self, specs: &[ContractSpec]) -> Result<Vec<DeployedContract>, DeploymentError> {
        if specs.is_empty() {
            return Ok(Vec::new());
        }

        // Resolve every artifact before sending anything
        let jobs = specs
            .iter()
            .map(|spec| {
                self.artifacts
                    .get(&spec.artifact)
                    .map(|artifact| (spec, artifact))
                    .ok_or_else(|| DeploymentError::Failed {
                        label: spec.label.clone(),
                        source: anyhow::anyhow!("Artifact '{}' is not loaded", spec.artifact),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "🚀 Deploying {} contracts ({})",
            jobs.len(),
            if self.concurrent { "concurrently" } else { "sequentially" }
        );

        let deployed = if self.concurrent {
            // try_join_all keeps input order and drops the rest on the first error
            try_join_all(jobs.into_iter().map(|(spec, artifact)| self.deploy_one(spec, artifact))).await?
        } else {
            let mut deployed = Vec::with_capacity(jobs.len());
            for (spec, artifact) in jobs {
                deployed.push(self.deploy_one(spec, artifact).await?);
            }
            deployed
        };

        for contract in &deployed {
            info!("  {} ({}): {}", contract.label, contract.artifact, contract.address);
        }

        Ok(deployed)
    }

    async fn deploy_one(&self, spec: &ContractSpec, artifact: &ContractArtifact) -> Result<DeployedContract, DeploymentError> {
        info!("📤 Deploying {} from {}", spec.label, spec.artifact);

        let receipt = self
            .deployer
            .deploy(artifact, &spec.constructor_args)
            .await
            .map_err(|source| {
                error!("❌ Deployment of {} failed: {}", spec.label, source);
                DeploymentError::Failed {
                    label: spec.label.clone(),
                    source,
                }
            })?;

        Ok(DeployedContract::from_spec(spec, receipt.address)
            .with_receipt(Some(receipt.tx_hash), receipt.block_number))
    }

    /// Register `addresses`, in order, through one batched transaction.
    pub async fn register_all(&self, addresses: &[Address]) -> Result<TransactionOutcome, RegistrationError> {
        self.register_all_until(addresses, std::future::pending::<()>()).await
    }

    /// Like [`register_all`](Self::register_all), but stops watching the
    /// transaction once `cancel` completes.
    pub async fn register_all_until<C>(&self, addresses: &[Address], cancel: C) -> Result<TransactionOutcome, RegistrationError>
    where
        C: Future<Output = ()>,
    {
        if addresses.is_empty() {
            return Err(RegistrationError::NoAddresses);
        }

        let mut seen = HashSet::with_capacity(addresses.len());
        if let Some(duplicate) = addresses.iter().find(|address| !seen.insert(**address)) {
            return Err(RegistrationError::DuplicateAddress(*duplicate));
        }

        if let Some(owners) = &self.owners {
            self.verify_owners(owners.as_ref(), addresses).await?;
        }

        let calls = addresses
            .iter()
            .map(|address| self.batch_builder.register_call(*address))
            .collect();
        let request = self.batch_builder.build(calls).map_err(RegistrationError::Batch)?;

        info!("📝 Registering {} contracts in one batch", addresses.len());

        match self.monitor.submit_and_wait_until(&request, &self.signer, cancel).await? {
            TransactionOutcome::Failed { tx_hash, reason } => Err(RegistrationError::Failed { tx_hash, reason }),
            TransactionOutcome::Cancelled => Err(RegistrationError::Cancelled),
            outcome => Ok(outcome),
        }
    }

    async fn verify_owners(&self, owners: &dyn OwnershipReader, addresses: &[Address]) -> Result<(), RegistrationError> {
        let expected = self.signer.default_signer().address();
        info!("🔍 Verifying that {} owns all {} contracts", expected, addresses.len());

        for contract in addresses {
            let owner = owners
                .owner_of(*contract)
                .await
                .map_err(|source| RegistrationError::OwnerLookup {
                    contract: *contract,
                    source,
                })?;
            if owner != expected {
                return Err(RegistrationError::InvalidOwner {
                    contract: *contract,
                    owner,
                    expected,
                });
            }
        }

        Ok(())
    }

    /// Deploy everything, then register it all.
    pub async fn run(&self, specs: &[ContractSpec]) -> Result<DeploymentReport, OrchestrationError> {
        self.run_until(specs, std::future::pending::<()>()).await
    }

    /// Like [`run`](Self::run); `cancel` only applies while waiting for the
    /// registration to confirm.
    pub async fn run_until<C>(&self, specs: &[ContractSpec], cancel: C) -> Result<DeploymentReport, OrchestrationError>
    where
        C: Future<Output = ()>,
    {
        let started_at = Utc::now();

        let contracts = self.deploy_all(specs).await?;
        let addresses: Vec<Address> = contracts.iter().map(|c| c.address).collect();
        let registration = self.register_all_until(&addresses, cancel).await?;

        info!("🎉 Deployed and registered {} contracts", contracts.len());

        Ok(DeploymentReport {
            contracts,
            registration,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
