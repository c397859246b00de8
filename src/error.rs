use alloy::primitives::{Address, TxHash};
use std::time::Duration;
use thiserror::Error;

/// Errors from monitoring a single submitted transaction.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The request was rejected before reaching the network.
    #[error("Submission rejected: {0}")]
    Submission(String),
    /// The status stream ended before any terminal status.
    #[error("Status subscription closed before a terminal status was observed")]
    SubscriptionClosed,
    #[error("No terminal status after {0:?}")]
    Timeout(Duration),
}

/// Errors from deploying the contract set.
#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error("Deployment of '{label}' failed: {source}")]
    Failed {
        label: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Errors from the batched registration.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Registration transaction {tx_hash} failed: {reason}")]
    Failed { tx_hash: TxHash, reason: String },
    #[error("Registration was not submitted: {0}")]
    Submission(String),
    #[error("Lost track of the registration transaction: {0}")]
    Subscription(MonitorError),
    #[error("Registration monitoring was cancelled")]
    Cancelled,
    #[error("Could not build the registration batch: {0}")]
    Batch(anyhow::Error),
    #[error("No addresses to register")]
    NoAddresses,
    #[error("Address {0} appears more than once")]
    DuplicateAddress(Address),
    #[error("Contract {contract} is owned by {owner}, expected {expected}")]
    InvalidOwner {
        contract: Address,
        owner: Address,
        expected: Address,
    },
    #[error("Could not read owner of {contract}: {source}")]
    OwnerLookup {
        contract: Address,
        #[source]
        source: anyhow::Error,
    },
}

impl From<MonitorError> for RegistrationError {
    fn from(err: MonitorError) -> Self {
        match err {
            MonitorError::Submission(reason) => RegistrationError::Submission(reason),
            other => RegistrationError::Subscription(other),
        }
    }
}

/// Top-level error: whichever step aborted the run.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error(transparent)]
    Deployment(#[from] DeploymentError),
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}
