use alloy::primitives::Address;
use anyhow::Result;

use crate::models::{Call, TransactionRequest};

/// Abstract trait for building the arena's calls
///
/// Implementations own the ABI details of the registry and of batching;
/// the orchestrator only deals in addresses and `Call`s.
pub trait BatchBuilder: Send + Sync {
    /// Encode `register(contender)` against the arena registry
    fn register_call(&self, contender: Address) -> Call;

    /// Combine `calls` into one atomic request, preserving their order
    fn build(&self, calls: Vec<Call>) -> Result<TransactionRequest>;

    /// Get a human-readable description of this builder
    fn description(&self) -> &str;
}
