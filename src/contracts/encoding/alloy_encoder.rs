use alloy::primitives::{Address, Bytes};
use alloy::sol_types::SolCall;
use anyhow::Result;
use tracing::{debug, info};

use crate::contracts::abi::{IArena, IMulticall3};
use crate::contracts::encoding::BatchBuilder;
use crate::models::{Call, TransactionRequest};

/// Alloy-based encoder using the sol! definitions for the arena registry
#[derive(Debug, Clone)]
pub struct AtomicBatchBuilder {
    arena: Address,
}

impl AtomicBatchBuilder {
    pub fn new(arena: Address) -> Self {
        info!("🏗️ Creating AtomicBatchBuilder for arena {}", arena);
        Self { arena }
    }
}

impl BatchBuilder for AtomicBatchBuilder {
    fn register_call(&self, contender: Address) -> Call {
        let input = IArena::registerCall { contender }.abi_encode();
        Call::new(self.arena, input, format!("arena.register({})", contender))
    }

    fn build(&self, calls: Vec<Call>) -> Result<TransactionRequest> {
        if calls.is_empty() {
            anyhow::bail!("Refusing to build an empty batch");
        }

        info!("📦 Building atomic batch of {} calls", calls.len());
        for (index, call) in calls.iter().enumerate() {
            debug!("  [{}] {} -> {}", index, call.label, call.target);
        }

        Ok(TransactionRequest::Batch(calls))
    }

    fn description(&self) -> &str {
        "AtomicBatchBuilder: arena.register calls combined into one all-or-nothing batch"
    }
}

/// Encode a batch as `Multicall3.aggregate3` with every sub-call required to
/// succeed, so a single failing call reverts the whole transaction.
pub fn encode_aggregate3(calls: &[Call]) -> Bytes {
    let calls = calls
        .iter()
        .map(|call| IMulticall3::Call3 {
            target: call.target,
            allowFailure: false,
            callData: call.input.clone(),
        })
        .collect();

    Bytes::from(IMulticall3::aggregate3Call { calls }.abi_encode())
}
