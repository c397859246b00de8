use crate::contracts::encoding::encode_aggregate3;
use crate::contracts::execution::traits::{StatusCallback, StatusSource, Subscription};
use crate::models::{ApplicationEvent, StatusEvent, TransactionRequest};
use crate::session::ChainSession;
use alloy::{
    eips::BlockNumberOrTag,
    network::{EthereumWallet, TransactionBuilder, TxSigner},
    primitives::{Address, TxHash},
    providers::{DynProvider, Provider},
    rpc::types::{TransactionReceipt, TransactionRequest as AlloyTransactionRequest},
};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Status source backed by JSON-RPC polling.
///
/// Pushes an inclusion (or failure) notification once the receipt appears,
/// then a finality notification once the chain's `finalized` head reaches
/// the inclusion block. Batches are sent as one Multicall3 `aggregate3`.
pub struct AlloyStatusSource {
    session: Arc<ChainSession>,
    multicall: Address,
    poll_interval: Duration,
}

impl AlloyStatusSource {
    pub fn new(session: Arc<ChainSession>, multicall: Address, poll_interval: Duration) -> Self {
        info!("🔧 Initializing AlloyStatusSource");
        info!("  Batch contract: {}", multicall);
        info!("  Poll interval: {:?}", poll_interval);

        Self {
            session,
            multicall,
            poll_interval,
        }
    }

    fn build_transaction_request(&self, request: &TransactionRequest, from: Address) -> AlloyTransactionRequest {
        let (to, input) = match request {
            TransactionRequest::Single(call) => (call.target, call.input.clone()),
            TransactionRequest::Batch(calls) => (self.multicall, encode_aggregate3(calls)),
        };

        AlloyTransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_input(input)
    }
}

#[async_trait]
impl StatusSource for AlloyStatusSource {
    async fn sign_and_watch(
        &self,
        request: &TransactionRequest,
        signer: &EthereumWallet,
        callback: StatusCallback,
    ) -> Result<Subscription> {
        info!("🚀 AlloyStatusSource: Submitting {}", request.describe());

        let provider = self.session.signing_provider(signer);
        let tx_request = self.build_transaction_request(request, signer.default_signer().address());

        let pending_tx = provider.send_transaction(tx_request).await
            .map_err(|e| {
                error!("❌ Submission rejected: {}", e);
                anyhow::anyhow!("Failed to send transaction: {}", e)
            })?;

        let tx_hash = *pending_tx.tx_hash();
        info!("⏳ Transaction {} sent, watching status...", tx_hash);

        let watcher = self.session.provider().clone();
        let poll_interval = self.poll_interval;
        let handle = tokio::spawn(async move {
            if let Err(e) = watch_status(&watcher, tx_hash, poll_interval, &callback).await {
                warn!("Status polling for {} stopped: {}", tx_hash, e);
            }
            // `callback` drops here, which closes the stream for the waiter
        });

        Ok(Subscription::new(tx_hash, move || handle.abort()))
    }

    fn description(&self) -> &str {
        "AlloyStatusSource: Polls receipts and the finalized head through Alloy providers"
    }
}

async fn watch_status(
    provider: &DynProvider,
    tx_hash: TxHash,
    poll_interval: Duration,
    callback: &StatusCallback,
) -> Result<()> {
    let receipt = loop {
        if let Some(receipt) = provider.get_transaction_receipt(tx_hash).await? {
            break receipt;
        }
        tokio::time::sleep(poll_interval).await;
    };

    let block_hash = receipt.block_hash
        .ok_or_else(|| anyhow::anyhow!("Receipt for {} has no block hash", tx_hash))?;
    let included_at = receipt.block_number
        .ok_or_else(|| anyhow::anyhow!("Receipt for {} has no block number", tx_hash))?;
    let events = application_events(&receipt);

    if !receipt.status() {
        callback(StatusEvent::failed(tx_hash, "execution reverted").with_events(events));
        return Ok(());
    }

    debug!("📥 {} included in block {}", tx_hash, included_at);
    callback(StatusEvent::in_block(tx_hash, block_hash).with_events(events));

    loop {
        if let Some(finalized) = provider.get_block_by_number(BlockNumberOrTag::Finalized).await? {
            if finalized.header.number >= included_at {
                callback(StatusEvent::finalized(tx_hash, block_hash));
                return Ok(());
            }
        }
        tokio::time::sleep(poll_interval).await;
    }
}

fn application_events(receipt: &TransactionReceipt) -> Vec<ApplicationEvent> {
    receipt
        .inner
        .logs()
        .iter()
        .map(|log| ApplicationEvent {
            emitter: log.address(),
            topics: log.topics().to_vec(),
            data: log.data().data.clone(),
        })
        .collect()
}
