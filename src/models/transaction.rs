use alloy::primitives::{Address, Bytes, TxHash, B256};
use serde::{Deserialize, Serialize};

/// One contract call: a target and its ABI-encoded input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub target: Address,
    pub input: Bytes,
    /// Short description for logs, e.g. `register(0x5FbD…)`
    pub label: String,
}

impl Call {
    pub fn new(target: Address, input: impl Into<Bytes>, label: impl Into<String>) -> Self {
        Self {
            target,
            input: input.into(),
            label: label.into(),
        }
    }
}

/// An unsigned unit of chain work. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionRequest {
    Single(Call),
    /// Sub-calls executed in order, all-or-nothing
    Batch(Vec<Call>),
}

impl TransactionRequest {
    pub fn calls(&self) -> &[Call] {
        match self {
            TransactionRequest::Single(call) => std::slice::from_ref(call),
            TransactionRequest::Batch(calls) => calls,
        }
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, TransactionRequest::Batch(_))
    }

    pub fn describe(&self) -> String {
        match self {
            TransactionRequest::Single(call) => call.label.clone(),
            TransactionRequest::Batch(calls) => format!("batch of {} calls", calls.len()),
        }
    }
}

/// An application-level event emitted while the transaction executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationEvent {
    pub emitter: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// One notification pushed by a status subscription.
///
/// A single notification may carry several markers at once; the monitor
/// decides which of them counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusEvent {
    pub tx_hash: TxHash,
    /// Block the transaction was included in
    pub in_block: Option<B256>,
    /// Block that became final with the transaction in it
    pub finalized: Option<B256>,
    /// Chain-reported execution failure
    pub error: Option<String>,
    pub events: Vec<ApplicationEvent>,
}

impl StatusEvent {
    pub fn in_block(tx_hash: TxHash, block_hash: B256) -> Self {
        Self {
            tx_hash,
            in_block: Some(block_hash),
            ..Default::default()
        }
    }

    pub fn finalized(tx_hash: TxHash, block_hash: B256) -> Self {
        Self {
            tx_hash,
            finalized: Some(block_hash),
            ..Default::default()
        }
    }

    pub fn failed(tx_hash: TxHash, reason: impl Into<String>) -> Self {
        Self {
            tx_hash,
            error: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn with_events(mut self, events: Vec<ApplicationEvent>) -> Self {
        self.events = events;
        self
    }

    /// The terminal outcome this notification implies, if any.
    ///
    /// Priority is failure, then finality, then inclusion.
    pub fn terminal_outcome(&self) -> Option<TransactionOutcome> {
        if let Some(reason) = &self.error {
            return Some(TransactionOutcome::Failed {
                tx_hash: self.tx_hash,
                reason: reason.clone(),
            });
        }
        if let Some(block_hash) = self.finalized {
            return Some(TransactionOutcome::Finalized {
                tx_hash: self.tx_hash,
                block_hash,
            });
        }
        self.in_block.map(|block_hash| TransactionOutcome::Included {
            tx_hash: self.tx_hash,
            block_hash,
        })
    }
}

/// Result of monitoring one submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum TransactionOutcome {
    Included { tx_hash: TxHash, block_hash: B256 },
    Finalized { tx_hash: TxHash, block_hash: B256 },
    Failed { tx_hash: TxHash, reason: String },
    /// Monitoring was abandoned by the caller before a terminal status arrived
    Cancelled,
}

impl TransactionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            TransactionOutcome::Included { .. } | TransactionOutcome::Finalized { .. }
        )
    }

    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            TransactionOutcome::Included { tx_hash, .. }
            | TransactionOutcome::Finalized { tx_hash, .. }
            | TransactionOutcome::Failed { tx_hash, .. } => Some(*tx_hash),
            TransactionOutcome::Cancelled => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_takes_priority_over_inclusion_and_finality() {
        let hash = TxHash::repeat_byte(1);
        let event = StatusEvent {
            tx_hash: hash,
            in_block: Some(B256::repeat_byte(2)),
            finalized: Some(B256::repeat_byte(3)),
            error: Some("ExtrinsicFailed".to_string()),
            events: vec![],
        };

        assert_eq!(
            event.terminal_outcome(),
            Some(TransactionOutcome::Failed { tx_hash: hash, reason: "ExtrinsicFailed".to_string() })
        );
    }

    #[test]
    fn test_finality_takes_priority_over_inclusion() {
        let hash = TxHash::repeat_byte(1);
        let event = StatusEvent {
            in_block: Some(B256::repeat_byte(2)),
            ..StatusEvent::finalized(hash, B256::repeat_byte(3))
        };

        assert_eq!(
            event.terminal_outcome(),
            Some(TransactionOutcome::Finalized { tx_hash: hash, block_hash: B256::repeat_byte(3) })
        );
    }

    #[test]
    fn test_application_events_alone_are_not_terminal() {
        let event = StatusEvent::default().with_events(vec![ApplicationEvent {
            emitter: Address::repeat_byte(9),
            topics: vec![B256::ZERO],
            data: Bytes::new(),
        }]);

        assert_eq!(event.terminal_outcome(), None);
    }

    #[test]
    fn test_single_request_exposes_one_call() {
        let call = Call::new(Address::ZERO, vec![0xde, 0xad], "noop");
        let request = TransactionRequest::Single(call.clone());

        assert!(!request.is_batch());
        assert_eq!(request.calls(), &[call]);
    }

    #[test]
    fn test_outcome_tx_hash() {
        let hash = TxHash::repeat_byte(3);

        assert_eq!(StatusEvent::failed(hash, "reverted").terminal_outcome().and_then(|o| o.tx_hash()), Some(hash));
        assert_eq!(
            TransactionOutcome::Finalized { tx_hash: hash, block_hash: B256::ZERO }.tx_hash(),
            Some(hash)
        );
        assert_eq!(TransactionOutcome::Cancelled.tx_hash(), None);
    }
}
