use alloy::network::EthereumWallet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, error, info, trace, warn};

use crate::contracts::execution::{StatusCallback, StatusSource};
use crate::error::MonitorError;
use crate::models::{ApplicationEvent, StatusEvent, TransactionOutcome, TransactionRequest};

/// Receives application events seen while a transaction is pending
pub type DiagnosticSink = Arc<dyn Fn(&ApplicationEvent) + Send + Sync>;

enum SlotState {
    Pending(oneshot::Sender<TransactionOutcome>),
    Resolved,
}

/// Write-once completion slot shared with the status callback.
///
/// Moves `Pending -> Resolved` on the first terminal status; there is no way
/// back, so later notifications cannot overwrite the outcome.
struct ResolutionSlot {
    state: Mutex<SlotState>,
}

impl ResolutionSlot {
    fn new(sender: oneshot::Sender<TransactionOutcome>) -> Self {
        Self {
            state: Mutex::new(SlotState::Pending(sender)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        // The guarded section never panics, but a poisoned slot is still usable
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_resolved(&self) -> bool {
        matches!(*self.lock(), SlotState::Resolved)
    }

    /// Returns false if the slot was already resolved.
    fn resolve(&self, outcome: TransactionOutcome) -> bool {
        let mut state = self.lock();
        match std::mem::replace(&mut *state, SlotState::Resolved) {
            SlotState::Pending(sender) => {
                // The waiter may have given up (timeout/cancel); nothing left to notify
                let _ = sender.send(outcome);
                true
            }
            SlotState::Resolved => false,
        }
    }
}

/// Turns a transaction's pushed status notifications into one outcome.
pub struct ConfirmationMonitor {
    source: Arc<dyn StatusSource>,
    timeout: Option<Duration>,
    diagnostics: Option<DiagnosticSink>,
    log_events: bool,
}

impl ConfirmationMonitor {
    pub fn new(source: Arc<dyn StatusSource>) -> Self {
        info!("🛰️ Creating ConfirmationMonitor ({})", source.description());
        Self {
            source,
            timeout: None,
            diagnostics: None,
            log_events: true,
        }
    }

    /// Bound the wait for a terminal status. `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_diagnostics(mut self, sink: DiagnosticSink) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    pub fn with_event_logging(mut self, enabled: bool) -> Self {
        self.log_events = enabled;
        self
    }

    /// Sign and submit `request`, then wait for its first terminal status.
    pub async fn submit_and_wait(
        &self,
        request: &TransactionRequest,
        signer: &EthereumWallet,
    ) -> Result<TransactionOutcome, MonitorError> {
        self.submit_and_wait_until(request, signer, std::future::pending::<()>()).await
    }

    /// Like [`submit_and_wait`](Self::submit_and_wait), but gives up with
    /// [`TransactionOutcome::Cancelled`] as soon as `cancel` completes.
    pub async fn submit_and_wait_until<C>(
        &self,
        request: &TransactionRequest,
        signer: &EthereumWallet,
        cancel: C,
    ) -> Result<TransactionOutcome, MonitorError>
    where
        C: Future<Output = ()>,
    {
        let (sender, receiver) = oneshot::channel();
        // The callback holds the only reference, so the sender drops with it
        let slot = Arc::new(ResolutionSlot::new(sender));
        let callback = self.status_callback(slot);

        let subscription = self
            .source
            .sign_and_watch(request, signer, callback)
            .await
            .map_err(|e| {
                error!("❌ {} rejected at submission: {}", request.describe(), e);
                MonitorError::Submission(e.to_string())
            })?;

        let tx_hash = subscription.tx_hash();
        info!("⏳ Waiting for terminal status of {} ({})", tx_hash, request.describe());

        let result = self.await_resolution(receiver, cancel).await;
        subscription.unsubscribe();

        match &result {
            Ok(TransactionOutcome::Cancelled) => warn!("🛑 Stopped watching {}", tx_hash),
            Ok(outcome) if outcome.is_success() => info!("✅ {} resolved: {:?}", tx_hash, outcome),
            Ok(outcome) => error!("❌ {} resolved: {:?}", tx_hash, outcome),
            Err(e) => error!("❌ Lost track of {}: {}", tx_hash, e),
        }

        result
    }

    async fn await_resolution<C>(
        &self,
        receiver: oneshot::Receiver<TransactionOutcome>,
        cancel: C,
    ) -> Result<TransactionOutcome, MonitorError>
    where
        C: Future<Output = ()>,
    {
        let resolution = async { receiver.await.map_err(|_| MonitorError::SubscriptionClosed) };
        let bounded = async {
            match self.timeout {
                Some(limit) => match tokio::time::timeout(limit, resolution).await {
                    Ok(result) => result,
                    Err(_) => Err(MonitorError::Timeout(limit)),
                },
                None => resolution.await,
            }
        };

        tokio::select! {
            biased;
            result = bounded => result,
            _ = cancel => Ok(TransactionOutcome::Cancelled),
        }
    }

    fn status_callback(&self, slot: Arc<ResolutionSlot>) -> StatusCallback {
        let diagnostics = self.diagnostics.clone();
        let log_events = self.log_events;

        Box::new(move |event: StatusEvent| {
            if slot.is_resolved() {
                trace!("Ignoring status for {} received after resolution", event.tx_hash);
                return;
            }

            for app_event in &event.events {
                match &diagnostics {
                    Some(sink) => sink(app_event),
                    None if log_events => debug!(
                        "📣 {} emitted by {} (topics: {:?}, data: 0x{})",
                        event.tx_hash,
                        app_event.emitter,
                        app_event.topics,
                        hex::encode(&app_event.data)
                    ),
                    None => {}
                }
            }

            if let Some(outcome) = event.terminal_outcome() {
                if !slot.resolve(outcome) {
                    trace!("Status for {} lost the race to resolve", event.tx_hash);
                }
            }
        })
    }
}
