use crate::config::FlowConfig;
use crate::domain::bank::Bank;
use crate::domain::conversion::ConversionResult;
use crate::domain::flow::{FlowState, TransferFlow};
use crate::domain::history::{StatusFilter, TransferRecord, TransferStatus};
use crate::domain::ports::{AccountVerifierRef, TransferHistory, TransferHistoryRef, TransferProcessorRef};
use crate::domain::reference::IdGenerator;
use crate::domain::transfer::{PaymentDetails, Receipt, SenderProfile, TransferRequest, TransferSummary};
use crate::error::Result;
use crate::infrastructure::in_memory::InMemoryTransferHistory;
use crate::infrastructure::simulated::{SimulatedAccountVerifier, SimulatedTransferProcessor};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

const CANCELLED: &str = "Cancelled before payment";

/// Everything a session needs, handed in explicitly at construction.
pub struct SessionContext {
    pub banks: Arc<[Bank]>,
    pub sender: Option<SenderProfile>,
    pub verifier: AccountVerifierRef,
    pub processor: TransferProcessorRef,
    pub history: TransferHistoryRef,
    pub ids: IdGenerator,
}

impl SessionContext {
    /// A context backed by the simulated verifier and processor.
    pub fn simulated(banks: Arc<[Bank]>, sender: Option<SenderProfile>, config: &FlowConfig) -> Self {
        Self {
            banks,
            sender,
            verifier: Arc::new(SimulatedAccountVerifier::from_config(config)),
            processor: Arc::new(SimulatedTransferProcessor::from_config(config)),
            history: Arc::new(InMemoryTransferHistory::new()),
            ids: IdGenerator::new(config.transaction_prefix.clone()),
        }
    }
}

/// What the presentation layer needs to render the current step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowSnapshot {
    pub state: FlowState,
    pub amount: String,
    pub bank_id: String,
    /// `None` while the amount is too large to convert.
    pub conversion: Option<ConversionResult>,
    pub request: Option<TransferRequest>,
    pub summary: Option<TransferSummary>,
    pub reason_error: bool,
    pub verifying: bool,
}

struct SessionInner {
    flow: TransferFlow,
    state_tx: watch::Sender<FlowState>,
    /// Bumped on every publish, so waiters re-check the flow.
    revision_tx: watch::Sender<u64>,
    verification: Option<JoinHandle<()>>,
    processing: Option<JoinHandle<()>>,
}

impl SessionInner {
    fn publish(&self) {
        self.revision_tx.send_modify(|revision| *revision += 1);
        self.state_tx.send_if_modified(|state| {
            let next = self.flow.state();
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        });
    }

    fn abort_pending(&mut self) {
        for task in [self.verification.take(), self.processing.take()]
            .into_iter()
            .flatten()
        {
            task.abort();
        }
    }
}

/// Stores `record`, if any. Failures are logged only; the transfer itself is
/// unaffected.
async fn record_history(history: &dyn TransferHistory, record: Option<TransferRecord>) {
    let Some(record) = record else {
        return;
    };
    let transaction_id = record.transaction_id.clone();
    let status = record.status;
    if let Err(e) = history.store(record).await {
        warn!(%transaction_id, %status, error = %e, "Failed to record transfer history");
    }
}

/// The record to keep when a confirmed but unpaid transfer is abandoned.
fn abandoned_record(flow: &TransferFlow) -> Option<TransferRecord> {
    if !matches!(
        flow.state(),
        FlowState::Processing | FlowState::CollectingPayment
    ) {
        return None;
    }
    let mut record = flow.history_record(TransferStatus::Failed)?;
    record.error = Some(CANCELLED.to_string());
    Some(record)
}

/// One user's transfer flow together with its in-flight async work.
///
/// Every user action and every async completion takes the same lock, so they
/// are applied one at a time. Completions carry the ticket issued when their
/// work began and become no-ops once the flow has moved past it. History is
/// written under that lock too, so records land in flow order.
#[derive(Clone)]
pub struct TransferSession {
    inner: Arc<Mutex<SessionInner>>,
    verifier: AccountVerifierRef,
    processor: TransferProcessorRef,
    history: TransferHistoryRef,
}

impl TransferSession {
    pub fn new(context: SessionContext) -> Result<Self> {
        let flow = TransferFlow::new(context.banks, context.sender, context.ids)?;
        let (state_tx, _) = watch::channel(flow.state());
        let (revision_tx, _) = watch::channel(0);
        Ok(Self {
            inner: Arc::new(Mutex::new(SessionInner {
                flow,
                state_tx,
                revision_tx,
                verification: None,
                processing: None,
            })),
            verifier: context.verifier,
            processor: context.processor,
            history: context.history,
        })
    }

    /// Runs a synchronous operation on the flow, e.g. editing a field.
    ///
    /// Use [`TransferSession::cancel`] rather than `TransferFlow::cancel` so
    /// pending tasks are aborted as well.
    pub async fn edit<R>(&self, f: impl FnOnce(&mut TransferFlow) -> R) -> R {
        let mut inner = self.inner.lock().await;
        let result = f(&mut inner.flow);
        inner.publish();
        result
    }

    pub async fn state(&self) -> FlowState {
        self.inner.lock().await.flow.state()
    }

    /// Receives every state change from now on.
    pub async fn subscribe(&self) -> watch::Receiver<FlowState> {
        self.inner.lock().await.state_tx.subscribe()
    }

    pub async fn snapshot(&self) -> FlowSnapshot {
        let inner = self.inner.lock().await;
        let flow = &inner.flow;
        FlowSnapshot {
            state: flow.state(),
            amount: flow.amount().as_str().to_string(),
            bank_id: flow.selected_bank().id.clone(),
            conversion: flow.conversion().ok(),
            request: flow.request().cloned(),
            summary: flow.summary(),
            reason_error: flow.reason_error(),
            verifying: flow.is_verifying(),
        }
    }

    /// Starts verifying the entered account number in the background.
    ///
    /// Returns `false` if there is no account number. A newer check aborts the
    /// previous one; only the latest result is ever applied.
    pub async fn check_account(&self) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        let Some((ticket, account_number)) = inner.flow.begin_verification()? else {
            return Ok(false);
        };
        if let Some(previous) = inner.verification.take() {
            previous.abort();
        }

        let verifier = self.verifier.clone();
        let session = Arc::downgrade(&self.inner);
        inner.verification = Some(tokio::spawn(async move {
            let outcome = verifier.verify(&account_number).await;
            let Some(session) = session.upgrade() else {
                return;
            };
            let mut inner = session.lock().await;
            inner.flow.complete_verification(ticket, outcome);
            inner.publish();
        }));
        Ok(true)
    }

    /// Waits until the flow no longer awaits an account check: the latest one
    /// resolved, the number changed, or the transfer was cancelled.
    ///
    /// The task stays owned by the session, so a concurrent cancel still
    /// aborts it.
    pub async fn settle_verification(&self) {
        let mut revisions = {
            let inner = self.inner.lock().await;
            if !inner.flow.is_verifying() {
                return;
            }
            inner.revision_tx.subscribe()
        };
        while revisions.changed().await.is_ok() {
            if !self.inner.lock().await.flow.is_verifying() {
                return;
            }
        }
    }

    /// Confirms the summary and starts processing in the background.
    ///
    /// Returns the generated transaction id and records the transfer as
    /// pending. The flow moves on to `CollectingPayment` by itself once
    /// processing completes; a failure is recorded in the history.
    pub async fn confirm(&self) -> Result<String> {
        let mut inner = self.inner.lock().await;
        let ticket = inner.flow.confirm()?;
        inner.publish();
        record_history(
            self.history.as_ref(),
            inner.flow.history_record(TransferStatus::Pending),
        )
        .await;

        let request = inner.flow.request().cloned().unwrap_or_default();
        let transaction_id = request.transaction_id.clone().unwrap_or_default();
        let processor = self.processor.clone();
        let history = self.history.clone();
        let session = Arc::downgrade(&self.inner);
        inner.processing = Some(tokio::spawn(async move {
            let outcome = processor.process(&request).await;
            let Some(session) = session.upgrade() else {
                return;
            };
            let mut inner = session.lock().await;
            let applied = inner.flow.complete_processing(ticket, outcome);
            inner.publish();
            if applied && inner.flow.state() == FlowState::ReviewingSummary {
                record_history(
                    history.as_ref(),
                    inner.flow.history_record(TransferStatus::Failed),
                )
                .await;
            }
        }));
        Ok(transaction_id)
    }

    /// Waits until the flow has left `Processing`, one way or the other.
    pub async fn settle_processing(&self) -> FlowState {
        let mut states = self.subscribe().await;
        let _ = states
            .wait_for(|state| *state != FlowState::Processing)
            .await;
        self.state().await
    }

    /// Pays for the transfer and records it as successful.
    pub async fn pay(&self, payment: PaymentDetails) -> Result<Receipt> {
        let mut inner = self.inner.lock().await;
        let receipt = inner.flow.pay(payment)?;
        inner.publish();
        record_history(
            self.history.as_ref(),
            inner.flow.history_record(TransferStatus::Success),
        )
        .await;
        Ok(receipt)
    }

    pub async fn back(&self) -> FlowState {
        let mut inner = self.inner.lock().await;
        let abandoned = abandoned_record(&inner.flow);
        inner.flow.back();
        if inner.flow.state() == FlowState::Idle {
            inner.abort_pending();
            record_history(self.history.as_ref(), abandoned).await;
        }
        inner.publish();
        inner.flow.state()
    }

    /// Abandons the transfer and everything still running on its behalf.
    ///
    /// A transfer that was confirmed but not yet paid stays in the history as
    /// failed.
    pub async fn cancel(&self) {
        let mut inner = self.inner.lock().await;
        let abandoned = abandoned_record(&inner.flow);
        inner.abort_pending();
        inner.flow.cancel();
        inner.publish();
        record_history(self.history.as_ref(), abandoned).await;
    }

    /// Past transfers matching `filter`, most recent first.
    pub async fn history(&self, filter: StatusFilter) -> Result<Vec<TransferRecord>> {
        self.history.list(filter).await
    }

    pub async fn dismiss(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.flow.dismiss()?;
        inner.abort_pending();
        inner.publish();
        info!("Transfer closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bank::default_banks;
    use crate::domain::ports::AccountVerifier;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    /// Takes a second and remembers whether it ever got to answer.
    struct SlowVerifier {
        answered: Arc<AtomicBool>,
    }

    #[async_trait]
    impl AccountVerifier for SlowVerifier {
        async fn verify(&self, account_number: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(1)).await;
            self.answered.store(true, Ordering::SeqCst);
            Ok(account_number.to_string())
        }
    }

    fn session() -> TransferSession {
        let context = SessionContext::simulated(default_banks(), None, &FlowConfig::default());
        TransferSession::new(context).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_processing_advances_to_payment() {
        let session = session();
        session.edit(|f| f.update_amount("100")).await.unwrap();
        assert!(session.edit(|f| f.start()).await.unwrap());
        session.edit(|f| f.set_reason("Family support")).await.unwrap();
        session.edit(|f| f.continue_to_summary()).await.unwrap();

        let id = session.confirm().await.unwrap();
        assert!(id.starts_with("Iz1HIHBjaA"));
        assert_eq!(session.state().await, FlowState::Processing);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(session.state().await, FlowState::Processing);
        assert_eq!(session.settle_processing().await, FlowState::CollectingPayment);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_reports_pending_verification() {
        let session = session();
        session.edit(|f| f.update_amount("10")).await.unwrap();
        session.edit(|f| f.start()).await.unwrap();
        session.edit(|f| f.set_account_number("42")).await.unwrap();
        assert!(session.check_account().await.unwrap());
        assert!(session.snapshot().await.verifying);

        session.settle_verification().await;
        let snapshot = session.snapshot().await;
        assert!(!snapshot.verifying);
        assert_eq!(
            snapshot.request.unwrap().recipient_name.as_deref(),
            Some("VERIFIED RECIPIENT")
        );
    }

    #[tokio::test]
    async fn test_check_account_needs_number() {
        let session = session();
        session.edit(|f| f.update_amount("10")).await.unwrap();
        session.edit(|f| f.start()).await.unwrap();
        assert!(!session.check_account().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_aborts_verification_being_settled() {
        let answered = Arc::new(AtomicBool::new(false));
        let config = FlowConfig::instant();
        let session = TransferSession::new(SessionContext {
            verifier: Arc::new(SlowVerifier {
                answered: answered.clone(),
            }),
            ..SessionContext::simulated(default_banks(), None, &config)
        })
        .unwrap();
        session.edit(|f| f.update_amount("10")).await.unwrap();
        session.edit(|f| f.start()).await.unwrap();
        session.edit(|f| f.set_account_number("42")).await.unwrap();
        assert!(session.check_account().await.unwrap());

        let settling = tokio::spawn({
            let session = session.clone();
            async move { session.settle_verification().await }
        });
        tokio::task::yield_now().await;
        assert!(session.snapshot().await.verifying);

        session.cancel().await;
        settling.await.unwrap();
        assert!(!session.snapshot().await.verifying);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!answered.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_returns_when_number_changes() {
        let session = session();
        session.edit(|f| f.update_amount("10")).await.unwrap();
        session.edit(|f| f.start()).await.unwrap();
        session.edit(|f| f.set_account_number("42")).await.unwrap();
        session.check_account().await.unwrap();

        let settling = tokio::spawn({
            let session = session.clone();
            async move { session.settle_verification().await }
        });
        tokio::task::yield_now().await;
        session.edit(|f| f.set_account_number("43")).await.unwrap();
        settling.await.unwrap();

        let snapshot = session.snapshot().await;
        assert!(!snapshot.verifying);
        assert!(snapshot.request.unwrap().recipient_name.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_lists_paid_transfer() {
        let session = session();
        session.edit(|f| f.update_amount("100")).await.unwrap();
        session.edit(|f| f.start()).await.unwrap();
        session.edit(|f| f.set_reason("Rent")).await.unwrap();
        session.edit(|f| f.continue_to_summary()).await.unwrap();
        let id = session.confirm().await.unwrap();
        session.settle_processing().await;
        session.pay(PaymentDetails::default()).await.unwrap();

        let paid = session
            .history(StatusFilter::Only(TransferStatus::Success))
            .await
            .unwrap();
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].transaction_id, id);
        assert!(
            session
                .history(StatusFilter::Only(TransferStatus::Failed))
                .await
                .unwrap()
                .is_empty()
        );
    }
}
