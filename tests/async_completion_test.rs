mod common;

use common::{EchoVerifier, FlakyProcessor};
use lakiremit::domain::flow::FlowState;
use lakiremit::domain::ports::{AccountVerifier, TransferProcessor};
use lakiremit::domain::transfer::{TransferRequest, VerificationStatus};
use lakiremit::infrastructure::simulated::SimulatedTransferProcessor;
use std::sync::Arc;
use std::time::Duration;

fn echo(delay_ms: u64) -> Arc<dyn AccountVerifier> {
    Arc::new(EchoVerifier {
        delay: Duration::from_millis(delay_ms),
    })
}

fn instant_processor() -> Arc<dyn TransferProcessor> {
    Arc::new(SimulatedTransferProcessor::new(Duration::ZERO))
}

async fn start(session: &lakiremit::application::session::TransferSession) {
    session.edit(|f| f.update_amount("25")).await.unwrap();
    session.edit(|f| f.start()).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_verification_after_cancel_is_dropped() {
    let session = common::session_with(echo(1000), instant_processor());
    start(&session).await;
    session.edit(|f| f.set_account_number("111")).await.unwrap();
    session.check_account().await.unwrap();

    session.cancel().await;
    start(&session).await;
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(
        session.snapshot().await.request,
        Some(TransferRequest::default())
    );
}

#[tokio::test(start_paused = true)]
async fn test_newer_check_supersedes_older() {
    let session = common::session_with(echo(1000), instant_processor());
    start(&session).await;
    session.edit(|f| f.set_account_number("111")).await.unwrap();
    session.check_account().await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    session.edit(|f| f.set_account_number("222")).await.unwrap();
    session.check_account().await.unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    let request = session.snapshot().await.request.unwrap();
    assert_eq!(request.recipient_name.as_deref(), Some("HOLDER OF 222"));
    assert_eq!(request.verification, VerificationStatus::Verified);
}

#[tokio::test(start_paused = true)]
async fn test_processing_failure_is_retryable() {
    let processor = Arc::new(FlakyProcessor::new(1));
    let session = common::session_with(echo(0), processor.clone());
    common::to_summary(&session, "40").await;

    session.confirm().await.unwrap();
    assert_eq!(session.settle_processing().await, FlowState::ReviewingSummary);
    let request = session.snapshot().await.request.unwrap();
    assert_eq!(request.reason, "Family support");
    assert_eq!(request.account_number, "1000123456");
    assert!(request.last_error.unwrap().contains("gateway unavailable"));

    let second = session.confirm().await.unwrap();
    assert!(second.starts_with(common::PREFIX));
    assert_eq!(session.settle_processing().await, FlowState::CollectingPayment);
    assert_eq!(processor.calls.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_back_from_payment_abandons_transfer() {
    let session = common::session_with(echo(0), instant_processor());
    common::to_summary(&session, "40").await;
    session.confirm().await.unwrap();
    assert_eq!(session.settle_processing().await, FlowState::CollectingPayment);

    assert_eq!(session.back().await, FlowState::Idle);
    assert!(session.snapshot().await.request.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_independent_sessions_in_parallel() {
    let mut handles = Vec::new();
    for i in 1..=16u32 {
        handles.push(tokio::spawn(async move {
            let session = common::session_with(echo(5), instant_processor());
            let amount = i.to_string();
            common::to_summary(&session, &amount).await;
            session.check_account().await.unwrap();
            session.settle_verification().await;
            session.confirm().await.unwrap();
            assert_eq!(session.settle_processing().await, FlowState::CollectingPayment);
            session.snapshot().await.summary.unwrap()
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let summary = handle.await.unwrap();
        assert_eq!(summary.sent_amount, rust_decimal::Decimal::from(i as u32 + 1));
        assert_eq!(summary.recipient_name.as_deref(), Some("HOLDER OF 1000123456"));
    }
}
