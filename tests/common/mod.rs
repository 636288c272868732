#![allow(dead_code)]

use async_trait::async_trait;
use lakiremit::application::session::{SessionContext, TransferSession};
use lakiremit::config::FlowConfig;
use lakiremit::domain::bank::{Bank, BonusRule};
use lakiremit::domain::ports::{AccountVerifier, TransferProcessor};
use lakiremit::domain::reference::IdGenerator;
use lakiremit::infrastructure::in_memory::InMemoryTransferHistory;
use lakiremit::domain::transfer::TransferRequest;
use lakiremit::error::{RemitError, Result};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const PREFIX: &str = "Iz1HIHBjaA";

pub fn banks() -> Arc<[Bank]> {
    Arc::from(vec![
        Bank::new("test", "Test Bank", dec!(151.9), BonusRule::Flat(dec!(10))),
        Bank::new("awash", "Awash", dec!(154.9), BonusRule::Percentage(dec!(2))),
    ])
}

pub fn simulated_session() -> TransferSession {
    let context = SessionContext::simulated(banks(), None, &FlowConfig::default());
    TransferSession::new(context).unwrap()
}

pub fn session_with(
    verifier: Arc<dyn AccountVerifier>,
    processor: Arc<dyn TransferProcessor>,
) -> TransferSession {
    TransferSession::new(SessionContext {
        banks: banks(),
        sender: None,
        verifier,
        processor,
        history: Arc::new(InMemoryTransferHistory::new()),
        ids: IdGenerator::new(PREFIX),
    })
    .unwrap()
}

/// Drives a session to `ReviewingSummary` with the given amount.
pub async fn to_summary(session: &TransferSession, amount: &str) {
    session.edit(|f| f.update_amount(amount)).await.unwrap();
    assert!(session.edit(|f| f.start()).await.unwrap());
    session
        .edit(|f| {
            f.set_account_number("1000123456")?;
            f.set_reason("Family support")
        })
        .await
        .unwrap();
    session.edit(|f| f.continue_to_summary()).await.unwrap();
}

/// Resolves each account number to itself after a delay.
pub struct EchoVerifier {
    pub delay: Duration,
}

#[async_trait]
impl AccountVerifier for EchoVerifier {
    async fn verify(&self, account_number: &str) -> Result<String> {
        tokio::time::sleep(self.delay).await;
        Ok(format!("HOLDER OF {account_number}"))
    }
}

/// Fails the first `failures` calls, then succeeds.
pub struct FlakyProcessor {
    pub failures: usize,
    pub calls: AtomicUsize,
}

impl FlakyProcessor {
    pub fn new(failures: usize) -> Self {
        Self {
            failures,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TransferProcessor for FlakyProcessor {
    async fn process(&self, _request: &TransferRequest) -> Result<()> {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
            Err(RemitError::Processing("gateway unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}
