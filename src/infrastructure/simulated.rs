use crate::config::FlowConfig;
use crate::domain::ports::{AccountVerifier, TransferProcessor};
use crate::domain::transfer::TransferRequest;
use crate::error::{RemitError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Stands in for the bank's account lookup: waits, then answers with a fixed name.
#[derive(Debug, Clone)]
pub struct SimulatedAccountVerifier {
    delay: Duration,
    recipient_name: String,
}

impl SimulatedAccountVerifier {
    pub fn new(delay: Duration, recipient_name: impl Into<String>) -> Self {
        Self {
            delay,
            recipient_name: recipient_name.into(),
        }
    }

    pub fn from_config(config: &FlowConfig) -> Self {
        Self::new(config.verification_delay, config.recipient_name.clone())
    }
}

#[async_trait]
impl AccountVerifier for SimulatedAccountVerifier {
    async fn verify(&self, account_number: &str) -> Result<String> {
        if account_number.is_empty() {
            return Err(RemitError::Verification(
                "Account number is empty".to_string(),
            ));
        }
        debug!(delay_ms = self.delay.as_millis() as u64, "Verifying account");
        tokio::time::sleep(self.delay).await;
        Ok(self.recipient_name.clone())
    }
}

/// Stands in for the transfer backend: waits, then reports success.
#[derive(Debug, Clone)]
pub struct SimulatedTransferProcessor {
    delay: Duration,
}

impl SimulatedTransferProcessor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_config(config: &FlowConfig) -> Self {
        Self::new(config.processing_delay)
    }
}

#[async_trait]
impl TransferProcessor for SimulatedTransferProcessor {
    async fn process(&self, request: &TransferRequest) -> Result<()> {
        debug!(
            transaction_id = request.transaction_id.as_deref().unwrap_or_default(),
            delay_ms = self.delay.as_millis() as u64,
            "Processing transfer"
        );
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}
