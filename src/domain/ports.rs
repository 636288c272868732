use super::bank::Bank;
use super::history::{StatusFilter, TransferRecord};
use super::transfer::TransferRequest;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Resolves the display name behind a destination account number.
#[async_trait]
pub trait AccountVerifier: Send + Sync {
    async fn verify(&self, account_number: &str) -> Result<String>;
}

/// Carries a confirmed transfer through to the payment step.
#[async_trait]
pub trait TransferProcessor: Send + Sync {
    async fn process(&self, request: &TransferRequest) -> Result<()>;
}

/// Supplies the bank rate table.
#[async_trait]
pub trait RateSource: Send + Sync {
    fn banks(&self) -> Arc<[Bank]>;
    fn is_loading(&self) -> bool;
    async fn refresh(&self) -> Result<Arc<[Bank]>>;
}

pub type AccountVerifierRef = Arc<dyn AccountVerifier>;
pub type TransferProcessorRef = Arc<dyn TransferProcessor>;
pub type RateSourceRef = Arc<dyn RateSource>;

/// Keeps a record of every confirmed transfer.
#[async_trait]
pub trait TransferHistory: Send + Sync {
    /// Inserts the record, replacing any earlier one with the same transaction id.
    async fn store(&self, record: TransferRecord) -> Result<()>;
    async fn get(&self, transaction_id: &str) -> Result<Option<TransferRecord>>;
    /// Matching records, most recently created first.
    async fn list(&self, filter: StatusFilter) -> Result<Vec<TransferRecord>>;
}

pub type TransferHistoryRef = Arc<dyn TransferHistory>;
