use crate::config::FlowConfig;
use crate::domain::bank::{Bank, default_banks};
use crate::domain::history::{StatusFilter, TransferRecord};
use crate::domain::ports::{RateSource, TransferHistory};
use crate::error::{RemitError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::info;

/// A rate table held in memory.
///
/// `refresh` only simulates a round trip; the table itself never changes
/// after construction unless replaced through [`StaticRateTable::replace`].
pub struct StaticRateTable {
    banks: RwLock<Arc<[Bank]>>,
    refresh_delay: Duration,
    loading: AtomicBool,
}

impl StaticRateTable {
    pub fn new(banks: Arc<[Bank]>, refresh_delay: Duration) -> Result<Self> {
        if banks.is_empty() {
            return Err(RemitError::EmptyRateTable);
        }
        Ok(Self {
            banks: RwLock::new(banks),
            refresh_delay,
            loading: AtomicBool::new(false),
        })
    }

    pub fn from_config(banks: Arc<[Bank]>, config: &FlowConfig) -> Result<Self> {
        Self::new(banks, config.rate_refresh_delay)
    }

    pub fn replace(&self, banks: Arc<[Bank]>) -> Result<()> {
        if banks.is_empty() {
            return Err(RemitError::EmptyRateTable);
        }
        *self.banks.write().unwrap_or_else(|e| e.into_inner()) = banks;
        Ok(())
    }
}

impl Default for StaticRateTable {
    fn default() -> Self {
        Self {
            banks: RwLock::new(default_banks()),
            refresh_delay: Duration::ZERO,
            loading: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl RateSource for StaticRateTable {
    fn banks(&self) -> Arc<[Bank]> {
        self.banks.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    async fn refresh(&self) -> Result<Arc<[Bank]>> {
        let loading = LoadingGuard::raise(&self.loading);
        tokio::time::sleep(self.refresh_delay).await;
        drop(loading);
        let banks = self.banks();
        info!(banks = banks.len(), "Rates refreshed");
        Ok(banks)
    }
}

/// Holds the loading flag up until dropped, so a refresh abandoned
/// mid-flight does not leave the table stuck in the loading state.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A thread-safe in-memory transfer history.
///
/// Records are kept in creation order; storing a record whose transaction id
/// is already known replaces it in place.
#[derive(Default, Clone)]
pub struct InMemoryTransferHistory {
    records: Arc<tokio::sync::RwLock<Vec<TransferRecord>>>,
}

impl InMemoryTransferHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransferHistory for InMemoryTransferHistory {
    async fn store(&self, record: TransferRecord) -> Result<()> {
        let mut records = self.records.write().await;
        match records
            .iter_mut()
            .find(|known| known.transaction_id == record.transaction_id)
        {
            Some(known) => *known = record,
            None => records.push(record),
        }
        Ok(())
    }

    async fn get(&self, transaction_id: &str) -> Result<Option<TransferRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|record| record.transaction_id == transaction_id)
            .cloned())
    }

    async fn list(&self, filter: StatusFilter) -> Result<Vec<TransferRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .rev()
            .filter(|record| filter.accepts(record.status))
            .cloned()
            .collect())
    }
}
