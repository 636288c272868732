use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Outcome of a transfer as listed in the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    /// Confirmed, not yet paid.
    Pending,
    Success,
    Failed,
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Success => "success",
            TransferStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Which records a history listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(TransferStatus),
}

impl StatusFilter {
    pub fn accepts(&self, status: TransferStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "pending" => Ok(StatusFilter::Only(TransferStatus::Pending)),
            "success" => Ok(StatusFilter::Only(TransferStatus::Success)),
            "failed" => Ok(StatusFilter::Only(TransferStatus::Failed)),
            other => Err(format!("unknown status filter: {other}")),
        }
    }
}

/// One line of the transfer history, keyed by transaction id.
///
/// A retried transfer gets a new transaction id, so a failed attempt keeps
/// its own record next to the one that eventually succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferRecord {
    pub transaction_id: String,
    pub recipient_name: Option<String>,
    pub bank: String,
    /// USD sent.
    pub amount: Decimal,
    /// ETB delivered, bonus included.
    pub total: Decimal,
    pub status: TransferStatus,
    /// Receipt reference, once paid.
    pub reference: Option<String>,
    pub error: Option<String>,
    pub recorded_at: DateTime<Utc>,
}
