use crate::domain::reference::DEFAULT_TRANSACTION_PREFIX;
use std::time::Duration;

pub const DEFAULT_PROCESSING_DELAY: Duration = Duration::from_secs(4);
pub const DEFAULT_VERIFICATION_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_RATE_REFRESH_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_RECIPIENT_NAME: &str = "VERIFIED RECIPIENT";

/// Tunables for the simulated parts of a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowConfig {
    /// How long the "sending money" step takes before payment opens.
    pub processing_delay: Duration,
    /// How long account verification takes to resolve.
    pub verification_delay: Duration,
    pub rate_refresh_delay: Duration,
    pub transaction_prefix: String,
    /// Name every verified account resolves to.
    pub recipient_name: String,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            processing_delay: DEFAULT_PROCESSING_DELAY,
            verification_delay: DEFAULT_VERIFICATION_DELAY,
            rate_refresh_delay: DEFAULT_RATE_REFRESH_DELAY,
            transaction_prefix: DEFAULT_TRANSACTION_PREFIX.to_string(),
            recipient_name: DEFAULT_RECIPIENT_NAME.to_string(),
        }
    }
}

impl FlowConfig {
    /// A configuration with every delay set to zero.
    pub fn instant() -> Self {
        Self {
            processing_delay: Duration::ZERO,
            verification_delay: Duration::ZERO,
            rate_refresh_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}
