use crate::domain::flow::{FlowAction, FlowState};
use thiserror::Error;

/// Field-level problems that block a flow transition.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum ValidationError {
    #[error("Reason can not be empty")]
    ReasonRequired,
    #[error("Amount must be positive")]
    AmountNotPositive,
    #[error("Amount is too large to convert")]
    AmountTooLarge,
    #[error("Invalid bonus rule: {0}")]
    InvalidBonusRule(String),
}

#[derive(Error, Debug)]
pub enum RemitError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Cannot {action} while {state}")]
    InvalidTransition { state: FlowState, action: FlowAction },
    #[error("Unknown bank: {0}")]
    UnknownBank(String),
    #[error("Account verification failed: {0}")]
    Verification(String),
    #[error("Transfer processing failed: {0}")]
    Processing(String),
    #[error("Rate table is empty")]
    EmptyRateTable,
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RemitError>;
