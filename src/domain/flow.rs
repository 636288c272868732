use super::amount::TransferAmount;
use super::bank::{Bank, find_bank};
use super::conversion::{ConversionResult, convert};
use super::history::{TransferRecord, TransferStatus};
use super::reference::IdGenerator;
use super::transfer::{
    DestinationBank, PaymentDetails, Receipt, SenderProfile, TransferRequest, TransferSummary,
    VerificationStatus,
};
use crate::error::{RemitError, Result, ValidationError};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Where a transfer currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowState {
    #[default]
    Idle,
    CollectingInfo,
    ReviewingSummary,
    Processing,
    CollectingPayment,
    Succeeded,
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FlowState::Idle => "idle",
            FlowState::CollectingInfo => "collecting info",
            FlowState::ReviewingSummary => "reviewing summary",
            FlowState::Processing => "processing",
            FlowState::CollectingPayment => "collecting payment",
            FlowState::Succeeded => "succeeded",
        };
        f.write_str(label)
    }
}

/// User or system triggers, named for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowAction {
    EditAmount,
    SelectBank,
    Start,
    EditDetails,
    VerifyAccount,
    Continue,
    Confirm,
    Pay,
    Dismiss,
}

impl fmt::Display for FlowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FlowAction::EditAmount => "edit the amount",
            FlowAction::SelectBank => "select a bank",
            FlowAction::Start => "start a transfer",
            FlowAction::EditDetails => "edit transfer details",
            FlowAction::VerifyAccount => "verify the account",
            FlowAction::Continue => "continue",
            FlowAction::Confirm => "confirm",
            FlowAction::Pay => "pay",
            FlowAction::Dismiss => "dismiss",
        };
        f.write_str(label)
    }
}

/// Identifies one piece of async work issued by a flow.
///
/// A completion is applied only while its ticket is still the latest of its
/// kind within the attempt that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptTicket {
    attempt: u64,
    sequence: u64,
}

/// The multi-step send-money flow for a single user session.
///
/// Owns the amount entry, the bank selection and, while a transfer is in
/// progress, its [`TransferRequest`]. Every method is synchronous; async
/// completions are fed back in through the `complete_*` methods together with
/// the ticket that was handed out when the work began.
#[derive(Debug)]
pub struct TransferFlow {
    banks: Arc<[Bank]>,
    selected: usize,
    amount: TransferAmount,
    state: FlowState,
    sender: Option<SenderProfile>,
    request: Option<TransferRequest>,
    receipt: Option<Receipt>,
    reason_error: bool,
    ids: IdGenerator,
    attempt: u64,
    verification_seq: u64,
    processing_seq: u64,
}

impl TransferFlow {
    pub fn new(
        banks: Arc<[Bank]>,
        sender: Option<SenderProfile>,
        ids: IdGenerator,
    ) -> Result<Self> {
        if banks.is_empty() {
            return Err(RemitError::EmptyRateTable);
        }
        Ok(Self {
            banks,
            selected: 0,
            amount: TransferAmount::new(),
            state: FlowState::Idle,
            sender,
            request: None,
            receipt: None,
            reason_error: false,
            ids,
            attempt: 0,
            verification_seq: 0,
            processing_seq: 0,
        })
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn banks(&self) -> &[Bank] {
        &self.banks
    }

    pub fn selected_bank(&self) -> &Bank {
        &self.banks[self.selected]
    }

    pub fn amount(&self) -> &TransferAmount {
        &self.amount
    }

    pub fn request(&self) -> Option<&TransferRequest> {
        self.request.as_ref()
    }

    pub fn receipt(&self) -> Option<&Receipt> {
        self.receipt.as_ref()
    }

    /// Set after a blocked `continue`, cleared once a reason is typed.
    pub fn reason_error(&self) -> bool {
        self.reason_error
    }

    /// Whether an account check has been issued and not yet resolved.
    pub fn is_verifying(&self) -> bool {
        self.request
            .as_ref()
            .is_some_and(|request| request.verification == VerificationStatus::Pending)
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.request.as_ref()?.transaction_id.as_deref()
    }

    /// Conversion of the current amount with the selected bank.
    pub fn conversion(&self) -> Result<ConversionResult> {
        convert(self.amount.value(), self.selected_bank())
    }

    pub fn update_amount(&mut self, input: &str) -> Result<bool> {
        self.expect_state(FlowState::Idle, FlowAction::EditAmount)?;
        Ok(self.amount.update(input))
    }

    pub fn select_bank(&mut self, id: &str) -> Result<()> {
        self.expect_state(FlowState::Idle, FlowAction::SelectBank)?;
        let bank = find_bank(&self.banks, id)?;
        let index = self
            .banks
            .iter()
            .position(|candidate| candidate.id == bank.id)
            .ok_or_else(|| RemitError::UnknownBank(id.to_string()))?;
        self.selected = index;
        Ok(())
    }

    /// Opens the send-money step.
    ///
    /// Returns `Ok(false)` without changing anything when the amount is not
    /// positive; the caller is expected to keep the affordance disabled. An
    /// amount too large to convert is an error.
    pub fn start(&mut self) -> Result<bool> {
        self.expect_state(FlowState::Idle, FlowAction::Start)?;
        if !self.amount.is_positive() {
            return Ok(false);
        }
        self.conversion()?;
        self.attempt += 1;
        self.request = Some(TransferRequest::for_sender(self.sender.as_ref()));
        self.reason_error = false;
        self.transition(FlowState::CollectingInfo);
        Ok(true)
    }

    pub fn set_sender_name(&mut self, name: impl Into<String>) -> Result<()> {
        self.details_mut()?.sender_name = name.into();
        Ok(())
    }

    pub fn set_sender_email(&mut self, email: impl Into<String>) -> Result<()> {
        self.details_mut()?.sender_email = email.into();
        Ok(())
    }

    pub fn set_destination(&mut self, destination: DestinationBank) -> Result<()> {
        self.details_mut()?.destination = destination;
        Ok(())
    }

    /// Changing the number discards any earlier verification of it.
    pub fn set_account_number(&mut self, account_number: impl Into<String>) -> Result<()> {
        let account_number = account_number.into();
        let request = self.details_mut()?;
        if request.account_number != account_number {
            request.account_number = account_number;
            request.recipient_name = None;
            request.verification = VerificationStatus::NotRequested;
            self.verification_seq += 1;
        }
        Ok(())
    }

    pub fn set_reason(&mut self, reason: impl Into<String>) -> Result<()> {
        let reason = reason.into();
        let clears_error = !reason.is_empty();
        self.details_mut()?.reason = reason;
        if clears_error {
            self.reason_error = false;
        }
        Ok(())
    }

    /// Marks the account number as being verified.
    ///
    /// Returns the ticket and number to verify, or `None` when there is no
    /// account number yet. A new request supersedes any earlier pending one.
    pub fn begin_verification(&mut self) -> Result<Option<(AttemptTicket, String)>> {
        let request = self.details_mut()?;
        if request.account_number.is_empty() {
            return Ok(None);
        }
        request.verification = VerificationStatus::Pending;
        let account_number = request.account_number.clone();
        self.verification_seq += 1;
        Ok(Some((
            AttemptTicket {
                attempt: self.attempt,
                sequence: self.verification_seq,
            },
            account_number,
        )))
    }

    /// Applies a verification outcome. Stale tickets are ignored.
    pub fn complete_verification(
        &mut self,
        ticket: AttemptTicket,
        outcome: Result<String>,
    ) -> bool {
        if ticket.attempt != self.attempt || ticket.sequence != self.verification_seq {
            debug!(?ticket, "Ignoring stale account verification");
            return false;
        }
        let Some(request) = self.request.as_mut() else {
            debug!(?ticket, "Ignoring account verification without a transfer");
            return false;
        };
        match outcome {
            Ok(name) => {
                info!(recipient = %name, "Account verified");
                request.recipient_name = Some(name);
                request.verification = VerificationStatus::Verified;
            }
            Err(e) => {
                info!(error = %e, "Account verification failed");
                request.recipient_name = None;
                request.verification = VerificationStatus::Failed(e.to_string());
            }
        }
        true
    }

    /// Leaves the info step. Only an empty reason blocks it.
    pub fn continue_to_summary(&mut self) -> Result<()> {
        self.expect_state(FlowState::CollectingInfo, FlowAction::Continue)?;
        if !self.request.as_ref().is_some_and(TransferRequest::has_reason) {
            self.reason_error = true;
            return Err(ValidationError::ReasonRequired.into());
        }
        self.reason_error = false;
        self.transition(FlowState::ReviewingSummary);
        Ok(())
    }

    /// Steps back from the summary to the info form, keeping every field.
    /// From anywhere else this abandons the transfer.
    pub fn back(&mut self) {
        match self.state {
            FlowState::ReviewingSummary => self.transition(FlowState::CollectingInfo),
            FlowState::Idle => {}
            _ => self.cancel(),
        }
    }

    /// Confirms the summary and enters processing with a fresh transaction id.
    pub fn confirm(&mut self) -> Result<AttemptTicket> {
        self.expect_state(FlowState::ReviewingSummary, FlowAction::Confirm)?;
        let transaction_id = self.ids.transaction_id();
        if let Some(request) = self.request.as_mut() {
            request.transaction_id = Some(transaction_id.clone());
            request.last_error = None;
        }
        self.processing_seq += 1;
        info!(%transaction_id, "Transfer confirmed");
        self.transition(FlowState::Processing);
        Ok(AttemptTicket {
            attempt: self.attempt,
            sequence: self.processing_seq,
        })
    }

    /// Applies the end of processing. A failure returns to the summary so the
    /// user can retry without re-entering anything.
    pub fn complete_processing(&mut self, ticket: AttemptTicket, outcome: Result<()>) -> bool {
        if self.state != FlowState::Processing
            || ticket.attempt != self.attempt
            || ticket.sequence != self.processing_seq
        {
            debug!(?ticket, state = %self.state, "Ignoring stale processing result");
            return false;
        }
        match outcome {
            Ok(()) => self.transition(FlowState::CollectingPayment),
            Err(e) => {
                if let Some(request) = self.request.as_mut() {
                    request.last_error = Some(e.to_string());
                }
                info!(error = %e, "Transfer processing failed");
                self.transition(FlowState::ReviewingSummary);
            }
        }
        true
    }

    pub fn pay(&mut self, payment: PaymentDetails) -> Result<Receipt> {
        self.expect_state(FlowState::CollectingPayment, FlowAction::Pay)?;
        let summary = self.summary().ok_or(RemitError::InvalidTransition {
            state: self.state,
            action: FlowAction::Pay,
        })?;
        let transaction_id = summary.transaction_id.clone().unwrap_or_default();
        let receipt = Receipt {
            transaction_id,
            reference: self.ids.reference(),
            summary,
            payment,
        };
        info!(
            transaction_id = %receipt.transaction_id,
            reference = %receipt.reference,
            "Transfer paid"
        );
        self.receipt = Some(receipt.clone());
        self.transition(FlowState::Succeeded);
        Ok(receipt)
    }

    /// Closes the success screen and clears the amount for the next transfer.
    pub fn dismiss(&mut self) -> Result<()> {
        self.expect_state(FlowState::Succeeded, FlowAction::Dismiss)?;
        self.reset();
        Ok(())
    }

    /// Abandons whatever is in progress. Always succeeds.
    pub fn cancel(&mut self) {
        if self.state != FlowState::Idle {
            info!(attempt = self.attempt, state = %self.state, "Transfer cancelled");
        }
        self.reset();
    }

    /// Snapshot for the summary and receipt screens, recomputed on every call.
    pub fn summary(&self) -> Option<TransferSummary> {
        let request = self.request.as_ref()?;
        let bank = self.selected_bank();
        let conversion = self.conversion().ok()?;
        let bank_name = match request.destination {
            DestinationBank::Primary => bank.name.clone(),
            DestinationBank::Other => "Other Bank".to_string(),
        };
        Some(TransferSummary {
            recipient_name: request.recipient_name.clone(),
            bank: bank_name,
            sent_amount: self.amount.value(),
            exchange_rate: bank.rate,
            converted: conversion.converted,
            bonus: conversion.bonus,
            reason: request.reason.clone(),
            fee: Decimal::ZERO,
            total: conversion.total,
            transaction_id: request.transaction_id.clone(),
        })
    }

    /// History entry for the confirmed transfer, or `None` before `confirm`.
    ///
    /// `Success` records carry the receipt reference and `Failed` ones the
    /// last processing error.
    pub fn history_record(&self, status: TransferStatus) -> Option<TransferRecord> {
        let summary = self.summary()?;
        let transaction_id = summary.transaction_id?;
        let reference = match status {
            TransferStatus::Success => self.receipt.as_ref().map(|r| r.reference.clone()),
            _ => None,
        };
        let error = match status {
            TransferStatus::Failed => self.request.as_ref()?.last_error.clone(),
            _ => None,
        };
        Some(TransferRecord {
            transaction_id,
            recipient_name: summary.recipient_name,
            bank: summary.bank,
            amount: summary.sent_amount,
            total: summary.total,
            status,
            reference,
            error,
            recorded_at: Utc::now(),
        })
    }

    fn reset(&mut self) {
        self.attempt += 1;
        self.request = None;
        self.receipt = None;
        self.reason_error = false;
        self.amount.clear();
        self.transition(FlowState::Idle);
    }

    fn details_mut(&mut self) -> Result<&mut TransferRequest> {
        let state = self.state;
        match (state, self.request.as_mut()) {
            (FlowState::CollectingInfo, Some(request)) => Ok(request),
            _ => Err(RemitError::InvalidTransition {
                state,
                action: FlowAction::EditDetails,
            }),
        }
    }

    fn expect_state(&self, expected: FlowState, action: FlowAction) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(RemitError::InvalidTransition {
                state: self.state,
                action,
            })
        }
    }

    fn transition(&mut self, next: FlowState) {
        if self.state != next {
            info!(attempt = self.attempt, from = %self.state, to = %next, "Flow transition");
            self.state = next;
        }
    }
}
