use super::conversion::format_etb;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;

/// Which kind of account receives the money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationBank {
    /// An account at the bank the transfer was quoted against.
    #[default]
    Primary,
    Other,
}

/// The signed-in user, as reported by the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SenderProfile {
    pub display_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum VerificationStatus {
    #[default]
    NotRequested,
    Pending,
    Verified,
    Failed(String),
}

/// Everything collected while walking through one transfer.
///
/// Sender fields may legitimately be blank. Only `reason` gates progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransferRequest {
    pub sender_name: String,
    pub sender_email: String,
    pub destination: DestinationBank,
    pub account_number: String,
    pub reason: String,
    /// Filled in whenever account verification resolves.
    pub recipient_name: Option<String>,
    pub verification: VerificationStatus,
    /// Assigned on confirmation, regenerated on every retry.
    pub transaction_id: Option<String>,
    /// Why the last processing attempt failed, if it did.
    pub last_error: Option<String>,
}

impl TransferRequest {
    pub fn for_sender(sender: Option<&SenderProfile>) -> Self {
        Self {
            sender_name: sender
                .and_then(|s| s.display_name.clone())
                .unwrap_or_default(),
            sender_email: sender.and_then(|s| s.email.clone()).unwrap_or_default(),
            ..Self::default()
        }
    }

    pub fn has_reason(&self) -> bool {
        !self.reason.trim().is_empty()
    }
}

/// Payer and card details entered on the payment step.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct PaymentDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(serialize_with = "serialize_masked_card")]
    pub card_number: String,
    #[serde(skip_serializing)]
    pub cvv: String,
    pub expiry_month: String,
    pub expiry_year: String,
}

impl PaymentDetails {
    /// The card number reduced to its last four digits.
    pub fn masked_card(&self) -> String {
        mask_card_number(&self.card_number)
    }
}

fn mask_card_number(card_number: &str) -> String {
    let digits: Vec<char> = card_number.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return String::new();
    }
    let tail: String = digits[digits.len().saturating_sub(4)..].iter().collect();
    format!("**** {tail}")
}

fn serialize_masked_card<S>(card_number: &str, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&mask_card_number(card_number))
}

impl fmt::Debug for PaymentDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentDetails")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("card_number", &self.masked_card())
            .field("expiry_month", &self.expiry_month)
            .field("expiry_year", &self.expiry_year)
            .finish_non_exhaustive()
    }
}

/// What the summary and receipt screens show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferSummary {
    /// `None` while verification is still outstanding.
    pub recipient_name: Option<String>,
    pub bank: String,
    pub sent_amount: Decimal,
    pub exchange_rate: Decimal,
    pub converted: Decimal,
    pub bonus: Decimal,
    pub reason: String,
    pub fee: Decimal,
    pub total: Decimal,
    pub transaction_id: Option<String>,
}

impl fmt::Display for TransferSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(id) = &self.transaction_id {
            writeln!(f, "Transaction ID: {id}")?;
        }
        writeln!(
            f,
            "To: {}",
            self.recipient_name.as_deref().unwrap_or("(unverified)")
        )?;
        writeln!(f, "Bank: {}", self.bank)?;
        writeln!(f, "Sent Amount: ${}", self.sent_amount.normalize())?;
        writeln!(f, "Exchange Rate: $1 = {} ETB", self.exchange_rate.normalize())?;
        writeln!(f, "Amount in ETB: {} ETB", format_etb(self.converted))?;
        writeln!(f, "Gift: {} ETB", format_etb(self.bonus))?;
        writeln!(f, "Reason: {}", self.reason)?;
        writeln!(f, "Transaction Fee: {}", format_etb(self.fee))?;
        write!(f, "Total: {} ETB", format_etb(self.total))
    }
}

/// Produced once the transfer succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub transaction_id: String,
    pub reference: String,
    pub summary: TransferSummary,
    pub payment: PaymentDetails,
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Reference: {}", self.reference)?;
        write!(f, "{}", self.summary)?;
        let card = self.payment.masked_card();
        if !card.is_empty() {
            write!(f, "\nPaid with: {card}")?;
        }
        Ok(())
    }
}
