use super::bank::{Bank, BonusRule};
use crate::error::{Result, ValidationError};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;

/// Converted amount, bonus and total in ETB, all at full precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConversionResult {
    pub converted: Decimal,
    pub bonus: Decimal,
    pub total: Decimal,
}

impl ConversionResult {
    /// A copy rounded to one decimal place, for presentation only.
    pub fn rounded(&self) -> Self {
        Self {
            converted: round_for_display(self.converted),
            bonus: round_for_display(self.bonus),
            total: round_for_display(self.total),
        }
    }
}

/// Converts a USD amount with the given bank's rate and bonus rule.
///
/// Negative amounts are treated as zero. Fails with
/// [`ValidationError::AmountTooLarge`] when any figure would not fit in a
/// `Decimal`.
pub fn convert(amount: Decimal, bank: &Bank) -> Result<ConversionResult> {
    let amount = amount.max(Decimal::ZERO);
    let converted = amount
        .checked_mul(bank.rate)
        .ok_or(ValidationError::AmountTooLarge)?;
    let bonus = match bank.bonus {
        BonusRule::Flat(value) => value,
        BonusRule::Percentage(percent) => {
            converted
                .checked_mul(percent)
                .ok_or(ValidationError::AmountTooLarge)?
                / dec!(100)
        }
    };
    let total = converted
        .checked_add(bonus)
        .ok_or(ValidationError::AmountTooLarge)?;
    Ok(ConversionResult {
        converted,
        bonus,
        total,
    })
}

pub fn round_for_display(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Renders a value with exactly one decimal place, e.g. `15200.0`.
pub fn format_etb(value: Decimal) -> String {
    let mut rounded = round_for_display(value);
    rounded.rescale(1);
    rounded.to_string()
}
