use crate::error::{RemitError, Result, ValidationError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// How a bank sweetens a transfer on top of the plain conversion.
///
/// Serialized using the labels shown next to each bank (`"10 ETB"`, `"2%"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BonusRule {
    /// A fixed amount in ETB, independent of the amount sent.
    Flat(Decimal),
    /// A percentage of the converted amount.
    Percentage(Decimal),
}

impl fmt::Display for BonusRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BonusRule::Flat(value) => write!(f, "{} ETB", value.normalize()),
            BonusRule::Percentage(percent) => write!(f, "{}%", percent.normalize()),
        }
    }
}

impl FromStr for BonusRule {
    type Err = ValidationError;

    fn from_str(label: &str) -> std::result::Result<Self, Self::Err> {
        let label = label.trim();
        let invalid = || ValidationError::InvalidBonusRule(label.to_string());

        let (number, percentage) = if let Some(number) = label.strip_suffix('%') {
            (number, true)
        } else if let Some(number) = label.strip_suffix("ETB") {
            (number, false)
        } else {
            (label, false)
        };

        let value = Decimal::from_str(number.trim()).map_err(|_| invalid())?;
        if value.is_sign_negative() {
            return Err(invalid());
        }

        if percentage {
            Ok(BonusRule::Percentage(value))
        } else {
            Ok(BonusRule::Flat(value))
        }
    }
}

impl TryFrom<String> for BonusRule {
    type Error = ValidationError;

    fn try_from(label: String) -> std::result::Result<Self, Self::Error> {
        label.parse()
    }
}

impl From<BonusRule> for String {
    fn from(rule: BonusRule) -> Self {
        rule.to_string()
    }
}

/// A destination bank and the rate it offers for one USD.
///
/// Rate tables are loaded once and shared read-only between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub logo: String,
    /// ETB paid out per USD sent.
    pub rate: Decimal,
    pub bonus: BonusRule,
    pub color: String,
}

impl Bank {
    pub fn new(id: &str, name: &str, rate: Decimal, bonus: BonusRule) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            short_name: name.to_string(),
            logo: id.to_string(),
            rate,
            bonus,
            color: String::new(),
        }
    }

    fn styled(mut self, short_name: &str, color: &str) -> Self {
        self.short_name = short_name.to_string();
        self.color = color.to_string();
        self
    }
}

/// The built-in rate table. The first entry is the default selection.
pub fn default_banks() -> Arc<[Bank]> {
    Arc::from(vec![
        Bank::new("cbe", "CBE", dec!(164.6), BonusRule::Flat(dec!(10))).styled("CBE", "#2E7D32"),
        Bank::new("awash", "Awash", dec!(154.9), BonusRule::Percentage(dec!(2)))
            .styled("Awash", "#1565C0"),
        Bank::new("oromia", "Oromia Bank", dec!(165.1), BonusRule::Flat(dec!(10)))
            .styled("Or...", "#43A047"),
        Bank::new(
            "abyssinia",
            "Abyssinia Bank",
            dec!(154.9),
            BonusRule::Percentage(dec!(2)),
        )
        .styled("Abyss...", "#F9A825"),
    ])
}

/// Looks a bank up by id, case-insensitively.
pub fn find_bank<'a>(banks: &'a [Bank], id: &str) -> Result<&'a Bank> {
    banks
        .iter()
        .find(|bank| bank.id.eq_ignore_ascii_case(id))
        .ok_or_else(|| RemitError::UnknownBank(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bonus_rule_parses_labels() {
        assert_eq!("10 ETB".parse(), Ok(BonusRule::Flat(dec!(10))));
        assert_eq!("2%".parse(), Ok(BonusRule::Percentage(dec!(2))));
        assert_eq!(" 2.5 % ".parse(), Ok(BonusRule::Percentage(dec!(2.5))));
        assert_eq!("15".parse(), Ok(BonusRule::Flat(dec!(15))));
    }

    #[test]
    fn test_bonus_rule_rejects_garbage() {
        assert!(matches!(
            "lots".parse::<BonusRule>(),
            Err(ValidationError::InvalidBonusRule(_))
        ));
        assert!("-1%".parse::<BonusRule>().is_err());
    }

    #[test]
    fn test_bonus_rule_display_matches_labels() {
        assert_eq!(BonusRule::Flat(dec!(10.0)).to_string(), "10 ETB");
        assert_eq!(BonusRule::Percentage(dec!(2)).to_string(), "2%");
    }

    #[test]
    fn test_default_table() {
        let banks = default_banks();
        assert_eq!(banks.len(), 4);
        assert_eq!(banks[0].id, "cbe");
        assert_eq!(banks[0].rate, dec!(164.6));
        assert_eq!(banks[1].bonus, BonusRule::Percentage(dec!(2)));
    }

    #[test]
    fn test_find_bank() {
        let banks = default_banks();
        assert_eq!(find_bank(&banks, "AWASH").unwrap().name, "Awash");
        assert!(matches!(
            find_bank(&banks, "nope"),
            Err(RemitError::UnknownBank(id)) if id == "nope"
        ));
    }
}
