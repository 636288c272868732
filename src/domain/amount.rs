use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::LazyLock;

static AMOUNT_INPUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]*\.?[0-9]*$").expect("Invalid amount regex"));

/// The USD amount as typed by the user.
///
/// Keeps the raw text so partial input such as `"12."` survives editing. The
/// numeric value is always derived from that text, never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferAmount {
    text: String,
}

impl TransferAmount {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the text if `input` looks like a plain decimal number.
    ///
    /// Returns `false` and keeps the previous text otherwise.
    pub fn update(&mut self, input: &str) -> bool {
        if AMOUNT_INPUT.is_match(input) {
            self.text = input.to_string();
            true
        } else {
            false
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Parsed value of the text, zero when empty or unparseable.
    pub fn value(&self) -> Decimal {
        let trimmed = self.text.trim_end_matches('.');
        if trimmed.is_empty() {
            return Decimal::ZERO;
        }
        let normalized = if trimmed.starts_with('.') {
            format!("0{trimmed}")
        } else {
            trimmed.to_string()
        };
        Decimal::from_str(&normalized).unwrap_or(Decimal::ZERO)
    }

    pub fn is_positive(&self) -> bool {
        self.value() > Decimal::ZERO
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_accepts_partial_decimals() {
        let mut amount = TransferAmount::new();
        assert!(amount.update("12."));
        assert_eq!(amount.value(), dec!(12));
        assert!(amount.update(".5"));
        assert_eq!(amount.value(), dec!(0.5));
        assert!(amount.update(""));
        assert_eq!(amount.value(), Decimal::ZERO);
    }

    #[test]
    fn test_rejects_non_numeric_edits() {
        let mut amount = TransferAmount::new();
        assert!(amount.update("100"));
        assert!(!amount.update("100a"));
        assert!(!amount.update("1.2.3"));
        assert!(!amount.update("-5"));
        assert_eq!(amount.as_str(), "100");
    }

    #[test]
    fn test_positivity() {
        let mut amount = TransferAmount::new();
        assert!(!amount.is_positive());
        amount.update("0.0");
        assert!(!amount.is_positive());
        amount.update("0.01");
        assert!(amount.is_positive());
        amount.clear();
        assert_eq!(amount.as_str(), "");
    }

    #[test]
    fn test_overlong_input_is_zero() {
        let mut amount = TransferAmount::new();
        amount.update("99999999999999999999999999999999999");
        assert_eq!(amount.value(), Decimal::ZERO);
    }
}
