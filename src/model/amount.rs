//! Amount type for handling monetary values read from loosely typed spreadsheet cells.
//!
//! Amounts are held as `f64`. Because they travel through text on every sync, two amounts are
//! considered the same when they differ by less than `EPSILON`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// The tolerance used when comparing amounts.
pub const EPSILON: f64 = 0.01;

/// Represents a dollar amount.
///
/// # Examples
///
/// ```
/// # use books_sync::model::Amount;
/// let amount = Amount::parse_lenient("$1,250.50");
/// assert_eq!(amount.value(), 1250.5);
/// assert_eq!(amount.to_string(), "1250.50");
///
/// // Spreadsheet data is loosely typed, garbage becomes zero.
/// assert_eq!(Amount::parse_lenient("abc").value(), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Amount(f64);

impl Amount {
    pub const ZERO: Amount = Amount(0.0);

    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Returns true when `self` and `other` are within `EPSILON` of each other.
    pub fn approx_eq(&self, other: &Amount) -> bool {
        (self.0 - other.0).abs() < EPSILON
    }

    /// Parses `s` the way a spreadsheet cell should be read: never fails, anything that cannot be
    /// understood as a number is zero.
    pub fn parse_lenient(s: &str) -> Self {
        match Amount::from_str(s) {
            Ok(amount) => amount,
            Err(e) => {
                debug!("Unable to parse amount '{s}', using 0: {e}");
                Amount::ZERO
            }
        }
    }
}

/// An error that can occur when parsing strings into `Amount` values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountError(String);

impl fmt::Display for AmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {}

impl FromStr for Amount {
    type Err = AmountError;

    /// Accepts `50`, `50.00`, `$50.00`, `-$50.00`, `$1,000.00`. An empty string is zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Amount::ZERO);
        }

        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let digits = unsigned.strip_prefix('$').unwrap_or(unsigned).replace(',', "");

        let value = f64::from_str(&digits)
            .map_err(|e| AmountError(format!("Invalid amount '{s}': {e}")))?;
        if !value.is_finite() {
            return Err(AmountError(format!("Invalid amount '{s}': not finite")));
        }
        Ok(Amount(if negative { -value } else { value }))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Amount {
    /// Formats the amount for people, e.g. `$1,234.50` or `-$20.00`.
    pub fn to_currency(&self) -> String {
        let sign = if self.0 < 0.0 { "-" } else { "" };
        format!("{sign}${}", format_num::format_num!(",.2", self.0.abs()))
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Amount(f64::deserialize(deserializer)?))
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Amount(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        assert_eq!(Amount::from_str("50.25").unwrap().value(), 50.25);
    }

    #[test]
    fn test_parse_with_dollar_sign() {
        assert_eq!(Amount::from_str("$50.00").unwrap().value(), 50.0);
    }

    #[test]
    fn test_parse_negative_with_dollar_sign() {
        assert_eq!(Amount::from_str("-$50.00").unwrap().value(), -50.0);
    }

    #[test]
    fn test_parse_with_commas() {
        assert_eq!(Amount::from_str("$1,234,567.89").unwrap().value(), 1234567.89);
    }

    #[test]
    fn test_parse_empty_and_whitespace() {
        assert_eq!(Amount::from_str("").unwrap(), Amount::ZERO);
        assert_eq!(Amount::from_str("   ").unwrap(), Amount::ZERO);
        assert_eq!(Amount::from_str("  $50.00  ").unwrap().value(), 50.0);
    }

    #[test]
    fn test_parse_garbage_is_an_error() {
        assert!(Amount::from_str("abc").is_err());
        assert!(Amount::from_str("12abc").is_err());
        assert!(Amount::from_str("NaN").is_err());
        assert!(Amount::from_str("inf").is_err());
    }

    #[test]
    fn test_parse_lenient_coerces_to_zero() {
        assert_eq!(Amount::parse_lenient("abc"), Amount::ZERO);
        assert_eq!(Amount::parse_lenient("$12.5"), Amount::new(12.5));
    }

    #[test]
    fn test_approx_eq() {
        assert!(Amount::new(100.0).approx_eq(&Amount::new(100.005)));
        assert!(Amount::new(100.005).approx_eq(&Amount::new(100.0)));
        assert!(!Amount::new(100.0).approx_eq(&Amount::new(100.02)));
    }

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Amount::new(100.0).to_string(), "100.00");
        assert_eq!(Amount::new(-7.5).to_string(), "-7.50");
    }

    #[test]
    fn test_display_survives_text_round_trip() {
        let original = Amount::new(100.005);
        let parsed = Amount::from_str(&original.to_string()).unwrap();
        assert!(original.approx_eq(&parsed));
    }

    #[test]
    fn test_to_currency() {
        assert_eq!(Amount::new(1234.5).to_currency(), "$1,234.50");
        assert_eq!(Amount::new(-20.0).to_currency(), "-$20.00");
        assert_eq!(Amount::ZERO.to_currency(), "$0.00");
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&Amount::new(12.5)).unwrap();
        assert_eq!(json, "12.5");
        let amount: Amount = serde_json::from_str("12.5").unwrap();
        assert_eq!(amount.value(), 12.5);
    }
}
