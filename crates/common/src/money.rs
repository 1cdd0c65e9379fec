//! Monetary value objects.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when parsing money values from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("invalid amount '{0}'")]
    InvalidAmount(String),

    #[error("amount '{0}' has more than two decimal places")]
    TooPrecise(String),

    #[error("invalid currency code '{0}'")]
    InvalidCurrency(String),
}

/// Money amount represented in minor units (e.g. halalas, cents) to avoid
/// floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in minor units (e.g., 12000 = 120.00)
    minor: i64,
}

impl Money {
    /// Creates a new Money amount from minor units.
    pub fn from_minor(minor: i64) -> Self {
        Self { minor }
    }

    /// Creates a new Money amount from a whole number of major units.
    pub fn from_major(major: i64) -> Self {
        Self { minor: major * 100 }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { minor: 0 }
    }

    /// Returns the amount in minor units.
    pub fn minor(&self) -> i64 {
        self.minor
    }

    /// Returns the whole-number major portion.
    pub fn major(&self) -> i64 {
        self.minor / 100
    }

    /// Returns the minor portion (remainder after major units).
    pub fn minor_part(&self) -> i64 {
        self.minor.abs() % 100
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.minor > 0
    }

    /// Formats the amount as a fixed two-decimal string, e.g. `"120.00"`.
    ///
    /// This is the representation the payment backend expects in request
    /// bodies.
    pub fn to_amount_string(&self) -> String {
        let sign = if self.minor < 0 { "-" } else { "" };
        format!("{sign}{}.{:02}", self.major().abs(), self.minor_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_amount_string())
    }
}

impl std::str::FromStr for Money {
    type Err = MoneyError;

    /// Parses `"120"`, `"120.5"` or `"120.50"` into minor units.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (major, fraction) = match digits.split_once('.') {
            Some((major, fraction)) => (major, fraction),
            None => (digits, ""),
        };

        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if major.is_empty() || !all_digits(major) || !all_digits(fraction) {
            return Err(MoneyError::InvalidAmount(s.to_string()));
        }
        if fraction.len() > 2 {
            return Err(MoneyError::TooPrecise(s.to_string()));
        }

        let major: i64 = major
            .parse()
            .map_err(|_| MoneyError::InvalidAmount(s.to_string()))?;
        let fraction_value: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().unwrap_or(0) * 10,
            _ => fraction.parse::<i64>().unwrap_or(0),
        };

        let minor = major
            .checked_mul(100)
            .and_then(|m| m.checked_add(fraction_value))
            .ok_or_else(|| MoneyError::InvalidAmount(s.to_string()))?;

        Ok(Self {
            minor: if negative { -minor } else { minor },
        })
    }
}

/// ISO 4217 currency code, stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Creates a currency from a three-letter code (case-insensitive).
    pub fn new(code: impl AsRef<str>) -> Result<Self, MoneyError> {
        let code = code.as_ref().trim();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code.to_ascii_uppercase()))
        } else {
            Err(MoneyError::InvalidCurrency(code.to_string()))
        }
    }

    /// Returns the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Currency {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_string_has_two_decimals() {
        assert_eq!(Money::from_minor(12000).to_amount_string(), "120.00");
        assert_eq!(Money::from_minor(5).to_amount_string(), "0.05");
        assert_eq!(Money::from_minor(1999).to_amount_string(), "19.99");
        assert_eq!(Money::from_minor(-250).to_amount_string(), "-2.50");
        assert_eq!(Money::zero().to_amount_string(), "0.00");
    }

    #[test]
    fn test_parse_amounts() {
        assert_eq!("120".parse::<Money>().unwrap(), Money::from_major(120));
        assert_eq!("120.5".parse::<Money>().unwrap(), Money::from_minor(12050));
        assert_eq!("120.05".parse::<Money>().unwrap(), Money::from_minor(12005));
        assert_eq!("-1.25".parse::<Money>().unwrap(), Money::from_minor(-125));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            "12a".parse::<Money>(),
            Err(MoneyError::InvalidAmount(_))
        ));
        assert!(matches!(
            ".50".parse::<Money>(),
            Err(MoneyError::InvalidAmount(_))
        ));
        assert!(matches!(
            "1.234".parse::<Money>(),
            Err(MoneyError::TooPrecise(_))
        ));
    }

    #[test]
    fn test_currency_normalizes_case() {
        assert_eq!(Currency::new("sar").unwrap().code(), "SAR");
        assert!(Currency::new("SA").is_err());
        assert!(Currency::new("S4R").is_err());
    }

    #[test]
    fn test_currency_serde_validates() {
        let c: Currency = serde_json::from_str("\"usd\"").unwrap();
        assert_eq!(c.code(), "USD");
        assert!(serde_json::from_str::<Currency>("\"dollars\"").is_err());
    }
}
