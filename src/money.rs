//! Money Module
//!
//! Supported currencies and the single place where client amounts are
//! validated and formatted. All amounts are `rust_decimal::Decimal`; binary
//! floating point never touches a balance.
//!
//! ## Design Principles
//! 1. Explicit Error Handling: no silent truncation of extra precision
//! 2. Currency owns its minor-unit scale (THB = 2, JPY = 0)
//! 3. Client-facing amounts are strings, formatted to the currency scale

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Money validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Precision overflow: provided {provided} decimals, max allowed {max}")]
    PrecisionOverflow { provided: u32, max: u32 },

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),
}

// ============================================================================
// Currency
// ============================================================================

/// Supported wallet currencies (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Currency {
    Thb,
    Usd,
    Eur,
    Gbp,
    Sgd,
    Myr,
    Idr,
    Vnd,
    Php,
    Jpy,
}

impl Currency {
    pub const ALL: [Currency; 10] = [
        Currency::Thb,
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Sgd,
        Currency::Myr,
        Currency::Idr,
        Currency::Vnd,
        Currency::Php,
        Currency::Jpy,
    ];

    /// ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Thb => "THB",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Sgd => "SGD",
            Currency::Myr => "MYR",
            Currency::Idr => "IDR",
            Currency::Vnd => "VND",
            Currency::Php => "PHP",
            Currency::Jpy => "JPY",
        }
    }

    /// Minor-unit scale
    pub fn decimals(&self) -> u32 {
        match self {
            Currency::Jpy | Currency::Idr | Currency::Vnd => 0,
            _ => 2,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Currency::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or_else(|| MoneyError::UnsupportedCurrency(s.to_string()))
    }
}

impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Validate: Client → Internal
// ============================================================================

/// Validate a client amount against a currency.
///
/// # Errors
/// * `InvalidAmount` - zero or negative
/// * `PrecisionOverflow` - more decimal places than the currency allows
pub fn validate_amount(amount: Decimal, currency: Currency) -> Result<Decimal, MoneyError> {
    if amount <= Decimal::ZERO {
        return Err(MoneyError::InvalidAmount);
    }
    let normalized = amount.normalize();
    if normalized.scale() > currency.decimals() {
        return Err(MoneyError::PrecisionOverflow {
            provided: normalized.scale(),
            max: currency.decimals(),
        });
    }
    Ok(normalized)
}

/// Round an exact product (e.g. a fee) to the currency's minor unit.
pub fn round_to_currency(value: Decimal, currency: Currency) -> Decimal {
    value.round_dp_with_strategy(currency.decimals(), RoundingStrategy::MidpointAwayFromZero)
}

// ============================================================================
// Format: Internal → Client
// ============================================================================

/// Format an amount with exactly the currency's decimals.
///
/// ```
/// use rust_decimal::Decimal;
/// use wallet_ledger::money::{Currency, format_amount};
/// assert_eq!(format_amount(Decimal::from(3995), Currency::Thb), "3995.00");
/// assert_eq!(format_amount(Decimal::from(120), Currency::Jpy), "120");
/// ```
pub fn format_amount(value: Decimal, currency: Currency) -> String {
    let mut rounded = round_to_currency(value, currency);
    rounded.rescale(currency.decimals());
    rounded.to_string()
}

/// Deserialize an amount from a JSON number or a JSON string.
///
/// Sign and precision are NOT checked here; the coordinator validates them
/// in its documented precondition order.
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum DecimalOrString {
        String(String),
        Number(Decimal),
    }

    match DecimalOrString::deserialize(deserializer)? {
        DecimalOrString::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Err(D::Error::custom("Amount cannot be empty"));
            }
            Decimal::from_str(s).map_err(|e| D::Error::custom(format!("Invalid decimal: {}", e)))
        }
        DecimalOrString::Number(d) => Ok(d),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_currency_parse() {
        assert_eq!("THB".parse::<Currency>().unwrap(), Currency::Thb);
        assert_eq!(" usd ".parse::<Currency>().unwrap(), Currency::Usd);
        assert!(matches!(
            "XYZ".parse::<Currency>(),
            Err(MoneyError::UnsupportedCurrency(_))
        ));
    }

    #[test]
    fn test_validate_amount() {
        assert_eq!(
            validate_amount(Decimal::new(500000, 2), Currency::Thb).unwrap(),
            Decimal::from(5000)
        );
        assert_eq!(
            validate_amount(Decimal::ZERO, Currency::Thb),
            Err(MoneyError::InvalidAmount)
        );
        assert_eq!(
            validate_amount(Decimal::new(-1, 0), Currency::Thb),
            Err(MoneyError::InvalidAmount)
        );
        assert_eq!(
            validate_amount(Decimal::new(1001, 3), Currency::Thb),
            Err(MoneyError::PrecisionOverflow {
                provided: 3,
                max: 2
            })
        );
        // Trailing zeros are not extra precision
        assert!(validate_amount(Decimal::new(10000, 4), Currency::Jpy).is_ok());
    }

    #[test]
    fn test_round_to_currency() {
        // 2.9% of 100.01 = 2.90029
        assert_eq!(
            round_to_currency(Decimal::new(290029, 5), Currency::Usd),
            Decimal::new(290, 2)
        );
        assert_eq!(
            round_to_currency(Decimal::new(125, 1), Currency::Jpy),
            Decimal::from(13)
        );
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(Decimal::from(5000), Currency::Thb), "5000.00");
        assert_eq!(format_amount(Decimal::new(5, 1), Currency::Usd), "0.50");
        assert_eq!(format_amount(Decimal::from(7), Currency::Vnd), "7");
    }

    #[test]
    fn test_deserialize_amount_number_or_string() {
        #[derive(Deserialize)]
        struct Body {
            #[serde(deserialize_with = "deserialize_amount")]
            amount: Decimal,
        }
        let a: Body = serde_json::from_str(r#"{"amount": 1000}"#).unwrap();
        assert_eq!(a.amount, Decimal::from(1000));
        let b: Body = serde_json::from_str(r#"{"amount": "12.50"}"#).unwrap();
        assert_eq!(b.amount, Decimal::new(1250, 2));
        let c: Body = serde_json::from_str(r#"{"amount": "-3"}"#).unwrap();
        assert_eq!(c.amount, Decimal::from(-3));
        assert!(serde_json::from_str::<Body>(r#"{"amount": ""}"#).is_err());
        assert!(serde_json::from_str::<Body>(r#"{"amount": "abc"}"#).is_err());
    }
}
