//! Fee calculation
//!
//! Pure, deterministic fee policy. Rates are exact decimals:
//!
//! | Operation                 | Rate  |
//! |---------------------------|-------|
//! | top-up, bank transfer     | 0.1%  |
//! | top-up, card              | 2.9%  |
//! | top-up, digital wallet    | 1.5%  |
//! | wallet-to-wallet transfer | 0.5%  |
//!
//! The exact product is rounded to the currency's minor unit (midpoint away
//! from zero), so the amount reported is the amount debited.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::{self, Currency};

/// Bank transfer top-up rate (0.1%)
pub const BANK_TRANSFER_RATE: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

/// Card top-up rate (2.9%)
pub const CARD_RATE: Decimal = Decimal::from_parts(29, 0, 0, false, 3);

/// Digital wallet top-up rate (1.5%)
pub const DIGITAL_WALLET_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 3);

/// Transfer rate (0.5%), charged to the sender on top of the amount
pub const TRANSFER_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 3);

/// Top-up funding source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    Card,
    DigitalWallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Card => "card",
            PaymentMethod::DigitalWallet => "digital_wallet",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            "card" => Ok(PaymentMethod::Card),
            "digital_wallet" => Ok(PaymentMethod::DigitalWallet),
            _ => Err(()),
        }
    }
}

/// Fee-bearing operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeOperation {
    TopUp(PaymentMethod),
    Transfer,
}

/// Get the rate for an operation
#[inline]
pub fn fee_rate(operation: FeeOperation) -> Decimal {
    match operation {
        FeeOperation::TopUp(PaymentMethod::BankTransfer) => BANK_TRANSFER_RATE,
        FeeOperation::TopUp(PaymentMethod::Card) => CARD_RATE,
        FeeOperation::TopUp(PaymentMethod::DigitalWallet) => DIGITAL_WALLET_RATE,
        FeeOperation::Transfer => TRANSFER_RATE,
    }
}

/// Calculate the fee for an operation on `amount` in `currency`.
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use wallet_ledger::fee::{FeeOperation, PaymentMethod, calculate_fee};
/// use wallet_ledger::money::Currency;
///
/// let fee = calculate_fee(
///     FeeOperation::TopUp(PaymentMethod::BankTransfer),
///     Decimal::from(5000),
///     Currency::Thb,
/// );
/// assert_eq!(fee, Decimal::from(5));
/// ```
#[inline]
pub fn calculate_fee(operation: FeeOperation, amount: Decimal, currency: Currency) -> Decimal {
    money::round_to_currency(amount * fee_rate(operation), currency)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates_are_exact() {
        assert_eq!(BANK_TRANSFER_RATE.to_string(), "0.001");
        assert_eq!(CARD_RATE.to_string(), "0.029");
        assert_eq!(DIGITAL_WALLET_RATE.to_string(), "0.015");
        assert_eq!(TRANSFER_RATE.to_string(), "0.005");
    }

    #[test]
    fn test_calculate_fee_topup() {
        let amount = Decimal::from(5000);
        assert_eq!(
            calculate_fee(FeeOperation::TopUp(PaymentMethod::BankTransfer), amount, Currency::Thb),
            Decimal::from(5)
        );
        assert_eq!(
            calculate_fee(FeeOperation::TopUp(PaymentMethod::Card), amount, Currency::Thb),
            Decimal::from(145)
        );
        assert_eq!(
            calculate_fee(FeeOperation::TopUp(PaymentMethod::DigitalWallet), amount, Currency::Thb),
            Decimal::from(75)
        );
    }

    #[test]
    fn test_calculate_fee_transfer() {
        assert_eq!(
            calculate_fee(FeeOperation::Transfer, Decimal::from(1000), Currency::Thb),
            Decimal::from(5)
        );
    }

    #[test]
    fn test_fee_rounds_to_minor_unit() {
        // 0.5% of 0.01 = 0.00005 -> 0.00
        assert_eq!(
            calculate_fee(FeeOperation::Transfer, Decimal::new(1, 2), Currency::Usd),
            Decimal::ZERO
        );
        // 2.9% of 100.01 = 2.90029 -> 2.90
        assert_eq!(
            calculate_fee(
                FeeOperation::TopUp(PaymentMethod::Card),
                Decimal::new(10001, 2),
                Currency::Usd
            ),
            Decimal::new(290, 2)
        );
        // 0.5% of 100 JPY = 0.5 -> 1
        assert_eq!(
            calculate_fee(FeeOperation::Transfer, Decimal::from(100), Currency::Jpy),
            Decimal::ONE
        );
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!("card".parse::<PaymentMethod>(), Ok(PaymentMethod::Card));
        assert_eq!(
            "bank_transfer".parse::<PaymentMethod>(),
            Ok(PaymentMethod::BankTransfer)
        );
        assert!("crypto".parse::<PaymentMethod>().is_err());
    }
}
