//! Monetary amounts.
//!
//! `Money` stores an amount as a signed count of cents (smallest currency
//! unit) in a single implied currency. Its textual form is always `$`
//! followed by the amount with exactly two decimal digits.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value_object::ValueObject;

/// Failure to parse a decimal numeral into [`Money`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyParseError {
    #[error("empty amount")]
    Empty,

    #[error("not a decimal amount: {0:?}")]
    Invalid(String),

    #[error("amount out of range: {0:?}")]
    Overflow(String),
}

/// Scalar monetary amount, in cents.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    cents: i64,
}

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money { cents: 0 };

    pub const fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    pub const fn cents(&self) -> i64 {
        self.cents
    }

    pub const fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Parse a plain decimal numeral (`"5"`, `"49.99"`, `".5"`, `"-3.2"`).
    ///
    /// Digits past the second fraction digit are rounded half-up on the
    /// magnitude, so `"0.125"` is 13 cents and `"-0.125"` is -13 cents.
    /// Exponents, whitespace, and non-finite spellings are rejected.
    pub fn parse(text: &str) -> Result<Self, MoneyParseError> {
        if text.is_empty() {
            return Err(MoneyParseError::Empty);
        }

        let invalid = || MoneyParseError::Invalid(text.to_string());
        let overflow = || MoneyParseError::Overflow(text.to_string());

        let (negative, unsigned) = match text.as_bytes()[0] {
            b'-' => (true, &text[1..]),
            b'+' => (false, &text[1..]),
            _ => (false, text),
        };

        let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let mut units: i64 = 0;
        for b in whole.bytes() {
            units = units
                .checked_mul(10)
                .and_then(|v| v.checked_add(i64::from(b - b'0')))
                .ok_or_else(overflow)?;
        }

        let digit = |idx: usize| fraction.as_bytes().get(idx).map(|b| i64::from(b - b'0')).unwrap_or(0);
        let mut cents = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(digit(0) * 10 + digit(1)))
            .ok_or_else(overflow)?;

        if digit(2) >= 5 {
            cents = cents.checked_add(1).ok_or_else(overflow)?;
        }

        Ok(Self::from_cents(if negative { -cents } else { cents }))
    }

    /// Canonical text form, e.g. `$5.00`.
    pub fn format(&self) -> String {
        self.to_string()
    }

    /// The amount with two decimals and no currency sign, e.g. `4.25`.
    pub fn amount(&self) -> Amount {
        Amount(*self)
    }
}

/// Bare two-decimal rendering of a [`Money`], see [`Money::amount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amount(Money);

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0.is_negative() { "-" } else { "" };
        let abs = self.0.cents.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = MoneyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.amount())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn whole_number_formats_with_two_decimals() {
        assert_eq!(Money::parse("5").unwrap().format(), "$5.00");
        assert_eq!(Money::parse("50").unwrap().to_string(), "$50.00");
    }

    #[test]
    fn fractions_are_padded_and_rounded() {
        assert_eq!(Money::parse("5.5").unwrap().to_string(), "$5.50");
        assert_eq!(Money::parse(".5").unwrap().to_string(), "$0.50");
        assert_eq!(Money::parse("5.").unwrap().to_string(), "$5.00");
        assert_eq!(Money::parse("0.125").unwrap().to_string(), "$0.13");
        assert_eq!(Money::parse("0.124999").unwrap().to_string(), "$0.12");
        assert_eq!(Money::parse("49.995").unwrap().to_string(), "$50.00");
    }

    #[test]
    fn negative_amounts_parse_and_keep_sign() {
        let m = Money::parse("-0.125").unwrap();
        assert!(m.is_negative());
        assert_eq!(m.cents(), -13);
        assert_eq!(m.to_string(), "$-0.13");
        assert_eq!(Money::parse("+2").unwrap().cents(), 200);
    }

    #[test]
    fn amount_has_no_currency_sign() {
        assert_eq!(Money::from_cents(425).amount().to_string(), "4.25");
        assert_eq!(Money::from_cents(-500).amount().to_string(), "-5.00");
        assert_eq!(Money::ZERO.amount().to_string(), "0.00");
    }

    #[test]
    fn rejects_non_numerals() {
        assert_eq!(Money::parse(""), Err(MoneyParseError::Empty));
        for bad in ["abc", "-", "+", ".", "1.2.3", "1e3", " 5", "5 ", "inf", "NaN", "--1", "1,5"] {
            assert!(
                matches!(Money::parse(bad), Err(MoneyParseError::Invalid(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(matches!(
            Money::parse("999999999999999999999"),
            Err(MoneyParseError::Overflow(_))
        ));
    }

    #[test]
    fn serializes_as_cents() {
        let json = serde_json::to_string(&Money::from_cents(5000)).unwrap();
        assert_eq!(json, "5000");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Money::from_cents(5000));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Property: the canonical form is `$`, digits, a dot, and exactly two digits.
        #[test]
        fn canonical_form_has_two_decimals(cents in 0i64..1_000_000_000_000) {
            let text = Money::from_cents(cents).to_string();
            let body = text.strip_prefix('$').unwrap();
            let (whole, frac) = body.split_once('.').unwrap();
            prop_assert!(!whole.is_empty());
            prop_assert!(whole.bytes().all(|b| b.is_ascii_digit()));
            prop_assert_eq!(frac.len(), 2);
        }

        /// Property: the numeric part of the canonical form parses back to the same amount.
        #[test]
        fn canonical_form_parses_back(cents in -1_000_000_000_000i64..1_000_000_000_000) {
            let m = Money::from_cents(cents);
            let text = m.to_string();
            let numeral = text.replacen('$', "", 1);
            prop_assert_eq!(Money::parse(&numeral).unwrap(), m);
        }
    }
}
