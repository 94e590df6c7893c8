//! Exact decimal text for rationals.
//!
//! Configuration and reports carry numbers as strings (`"2400000"`, `"0.5"`,
//! `"1/3"`) so that no value ever passes through `f64`.

use num::bigint::BigInt;
use num::rational::BigRational;
use num::traits::{One, Signed, Zero};

use crate::error::ModelError;

/// Parse `"123"`, `"-0.25"`, `"2_400_000"` or `"1/3"` into an exact rational.
pub fn parse_decimal(text: &str) -> Result<BigRational, ModelError> {
    let invalid = || ModelError::InvalidDecimal(text.to_string());
    let cleaned: String = text.trim().chars().filter(|c| *c != '_').collect();
    if let Some((numer, denom)) = cleaned.split_once('/') {
        let numer = parse_plain(numer.trim()).ok_or_else(invalid)?;
        let denom = parse_plain(denom.trim()).ok_or_else(invalid)?;
        if denom.is_zero() {
            return Err(invalid());
        }
        return Ok(numer / denom);
    }
    parse_plain(&cleaned).ok_or_else(invalid)
}

fn parse_plain(text: &str) -> Option<BigRational> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    let digits = format!("{int_part}{frac_part}");
    let numer: BigInt = digits.parse().ok()?;
    let value = BigRational::new(numer, num::pow(BigInt::from(10), frac_part.len()));
    Some(if negative { -value } else { value })
}

/// Render a rational as a terminating decimal when one exists, else `n/d`.
pub fn format_decimal(value: &BigRational) -> String {
    let denom = value.denom().clone();
    let two = BigInt::from(2);
    let five = BigInt::from(5);
    let mut rest = denom.clone();
    let (mut twos, mut fives) = (0usize, 0usize);
    while (&rest % &two).is_zero() {
        rest /= &two;
        twos += 1;
    }
    while (&rest % &five).is_zero() {
        rest /= &five;
        fives += 1;
    }
    if !rest.is_one() {
        return format!("{}/{}", value.numer(), denom);
    }

    let places = twos.max(fives);
    let scaled = value.numer() * num::pow(BigInt::from(10), places) / &denom;
    if places == 0 {
        return scaled.to_string();
    }
    let digits = scaled.abs().to_string();
    let padded = format!("{digits:0>width$}", width = places + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - places);
    let sign = if value.is_negative() { "-" } else { "" };
    format!("{sign}{int_part}.{frac_part}")
}

/// `#[serde(with = "...")]` adapter storing a `BigRational` as decimal text.
pub mod serde_decimal {
    use num::rational::BigRational;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigRational, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_decimal(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigRational, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_decimal(&text).map_err(serde::de::Error::custom)
    }
}

/// Like [`serde_decimal`] for optional values.
pub mod serde_decimal_opt {
    use num::rational::BigRational;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<BigRational>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_some(&super::format_decimal(v)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<BigRational>, D::Error> {
        let text = Option::<String>::deserialize(deserializer)?;
        text.map(|t| super::parse_decimal(&t).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn q(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    #[test]
    fn parses_integers_decimals_and_fractions() {
        assert_eq!(parse_decimal("2400000").unwrap(), q(2_400_000, 1));
        assert_eq!(parse_decimal("2_400_000").unwrap(), q(2_400_000, 1));
        assert_eq!(parse_decimal("0.5").unwrap(), q(1, 2));
        assert_eq!(parse_decimal(".25").unwrap(), q(1, 4));
        assert_eq!(parse_decimal("-12.50").unwrap(), q(-25, 2));
        assert_eq!(parse_decimal(" 1/3 ").unwrap(), q(1, 3));
        assert_eq!(parse_decimal("-2/4").unwrap(), q(-1, 2));
    }

    #[test]
    fn rejects_non_numbers() {
        for bad in ["", "-", ".", "abc", "1.2.3", "1e3", "1/0", "0.1?", "NaN"] {
            assert!(
                matches!(parse_decimal(bad), Err(ModelError::InvalidDecimal(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn formats_terminating_and_repeating_values() {
        assert_eq!(format_decimal(&q(9_588_000_000, 1)), "9588000000");
        assert_eq!(format_decimal(&q(1, 2)), "0.5");
        assert_eq!(format_decimal(&q(-3, 20)), "-0.15");
        assert_eq!(format_decimal(&q(1, 1000)), "0.001");
        assert_eq!(format_decimal(&q(1, 3)), "1/3");
        assert_eq!(format_decimal(&q(-7, 6)), "-7/6");
    }

    proptest! {
        #[test]
        fn format_then_parse_is_identity(n in -1_000_000i64..1_000_000, d in 1i64..5_000) {
            let value = q(n, d);
            prop_assert_eq!(parse_decimal(&format_decimal(&value)).unwrap(), value);
        }
    }
}
