use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, NaiveDate};

// Decimal inputs outside this window are rejected before any arithmetic;
// bigdecimal rescaling is neither overflow-checked nor cheap at large exponents.
const MAX_EXPONENT: i64 = 32;
const MAX_DIGIT_BITS: u64 = 128;

/// Rounds half away from zero to two decimal places and pins the scale, so
/// `150` and `150.004` both render as `150.00`.
pub fn round_currency(value: &BigDecimal) -> BigDecimal {
    value.round(2).with_scale(2)
}

/// Rejects decimals whose exponent or digit count is too large to round or
/// compare safely. `what` names the field in the error message.
pub fn check_range(value: &BigDecimal, what: &str) -> Result<(), String> {
    let (digits, exponent) = value.as_bigint_and_exponent();
    if !(-MAX_EXPONENT..=MAX_EXPONENT).contains(&exponent) || digits.bits() > MAX_DIGIT_BITS {
        return Err(format!("{} is out of range", what));
    }
    Ok(())
}

pub fn is_positive(value: &BigDecimal) -> bool {
    value > &BigDecimal::zero()
}

/// Accepts a plain `YYYY-MM-DD` date or a full RFC 3339 timestamp.
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
        .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_round_currency() {
        let cases = [
            ("150", "150.00"),
            ("12.345", "12.35"),
            ("12.344", "12.34"),
            ("-7.125", "-7.13"),
            ("0.1", "0.10"),
        ];
        for (input, expected) in cases {
            let rounded = round_currency(&BigDecimal::from_str(input).unwrap());
            assert_eq!(rounded.to_string(), expected, "rounding {}", input);
        }
    }

    #[test]
    fn test_check_range() {
        for ok in ["150", "0.01", "-7.125", "123456789012345678901234567890.12", "1e20"] {
            assert!(check_range(&BigDecimal::from_str(ok).unwrap(), "Amount").is_ok(), "{}", ok);
        }
        for bad in [
            "1e9223372036854775807",
            "1e-9223372036854775807",
            "1e40",
            "1e-40",
            "340282366920938463463374607431768211457",
        ] {
            assert_eq!(
                check_range(&BigDecimal::from_str(bad).unwrap(), "Amount"),
                Err("Amount is out of range".to_string()),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_parse_date() {
        let expected = NaiveDate::from_ymd_opt(2022, 11, 21).unwrap();
        assert_eq!(parse_date("2022-11-21"), Ok(expected));
        assert_eq!(parse_date("2022-11-21T12:00:00.000Z"), Ok(expected));
        assert!(parse_date("21/11/2022").is_err());
    }
}
