use alloy::primitives::U256;

use crate::error::OracleError;

/// Fractional digits of on-chain value amounts (native-token scale).
pub const VALUE_DECIMALS: u8 = 18;
/// Fractional digits of on-chain rarity scores.
pub const SCORE_DECIMALS: u8 = 2;

/// Exact conversion between decimal display strings and the fixed-point
/// unsigned integers the oracle stores.
///
/// Every scaling operation in the SDK goes through this module; nothing
/// else multiplies or divides by powers of ten.
#[derive(Clone, Copy, Debug)]
pub struct Converter {
    decimals: u8,
}

impl Converter {
    pub fn new(decimals: u8) -> Self { Self { decimals } }

    /// Number of fractional digits this converter carries.
    pub fn decimals(&self) -> u8 { self.decimals }

    /// Parses a decimal string into its scaled integer representation.
    ///
    /// Exact: inputs with more fractional digits than the scale are
    /// rejected, never rounded. Signs, whitespace and anything else that is
    /// not `[0-9]` with at most one `.` are rejected too.
    pub fn to_unsigned(&self, value: &str) -> Result<U256, OracleError> {
        let (int_part, frac_part) = match value.split_once('.') {
            Some(parts) => parts,
            None => (value, ""),
        };
        let all_digits = int_part.bytes().all(|b| b.is_ascii_digit())
            && frac_part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits || (int_part.is_empty() && frac_part.is_empty()) {
            return Err(OracleError::Validation(format!("not a decimal number: {value:?}")));
        }
        if frac_part.len() > self.decimals as usize {
            return Err(OracleError::Validation(format!(
                "{value:?} carries more than {} fractional digits",
                self.decimals
            )));
        }

        let int = parse_digits(int_part)?;
        let frac = parse_digits(frac_part)?;
        int.checked_mul(pow10(self.decimals))
            .zip(frac.checked_mul(pow10(self.decimals - frac_part.len() as u8)))
            .and_then(|(int, frac)| int.checked_add(frac))
            .ok_or_else(|| {
                OracleError::Validation(format!("{value:?} exceeds the representable range"))
            })
    }

    /// Renders a scaled integer back to its decimal string.
    ///
    /// The exact inverse of [`Converter::to_unsigned`]: every significant
    /// fractional digit is kept, trailing zeros are trimmed, whole values
    /// render without a point and zero renders as `"0"`.
    pub fn from_unsigned(&self, value: U256) -> String {
        let digits = value.to_string();
        let decimals = self.decimals as usize;
        if decimals == 0 {
            return digits;
        }
        let (int_part, frac_part) = if digits.len() > decimals {
            let split = digits.len() - decimals;
            (digits[..split].to_string(), digits[split..].to_string())
        } else {
            ("0".to_string(), format!("{digits:0>decimals$}"))
        };
        let frac_part = frac_part.trim_end_matches('0');
        if frac_part.is_empty() { int_part } else { format!("{int_part}.{frac_part}") }
    }
}

/// Validated non-negative integer passthrough for token IDs and ranks.
pub fn parse_index(value: &str) -> Result<U256, OracleError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(OracleError::Validation(format!("not a whole number: {value:?}")));
    }
    parse_digits(value)
}

/// Confidence percentage, bounded to `0..=100`.
pub fn parse_confidence(value: &str) -> Result<u8, OracleError> {
    let confidence: u8 = value
        .parse()
        .map_err(|_| OracleError::Validation(format!("not a confidence percentage: {value:?}")))?;
    if confidence > 100 {
        return Err(OracleError::Validation(format!("confidence {confidence} is outside 0..=100")));
    }
    Ok(confidence)
}

fn parse_digits(digits: &str) -> Result<U256, OracleError> {
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 10)
        .map_err(|_| OracleError::Validation(format!("{digits:?} exceeds the representable range")))
}

fn pow10(decimals: u8) -> U256 { U256::from(10u64).pow(U256::from(decimals)) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_value_strings_exactly() {
        let value = Converter::new(VALUE_DECIMALS);
        assert_eq!(
            value.to_unsigned("1.25").unwrap(),
            U256::from(1_250_000_000_000_000_000u128)
        );
        assert_eq!(value.to_unsigned("0").unwrap(), U256::ZERO);
        assert_eq!(value.to_unsigned(".5").unwrap(), U256::from(500_000_000_000_000_000u128));
        assert_eq!(value.to_unsigned("3.").unwrap(), U256::from(3_000_000_000_000_000_000u128));

        let score = Converter::new(SCORE_DECIMALS);
        assert_eq!(score.to_unsigned("85.50").unwrap(), U256::from(8550u64));
        assert_eq!(score.to_unsigned("85.5").unwrap(), U256::from(8550u64));
    }

    #[test]
    fn rejects_malformed_and_out_of_scale_input() {
        let value = Converter::new(VALUE_DECIMALS);
        for bad in ["", ".", "-1", "+1", "1,5", "1.2.3", " 1", "1 ", "1e5", "0x10"] {
            assert!(value.to_unsigned(bad).is_err(), "accepted {bad:?}");
        }
        // 19 fractional digits at an 18-digit scale.
        assert!(value.to_unsigned("0.1234567890123456789").is_err());
        assert!(Converter::new(SCORE_DECIMALS).to_unsigned("85.505").is_err());
    }

    #[test]
    fn renders_back_without_losing_digits() {
        let value = Converter::new(VALUE_DECIMALS);
        assert_eq!(value.from_unsigned(U256::from(1u64)), "0.000000000000000001");
        assert_eq!(value.from_unsigned(U256::ZERO), "0");
        assert_eq!(value.from_unsigned(U256::from(1_250_000_000_000_000_000u128)), "1.25");
        assert_eq!(value.from_unsigned(U256::from(3_000_000_000_000_000_000u128)), "3");

        let score = Converter::new(SCORE_DECIMALS);
        assert_eq!(score.from_unsigned(U256::from(8550u64)), "85.5");
        assert_eq!(score.from_unsigned(U256::from(120_000u64)), "1200");
        assert_eq!(score.from_unsigned(U256::from(7u64)), "0.07");
    }

    #[test]
    fn round_trips_in_scale_strings() {
        let value = Converter::new(VALUE_DECIMALS);
        for s in ["0.000000000000000001", "1.25", "1200", "999999.999999999999999999"] {
            let scaled = value.to_unsigned(s).unwrap();
            assert_eq!(value.from_unsigned(scaled), *s, "round trip of {s:?}");
        }
    }

    #[test]
    fn validates_integer_passthrough() {
        assert_eq!(parse_index("1250").unwrap(), U256::from(1250u64));
        assert!(parse_index("").is_err());
        assert!(parse_index("-3").is_err());
        assert!(parse_index("12.5").is_err());

        assert_eq!(parse_confidence("85").unwrap(), 85);
        assert_eq!(parse_confidence("100").unwrap(), 100);
        assert!(parse_confidence("101").is_err());
        assert!(parse_confidence("-5").is_err());
        assert!(parse_confidence("eighty").is_err());
    }
}
