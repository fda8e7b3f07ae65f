//! Zero-default numeric coercion for noisy feed fields
//!
//! Feed values arrive as "$1,234", "1 in 3.52", "-", "" and worse. Nothing here
//! ever fails: anything that does not yield a number yields zero, which the
//! rest of the pipeline reads as "unknown".

use regex::Regex;
use std::sync::LazyLock;

static DECIMAL_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\d.]+").expect("valid decimal run regex"));

/// Keep only the ASCII digits of `s` and parse them.
///
/// Commas are dropped before anything else so "1,234" reads as 1234. Decimal
/// points are not currency-aware: "$5.00" yields 500. Values too large for a
/// `u64` yield 0.
pub fn coerce_int(s: &str) -> u64 {
    let digits: String = s
        .replace(',', "")
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return 0;
    }
    digits.parse().unwrap_or(0)
}

/// Parse the first run of digits and dots in `s` as a float.
///
/// Commas must go first, otherwise "1,234.5" would stop at "1".
pub fn coerce_float(s: &str) -> f64 {
    let cleaned = s.replace(',', "");
    DECIMAL_RUN_RE
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Returns true when `s` is non-empty and made only of ASCII digits
pub fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_int_strips_noise() {
        assert_eq!(coerce_int(""), 0);
        assert_eq!(coerce_int("   "), 0);
        assert_eq!(coerce_int("1,234"), 1234);
        assert_eq!(coerce_int("$1,234"), 1234);
        assert_eq!(coerce_int("$5"), 5);
        assert_eq!(coerce_int(" 42 "), 42);
        assert_eq!(coerce_int("-"), 0);
        assert_eq!(coerce_int("N/A"), 0);
    }

    #[test]
    fn test_coerce_int_is_not_currency_aware() {
        assert_eq!(coerce_int("$5.00"), 500);
    }

    #[test]
    fn test_coerce_int_overflow_defaults_to_zero() {
        assert_eq!(coerce_int("99999999999999999999999"), 0);
    }

    #[test]
    fn test_coerce_int_is_idempotent() {
        for input in ["$1,234", "abc", "7 in 10", "0012"] {
            let once = coerce_int(input);
            assert_eq!(coerce_int(&once.to_string()), once);
        }
    }

    #[test]
    fn test_coerce_float() {
        assert_eq!(coerce_float(""), 0.0);
        assert_eq!(coerce_float("3.52"), 3.52);
        assert_eq!(coerce_float("1 in 4.12"), 1.0);
        assert_eq!(coerce_float("1,234.5"), 1234.5);
        assert_eq!(coerce_float("."), 0.0);
        assert_eq!(coerce_float("1.2.3"), 0.0);
        assert_eq!(coerce_float("odds unknown"), 0.0);
    }

    #[test]
    fn test_is_all_digits() {
        assert!(is_all_digits("1401"));
        assert!(!is_all_digits(""));
        assert!(!is_all_digits("14a1"));
        assert!(!is_all_digits(" 1401"));
        assert!(!is_all_digits("Game Number"));
    }
}
