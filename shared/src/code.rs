//! Order code formatting
//!
//! Order codes are human-readable identifiers customers put in the
//! bank-transfer remark, e.g. `SC-0000042`. They come from a
//! persisted sequence counter and are never reused, even after an
//! order is deleted. Customer codes use the same counter mechanism
//! but are bare decimal strings.

/// Prefix for order codes
pub const ORDER_CODE_PREFIX: &str = "SC-";

/// Digits in the zero-padded sequence part
const ORDER_CODE_DIGITS: usize = 7;

/// Format a sequence number as an order code (`SC-0000001`)
pub fn format_order_code(seq: u64) -> String {
    format!("{}{:07}", ORDER_CODE_PREFIX, seq)
}

/// Parse an order code back into its sequence number.
///
/// Accepts only the canonical `SC-` + 7 digits form.
pub fn parse_order_code(code: &str) -> Option<u64> {
    let digits = code.strip_prefix(ORDER_CODE_PREFIX)?;
    if digits.len() != ORDER_CODE_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Whether a stored customer code is a valid bare decimal string
pub fn is_customer_code(code: &str) -> bool {
    !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_zero_padded() {
        assert_eq!(format_order_code(1), "SC-0000001");
        assert_eq!(format_order_code(1234567), "SC-1234567");
        assert_eq!(format_order_code(12345678), "SC-12345678");
    }

    #[test]
    fn parses_canonical_codes_only() {
        assert_eq!(parse_order_code("SC-0000042"), Some(42));
        assert_eq!(parse_order_code("SC-42"), None);
        assert_eq!(parse_order_code("XX-0000042"), None);
        assert_eq!(parse_order_code("SC-00000a2"), None);
        assert_eq!(parse_order_code(""), None);
    }

    #[test]
    fn roundtrips() {
        for seq in [1u64, 99, 1000, 9999999] {
            assert_eq!(parse_order_code(&format_order_code(seq)), Some(seq));
        }
    }

    #[test]
    fn customer_codes_are_bare_digits() {
        assert!(is_customer_code("7"));
        assert!(is_customer_code("00123"));
        assert!(!is_customer_code(""));
        assert!(!is_customer_code("SC-1"));
    }
}
