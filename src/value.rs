//! # Literal Values
//!
//! This module defines [`U256`], the 256-bit unsigned integer type used for
//! every `StateConfig` constant, and the handful of free functions that turn
//! source-text literals into one.
//!
//! ## Supported literal forms
//! - Decimal: `123`
//! - Hex: `0x7b` / `0X7B`
//! - `MaxUint256` / `Infinity` — both intern the canonical all-ones 32-byte
//!   value.
//!
//! `_` (the configurable placeholder) and `arg(n)` are not literals in the
//! numeric sense — they are handled directly in [`crate::ast`] /
//! [`crate::codegen`] since they never produce a constant-pool entry of
//! their own (the placeholder never emits anything, `arg(n)` emits a
//! sentinel instruction that is rewritten in a later pass).

/// 256-bit unsigned integer, the type of every `StateConfig` constant.
pub type U256 = ruint::Uint<256, 4>;

/// The canonical value of the `MaxUint256`/`Infinity` sentinel: 32 bytes of
/// `0xff`.
pub fn max_uint256() -> U256 {
    U256::MAX
}

/// Names that resolve to [`max_uint256`] rather than being parsed as a
/// numeral.
pub fn is_max_uint_keyword(word: &str) -> bool {
    matches!(word, "MaxUint256" | "Infinity")
}

/// Parse a decimal or `0x`-prefixed hex integer literal into a [`U256`].
///
/// Returns `None` if `text` is not a valid literal in either radix — the
/// caller turns that into an in-tree diagnostic rather than panicking.
pub fn parse_integer_literal(text: &str) -> Option<U256> {
    if let Some(digits) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        U256::from_str_radix(digits, 16).ok()
    } else {
        U256::from_str_radix(text, 10).ok()
    }
}

/// Big-endian 32-byte encoding of a constant, as laid out in the
/// `StateConfig` wire format.
pub fn to_be_bytes(value: &U256) -> [u8; 32] {
    value.to_be_bytes()
}

/// Inverse of [`to_be_bytes`].
pub fn from_be_bytes(bytes: [u8; 32]) -> U256 {
    U256::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal() {
        assert_eq!(parse_integer_literal("42"), Some(U256::from(42u64)));
    }

    #[test]
    fn parses_hex() {
        assert_eq!(parse_integer_literal("0xff"), Some(U256::from(255u64)));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_integer_literal("0xzz"), None);
        assert_eq!(parse_integer_literal("12a"), None);
    }

    #[test]
    fn max_uint_is_all_ones() {
        assert_eq!(max_uint256(), U256::MAX);
        assert_eq!(to_be_bytes(&max_uint256()), [0xffu8; 32]);
    }

    #[test]
    fn be_bytes_roundtrip() {
        let value = U256::from(0xdead_beefu64);
        assert_eq!(from_be_bytes(to_be_bytes(&value)), value);
    }
}
