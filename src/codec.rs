//! Hex Numeric Codec
//!
//! Converts the ledger's `0x`-prefixed hexadecimal quantities into native
//! integers and decimal strings.
//!
//! The scanning path runs over untrusted RPC data, so the tolerant helpers
//! ([`parse_int`], [`to_decimal_string`]) never fail: a malformed field
//! degrades to `0` instead of aborting a whole block. [`decode_leading_byte`]
//! is the strict variant for callers that need to tell errors apart.

use num_bigint::BigUint;
use thiserror::Error;

/// Maximum number of hex digits kept by [`to_decimal_string`] (256 bits).
pub const MAX_VALUE_HEX_DIGITS: usize = 64;

#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    #[error("empty hex string")]
    Empty,

    #[error("invalid hex string: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Strip an optional `0x` / `0X` prefix
fn strip_prefix(hex_str: &str) -> &str {
    hex_str
        .strip_prefix("0x")
        .or_else(|| hex_str.strip_prefix("0X"))
        .unwrap_or(hex_str)
}

/// Parse a hex quantity into `u64`.
///
/// Returns `0` for empty, malformed or overflowing input.
pub fn parse_int(hex_str: &str) -> u64 {
    u64::from_str_radix(strip_prefix(hex_str), 16).unwrap_or(0)
}

/// Decode a hex string and return its first byte.
///
/// Odd-length input is left-padded with a zero nibble, so `"0xf"` decodes to
/// `0x0f`.
pub fn decode_leading_byte(hex_str: &str) -> Result<u8, CodecError> {
    let trimmed = strip_prefix(hex_str);
    if trimmed.is_empty() {
        return Err(CodecError::Empty);
    }

    let bytes = if trimmed.len() % 2 == 1 {
        hex::decode(format!("0{}", trimmed))?
    } else {
        hex::decode(trimmed)?
    };

    Ok(bytes.first().copied().unwrap_or(0))
}

/// Convert a hex quantity of any size into its decimal representation.
///
/// Values wider than 256 bits keep only their least-significant 64 digits.
/// Empty or unparsable input yields `"0"`.
pub fn to_decimal_string(hex_str: &str) -> String {
    let digits = strip_prefix(hex_str);
    if digits.is_empty() {
        return "0".to_string();
    }

    let start = digits.len().saturating_sub(MAX_VALUE_HEX_DIGITS);
    let Some(digits) = digits.get(start..) else {
        // cut landed inside a multi-byte char, can't be hex anyway
        return "0".to_string();
    };

    // BigUint tolerates '_' and '+', the wire format does not
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return "0".to_string();
    }

    BigUint::parse_bytes(digits.as_bytes(), 16)
        .map(|value| value.to_str_radix(10))
        .unwrap_or_else(|| "0".to_string())
}

/// Encode a block number for the wire: `0x` + lowercase hex, no leading zeros.
pub fn encode_block_number(number: u64) -> String {
    format!("0x{:x}", number)
}
