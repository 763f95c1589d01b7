use alloy_primitives::U256;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("invalid hex input: {0}")]
    MalformedHex(String),
    #[error("invalid ethereum address length: {0}")]
    InvalidAddressLength(usize),
    #[error("value too large for uint256: {0} bytes")]
    ValueTooLarge(usize),
}

fn strip_prefix(hex: &str) -> &str {
    hex.strip_prefix("0x")
        .or_else(|| hex.strip_prefix("0X"))
        .unwrap_or(hex)
}

/// Converts a byte sequence to a lowercase hex string, optionally `0x`-prefixed.
pub fn bytes_to_hex(bytes: &[u8], with_prefix: bool) -> String {
    let encoded = hex::encode(bytes);
    if with_prefix {
        format!("0x{encoded}")
    } else {
        encoded
    }
}

/// Converts a hex string to a byte sequence. Strips a `0x`/`0X` prefix if
/// present; an odd number of digits is left-padded with a single `0` nibble.
pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, CodecError> {
    let stripped = strip_prefix(hex);
    let padded;
    let digits = if stripped.len() % 2 != 0 {
        padded = format!("0{stripped}");
        padded.as_str()
    } else {
        stripped
    };
    hex::decode(digits).map_err(|_| CodecError::MalformedHex(hex.to_string()))
}

/// True iff every character after optional prefix removal is a hex digit.
/// An empty string after stripping counts as valid.
pub fn is_valid_hex(hex: &str) -> bool {
    strip_prefix(hex).bytes().all(|b| b.is_ascii_hexdigit())
}

/// Formats a 20-byte address into its mixed-case display form.
///
/// Both characters of each byte pair take their case from whether the
/// even-indexed character's nibble value is >= 8. No hash is involved, so
/// this is NOT interoperable with keccak-based checksum consumers.
pub fn format_address(address: &str) -> Result<String, CodecError> {
    let addr = strip_prefix(address);
    if addr.len() != 40 {
        return Err(CodecError::InvalidAddressLength(addr.len()));
    }

    let digits = addr.as_bytes();
    let mut formatted = String::with_capacity(42);
    formatted.push_str("0x");
    for (i, &digit) in digits.iter().enumerate() {
        // the pair's leading character decides the casing for both members
        let lead = digits[i & !1] as char;
        let nibble = lead
            .to_digit(16)
            .ok_or_else(|| CodecError::MalformedHex(address.to_string()))?;
        let c = digit as char;
        if nibble >= 8 {
            formatted.push(c.to_ascii_uppercase());
        } else {
            formatted.push(c.to_ascii_lowercase());
        }
    }
    Ok(formatted)
}

/// Encodes a uint256 as 32 big-endian bytes of hex.
pub fn uint256_to_hex(value: U256, with_prefix: bool) -> String {
    bytes_to_hex(&value.to_be_bytes::<32>(), with_prefix)
}

/// Decodes hex into a uint256. Inputs shorter than 32 bytes are
/// zero-left-padded; longer inputs fail.
pub fn hex_to_uint256(hex: &str) -> Result<U256, CodecError> {
    let bytes = hex_to_bytes(hex)?;
    if bytes.len() > 32 {
        return Err(CodecError::ValueTooLarge(bytes.len()));
    }
    Ok(U256::from_be_slice(&bytes))
}

/// Reinterprets hex-encoded bytes as text. Ill-formed UTF-8 is replaced,
/// not rejected.
pub fn hex_to_string(hex: &str) -> Result<String, CodecError> {
    let bytes = hex_to_bytes(hex)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Encodes the UTF-8 bytes of a string as hex.
pub fn string_to_hex(text: &str, with_prefix: bool) -> String {
    bytes_to_hex(text.as_bytes(), with_prefix)
}

/// Groups hex-encoded bytes pairwise into big-endian 16-bit values. An odd
/// trailing byte becomes the high byte of a final value.
pub fn hex_to_uint16_array(hex: &str) -> Result<Vec<u16>, CodecError> {
    let bytes = hex_to_bytes(hex)?;
    let values = bytes
        .chunks(2)
        .map(|pair| {
            let high = u16::from(pair[0]) << 8;
            match pair.get(1) {
                Some(&low) => high | u16::from(low),
                None => high,
            }
        })
        .collect();
    Ok(values)
}

/// Packs 16-bit values as big-endian byte pairs and encodes them as hex.
pub fn uint16_array_to_hex(values: &[u16], with_prefix: bool) -> String {
    let mut bytes = Vec::with_capacity(values.len() * 2);
    for value in values {
        bytes.extend_from_slice(&value.to_be_bytes());
    }
    bytes_to_hex(&bytes, with_prefix)
}

/// Extracts the 4-byte function selector (first 8 hex digits) from ABI call
/// data. This is a placeholder, not an ABI decoder: parameters are ignored
/// and no type information is recovered.
pub fn decode_abi_selector(hex: &str) -> Result<String, CodecError> {
    let stripped = strip_prefix(hex);
    if !is_valid_hex(stripped) {
        return Err(CodecError::MalformedHex(hex.to_string()));
    }
    let end = stripped.len().min(8);
    Ok(stripped[..end].to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_round_trip() {
        let data = vec![0x00, 0x01, 0x7f, 0x80, 0xfe, 0xff];
        let with_prefix = bytes_to_hex(&data, true);
        let bare = bytes_to_hex(&data, false);
        assert_eq!(with_prefix, "0x00017f80feff");
        assert_eq!(bare, "00017f80feff");
        assert_eq!(hex_to_bytes(&with_prefix).unwrap(), data);
        assert_eq!(hex_to_bytes(&bare).unwrap(), data);
    }

    #[test]
    fn hex_decoding_strips_either_prefix_case() {
        assert_eq!(hex_to_bytes("0xABCDEF").unwrap(), vec![0xab, 0xcd, 0xef]);
        assert_eq!(hex_to_bytes("0XABCDEF").unwrap(), vec![0xab, 0xcd, 0xef]);
        assert_eq!(hex_to_bytes("0x").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn odd_length_hex_is_left_padded() {
        assert_eq!(hex_to_bytes("abc").unwrap(), hex_to_bytes("0abc").unwrap());
        assert_eq!(hex_to_bytes("0xf").unwrap(), vec![0x0f]);
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert!(matches!(
            hex_to_bytes("0xzz"),
            Err(CodecError::MalformedHex(_))
        ));
        assert!(matches!(
            hex_to_bytes("12 34"),
            Err(CodecError::MalformedHex(_))
        ));
    }

    #[test]
    fn hex_validity() {
        assert!(is_valid_hex("0xDEADbeef"));
        assert!(is_valid_hex("0x"));
        assert!(is_valid_hex(""));
        assert!(!is_valid_hex("0x12g4"));
    }

    #[test]
    fn address_length_is_enforced() {
        assert_eq!(
            format_address("0x1234"),
            Err(CodecError::InvalidAddressLength(4))
        );
        let too_long = "a".repeat(41);
        assert_eq!(
            format_address(&too_long),
            Err(CodecError::InvalidAddressLength(41))
        );
    }

    #[test]
    fn address_casing_follows_pair_leading_nibble() {
        // leading nibble >= 8 uppercases the whole pair
        assert_eq!(
            format_address(&"8a".repeat(20)).unwrap(),
            format!("0x{}", "8A".repeat(20))
        );
        assert_eq!(
            format_address(&"7f".repeat(20)).unwrap(),
            format!("0x{}", "7f".repeat(20))
        );
        // incoming case is irrelevant
        assert_eq!(
            format_address(&"Ab".repeat(20)).unwrap(),
            format!("0x{}", "AB".repeat(20))
        );
        assert_eq!(
            format_address(&"0".repeat(40)).unwrap(),
            format!("0x{}", "0".repeat(40))
        );
    }

    #[test]
    fn address_formatting_is_idempotent() {
        let formatted = format_address("0x9f8b2c4d5e6a710392817465fedcba0123456789").unwrap();
        assert_eq!(format_address(&formatted).unwrap(), formatted);
    }

    #[test]
    fn uint256_round_trip() {
        let value = U256::from(0xdeadu64);
        let encoded = uint256_to_hex(value, true);
        assert_eq!(encoded.len(), 2 + 64);
        assert!(encoded.ends_with("dead"));
        assert_eq!(hex_to_uint256(&encoded).unwrap(), value);
    }

    #[test]
    fn short_uint256_input_is_zero_padded() {
        assert_eq!(hex_to_uint256("0x01").unwrap(), U256::from(1u64));
        assert_eq!(hex_to_uint256("f").unwrap(), U256::from(15u64));
    }

    #[test]
    fn oversized_uint256_input_fails() {
        let too_big = "ff".repeat(33);
        assert_eq!(
            hex_to_uint256(&too_big),
            Err(CodecError::ValueTooLarge(33))
        );
    }

    #[test]
    fn string_round_trip() {
        assert_eq!(string_to_hex("hello", true), "0x68656c6c6f");
        assert_eq!(hex_to_string("0x68656c6c6f").unwrap(), "hello");
        assert_eq!(
            hex_to_string(&string_to_hex("{\"method\":\"createCity\"}", true)).unwrap(),
            "{\"method\":\"createCity\"}"
        );
    }

    #[test]
    fn uint16_round_trip() {
        let values = vec![0x0102, 0xfffe, 0x0000, 0x8000];
        let encoded = uint16_array_to_hex(&values, true);
        assert_eq!(encoded, "0x0102fffe00008000");
        assert_eq!(hex_to_uint16_array(&encoded).unwrap(), values);
    }

    #[test]
    fn odd_trailing_byte_is_a_high_byte() {
        assert_eq!(
            hex_to_uint16_array("0x010203").unwrap(),
            vec![0x0102, 0x0300]
        );
    }

    #[test]
    fn selector_is_first_four_bytes_only() {
        let data = format!("0xa9059cbb{}", "00".repeat(64));
        assert_eq!(decode_abi_selector(&data).unwrap(), "a9059cbb");
        assert_eq!(decode_abi_selector("0xAB").unwrap(), "ab");
        assert!(matches!(
            decode_abi_selector("0xnope"),
            Err(CodecError::MalformedHex(_))
        ));
    }
}
