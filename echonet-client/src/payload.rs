//! Item values and request payload derivation

use echonet_core::{hex_to_bytes, minimal_bytes, EchonetResult};
use std::fmt;

/// A command or state handed in by the host for an item
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemValue {
    Decimal(u64),
    Text(String),
}

impl ItemValue {
    /// Parse host text: decimal numbers become `Decimal`, anything else `Text`
    ///
    /// Fractions are truncated toward zero. Negative numbers are stored as
    /// their 64-bit two's complement, so `-1` encodes as eight `0xFF` bytes.
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<u64>() {
            return ItemValue::Decimal(n);
        }
        match parse_signed_decimal(trimmed) {
            Some(n) => ItemValue::Decimal(n),
            None => ItemValue::Text(s.to_string()),
        }
    }

    /// EDT bytes for this value
    ///
    /// Decimals use their minimal big-endian form. Text is read as hex; text
    /// that is not hex, or is empty, becomes a single zero byte.
    pub fn to_edt(&self) -> Vec<u8> {
        match self {
            ItemValue::Decimal(n) => minimal_bytes(*n),
            ItemValue::Text(s) => match hex_to_bytes(s.trim()) {
                Ok(bytes) if !bytes.is_empty() => bytes,
                _ => vec![0x00],
            },
        }
    }
}

/// `[+-]digits[.digits]`, truncated; exponents and hex are left to `Text`
fn parse_signed_decimal(s: &str) -> Option<u64> {
    let unsigned = s.strip_prefix(['-', '+']).unwrap_or(s);
    if !unsigned.bytes().any(|b| b.is_ascii_digit())
        || !unsigned.bytes().all(|b| b.is_ascii_digit() || b == b'.')
    {
        return None;
    }
    let value = s.parse::<f64>().ok()?;
    Some(value.trunc() as i64 as u64)
}

impl fmt::Display for ItemValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemValue::Decimal(n) => write!(f, "{}", n),
            ItemValue::Text(s) => f.write_str(s),
        }
    }
}

/// Where the EDT of a request comes from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Payload {
    /// No EDT, as for a property read
    #[default]
    Empty,
    /// Explicit hex, e.g. from a binding; odd lengths are left-padded with `0`
    Hex(String),
    /// Derived from an item value
    Value(ItemValue),
}

impl Payload {
    /// Encode the payload
    ///
    /// # Errors
    /// Returns `EchonetError::Decode` if explicit hex is invalid
    pub fn to_bytes(&self) -> EchonetResult<Vec<u8>> {
        match self {
            Payload::Empty => Ok(Vec::new()),
            Payload::Hex(hex) => {
                let hex = hex.trim();
                if hex.len() % 2 == 1 {
                    hex_to_bytes(&format!("0{}", hex))
                } else {
                    hex_to_bytes(hex)
                }
            }
            Payload::Value(value) => Ok(value.to_edt()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use echonet_core::EchonetError;

    #[test]
    fn test_item_value_parse() {
        assert_eq!(ItemValue::parse("300"), ItemValue::Decimal(300));
        assert_eq!(ItemValue::parse("ON"), ItemValue::Text("ON".to_string()));
        assert_eq!(ItemValue::parse("1E10"), ItemValue::Text("1E10".to_string()));
        assert_eq!(ItemValue::parse("."), ItemValue::Text(".".to_string()));
    }

    #[test]
    fn test_fractional_value_truncated() {
        assert_eq!(ItemValue::parse("21.5"), ItemValue::Decimal(21));
        assert_eq!(ItemValue::parse("21.5").to_edt(), vec![0x15]);
        assert_eq!(ItemValue::parse("0.9").to_edt(), vec![0x00]);
        assert_eq!(ItemValue::parse("-0.5").to_edt(), vec![0x00]);
    }

    #[test]
    fn test_negative_value_twos_complement() {
        assert_eq!(ItemValue::parse("-1").to_edt(), vec![0xFF; 8]);
        assert_eq!(
            ItemValue::parse("-2.7").to_edt(),
            vec![0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE]
        );
    }

    #[test]
    fn test_value_edt() {
        assert_eq!(ItemValue::Decimal(0).to_edt(), vec![0x00]);
        assert_eq!(ItemValue::Decimal(300).to_edt(), vec![0x01, 0x2C]);
        assert_eq!(ItemValue::Text("4142".to_string()).to_edt(), vec![0x41, 0x42]);
        assert_eq!(ItemValue::Text("ON".to_string()).to_edt(), vec![0x00]);
        assert_eq!(ItemValue::Text(String::new()).to_edt(), vec![0x00]);
    }

    #[test]
    fn test_payload_to_bytes() {
        assert_eq!(Payload::Empty.to_bytes().unwrap(), Vec::<u8>::new());
        assert_eq!(Payload::Hex("30".to_string()).to_bytes().unwrap(), vec![0x30]);
        assert_eq!(Payload::Hex("1".to_string()).to_bytes().unwrap(), vec![0x01]);
        assert_eq!(Payload::Hex("123".to_string()).to_bytes().unwrap(), vec![0x01, 0x23]);
        assert!(matches!(
            Payload::Hex("XY".to_string()).to_bytes(),
            Err(EchonetError::Decode(_))
        ));
        assert_eq!(
            Payload::Value(ItemValue::Decimal(256)).to_bytes().unwrap(),
            vec![0x01, 0x00]
        );
    }
}
