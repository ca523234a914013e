//! Typed registry value data.
//!
//! Declarations carry loosely-typed [`RawData`]; [`encode`] validates it
//! against a [`ValueType`] and produces the canonical [`ValueData`] that is
//! used for every comparison.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Hex pairs, each optionally followed by whitespace.
static HEX_PAIRS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[0-9A-Fa-f]{2}\s*)*$").expect("Invalid hex pair regex")
});

/// Registry value type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ValueType {
    /// REG_SZ
    #[default]
    String,
    /// REG_EXPAND_SZ
    Expand,
    /// REG_MULTI_SZ
    Array,
    /// REG_DWORD
    Dword,
    /// REG_QWORD
    Qword,
    /// REG_BINARY
    Binary,
}

impl ValueType {
    pub const ALL: [ValueType; 6] = [
        ValueType::String,
        ValueType::Expand,
        ValueType::Array,
        ValueType::Dword,
        ValueType::Qword,
        ValueType::Binary,
    ];

    /// Name used in declarations.
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Expand => "expand",
            ValueType::Array => "array",
            ValueType::Dword => "dword",
            ValueType::Qword => "qword",
            ValueType::Binary => "binary",
        }
    }

    /// Native Windows type name.
    pub fn native_name(&self) -> &'static str {
        match self {
            ValueType::String => "REG_SZ",
            ValueType::Expand => "REG_EXPAND_SZ",
            ValueType::Array => "REG_MULTI_SZ",
            ValueType::Dword => "REG_DWORD",
            ValueType::Qword => "REG_QWORD",
            ValueType::Binary => "REG_BINARY",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValueType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| s.eq_ignore_ascii_case(t.name()) || s.eq_ignore_ascii_case(t.native_name()))
            .ok_or_else(|| Error::UnknownValueType(s.to_string()))
    }
}

impl TryFrom<String> for ValueType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ValueType> for String {
    fn from(value_type: ValueType) -> Self {
        value_type.name().to_string()
    }
}

/// Data as written in a declaration, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawData {
    Integer(i64),
    Text(String),
    List(Vec<String>),
}

impl Default for RawData {
    fn default() -> Self {
        RawData::Text(String::new())
    }
}

impl fmt::Display for RawData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawData::Integer(n) => write!(f, "{n}"),
            RawData::Text(s) => f.write_str(s),
            RawData::List(items) => f.write_str(&items.join(",")),
        }
    }
}

impl From<&str> for RawData {
    fn from(s: &str) -> Self {
        RawData::Text(s.to_string())
    }
}

impl From<String> for RawData {
    fn from(s: String) -> Self {
        RawData::Text(s)
    }
}

impl From<i64> for RawData {
    fn from(n: i64) -> Self {
        RawData::Integer(n)
    }
}

impl From<Vec<String>> for RawData {
    fn from(items: Vec<String>) -> Self {
        RawData::List(items)
    }
}

/// Canonical, validated value data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueData {
    String(String),
    Expand(String),
    Array(Vec<String>),
    /// Magnitude below 2^32
    Dword(i64),
    /// Magnitude below 2^64
    Qword(i128),
    /// Lowercase hex pairs separated by single spaces, e.g. `ca fe`
    Binary(String),
}

impl ValueData {
    pub fn value_type(&self) -> ValueType {
        match self {
            ValueData::String(_) => ValueType::String,
            ValueData::Expand(_) => ValueType::Expand,
            ValueData::Array(_) => ValueType::Array,
            ValueData::Dword(_) => ValueType::Dword,
            ValueData::Qword(_) => ValueType::Qword,
            ValueData::Binary(_) => ValueType::Binary,
        }
    }

    /// Canonical binary data for raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let pairs: Vec<String> = bytes.iter().map(|b| format!("{b:02x}")).collect();
        ValueData::Binary(pairs.join(" "))
    }

    /// Decoded bytes of binary data; `None` for other types.
    pub fn bytes(&self) -> Option<Vec<u8>> {
        let ValueData::Binary(text) = self else {
            return None;
        };
        text.split_whitespace()
            .map(|pair| u8::from_str_radix(pair, 16).ok())
            .collect()
    }

    /// Raw form that encodes back to this exact value.
    pub fn to_raw(&self) -> RawData {
        match self {
            ValueData::String(s) | ValueData::Expand(s) | ValueData::Binary(s) => {
                RawData::Text(s.clone())
            }
            ValueData::Array(items) => RawData::List(items.clone()),
            ValueData::Dword(n) => RawData::Integer(*n),
            ValueData::Qword(n) => match i64::try_from(*n) {
                Ok(small) => RawData::Integer(small),
                Err(_) => RawData::Text(n.to_string()),
            },
        }
    }
}

impl fmt::Display for ValueData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueData::String(s) | ValueData::Expand(s) | ValueData::Binary(s) => f.write_str(s),
            ValueData::Array(items) => f.write_str(&items.join(",")),
            ValueData::Dword(n) => write!(f, "{n}"),
            ValueData::Qword(n) => write!(f, "{n}"),
        }
    }
}

/// Validate raw data against a type and return its canonical form.
pub fn encode(value_type: ValueType, raw: &RawData) -> Result<ValueData> {
    match value_type {
        ValueType::String => scalar_text(value_type, raw).map(ValueData::String),
        ValueType::Expand => scalar_text(value_type, raw).map(ValueData::Expand),
        ValueType::Array => Ok(ValueData::Array(match raw {
            RawData::List(items) => items.clone(),
            RawData::Text(s) => vec![s.clone()],
            RawData::Integer(n) => vec![n.to_string()],
        })),
        ValueType::Dword => {
            let value = integer_within(raw, 32)
                .ok_or_else(|| Error::data(value_type, raw.to_string(), "must be a valid DWORD"))?;
            // Magnitude below 2^32 always fits i64
            Ok(ValueData::Dword(value as i64))
        }
        ValueType::Qword => integer_within(raw, 64)
            .map(ValueData::Qword)
            .ok_or_else(|| Error::data(value_type, raw.to_string(), "must be a valid QWORD")),
        ValueType::Binary => match raw {
            RawData::Text(s) => normalize_binary(s).map(ValueData::Binary).ok_or_else(|| {
                Error::data(
                    value_type,
                    s.as_str(),
                    "must be a hex encoded string of the form '00 01 02 ...'",
                )
            }),
            _ => Err(Error::data(
                value_type,
                raw.to_string(),
                "must be a hex encoded string",
            )),
        },
    }
}

/// Compare observed data with desired data the way each type requires.
///
/// Binary data compares case-insensitively; missing observed data never
/// matches. Every other type uses exact canonical equality.
pub fn property_matches(
    value_type: ValueType,
    observed: Option<&ValueData>,
    desired: &ValueData,
) -> bool {
    match value_type {
        ValueType::Binary => match (observed, desired) {
            (Some(ValueData::Binary(current)), ValueData::Binary(wanted)) => {
                current.eq_ignore_ascii_case(wanted)
            }
            _ => false,
        },
        _ => observed == Some(desired),
    }
}

fn scalar_text(value_type: ValueType, raw: &RawData) -> Result<String> {
    match raw {
        RawData::Text(s) => Ok(s.clone()),
        RawData::Integer(n) => Ok(n.to_string()),
        RawData::List(_) => Err(Error::data(
            value_type,
            raw.to_string(),
            "a list of strings is only valid for array values",
        )),
    }
}

/// Parse an integer whose magnitude fits in `bits` bits.
///
/// The check is on the absolute value, so `-(2^32 - 1)` is a valid DWORD.
fn integer_within(raw: &RawData, bits: u32) -> Option<i128> {
    let value = match raw {
        RawData::Integer(n) => i128::from(*n),
        RawData::Text(s) => parse_integer_literal(s)?,
        RawData::List(_) => return None,
    };
    (value.unsigned_abs() >> bits == 0).then_some(value)
}

/// Parse an integer literal: optional sign, `0x`/`0b`/`0o`/`0d` prefixes,
/// leading-zero octal, and single `_` separators between digits.
pub fn parse_integer_literal(text: &str) -> Option<i128> {
    let text = text.trim();
    let (negative, unsigned) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };

    let lower = unsigned.to_ascii_lowercase();
    let (radix, digits) = if let Some(rest) = lower.strip_prefix("0x") {
        (16, rest)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (2, rest)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (8, rest)
    } else if let Some(rest) = lower.strip_prefix("0d") {
        (10, rest)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (8, &lower[1..])
    } else {
        (10, lower.as_str())
    };

    if digits.is_empty()
        || digits.starts_with('_')
        || digits.ends_with('_')
        || digits.contains("__")
        || !digits.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return None;
    }

    let cleaned: String = digits.chars().filter(|&c| c != '_').collect();
    let magnitude = i128::from_str_radix(&cleaned, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Canonical binary text, or `None` if the input is not hex pairs.
fn normalize_binary(text: &str) -> Option<String> {
    if !HEX_PAIRS.is_match(text) {
        return None;
    }
    let compact: Vec<char> = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let pairs: Vec<String> = compact.chunks(2).map(|pair| pair.iter().collect()).collect();
    Some(pairs.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> RawData {
        RawData::from(s)
    }

    #[test]
    fn test_value_type_names() {
        assert_eq!("string".parse::<ValueType>().unwrap(), ValueType::String);
        assert_eq!("EXPAND".parse::<ValueType>().unwrap(), ValueType::Expand);
        assert_eq!("reg_multi_sz".parse::<ValueType>().unwrap(), ValueType::Array);
        assert_eq!("REG_QWORD".parse::<ValueType>().unwrap(), ValueType::Qword);
        assert!("REG_NONE".parse::<ValueType>().is_err());
        assert_eq!(ValueType::default(), ValueType::String);
        for value_type in ValueType::ALL {
            assert_eq!(value_type.to_string().parse::<ValueType>().unwrap(), value_type);
        }
    }

    #[test]
    fn test_strings_are_verbatim() {
        assert_eq!(
            encode(ValueType::String, &text("  Mixed Case  ")).unwrap(),
            ValueData::String("  Mixed Case  ".into())
        );
        assert_eq!(
            encode(ValueType::Expand, &text("%SystemRoot%\\system32")).unwrap(),
            ValueData::Expand("%SystemRoot%\\system32".into())
        );
        assert_eq!(
            encode(ValueType::String, &RawData::Integer(5)).unwrap(),
            ValueData::String("5".into())
        );
        assert!(encode(ValueType::String, &RawData::List(vec!["a".into()])).is_err());
    }

    #[test]
    fn test_default_raw_data_is_empty_string() {
        assert_eq!(
            encode(ValueType::String, &RawData::default()).unwrap(),
            ValueData::String(String::new())
        );
        assert!(encode(ValueType::Dword, &RawData::default()).is_err());
    }

    #[test]
    fn test_array_preserves_order() {
        let raw = RawData::List(vec!["b".into(), "a".into(), "b".into()]);
        let data = encode(ValueType::Array, &raw).unwrap();
        assert_eq!(data, ValueData::Array(vec!["b".into(), "a".into(), "b".into()]));
        assert_ne!(
            data,
            encode(ValueType::Array, &RawData::List(vec!["a".into(), "b".into(), "b".into()]))
                .unwrap()
        );
        assert_eq!(data.to_string(), "b,a,b");
        assert_eq!(
            encode(ValueType::Array, &text("single")).unwrap(),
            ValueData::Array(vec!["single".into()])
        );
    }

    #[test]
    fn test_dword_boundary() {
        assert_eq!(
            encode(ValueType::Dword, &text("4294967295")).unwrap(),
            ValueData::Dword(4_294_967_295)
        );
        assert!(encode(ValueType::Dword, &text("4294967296")).is_err());
        assert_eq!(
            encode(ValueType::Dword, &RawData::Integer(0)).unwrap(),
            ValueData::Dword(0)
        );
    }

    #[test]
    fn test_dword_negative_magnitude_rule() {
        // The range check is on the absolute value, not two's complement:
        // -(2^32 - 1) is accepted and -2^32 is rejected.
        assert_eq!(
            encode(ValueType::Dword, &text("-4294967295")).unwrap(),
            ValueData::Dword(-4_294_967_295)
        );
        assert!(encode(ValueType::Dword, &text("-4294967296")).is_err());
        assert_eq!(
            encode(ValueType::Dword, &RawData::Integer(-1)).unwrap(),
            ValueData::Dword(-1)
        );
    }

    #[test]
    fn test_qword_boundary() {
        assert_eq!(
            encode(ValueType::Qword, &text("18446744073709551615")).unwrap(),
            ValueData::Qword(18_446_744_073_709_551_615)
        );
        assert!(encode(ValueType::Qword, &text("18446744073709551616")).is_err());
        assert_eq!(
            encode(ValueType::Qword, &text("-18446744073709551615")).unwrap(),
            ValueData::Qword(-18_446_744_073_709_551_615)
        );
        assert!(encode(ValueType::Qword, &text("-18446744073709551616")).is_err());
        assert_eq!(
            encode(ValueType::Qword, &RawData::Integer(i64::MIN)).unwrap(),
            ValueData::Qword(i128::from(i64::MIN))
        );
    }

    #[test]
    fn test_integer_rejections() {
        for bad in ["", "abc", "1.5", "12abc", "0x", "1__0", "_1", "1_", "08", "- 1"] {
            assert!(
                encode(ValueType::Dword, &text(bad)).is_err(),
                "{bad:?} should be rejected"
            );
        }
        assert!(encode(ValueType::Qword, &RawData::List(vec!["1".into()])).is_err());
    }

    #[test]
    fn test_integer_literal_forms() {
        assert_eq!(parse_integer_literal(" 42 "), Some(42));
        assert_eq!(parse_integer_literal("+7"), Some(7));
        assert_eq!(parse_integer_literal("-0x10"), Some(-16));
        assert_eq!(parse_integer_literal("0XfF"), Some(255));
        assert_eq!(parse_integer_literal("0b101"), Some(5));
        assert_eq!(parse_integer_literal("0o17"), Some(15));
        assert_eq!(parse_integer_literal("017"), Some(15));
        assert_eq!(parse_integer_literal("0d19"), Some(19));
        assert_eq!(parse_integer_literal("1_000_000"), Some(1_000_000));
        assert_eq!(parse_integer_literal("0"), Some(0));
        assert_eq!(parse_integer_literal("-"), None);
        assert_eq!(parse_integer_literal("0x-1"), None);
    }

    #[test]
    fn test_binary_normalization() {
        let expected = ValueData::Binary("ca fe".into());
        assert_eq!(encode(ValueType::Binary, &text("CA FE")).unwrap(), expected);
        assert_eq!(encode(ValueType::Binary, &text("cafe")).unwrap(), expected);
        assert_eq!(encode(ValueType::Binary, &text("CaFE ")).unwrap(), expected);
        assert_eq!(
            encode(ValueType::Binary, &text("CaFE BEEF")).unwrap(),
            ValueData::Binary("ca fe be ef".into())
        );
        assert_eq!(
            encode(ValueType::Binary, &text("")).unwrap(),
            ValueData::Binary(String::new())
        );
    }

    #[test]
    fn test_binary_encode_is_idempotent() {
        let once = encode(ValueType::Binary, &text("DE AD\tBE EF")).unwrap();
        let twice = encode(ValueType::Binary, &once.to_raw()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_binary_rejections() {
        for bad in ["abc", "c afe", "zz", "0x01", "ca-fe"] {
            assert!(
                encode(ValueType::Binary, &text(bad)).is_err(),
                "{bad:?} should be rejected"
            );
        }
        assert!(encode(ValueType::Binary, &RawData::Integer(1)).is_err());
    }

    #[test]
    fn test_binary_bytes() {
        let data = encode(ValueType::Binary, &text("00 7F ff")).unwrap();
        assert_eq!(data.bytes(), Some(vec![0x00, 0x7f, 0xff]));
        assert_eq!(ValueData::from_bytes(&[0xca, 0xfe]), ValueData::Binary("ca fe".into()));
        assert_eq!(ValueData::Dword(1).bytes(), None);
    }

    #[test]
    fn test_to_raw_encodes_back() {
        let values = [
            ValueData::String("x".into()),
            ValueData::Expand("%PATH%".into()),
            ValueData::Array(vec!["a".into(), "b".into()]),
            ValueData::Dword(-4_294_967_295),
            ValueData::Qword(18_446_744_073_709_551_615),
            ValueData::Qword(-3),
            ValueData::Binary("00 01".into()),
        ];
        for value in values {
            assert_eq!(encode(value.value_type(), &value.to_raw()).unwrap(), value);
        }
    }

    #[test]
    fn test_property_matches_binary_ignores_case() {
        let desired = ValueData::Binary("ca fe".into());
        let observed = ValueData::Binary("CA FE".into());
        assert!(property_matches(ValueType::Binary, Some(&observed), &desired));
        assert!(!property_matches(ValueType::Binary, None, &desired));
        assert!(!property_matches(
            ValueType::Binary,
            Some(&ValueData::Binary("ca fd".into())),
            &desired
        ));
    }

    #[test]
    fn test_property_matches_exact_for_other_types() {
        let desired = ValueData::String("Value".into());
        assert!(property_matches(ValueType::String, Some(&desired.clone()), &desired));
        assert!(!property_matches(
            ValueType::String,
            Some(&ValueData::String("value".into())),
            &desired
        ));
        assert!(!property_matches(
            ValueType::String,
            Some(&ValueData::Expand("Value".into())),
            &desired
        ));
        assert!(!property_matches(ValueType::Dword, None, &ValueData::Dword(1)));
    }

    #[test]
    fn test_raw_data_deserializes_untagged() {
        let raw: Vec<RawData> = serde_json::from_str(r#"[1, "two", ["a", "b"]]"#).unwrap();
        assert_eq!(
            raw,
            vec![
                RawData::Integer(1),
                RawData::Text("two".into()),
                RawData::List(vec!["a".into(), "b".into()]),
            ]
        );
    }
}
