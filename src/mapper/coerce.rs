//! Coercion of raw driver values into field values.
//!
//! Every coercion function has the same shape: `Null` yields the kind's zero value, a native
//! value of the right kind is taken as-is (integers narrowed with a range check), and text or
//! bytes are parsed. Anything else is an error.

use std::str::FromStr;

use chrono::NaiveDateTime;
use thiserror::Error;

use super::record::{FieldKind, FieldValue};
use crate::types::RowValues;

#[derive(Debug, Error, PartialEq)]
pub enum CoerceError {
    #[error("a {raw} value cannot be assigned to a {target} field")]
    UnexpectedRaw {
        raw: &'static str,
        target: &'static str,
    },
    #[error("{text:?} cannot be parsed as {target}")]
    Parse { text: String, target: &'static str },
    #[error("{value} is out of range for {target}")]
    OutOfRange { value: i64, target: &'static str },
    #[error("textual date-time values are not supported")]
    TextualDateTime,
}

pub(crate) type Coercion = fn(&RowValues) -> Result<FieldValue, CoerceError>;

/// The coercion function for `kind`, or `None` for kinds the mapper refuses.
pub(crate) fn coercion_for(kind: FieldKind) -> Option<Coercion> {
    let f: Coercion = match kind {
        FieldKind::I8 => |raw| integer(raw, "i8").map(FieldValue::I8),
        FieldKind::I16 => |raw| integer(raw, "i16").map(FieldValue::I16),
        FieldKind::I32 => |raw| integer(raw, "i32").map(FieldValue::I32),
        FieldKind::I64 => |raw| integer(raw, "i64").map(FieldValue::I64),
        FieldKind::U8 => |raw| integer(raw, "u8").map(FieldValue::U8),
        FieldKind::U16 => |raw| integer(raw, "u16").map(FieldValue::U16),
        FieldKind::U32 => |raw| integer(raw, "u32").map(FieldValue::U32),
        FieldKind::U64 => |raw| integer(raw, "u64").map(FieldValue::U64),
        // narrowing to f32 is the documented behaviour for single-precision fields
        #[allow(clippy::cast_possible_truncation)]
        FieldKind::F32 => |raw| float(raw, "f32").map(|v| FieldValue::F32(v as f32)),
        FieldKind::F64 => |raw| float(raw, "f64").map(FieldValue::F64),
        FieldKind::Bool => |raw| boolean(raw).map(FieldValue::Bool),
        FieldKind::Text => |raw| Ok(FieldValue::Text(text(raw))),
        FieldKind::DateTime => |raw| date_time(raw).map(FieldValue::DateTime),
        FieldKind::Record | FieldKind::Unsupported => return None,
    };
    Some(f)
}

fn raw_text<'a>(raw: &'a RowValues, target: &'static str) -> Result<Option<&'a str>, CoerceError> {
    match raw {
        RowValues::Text(s) => Ok(Some(s)),
        RowValues::Blob(bytes) => std::str::from_utf8(bytes)
            .map(Some)
            .map_err(|_| CoerceError::Parse {
                text: String::from_utf8_lossy(bytes).into_owned(),
                target,
            }),
        _ => Ok(None),
    }
}

fn parse<T: FromStr>(s: &str, target: &'static str) -> Result<T, CoerceError> {
    s.parse().map_err(|_| CoerceError::Parse {
        text: s.to_string(),
        target,
    })
}

fn unexpected(raw: &RowValues, target: &'static str) -> CoerceError {
    CoerceError::UnexpectedRaw {
        raw: raw.kind_name(),
        target,
    }
}

fn integer<T>(raw: &RowValues, target: &'static str) -> Result<T, CoerceError>
where
    T: TryFrom<i64> + FromStr + Default,
{
    if let Some(s) = raw_text(raw, target)? {
        return parse(s, target);
    }
    match raw {
        RowValues::Null => Ok(T::default()),
        RowValues::Int(i) => T::try_from(*i).map_err(|_| CoerceError::OutOfRange { value: *i, target }),
        other => Err(unexpected(other, target)),
    }
}

fn float(raw: &RowValues, target: &'static str) -> Result<f64, CoerceError> {
    if let Some(s) = raw_text(raw, target)? {
        return parse(s, target);
    }
    match raw {
        RowValues::Null => Ok(0.0),
        RowValues::Float(f) => Ok(*f),
        other => Err(unexpected(other, target)),
    }
}

/// Integers map to `true` only when they are exactly `1`.
fn boolean(raw: &RowValues) -> Result<bool, CoerceError> {
    if let Some(s) = raw_text(raw, "bool")? {
        return match s {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
            _ => Err(CoerceError::Parse {
                text: s.to_string(),
                target: "bool",
            }),
        };
    }
    match raw {
        RowValues::Null => Ok(false),
        RowValues::Bool(b) => Ok(*b),
        RowValues::Int(i) => Ok(*i == 1),
        other => Err(unexpected(other, "bool")),
    }
}

fn text(raw: &RowValues) -> String {
    match raw {
        RowValues::Null => String::new(),
        RowValues::Text(s) => s.clone(),
        RowValues::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        RowValues::Int(i) => i.to_string(),
        RowValues::Float(f) => f.to_string(),
        RowValues::Bool(b) => b.to_string(),
        RowValues::Timestamp(ts) => ts.to_string(),
        RowValues::JSON(json) => json.to_string(),
    }
}

fn date_time(raw: &RowValues) -> Result<NaiveDateTime, CoerceError> {
    match raw {
        RowValues::Null => Ok(NaiveDateTime::default()),
        RowValues::Timestamp(ts) => Ok(*ts),
        RowValues::Text(_) | RowValues::Blob(_) => Err(CoerceError::TextualDateTime),
        other => Err(unexpected(other, "date-time")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coerce(kind: FieldKind, raw: RowValues) -> Result<FieldValue, CoerceError> {
        coercion_for(kind).unwrap()(&raw)
    }

    #[test]
    fn null_yields_zero_values() {
        assert_eq!(coerce(FieldKind::I32, RowValues::Null), Ok(FieldValue::I32(0)));
        assert_eq!(coerce(FieldKind::F64, RowValues::Null), Ok(FieldValue::F64(0.0)));
        assert_eq!(coerce(FieldKind::Bool, RowValues::Null), Ok(FieldValue::Bool(false)));
        assert_eq!(coerce(FieldKind::Text, RowValues::Null), Ok(FieldValue::Text(String::new())));
        assert_eq!(
            coerce(FieldKind::DateTime, RowValues::Null),
            Ok(FieldValue::DateTime(NaiveDateTime::default()))
        );
    }

    #[test]
    fn native_integers_are_narrowed_with_range_check() {
        assert_eq!(coerce(FieldKind::I8, RowValues::Int(-5)), Ok(FieldValue::I8(-5)));
        assert_eq!(coerce(FieldKind::U16, RowValues::Int(65_535)), Ok(FieldValue::U16(65_535)));
        assert_eq!(
            coerce(FieldKind::U8, RowValues::Int(300)),
            Err(CoerceError::OutOfRange { value: 300, target: "u8" })
        );
        assert!(coerce(FieldKind::U64, RowValues::Int(-1)).is_err());
    }

    #[test]
    fn byte_encoded_text_is_parsed() {
        assert_eq!(
            coerce(FieldKind::I64, RowValues::Blob(b"42".to_vec())),
            Ok(FieldValue::I64(42))
        );
        assert_eq!(
            coerce(FieldKind::U32, RowValues::Text("7".into())),
            Ok(FieldValue::U32(7))
        );
        assert_eq!(
            coerce(FieldKind::F32, RowValues::Blob(b"1.5".to_vec())),
            Ok(FieldValue::F32(1.5))
        );
        assert!(matches!(
            coerce(FieldKind::I16, RowValues::Blob(b"abc".to_vec())),
            Err(CoerceError::Parse { .. })
        ));
    }

    #[test]
    fn wrong_native_kind_is_rejected() {
        assert_eq!(
            coerce(FieldKind::I64, RowValues::Float(1.0)),
            Err(CoerceError::UnexpectedRaw { raw: "float", target: "i64" })
        );
        assert!(coerce(FieldKind::F64, RowValues::Bool(true)).is_err());
    }

    #[test]
    fn booleans_accept_native_one_and_text_forms() {
        assert_eq!(coerce(FieldKind::Bool, RowValues::Bool(true)), Ok(FieldValue::Bool(true)));
        assert_eq!(coerce(FieldKind::Bool, RowValues::Int(1)), Ok(FieldValue::Bool(true)));
        assert_eq!(coerce(FieldKind::Bool, RowValues::Int(0)), Ok(FieldValue::Bool(false)));
        assert_eq!(coerce(FieldKind::Bool, RowValues::Int(2)), Ok(FieldValue::Bool(false)));
        assert_eq!(coerce(FieldKind::Bool, RowValues::Blob(b"T".to_vec())), Ok(FieldValue::Bool(true)));
        assert_eq!(coerce(FieldKind::Bool, RowValues::Text("false".into())), Ok(FieldValue::Bool(false)));
        assert!(coerce(FieldKind::Bool, RowValues::Text("yes".into())).is_err());
    }

    #[test]
    fn text_accepts_any_raw_shape() {
        assert_eq!(
            coerce(FieldKind::Text, RowValues::Blob(b"hola".to_vec())),
            Ok(FieldValue::Text("hola".into()))
        );
        assert_eq!(coerce(FieldKind::Text, RowValues::Int(3)), Ok(FieldValue::Text("3".into())));
    }

    #[test]
    fn date_time_rejects_text() {
        let ts = NaiveDateTime::parse_from_str("2024-01-02 03:04:05", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(coerce(FieldKind::DateTime, RowValues::Timestamp(ts)), Ok(FieldValue::DateTime(ts)));
        assert_eq!(
            coerce(FieldKind::DateTime, RowValues::Text("2024-01-02 03:04:05".into())),
            Err(CoerceError::TextualDateTime)
        );
    }

    #[test]
    fn refused_kinds_have_no_coercion() {
        assert!(coercion_for(FieldKind::Record).is_none());
        assert!(coercion_for(FieldKind::Unsupported).is_none());
    }
}
