//! Lenient field parsing for hand-edited campaign files
//!
//! Sheets frequently store numbers as strings ("15", "+5") and leave
//! fields blank. Anything unusable falls back to the field's default here,
//! once, so the rest of the crate only sees typed values.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::combat::TagField;

/// Default for HP, AC and ability scores
pub const DEFAULT_SCORE: i32 = 10;

pub(crate) fn default_score() -> i32 {
    DEFAULT_SCORE
}

/// Interpret a JSON value as an integer, if it is one in spirit
pub(crate) fn int_from_value(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .and_then(|i| i32::try_from(i).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Integer, defaulting to [`DEFAULT_SCORE`]
pub(crate) fn score<'de, D: Deserializer<'de>>(d: D) -> Result<i32, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value
        .as_ref()
        .and_then(int_from_value)
        .unwrap_or(DEFAULT_SCORE))
}

/// Integer, defaulting to 0
pub(crate) fn int_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<i32, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.as_ref().and_then(int_from_value).unwrap_or(0))
}

/// Free text; numbers and booleans are rendered, null is empty
pub(crate) fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

/// Tag field; null is empty
pub(crate) fn tags<'de, D: Deserializer<'de>>(d: D) -> Result<TagField, D::Error> {
    Ok(Option::<TagField>::deserialize(d)?.unwrap_or_default())
}
