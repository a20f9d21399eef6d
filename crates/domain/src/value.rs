//! Loose value coercion shared by trigger filters and condition operators.
//!
//! Event payloads and live state carry arbitrary JSON values while rule
//! authors type comparison operands as text. Comparisons therefore go through
//! a string or number coercion instead of strict JSON equality.

use std::borrow::Cow;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Render a value the way it is compared as text.
///
/// Strings are used verbatim (no surrounding quotes); every other value uses
/// its JSON rendering (`true`, `150`, `0.8`, `null`, …). Integral floats lose
/// their fraction, so `100.0` reads as `100`.
#[must_use]
pub fn as_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(text) => Cow::Borrowed(text),
        Value::Number(number) if number.is_f64() => match number.as_f64() {
            Some(float) if float.fract() == 0.0 && float.abs() < 1e21 => {
                // adding zero folds -0.0 into 0.0
                Cow::Owned(format!("{}", float + 0.0))
            }
            _ => Cow::Owned(number.to_string()),
        },
        other => Cow::Owned(other.to_string()),
    }
}

/// Coerce a value to a finite number.
///
/// Numbers are taken as-is and strings are parsed after trimming. Anything
/// else (booleans, null, arrays, objects, non-numeric text) yields `None`.
#[must_use]
pub fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_number(text),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// Parse a textual operand as a finite number.
#[must_use]
pub fn parse_number(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Whether two values are equal once both are rendered as text.
#[must_use]
pub fn loosely_equal(actual: &Value, expected: &Value) -> bool {
    as_text(actual) == as_text(expected)
}

/// Whether a value is a scalar (string, number, boolean or null).
#[must_use]
pub fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

/// Deserialize any JSON scalar into its textual form.
///
/// Lets rule authors write `"value": true` or `"value": 100` where the model
/// stores `"true"` / `"100"`.
///
/// # Errors
///
/// Fails when the input is an array or an object.
pub fn scalar_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if is_scalar(&value) {
        Ok(as_text(&value).into_owned())
    } else {
        Err(serde::de::Error::custom("expected a string, number, boolean or null"))
    }
}
