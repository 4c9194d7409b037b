//! Pulling values out of upstream JSON with a JSONPath expression.
//!
//! There are two ways to apply an expression. [`single_value`] demands
//! exactly one match and renders it as bare text. [`apply_filter`] replaces
//! the document with whatever matched, and [`filter_or_inject`] turns any
//! failure into an in-band marker so the response can still be rendered.
use serde_json::{Map, Value};
use tracing::error;

use crate::{
    errors::{ExtractionError, JSONPathError},
    jsonpath::find,
};

/// Object key of the marker added to a document when filtering fails.
pub const ERROR_KEY: &str = "jsonpath-error";

/// Values located by a query, in document order.
pub type MatchSet = Vec<Value>;

pub fn evaluate(value: &Value, expr: &str) -> Result<MatchSet, JSONPathError> {
    Ok(find(expr, value)?
        .into_iter()
        .map(|node| node.value.clone())
        .collect())
}

/// The text of the one value `expr` matches in `value`.
pub fn single_value(value: &Value, expr: &str) -> Result<String, ExtractionError> {
    let mut matches = evaluate(value, expr)?;

    match matches.len() {
        0 => Err(ExtractionError::NotFound {
            expr: expr.to_owned(),
        }),
        1 => Ok(matches.pop().map(|v| scalar_text(&v)).unwrap_or_default()),
        _ => Err(ExtractionError::Ambiguous {
            expr: expr.to_owned(),
        }),
    }
}

/// Replace `value` with the values `expr` matches. A single match replaces
/// the document outright; several become an array.
pub fn apply_filter(value: &Value, expr: &str) -> Result<Value, ExtractionError> {
    let mut matches = evaluate(value, expr)?;

    match matches.len() {
        0 => Err(ExtractionError::NotFound {
            expr: expr.to_owned(),
        }),
        1 => Ok(matches.pop().unwrap_or(Value::Null)),
        _ => Ok(Value::Array(matches)),
    }
}

/// Like [`apply_filter`], but failures are logged and injected into the
/// input document instead of being returned.
pub fn filter_or_inject(value: Value, expr: &str) -> Value {
    match apply_filter(&value, expr) {
        Ok(filtered) => filtered,
        Err(err) => {
            error!(jsonpath = expr, "jsonpath error: {}", err);
            inject_error(value, err.to_string())
        }
    }
}

/// Add a `{"jsonpath-error": message}` marker to `value`.
///
/// Objects get the marker key merged in, replacing any existing member of
/// the same name. Arrays get the marker appended. Anything else is promoted
/// to a two element array.
pub fn inject_error(value: Value, message: String) -> Value {
    match value {
        Value::Object(mut obj) => {
            obj.insert(ERROR_KEY.to_owned(), Value::String(message));
            Value::Object(obj)
        }
        Value::Array(mut arr) => {
            arr.push(marker(message));
            Value::Array(arr)
        }
        scalar => Value::Array(vec![scalar, marker(message)]),
    }
}

fn marker(message: String) -> Value {
    let mut obj = Map::new();
    obj.insert(ERROR_KEY.to_owned(), Value::String(message));
    Value::Object(obj)
}

/// Plain text for a JSON value. Strings are unquoted and null is empty.
/// Containers are rendered as compact JSON.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.to_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        _ => value.to_string(),
    }
}
