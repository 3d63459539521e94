//! Answer normalization.
//!
//! Reduces a model's raw reply (ideally `{"answer": ...}`) to a single
//! comparable string.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What to return when the reply is not valid JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParseFallback {
    /// Treat the reply as "no answer".
    Empty,
    /// Use the raw reply, trimmed and lower-cased.
    #[default]
    LowercasedRaw,
}

impl ParseFallback {
    fn apply(self, raw: &str) -> String {
        match self {
            ParseFallback::Empty => String::new(),
            ParseFallback::LowercasedRaw => raw.trim().to_lowercase(),
        }
    }
}

impl fmt::Display for ParseFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseFallback::Empty => write!(f, "empty"),
            ParseFallback::LowercasedRaw => write!(f, "lowercased-raw"),
        }
    }
}

impl FromStr for ParseFallback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "empty" | "strict" => Ok(ParseFallback::Empty),
            "lowercased-raw" | "raw" | "lenient" => Ok(ParseFallback::LowercasedRaw),
            other => Err(format!("unknown parse fallback: {other}")),
        }
    }
}

/// Extract the canonical answer string from a raw model reply.
///
/// - `{"answer": "Paris"}` → `"Paris"`
/// - `{"answer": 42}` → `"42"`, `{"answer": true}` → `"true"`
/// - missing or falsy `answer` (null, false, 0, "") → `""`
/// - valid JSON that is not an object → `""`
/// - anything unparseable → decided by `fallback`
pub fn normalize_answer(raw: &str, fallback: ParseFallback) -> String {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => match map.get("answer") {
            None => String::new(),
            Some(value) if is_falsy(value) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => format_number(n),
            Some(Value::Bool(b)) => b.to_string(),
            Some(other) => other.to_string(),
        },
        // A bare `null` has no fields to read from; handle it like garbage.
        Ok(Value::Null) => fallback.apply(raw),
        Ok(_) => String::new(),
        Err(e) => {
            tracing::debug!("model reply is not JSON ({e}), falling back to {fallback}");
            fallback.apply(raw)
        }
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn format_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        n.as_f64().map(format_float).unwrap_or_else(|| n.to_string())
    }
}

/// Shortest round-trip decimal, switching to exponent form (`1e+21`,
/// `1.5e-7`) outside `[1e-6, 1e21)` the way JSON-producing runtimes do.
fn format_float(f: f64) -> String {
    let magnitude = f.abs();
    if magnitude != 0.0 && !(1e-6..1e21).contains(&magnitude) {
        let exp = format!("{f:e}");
        match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
            _ => exp,
        }
    } else {
        // Display drops a trailing ".0", so 3.0 reads "3" like an integer.
        f.to_string()
    }
}
