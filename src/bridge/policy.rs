//! Translation policy
//!
//! Decides which host values need a bridge before crossing into the
//! script runtime.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::value::Value;

/// How nested composites are translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationPolicy {
    /// Walk the whole graph up front.
    Eager,
    /// Wrap the root; translate children on first access.
    #[default]
    Lazy,
}

impl fmt::Display for TranslationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationPolicy::Eager => f.write_str("eager"),
            TranslationPolicy::Lazy => f.write_str("lazy"),
        }
    }
}

impl FromStr for TranslationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eager" => Ok(TranslationPolicy::Eager),
            "lazy" => Ok(TranslationPolicy::Lazy),
            other => Err(format!("unknown translation policy: {other}")),
        }
    }
}

/// True iff `value` is an unbridged mapping or sequence.
pub fn needs_translation(value: &Value) -> bool {
    matches!(value, Value::Map(_) | Value::Seq(_))
}

/// Primitive rules: characters become text, everything else passes through.
pub(crate) fn translate_primitive(value: Value) -> Value {
    match value {
        Value::Char(c) => Value::Text(c.to_string()),
        other => other,
    }
}
