//! Dynamic-object protocol
//!
//! The operations a foreign runtime performs on host objects it did not
//! create. Named members and indexed slots are separate surfaces; each
//! bridge kind rejects the surface that does not fit its shape.

use std::fmt;

use crate::core::error::BridgeResult;
use crate::value::Value;

/// Shape of a bridged object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Mapping,
    Sequence,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Mapping => f.write_str("mapping"),
            ObjectKind::Sequence => f.write_str("sequence"),
        }
    }
}

/// Result of a read: absent is distinct from present-with-null.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(Value),
    NotFound,
}

impl Lookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn into_option(self) -> Option<Value> {
        match self {
            Lookup::Found(v) => Some(v),
            Lookup::NotFound => None,
        }
    }

    /// Collapses absence into null, for protocols without an absent sentinel.
    pub fn or_null(self) -> Value {
        self.into_option().unwrap_or(Value::Null)
    }
}

/// Host object as seen from the foreign runtime.
pub trait DynamicObject {
    fn kind(&self) -> ObjectKind;

    fn get_member(&self, name: &str) -> BridgeResult<Lookup>;
    fn set_member(&self, name: &str, value: Value) -> BridgeResult<()>;
    fn has_member(&self, name: &str) -> BridgeResult<bool>;
    fn delete_member(&self, name: &str) -> BridgeResult<()>;

    fn get_slot(&self, index: usize) -> BridgeResult<Lookup>;
    fn set_slot(&self, index: usize, value: Value) -> BridgeResult<()>;
    fn has_slot(&self, index: usize) -> BridgeResult<bool>;
    fn delete_slot(&self, index: usize) -> BridgeResult<()>;

    /// Keys at the time of the call, in backing order.
    fn enumerate_keys(&self) -> Vec<String>;
    /// Values at the time of the call, translated.
    fn enumerate_values(&self) -> Vec<Value>;
}
