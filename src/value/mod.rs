//! Native value model
//!
//! Host-side data handed to script helpers. Composite values are shared
//! stores: cloning a [`NativeMap`] or [`NativeSeq`] handle aliases the same
//! backing storage, and the store address is its identity.

use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::bridge::Bridge;

/// Identity of a backing store (its address while alive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreId(usize);

/// A host value.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Text(String),
    Map(NativeMap),
    Seq(NativeSeq),
    /// A value that already crossed the boundary.
    Bridge(Bridge),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&NativeMap> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&NativeSeq> {
        match self {
            Value::Seq(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bridge(&self) -> Option<&Bridge> {
        match self {
            Value::Bridge(b) => Some(b),
            _ => None,
        }
    }

    /// Strip a bridge back to the store it wraps.
    pub fn into_native(self) -> Value {
        match self {
            Value::Bridge(bridge) => bridge.backing(),
            other => other,
        }
    }

    /// Identity of the composite store behind this value, bridged or not.
    pub fn store_id(&self) -> Option<StoreId> {
        match self {
            Value::Map(m) => Some(m.id()),
            Value::Seq(s) => Some(s.id()),
            Value::Bridge(b) => Some(b.store_id()),
            _ => None,
        }
    }

    /// JSON snapshot. Stores already on the current path render as `null`.
    pub fn to_json(&self) -> serde_json::Value {
        self.to_json_guarded(&mut HashSet::new())
    }

    fn to_json_guarded(&self, path: &mut HashSet<StoreId>) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(n) => Json::from(*n),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Char(c) => Json::String(c.to_string()),
            Value::Text(s) => Json::String(s.clone()),
            Value::Bridge(b) => b.backing().to_json_guarded(path),
            Value::Map(m) => {
                if !path.insert(m.id()) {
                    return Json::Null;
                }
                let obj = m
                    .entries()
                    .into_iter()
                    .map(|(k, v)| (k, v.to_json_guarded(path)))
                    .collect();
                path.remove(&m.id());
                Json::Object(obj)
            }
            Value::Seq(s) => {
                if !path.insert(s.id()) {
                    return Json::Null;
                }
                let arr = s
                    .to_vec()
                    .iter()
                    .map(|v| v.to_json_guarded(path))
                    .collect();
                path.remove(&s.id());
                Json::Array(arr)
            }
        }
    }
}

/// Primitives compare by value, composites by store identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                *a as f64 == *b
            }
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a.ptr_eq(b),
            (Value::Seq(a), Value::Seq(b)) => a.ptr_eq(b),
            (Value::Bridge(a), Value::Bridge(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Char(c) => write!(f, "Char({c:?})"),
            Value::Text(s) => write!(f, "Text({s:?})"),
            Value::Map(m) => m.fmt(f),
            Value::Seq(s) => s.fmt(f),
            Value::Bridge(b) => b.fmt(f),
        }
    }
}

/// Generic stringification used when a helper result is not already text.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Char(c) => write!(f, "{c}"),
            Value::Text(s) => f.write_str(s),
            composite => write!(f, "{}", composite.to_json()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::Text(s),
            Json::Array(items) => Value::Seq(items.into_iter().map(Value::from).collect()),
            Json::Object(obj) => Value::Map(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect()),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v.into())
            }
        })*
    };
}

value_from! {
    bool => Bool,
    i32 => Int,
    i64 => Int,
    u32 => Int,
    f64 => Float,
    char => Char,
    String => Text,
    &str => Text,
    NativeMap => Map,
    NativeSeq => Seq,
    Bridge => Bridge,
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Seq(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Ordered, string-keyed shared mapping.
#[derive(Clone, Default)]
pub struct NativeMap(Rc<RefCell<IndexMap<String, Value>>>);

impl NativeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> StoreId {
        StoreId(Rc::as_ptr(&self.0) as *const () as usize)
    }

    pub fn ptr_eq(&self, other: &NativeMap) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    /// Inserts or replaces; a new key goes to the end, an existing key keeps its position.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.borrow_mut().insert(key.into(), value.into())
    }

    /// Removes a key without disturbing the order of the others.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.borrow_mut().shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.0.borrow().values().cloned().collect()
    }

    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for NativeMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let map = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<IndexMap<_, _>>();
        NativeMap(Rc::new(RefCell::new(map)))
    }
}

impl fmt::Debug for NativeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Shallow on purpose: stores may be cyclic.
        f.debug_struct("NativeMap")
            .field("id", &self.id())
            .field("keys", &self.keys())
            .finish()
    }
}

/// Ordered, 0-indexed, growable shared sequence.
#[derive(Clone, Default)]
pub struct NativeSeq(Rc<RefCell<Vec<Value>>>);

impl NativeSeq {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> StoreId {
        StoreId(Rc::as_ptr(&self.0) as *const () as usize)
    }

    pub fn ptr_eq(&self, other: &NativeSeq) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    /// Replaces the element at `index`, returning the old one; `None` if out of range.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> Option<Value> {
        let mut items = self.0.borrow_mut();
        let slot = items.get_mut(index)?;
        Some(std::mem::replace(slot, value.into()))
    }

    pub fn push(&self, value: impl Into<Value>) {
        self.0.borrow_mut().push(value.into());
    }

    /// Removes the element at `index`, shifting later elements down.
    pub fn remove(&self, index: usize) -> Option<Value> {
        let mut items = self.0.borrow_mut();
        (index < items.len()).then(|| items.remove(index))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }
}

impl<V: Into<Value>> FromIterator<V> for NativeSeq {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        NativeSeq(Rc::new(RefCell::new(
            iter.into_iter().map(Into::into).collect(),
        )))
    }
}

impl fmt::Debug for NativeSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeSeq")
            .field("id", &self.id())
            .field("len", &self.len())
            .finish()
    }
}
