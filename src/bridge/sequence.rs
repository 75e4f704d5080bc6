//! Sequence bridge: indexed-slot access over a host sequence.
//!
//! The only named member is the read-only `length`. Any other name is
//! rejected so scripts cannot treat a sequence as a general object.

use std::rc::Rc;

use super::protocol::{DynamicObject, Lookup, ObjectKind};
use super::translator::TranslatorState;
use super::TranslationPolicy;
use crate::core::error::{BridgeError, BridgeResult};
use crate::value::{NativeSeq, Value};

/// Reserved member name on sequence bridges.
pub const LENGTH: &str = "length";

#[derive(Clone)]
pub struct SequenceBridge {
    inner: Rc<SequenceInner>,
}

struct SequenceInner {
    store: NativeSeq,
    translator: Rc<TranslatorState>,
}

impl SequenceBridge {
    pub(crate) fn new(store: NativeSeq, translator: Rc<TranslatorState>) -> Self {
        Self {
            inner: Rc::new(SequenceInner { store, translator }),
        }
    }

    pub fn store(&self) -> &NativeSeq {
        &self.inner.store
    }

    pub fn len(&self) -> usize {
        self.inner.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.store.is_empty()
    }

    pub fn ptr_eq(&self, other: &SequenceBridge) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn by_name<T>(&self, operation: &'static str) -> BridgeResult<T> {
        Err(BridgeError::unsupported(ObjectKind::Sequence, operation))
    }
}

impl DynamicObject for SequenceBridge {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Sequence
    }

    fn get_member(&self, name: &str) -> BridgeResult<Lookup> {
        if name == LENGTH {
            return Ok(Lookup::Found(Value::Int(self.len() as i64)));
        }
        self.by_name("access by name")
    }

    fn set_member(&self, name: &str, _value: Value) -> BridgeResult<()> {
        if name == LENGTH {
            return self.by_name("assignment to length");
        }
        self.by_name("access by name")
    }

    fn has_member(&self, name: &str) -> BridgeResult<bool> {
        if name == LENGTH {
            return Ok(true);
        }
        self.by_name("access by name")
    }

    fn delete_member(&self, name: &str) -> BridgeResult<()> {
        if name == LENGTH {
            return self.by_name("deletion of length");
        }
        self.by_name("access by name")
    }

    fn get_slot(&self, index: usize) -> BridgeResult<Lookup> {
        Ok(match self.inner.store.get(index) {
            Some(value) => Lookup::Found(self.inner.translator.translate(value)),
            None => Lookup::NotFound,
        })
    }

    /// Replaces in range, appends at `length`, fails past it.
    fn set_slot(&self, index: usize, value: Value) -> BridgeResult<()> {
        let value = value.into_native();
        if self.inner.translator.policy() == TranslationPolicy::Eager {
            self.inner.translator.translate(value.clone());
        }

        let length = self.len();
        if index < length {
            self.inner.store.set(index, value);
        } else if index == length {
            self.inner.store.push(value);
        } else {
            return Err(BridgeError::IndexOutOfBounds { index, length });
        }
        Ok(())
    }

    fn has_slot(&self, index: usize) -> BridgeResult<bool> {
        Ok(index < self.len())
    }

    /// Removes and shifts later elements down; a missing slot is a no-op.
    fn delete_slot(&self, index: usize) -> BridgeResult<()> {
        self.inner.store.remove(index);
        Ok(())
    }

    fn enumerate_keys(&self) -> Vec<String> {
        (0..self.len()).map(|i| i.to_string()).collect()
    }

    fn enumerate_values(&self) -> Vec<Value> {
        self.inner
            .store
            .to_vec()
            .into_iter()
            .map(|v| self.inner.translator.translate(v))
            .collect()
    }
}
