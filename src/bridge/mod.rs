//! Host-object bridge
//!
//! Exposes host mappings and sequences through the dynamic-object protocol
//! a script runtime uses for member and index access.
//!
//! ```text
//!   host Value ──► policy::needs_translation ──► Translator ──► Bridge
//!                                                  │             ├─ MappingBridge  (named members)
//!                                                  │             └─ SequenceBridge (indexed slots + length)
//!                                                  └─ identity cache: one bridge per backing store
//! ```

pub mod mapping;
pub mod policy;
pub mod protocol;
pub mod sequence;
pub mod translator;

pub use mapping::MappingBridge;
pub use policy::{needs_translation, TranslationPolicy};
pub use protocol::{DynamicObject, Lookup, ObjectKind};
pub use sequence::SequenceBridge;
pub use translator::Translator;

use std::fmt;

use crate::core::error::BridgeResult;
use crate::value::{StoreId, Value};

/// A bridged composite: one of the two protocol shapes.
#[derive(Clone)]
pub enum Bridge {
    Mapping(MappingBridge),
    Sequence(SequenceBridge),
}

impl Bridge {
    /// Identity of the wrapped store.
    pub fn store_id(&self) -> StoreId {
        match self {
            Bridge::Mapping(m) => m.store().id(),
            Bridge::Sequence(s) => s.store().id(),
        }
    }

    /// The wrapped store as a plain host value (same store, not a copy).
    pub fn backing(&self) -> Value {
        match self {
            Bridge::Mapping(m) => Value::Map(m.store().clone()),
            Bridge::Sequence(s) => Value::Seq(s.store().clone()),
        }
    }

    /// Untranslated children, snapshotted.
    pub(crate) fn backing_values(&self) -> Vec<Value> {
        match self {
            Bridge::Mapping(m) => m.store().values(),
            Bridge::Sequence(s) => s.store().to_vec(),
        }
    }

    pub fn ptr_eq(&self, other: &Bridge) -> bool {
        match (self, other) {
            (Bridge::Mapping(a), Bridge::Mapping(b)) => a.ptr_eq(b),
            (Bridge::Sequence(a), Bridge::Sequence(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    fn as_object(&self) -> &dyn DynamicObject {
        match self {
            Bridge::Mapping(m) => m,
            Bridge::Sequence(s) => s,
        }
    }
}

impl DynamicObject for Bridge {
    fn kind(&self) -> ObjectKind {
        self.as_object().kind()
    }

    fn get_member(&self, name: &str) -> BridgeResult<Lookup> {
        self.as_object().get_member(name)
    }

    fn set_member(&self, name: &str, value: Value) -> BridgeResult<()> {
        self.as_object().set_member(name, value)
    }

    fn has_member(&self, name: &str) -> BridgeResult<bool> {
        self.as_object().has_member(name)
    }

    fn delete_member(&self, name: &str) -> BridgeResult<()> {
        self.as_object().delete_member(name)
    }

    fn get_slot(&self, index: usize) -> BridgeResult<Lookup> {
        self.as_object().get_slot(index)
    }

    fn set_slot(&self, index: usize, value: Value) -> BridgeResult<()> {
        self.as_object().set_slot(index, value)
    }

    fn has_slot(&self, index: usize) -> BridgeResult<bool> {
        self.as_object().has_slot(index)
    }

    fn delete_slot(&self, index: usize) -> BridgeResult<()> {
        self.as_object().delete_slot(index)
    }

    fn enumerate_keys(&self) -> Vec<String> {
        self.as_object().enumerate_keys()
    }

    fn enumerate_values(&self) -> Vec<Value> {
        self.as_object().enumerate_values()
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("kind", &self.kind())
            .field("store", &self.store_id())
            .finish()
    }
}
