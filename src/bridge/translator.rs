//! Recursive translator
//!
//! Owns the identity cache for one session: every backing store maps to
//! exactly one bridge, so repeated reads return the same bridge and no
//! store is ever wrapped twice. The cache is keyed by store identity and
//! kept apart from the stores themselves; a store mutated natively is
//! always re-read, never served from a stale copy.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use super::mapping::MappingBridge;
use super::policy::{needs_translation, translate_primitive, TranslationPolicy};
use super::protocol::DynamicObject;
use super::sequence::SequenceBridge;
use super::Bridge;
use crate::value::{StoreId, Value};

/// Session handle. Dropping it closes the session.
pub struct Translator {
    state: Rc<TranslatorState>,
}

pub(crate) struct TranslatorState {
    policy: TranslationPolicy,
    registry: RefCell<HashMap<StoreId, Bridge>>,
    closed: Cell<bool>,
}

impl Translator {
    pub fn new(policy: TranslationPolicy) -> Self {
        Self {
            state: Rc::new(TranslatorState {
                policy,
                registry: RefCell::new(HashMap::new()),
                closed: Cell::new(false),
            }),
        }
    }

    pub fn policy(&self) -> TranslationPolicy {
        self.state.policy
    }

    /// Bridges composites, applies primitive rules to everything else.
    /// Translating a bridge returns it unchanged.
    pub fn translate(&self, value: Value) -> Value {
        self.state.translate(value)
    }

    /// The bridge already created for `id`, if any.
    pub fn lookup(&self, id: StoreId) -> Option<Bridge> {
        self.state.registry.borrow().get(&id).cloned()
    }

    pub fn bridge_count(&self) -> usize {
        self.state.registry.borrow().len()
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.get()
    }

    /// Drops the identity cache. Bridges handed out earlier keep working
    /// but children read through them are no longer memoized.
    pub fn close(&self) {
        if self.state.closed.replace(true) {
            return;
        }
        let released = std::mem::take(&mut *self.state.registry.borrow_mut());
        tracing::trace!(target: "bridge", bridges = released.len(), "translator closed");
    }
}

impl Drop for Translator {
    fn drop(&mut self) {
        self.close();
    }
}

impl TranslatorState {
    pub(crate) fn policy(&self) -> TranslationPolicy {
        self.policy
    }

    pub(crate) fn translate(self: &Rc<Self>, value: Value) -> Value {
        match value {
            Value::Map(map) => {
                let id = map.id();
                Value::Bridge(self.bridge_for(id, || {
                    Bridge::Mapping(MappingBridge::new(map, Rc::clone(self)))
                }))
            }
            Value::Seq(seq) => {
                let id = seq.id();
                Value::Bridge(self.bridge_for(id, || {
                    Bridge::Sequence(SequenceBridge::new(seq, Rc::clone(self)))
                }))
            }
            other => translate_primitive(other),
        }
    }

    fn bridge_for(self: &Rc<Self>, id: StoreId, make: impl FnOnce() -> Bridge) -> Bridge {
        if let Some(existing) = self.registry.borrow().get(&id) {
            return existing.clone();
        }

        let bridge = make();
        if self.closed.get() {
            return bridge;
        }
        // Registered before descending so cycles terminate.
        self.registry.borrow_mut().insert(id, bridge.clone());
        tracing::trace!(target: "bridge", kind = %bridge.kind(), policy = %self.policy, "bridge created");

        if self.policy == TranslationPolicy::Eager {
            for child in bridge.backing_values() {
                if needs_translation(&child) {
                    self.translate(child);
                }
            }
        }
        bridge
    }
}
