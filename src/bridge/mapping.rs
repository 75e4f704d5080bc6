//! Mapping bridge: named-member access over an ordered host mapping.

use std::rc::Rc;

use super::protocol::{DynamicObject, Lookup, ObjectKind};
use super::translator::TranslatorState;
use super::TranslationPolicy;
use crate::core::error::{BridgeError, BridgeResult};
use crate::value::{NativeMap, Value};

/// View over a [`NativeMap`]. Wraps the store directly, so writes on
/// either side are visible on the other.
#[derive(Clone)]
pub struct MappingBridge {
    inner: Rc<MappingInner>,
}

struct MappingInner {
    store: NativeMap,
    translator: Rc<TranslatorState>,
}

impl MappingBridge {
    pub(crate) fn new(store: NativeMap, translator: Rc<TranslatorState>) -> Self {
        Self {
            inner: Rc::new(MappingInner { store, translator }),
        }
    }

    pub fn store(&self) -> &NativeMap {
        &self.inner.store
    }

    pub fn ptr_eq(&self, other: &MappingBridge) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn index_unsupported<T>(&self) -> BridgeResult<T> {
        Err(BridgeError::unsupported(
            ObjectKind::Mapping,
            "access by index",
        ))
    }
}

impl DynamicObject for MappingBridge {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Mapping
    }

    fn get_member(&self, name: &str) -> BridgeResult<Lookup> {
        Ok(match self.inner.store.get(name) {
            Some(value) => Lookup::Found(self.inner.translator.translate(value)),
            None => Lookup::NotFound,
        })
    }

    fn set_member(&self, name: &str, value: Value) -> BridgeResult<()> {
        let value = value.into_native();
        if self.inner.translator.policy() == TranslationPolicy::Eager {
            self.inner.translator.translate(value.clone());
        }
        self.inner.store.insert(name, value);
        Ok(())
    }

    fn has_member(&self, name: &str) -> BridgeResult<bool> {
        Ok(self.inner.store.contains_key(name))
    }

    fn delete_member(&self, name: &str) -> BridgeResult<()> {
        self.inner.store.remove(name);
        Ok(())
    }

    fn get_slot(&self, _index: usize) -> BridgeResult<Lookup> {
        self.index_unsupported()
    }

    fn set_slot(&self, _index: usize, _value: Value) -> BridgeResult<()> {
        self.index_unsupported()
    }

    fn has_slot(&self, _index: usize) -> BridgeResult<bool> {
        self.index_unsupported()
    }

    fn delete_slot(&self, _index: usize) -> BridgeResult<()> {
        self.index_unsupported()
    }

    fn enumerate_keys(&self) -> Vec<String> {
        self.inner.store.keys()
    }

    fn enumerate_values(&self) -> Vec<Value> {
        self.inner
            .store
            .values()
            .into_iter()
            .map(|v| self.inner.translator.translate(v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::Translator;
    use serde_json::json;

    fn bridge_of(translator: &Translator, json: serde_json::Value) -> MappingBridge {
        match translator.translate(Value::from(json)) {
            Value::Bridge(crate::bridge::Bridge::Mapping(m)) => m,
            other => panic!("expected mapping bridge, got {other:?}"),
        }
    }

    #[test]
    fn test_get_set_has_delete() {
        let translator = Translator::new(TranslationPolicy::Lazy);
        let bridge = bridge_of(&translator, json!({"a": 1}));

        assert_eq!(bridge.get_member("a").unwrap(), Lookup::Found(Value::Int(1)));
        assert_eq!(bridge.get_member("missing").unwrap(), Lookup::NotFound);

        bridge.set_member("b", Value::from("two")).unwrap();
        assert!(bridge.has_member("b").unwrap());
        assert_eq!(bridge.store().get("b"), Some(Value::from("two")));

        bridge.delete_member("a").unwrap();
        assert!(!bridge.has_member("a").unwrap());
        assert_eq!(bridge.enumerate_keys(), vec!["b"]);
    }

    #[test]
    fn test_absent_differs_from_null() {
        let translator = Translator::new(TranslationPolicy::Lazy);
        let bridge = bridge_of(&translator, json!({"nothing": null}));

        assert_eq!(
            bridge.get_member("nothing").unwrap(),
            Lookup::Found(Value::Null)
        );
        assert_eq!(bridge.get_member("absent").unwrap(), Lookup::NotFound);
        // Collapsed view for protocols without an absent sentinel.
        assert_eq!(bridge.get_member("absent").unwrap().or_null(), Value::Null);
    }

    #[test]
    fn test_indexed_access_unsupported() {
        let translator = Translator::new(TranslationPolicy::Lazy);
        let bridge = bridge_of(&translator, json!({"0": "zero"}));

        for result in [
            bridge.get_slot(0).map(|_| ()),
            bridge.set_slot(0, Value::Null),
            bridge.has_slot(0).map(|_| ()),
            bridge.delete_slot(0),
        ] {
            let err = result.unwrap_err();
            assert!(err.is_unsupported());
            assert_eq!(
                err.to_string(),
                "access by index not supported on a mapping object"
            );
        }
        // The store is untouched.
        assert_eq!(bridge.store().get("0"), Some(Value::from("zero")));
    }

    #[test]
    fn test_writes_are_shared_with_store() {
        let translator = Translator::new(TranslationPolicy::Lazy);
        let store = NativeMap::new();
        let bridge = match translator.translate(Value::Map(store.clone())) {
            Value::Bridge(crate::bridge::Bridge::Mapping(m)) => m,
            _ => unreachable!(),
        };

        store.insert("native", true);
        assert_eq!(
            bridge.get_member("native").unwrap(),
            Lookup::Found(Value::Bool(true))
        );

        bridge.set_member("foreign", Value::Int(7)).unwrap();
        assert_eq!(store.get("foreign"), Some(Value::Int(7)));
    }

    #[test]
    fn test_bridged_write_is_stored_natively() {
        let translator = Translator::new(TranslationPolicy::Lazy);
        let bridge = bridge_of(&translator, json!({"list": [1, 2]}));

        let list = bridge.get_member("list").unwrap().into_option().unwrap();
        assert!(list.as_bridge().is_some());
        bridge.set_member("alias", list.clone()).unwrap();

        // The store holds the native sequence, not the bridge.
        assert!(bridge.store().get("alias").unwrap().as_seq().is_some());
        // Reading it back yields the same bridge.
        assert_eq!(
            bridge.get_member("alias").unwrap(),
            Lookup::Found(list)
        );
    }

    #[test]
    fn test_enumerate_values_translates() {
        let translator = Translator::new(TranslationPolicy::Lazy);
        let bridge = bridge_of(&translator, json!({"n": 1, "c": {"x": 1}, "s": [1]}));

        let values = bridge.enumerate_values();
        assert_eq!(values[0], Value::Int(1));
        assert!(matches!(
            values[1].as_bridge().map(|b| b.kind()),
            Some(ObjectKind::Mapping)
        ));
        assert!(matches!(
            values[2].as_bridge().map(|b| b.kind()),
            Some(ObjectKind::Sequence)
        ));
    }
}
