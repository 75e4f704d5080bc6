//! QuickJS adapter for the host-object bridge
//!
//! Lazy sessions hand scripts a `Proxy` per bridge: the proxy target is an
//! empty object carrying only a session tag under a registered symbol, and
//! every trap forwards to the bridge. Eager sessions materialize plain JS objects and arrays from the
//! fully translated graph instead.
//!
//! Property keys arrive as strings; a canonical array index (`"0"`, `"17"`)
//! is routed to the slot surface, anything else to the member surface.

use rquickjs::convert::Coerced;
use rquickjs::function::This;
use rquickjs::function::Constructor;
use rquickjs::{Array, Ctx, Exception, Function, Object, Value as JsValue};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::bridge::sequence::LENGTH;
use crate::bridge::{Bridge, DynamicObject, Lookup, ObjectKind, TranslationPolicy, Translator};
use crate::core::error::{BridgeError, BridgeResult};
use crate::value::{NativeMap, NativeSeq, StoreId, Value};

/// Description of the registered symbol keying the session tag on every
/// proxy target. Symbol keys never reach the member surface, so host data
/// may use the same text as an ordinary key.
const BRIDGE_TAG: &str = "__hostBridge";
const CACHE_KEY: &str = "cache";
const MAX_IMPORT_DEPTH: usize = 256;

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Rust half of one call scope: translator plus proxy handles.
pub(crate) struct JsSession {
    id: u64,
    translator: Translator,
    handles: RefCell<Vec<Bridge>>,
    index: RefCell<HashMap<StoreId, usize>>,
}

impl JsSession {
    pub(crate) fn new(policy: TranslationPolicy) -> Rc<Self> {
        Rc::new(Self {
            id: NEXT_SESSION.fetch_add(1, Ordering::Relaxed),
            translator: Translator::new(policy),
            handles: RefCell::new(Vec::new()),
            index: RefCell::new(HashMap::new()),
        })
    }

    pub(crate) fn policy(&self) -> TranslationPolicy {
        self.translator.policy()
    }

    fn handle_for(&self, bridge: &Bridge) -> usize {
        let id = bridge.store_id();
        if let Some(&handle) = self.index.borrow().get(&id) {
            return handle;
        }
        let mut handles = self.handles.borrow_mut();
        handles.push(bridge.clone());
        let handle = handles.len() - 1;
        self.index.borrow_mut().insert(id, handle);
        handle
    }

    fn tag(&self, handle: usize) -> String {
        format!("{}:{}", self.id, handle)
    }

    /// Bridge behind a tag minted by this session.
    fn resolve_tag(&self, tag: &str) -> Option<Bridge> {
        let (session, handle) = tag.split_once(':')?;
        if session.parse::<u64>().ok()? != self.id {
            return None;
        }
        self.handles.borrow().get(handle.parse::<usize>().ok()?).cloned()
    }

    pub(crate) fn close(&self) {
        self.translator.close();
    }

    /// Converts a script value back to a host value. Proxies minted by this
    /// session come back as their bridge; plain objects and arrays become
    /// fresh host stores.
    pub(crate) fn import<'js>(&self, ctx: &Ctx<'js>, value: JsValue<'js>) -> rquickjs::Result<Value> {
        let tag_key = bridge_tag_key(ctx)?;
        self.import_at(ctx, &tag_key, value, 0)
            .map_err(|e| throw_bridge_error(ctx, e))
    }

    fn import_at<'js>(
        &self,
        ctx: &Ctx<'js>,
        tag_key: &JsValue<'js>,
        value: JsValue<'js>,
        depth: usize,
    ) -> BridgeResult<Value> {
        if depth > MAX_IMPORT_DEPTH {
            return Err(BridgeError::Conversion(format!(
                "value nested deeper than {MAX_IMPORT_DEPTH} levels"
            )));
        }
        if value.is_undefined() || value.is_null() {
            return Ok(Value::Null);
        }
        if let Some(b) = value.as_bool() {
            return Ok(Value::Bool(b));
        }
        if let Some(n) = value.as_int() {
            return Ok(Value::Int(n as i64));
        }
        if let Some(f) = value.as_float() {
            return Ok(number_value(f));
        }
        if let Some(s) = value.as_string() {
            return Ok(Value::Text(s.to_string()?));
        }
        if value.is_function() {
            return Err(BridgeError::Conversion(
                "functions cannot be stored on host objects".to_string(),
            ));
        }
        if value.is_symbol() {
            return Err(BridgeError::Conversion(
                "symbols cannot be stored on host objects".to_string(),
            ));
        }
        if let Some(array) = value.as_array() {
            let seq = NativeSeq::new();
            for item in array.iter::<JsValue>() {
                seq.push(self.import_at(ctx, tag_key, item?, depth + 1)?);
            }
            return Ok(Value::Seq(seq));
        }
        if let Some(object) = value.as_object() {
            if let Some(tag) = object.get::<_, Option<String>>(tag_key.clone())? {
                if let Some(bridge) = self.resolve_tag(&tag) {
                    return Ok(Value::Bridge(bridge));
                }
            }
            let map = NativeMap::new();
            for key in object.keys::<String>() {
                let key = key?;
                let item: JsValue = object.get(key.as_str())?;
                map.insert(key, self.import_at(ctx, tag_key, item, depth + 1)?);
            }
            return Ok(Value::Map(map));
        }
        Err(BridgeError::Conversion(format!(
            "unsupported script value of type {:?}",
            value.type_of()
        )))
    }
}

/// `Symbol.for(BRIDGE_TAG)`, the same value in every context of a runtime.
fn bridge_tag_key<'js>(ctx: &Ctx<'js>) -> rquickjs::Result<JsValue<'js>> {
    let symbol: Object = ctx.globals().get("Symbol")?;
    let registry: Function = symbol.get("for")?;
    registry.call((BRIDGE_TAG,))
}

fn number_value(f: f64) -> Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if f.fract() == 0.0 && f.abs() <= MAX_SAFE {
        Value::Int(f as i64)
    } else {
        Value::Float(f)
    }
}

/// Raises a bridge failure inside the script as a `TypeError`.
pub(crate) fn throw_bridge_error(ctx: &Ctx<'_>, err: BridgeError) -> rquickjs::Error {
    match err {
        BridgeError::Script(inner) => inner,
        other => Exception::throw_type(ctx, &other.to_string()),
    }
}

enum PropertyKey<'js> {
    Index(usize),
    Name(String),
    Symbol(JsValue<'js>),
}

impl<'js> PropertyKey<'js> {
    fn classify(key: JsValue<'js>) -> rquickjs::Result<Self> {
        if key.is_symbol() {
            return Ok(PropertyKey::Symbol(key));
        }
        let name = match key.as_string() {
            Some(s) => s.to_string()?,
            None => key.get::<Coerced<String>>()?.0,
        };
        Ok(match array_index(&name) {
            Some(index) => PropertyKey::Index(index),
            None => PropertyKey::Name(name),
        })
    }
}

/// Canonical array index: decimal, no leading zeros, below 2^32 - 1.
fn array_index(name: &str) -> Option<usize> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if name.len() > 1 && name.starts_with('0') {
        return None;
    }
    match name.parse::<u32>() {
        Ok(n) if n != u32::MAX => Some(n as usize),
        _ => None,
    }
}

/// Script-side view of a session inside one `Ctx`.
pub(crate) struct JsScope<'js> {
    ctx: Ctx<'js>,
    session: Rc<JsSession>,
    handler: Object<'js>,
    materialized: RefCell<HashMap<StoreId, JsValue<'js>>>,
}

impl<'js> JsScope<'js> {
    /// New session with its own proxy handler and identity cache.
    pub(crate) fn open(ctx: &Ctx<'js>, policy: TranslationPolicy) -> rquickjs::Result<Self> {
        let session = JsSession::new(policy);
        let handler = install_traps(ctx, &session)?;
        tracing::trace!(target: "bindings", session = session.id, %policy, "scope opened");
        Ok(Self::attach(ctx.clone(), session, handler))
    }

    fn attach(ctx: Ctx<'js>, session: Rc<JsSession>, handler: Object<'js>) -> Self {
        Self {
            ctx,
            session,
            handler,
            materialized: RefCell::new(HashMap::new()),
        }
    }

    pub(crate) fn session(&self) -> &Rc<JsSession> {
        &self.session
    }

    /// Host value to script value, per the session's policy.
    pub(crate) fn export(&self, value: Value) -> rquickjs::Result<JsValue<'js>> {
        match self.session.translator.translate(value) {
            Value::Bridge(bridge) => match self.session.policy() {
                TranslationPolicy::Lazy => self.proxy_for(bridge),
                TranslationPolicy::Eager => {
                    let mut done = self.materialized.borrow_mut();
                    self.materialize(bridge, &mut done)
                }
            },
            primitive => primitive_to_js(&self.ctx, primitive),
        }
    }

    pub(crate) fn import(&self, value: JsValue<'js>) -> rquickjs::Result<Value> {
        self.session.import(&self.ctx, value)
    }

    /// Helper result to host text. Strings pass verbatim and `null` or
    /// `undefined` mean no output. Plain objects, arrays and host proxies
    /// come back through `import` and render as JSON, the same under both
    /// policies; anything else goes through `String(value)`.
    pub(crate) fn result_text(&self, value: JsValue<'js>) -> rquickjs::Result<Option<String>> {
        if value.is_undefined() || value.is_null() {
            return Ok(None);
        }
        if let Some(s) = value.as_string() {
            return Ok(Some(s.to_string()?));
        }
        if self.is_plain_data(&value)? {
            return Ok(Some(self.import(value)?.into_native().to_string()));
        }
        Ok(Some(value.get::<Coerced<String>>()?.0))
    }

    /// Arrays, and objects whose prototype is `Object.prototype` or `null`.
    /// Proxy targets are plain objects, so host proxies count too.
    fn is_plain_data(&self, value: &JsValue<'js>) -> rquickjs::Result<bool> {
        if value.is_array() {
            return Ok(true);
        }
        let Some(object) = value.as_object() else {
            return Ok(false);
        };
        if value.is_function() {
            return Ok(false);
        }
        let object_ctor: Object = self.ctx.globals().get("Object")?;
        let get_prototype: Function = object_ctor.get("getPrototypeOf")?;
        let proto: JsValue = get_prototype.call((object.clone(),))?;
        let plain: JsValue = object_ctor.get("prototype")?;
        Ok(proto.is_null() || proto == plain)
    }

    /// Drops the identity cache on both sides. Proxies that escaped the
    /// scope stay usable but are no longer memoized.
    pub(crate) fn close(&self) {
        self.session.close();
        self.materialized.borrow_mut().clear();
        let reset = Object::new(self.ctx.clone()).and_then(|fresh| self.handler.set(CACHE_KEY, fresh));
        if let Err(e) = reset {
            tracing::warn!(target: "bindings", session = self.session.id, "failed to reset proxy cache: {}", e);
        }
        tracing::trace!(target: "bindings", session = self.session.id, "scope closed");
    }

    fn proxy_for(&self, bridge: Bridge) -> rquickjs::Result<JsValue<'js>> {
        let handle = self.session.handle_for(&bridge);
        let key = handle.to_string();
        let cache: Object = self.handler.get(CACHE_KEY)?;
        if let Some(existing) = cache.get::<_, Option<Object>>(key.as_str())? {
            return Ok(existing.into_value());
        }

        let target = Object::new(self.ctx.clone())?;
        target.set(bridge_tag_key(&self.ctx)?, self.session.tag(handle))?;
        let proxy_ctor: Constructor = self.ctx.globals().get("Proxy")?;
        let proxy: Object = proxy_ctor.construct((target, self.handler.clone()))?;
        cache.set(key.as_str(), proxy.clone())?;
        Ok(proxy.into_value())
    }

    fn materialize(
        &self,
        bridge: Bridge,
        done: &mut HashMap<StoreId, JsValue<'js>>,
    ) -> rquickjs::Result<JsValue<'js>> {
        let id = bridge.store_id();
        if let Some(existing) = done.get(&id) {
            return Ok(existing.clone());
        }

        match bridge.kind() {
            ObjectKind::Mapping => {
                let object = Object::new(self.ctx.clone())?;
                done.insert(id, object.clone().into_value());
                for key in bridge.enumerate_keys() {
                    let lookup = bridge.get_member(&key).map_err(|e| self.throw(e))?;
                    if let Lookup::Found(child) = lookup {
                        object.set(key.as_str(), self.materialize_value(child, done)?)?;
                    }
                }
                Ok(object.into_value())
            }
            ObjectKind::Sequence => {
                let array = Array::new(self.ctx.clone())?;
                done.insert(id, array.clone().into_value());
                for (i, child) in bridge.enumerate_values().into_iter().enumerate() {
                    array.set(i, self.materialize_value(child, done)?)?;
                }
                Ok(array.into_value())
            }
        }
    }

    fn materialize_value(
        &self,
        value: Value,
        done: &mut HashMap<StoreId, JsValue<'js>>,
    ) -> rquickjs::Result<JsValue<'js>> {
        match value {
            Value::Bridge(bridge) => self.materialize(bridge, done),
            primitive => primitive_to_js(&self.ctx, primitive),
        }
    }

    fn throw(&self, err: BridgeError) -> rquickjs::Error {
        throw_bridge_error(&self.ctx, err)
    }

    fn resolve(&self, target: &Object<'js>) -> rquickjs::Result<Bridge> {
        let tag: String = target.get(bridge_tag_key(&self.ctx)?)?;
        self.session
            .resolve_tag(&tag)
            .ok_or_else(|| Exception::throw_type(&self.ctx, "host object belongs to another scope"))
    }

    fn found_to_js(&self, result: BridgeResult<Lookup>) -> rquickjs::Result<JsValue<'js>> {
        match result.map_err(|e| self.throw(e))? {
            Lookup::Found(value) => self.export(value),
            Lookup::NotFound => Ok(JsValue::new_undefined(self.ctx.clone())),
        }
    }

    /// Well-known symbols resolve against the matching builtin prototype,
    /// so a sequence proxy picks up `Array.prototype[Symbol.iterator]`.
    fn symbol_fallback(&self, kind: ObjectKind, symbol: JsValue<'js>) -> rquickjs::Result<JsValue<'js>> {
        let builtin = match kind {
            ObjectKind::Sequence => "Array",
            ObjectKind::Mapping => "Object",
        };
        let ctor: Object = self.ctx.globals().get(builtin)?;
        let proto: Object = ctor.get("prototype")?;
        proto.get::<JsValue, JsValue>(symbol)
    }

    fn trap_get(&self, target: Object<'js>, key: JsValue<'js>) -> rquickjs::Result<JsValue<'js>> {
        let bridge = self.resolve(&target)?;
        match PropertyKey::classify(key)? {
            PropertyKey::Symbol(symbol) => {
                if target.contains_key(symbol.clone())? {
                    return target.get(symbol);
                }
                self.symbol_fallback(bridge.kind(), symbol)
            }
            PropertyKey::Index(index) => self.found_to_js(bridge.get_slot(index)),
            PropertyKey::Name(name) => self.found_to_js(bridge.get_member(&name)),
        }
    }

    fn trap_set(&self, target: Object<'js>, key: JsValue<'js>, value: JsValue<'js>) -> rquickjs::Result<bool> {
        let bridge = self.resolve(&target)?;
        let key = PropertyKey::classify(key)?;
        let value = self.import(value)?;
        let result = match key {
            PropertyKey::Symbol(_) => Err(BridgeError::Conversion(
                "symbol keys cannot be stored on host objects".to_string(),
            )),
            PropertyKey::Index(index) => bridge.set_slot(index, value),
            PropertyKey::Name(name) => bridge.set_member(&name, value),
        };
        result.map_err(|e| self.throw(e))?;
        Ok(true)
    }

    fn trap_has(&self, target: Object<'js>, key: JsValue<'js>) -> rquickjs::Result<bool> {
        let bridge = self.resolve(&target)?;
        let result = match PropertyKey::classify(key)? {
            PropertyKey::Symbol(_) => Ok(false),
            PropertyKey::Index(index) => bridge.has_slot(index),
            PropertyKey::Name(name) => bridge.has_member(&name),
        };
        result.map_err(|e| self.throw(e))
    }

    fn trap_delete(&self, target: Object<'js>, key: JsValue<'js>) -> rquickjs::Result<bool> {
        let bridge = self.resolve(&target)?;
        let result = match PropertyKey::classify(key)? {
            PropertyKey::Symbol(_) => Ok(()),
            PropertyKey::Index(index) => bridge.delete_slot(index),
            PropertyKey::Name(name) => bridge.delete_member(&name),
        };
        result.map_err(|e| self.throw(e))?;
        Ok(true)
    }

    fn trap_own_keys(&self, target: Object<'js>) -> rquickjs::Result<Vec<String>> {
        Ok(self.resolve(&target)?.enumerate_keys())
    }

    /// Enumeration is always by name on mappings: a key such as `"1"` is
    /// listed by `ownKeys` and must be describable.
    fn trap_descriptor(&self, target: Object<'js>, key: JsValue<'js>) -> rquickjs::Result<JsValue<'js>> {
        let bridge = self.resolve(&target)?;
        let (lookup, enumerable) = match (bridge.kind(), PropertyKey::classify(key)?) {
            (_, PropertyKey::Symbol(_)) => (Ok(Lookup::NotFound), false),
            (ObjectKind::Sequence, PropertyKey::Name(name)) if name == LENGTH => {
                (bridge.get_member(LENGTH), false)
            }
            (ObjectKind::Sequence, PropertyKey::Index(index)) => (bridge.get_slot(index), true),
            (ObjectKind::Sequence, PropertyKey::Name(name)) => (bridge.get_member(&name), true),
            (ObjectKind::Mapping, PropertyKey::Index(index)) => {
                (bridge.get_member(&index.to_string()), true)
            }
            (ObjectKind::Mapping, PropertyKey::Name(name)) => (bridge.get_member(&name), true),
        };

        match lookup.map_err(|e| self.throw(e))? {
            Lookup::NotFound => Ok(JsValue::new_undefined(self.ctx.clone())),
            Lookup::Found(value) => {
                let descriptor = Object::new(self.ctx.clone())?;
                descriptor.set("value", self.export(value)?)?;
                descriptor.set("writable", enumerable)?;
                descriptor.set("enumerable", enumerable)?;
                descriptor.set("configurable", true)?;
                Ok(descriptor.into_value())
            }
        }
    }
}

/// Builds the per-session proxy handler. Traps find the session through
/// their captured handle and the handler through `this`.
fn install_traps<'js>(ctx: &Ctx<'js>, session: &Rc<JsSession>) -> rquickjs::Result<Object<'js>> {
    let handler = Object::new(ctx.clone())?;
    handler.set(CACHE_KEY, Object::new(ctx.clone())?)?;

    let s = Rc::clone(session);
    handler.set(
        "get",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx<'js>, this: This<Object<'js>>, target: Object<'js>, key: JsValue<'js>, _receiver: JsValue<'js>| {
                JsScope::attach(ctx, Rc::clone(&s), this.0).trap_get(target, key)
            },
        )?,
    )?;

    let s = Rc::clone(session);
    handler.set(
        "set",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx<'js>,
                  this: This<Object<'js>>,
                  target: Object<'js>,
                  key: JsValue<'js>,
                  value: JsValue<'js>,
                  _receiver: JsValue<'js>| {
                JsScope::attach(ctx, Rc::clone(&s), this.0).trap_set(target, key, value)
            },
        )?,
    )?;

    let s = Rc::clone(session);
    handler.set(
        "has",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx<'js>, this: This<Object<'js>>, target: Object<'js>, key: JsValue<'js>| {
                JsScope::attach(ctx, Rc::clone(&s), this.0).trap_has(target, key)
            },
        )?,
    )?;

    let s = Rc::clone(session);
    handler.set(
        "deleteProperty",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx<'js>, this: This<Object<'js>>, target: Object<'js>, key: JsValue<'js>| {
                JsScope::attach(ctx, Rc::clone(&s), this.0).trap_delete(target, key)
            },
        )?,
    )?;

    let s = Rc::clone(session);
    handler.set(
        "ownKeys",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx<'js>, this: This<Object<'js>>, target: Object<'js>| {
                JsScope::attach(ctx, Rc::clone(&s), this.0).trap_own_keys(target)
            },
        )?,
    )?;

    let s = Rc::clone(session);
    handler.set(
        "getOwnPropertyDescriptor",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx<'js>, this: This<Object<'js>>, target: Object<'js>, key: JsValue<'js>| {
                JsScope::attach(ctx, Rc::clone(&s), this.0).trap_descriptor(target, key)
            },
        )?,
    )?;

    Ok(handler)
}

pub(crate) fn primitive_to_js<'js>(ctx: &Ctx<'js>, value: Value) -> rquickjs::Result<JsValue<'js>> {
    Ok(match value {
        Value::Null => JsValue::new_null(ctx.clone()),
        Value::Bool(b) => JsValue::new_bool(ctx.clone(), b),
        Value::Int(n) => match i32::try_from(n) {
            Ok(small) => JsValue::new_int(ctx.clone(), small),
            Err(_) => JsValue::new_float(ctx.clone(), n as f64),
        },
        Value::Float(f) => JsValue::new_float(ctx.clone(), f),
        Value::Char(c) => text_to_js(ctx, &c.to_string())?,
        Value::Text(s) => text_to_js(ctx, &s)?,
        composite => {
            return Err(throw_bridge_error(
                ctx,
                BridgeError::Conversion(format!("untranslated composite {composite:?}")),
            ))
        }
    })
}

pub(crate) fn text_to_js<'js>(ctx: &Ctx<'js>, text: &str) -> rquickjs::Result<JsValue<'js>> {
    Ok(rquickjs::String::from_str(ctx.clone(), text)?.into_value())
}

/// Message and line of the pending exception, if any.
pub(crate) fn caught_exception(ctx: &Ctx<'_>) -> (String, Option<u32>) {
    let thrown = ctx.catch();
    let Some(object) = thrown.as_object() else {
        let message = thrown
            .get::<Coerced<String>>()
            .map(|c| c.0)
            .unwrap_or_else(|_| "unknown script error".to_string());
        return (message, None);
    };

    let name: Option<String> = object.get("name").ok().flatten();
    let message: Option<String> = object.get("message").ok().flatten();
    let line: Option<u32> = object
        .get::<_, Option<i32>>("lineNumber")
        .ok()
        .flatten()
        .and_then(|n| u32::try_from(n).ok())
        .or_else(|| {
            object
                .get::<_, Option<String>>("stack")
                .ok()
                .flatten()
                .and_then(|stack| first_frame_line(&stack))
        });

    let text = match (name, message) {
        (Some(name), Some(message)) if !message.is_empty() => format!("{name}: {message}"),
        (Some(name), _) => name,
        (None, Some(message)) => message,
        (None, None) => "unknown script error".to_string(),
    };
    (text, line)
}

/// Line of the innermost frame in a QuickJS stack (`at f (file:3)` or `file:3:7`).
fn first_frame_line(stack: &str) -> Option<u32> {
    stack.lines().find_map(|frame| {
        let open = frame.find('(')?;
        let close = frame[open..].find(')')? + open;
        frame[open + 1..close]
            .split(':')
            .skip(1)
            .find_map(|part| part.parse::<u32>().ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_index() {
        assert_eq!(array_index("0"), Some(0));
        assert_eq!(array_index("42"), Some(42));
        assert_eq!(array_index("007"), None);
        assert_eq!(array_index("-1"), None);
        assert_eq!(array_index("1.5"), None);
        assert_eq!(array_index("length"), None);
        assert_eq!(array_index(""), None);
        assert_eq!(array_index("4294967295"), None);
    }

    #[test]
    fn test_first_frame_line() {
        assert_eq!(first_frame_line("    at bold (eval_script:3)\n"), Some(3));
        assert_eq!(first_frame_line("    at <anonymous> (helpers.js:12:7)\n"), Some(12));
        assert_eq!(first_frame_line("    at <eval>\n    at f (x:9)"), Some(9));
        assert_eq!(first_frame_line("no frames"), None);
    }

    #[test]
    fn test_number_value() {
        assert_eq!(number_value(3.0), Value::Int(3));
        assert!(matches!(number_value(0.5), Value::Float(_)));
        assert!(matches!(number_value(1e300), Value::Float(_)));
    }

    #[test]
    fn test_session_tags() {
        let a = JsSession::new(TranslationPolicy::Lazy);
        let b = JsSession::new(TranslationPolicy::Lazy);
        let bridge = match a.translator.translate(Value::Map(NativeMap::new())) {
            Value::Bridge(bridge) => bridge,
            _ => unreachable!(),
        };

        let handle = a.handle_for(&bridge);
        assert_eq!(a.handle_for(&bridge), handle);
        let tag = a.tag(handle);
        assert!(a.resolve_tag(&tag).unwrap().ptr_eq(&bridge));
        assert!(b.resolve_tag(&tag).is_none());
        assert!(a.resolve_tag("garbage").is_none());
    }
}
