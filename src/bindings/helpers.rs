//! Call adapter: runs a script helper against host data.
//!
//! A call translates the context, the first argument, the remaining
//! params and the hash into script values, invokes the helper as
//! `(context, firstArgument, options)` and turns the result back into
//! host text.

use indexmap::IndexMap;
use rquickjs::function::Opt;
use rquickjs::{Ctx, Exception, Function, Object, Value as JsValue};
use std::fmt;
use std::io;
use std::rc::Rc;

use super::environment::{CallScope, SharedEnvironment};
use super::js::{caught_exception, text_to_js, JsSession};
use crate::core::error::{BridgeError, BridgeResult};
use crate::value::{NativeMap, NativeSeq, Value};

/// First argument passed when a helper is called without parameters.
pub const NOT_SET: &str = "___NOT_SET_";

/// Source of the helper's context properties.
pub trait RenderContext {
    fn property_set(&self) -> Vec<(String, Value)>;
}

impl RenderContext for NativeMap {
    fn property_set(&self) -> Vec<(String, Value)> {
        self.entries()
    }
}

impl RenderContext for Vec<(String, Value)> {
    fn property_set(&self) -> Vec<(String, Value)> {
        self.clone()
    }
}

/// Renders the blocks of a block helper (`options.fn` / `options.inverse`).
pub trait BlockRenderer {
    fn primary_block(&self, context: &Value) -> io::Result<String>;
    fn alternate_block(&self, context: &Value) -> io::Result<String>;
}

/// Receives helpers declared by a helper script.
pub trait HelperRegistry {
    fn register_helper(&mut self, name: &str, helper: JsHelper);
}

/// Ordered helper table.
#[derive(Default)]
pub struct HelperSet {
    helpers: IndexMap<String, JsHelper>,
}

impl HelperSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&JsHelper> {
        self.helpers.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.helpers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.helpers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.helpers.is_empty()
    }

    /// Looks up `name` and applies it.
    pub fn apply(&self, name: &str, call: &HelperCall<'_>) -> BridgeResult<Option<String>> {
        let helper = self.get(name).ok_or_else(|| BridgeError::HelperExecution {
            helper: name.to_string(),
            message: "no such helper".to_string(),
            location: None,
        })?;
        helper.apply(call)
    }
}

impl HelperRegistry for HelperSet {
    fn register_helper(&mut self, name: &str, helper: JsHelper) {
        if self.helpers.insert(name.to_string(), helper).is_some() {
            tracing::debug!(target: "bindings", helper = name, "Helper replaced");
        }
    }
}

impl fmt::Debug for HelperSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.helpers.keys()).finish()
    }
}

/// Arguments of one helper invocation.
pub struct HelperCall<'a> {
    pub context: &'a dyn RenderContext,
    pub params: Vec<Value>,
    pub hash: NativeMap,
    pub blocks: Option<Rc<dyn BlockRenderer>>,
}

impl<'a> HelperCall<'a> {
    pub fn new(context: &'a dyn RenderContext) -> Self {
        Self {
            context,
            params: Vec::new(),
            hash: NativeMap::new(),
            blocks: None,
        }
    }

    pub fn param(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn hash(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.hash.insert(key, value);
        self
    }

    pub fn blocks(mut self, renderer: Rc<dyn BlockRenderer>) -> Self {
        self.blocks = Some(renderer);
        self
    }
}

/// A helper declared by a script, bound to the environment it lives in.
#[derive(Clone)]
pub struct JsHelper {
    name: String,
    filename: String,
    env: Rc<SharedEnvironment>,
}

#[derive(Clone, Copy)]
enum Block {
    Primary,
    Alternate,
}

impl JsHelper {
    pub(crate) fn new(name: &str, filename: &str, env: Rc<SharedEnvironment>) -> Self {
        Self {
            name: name.to_string(),
            filename: filename.to_string(),
            env,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Script the helper was declared in.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Runs the helper. Strings come back verbatim and `null`/`undefined`
    /// as `None`. Plain objects, arrays and host objects render as JSON,
    /// anything else through `String(value)`. Every script failure during
    /// the call surfaces as [`BridgeError::HelperExecution`].
    pub fn apply(&self, call: &HelperCall<'_>) -> BridgeResult<Option<String>> {
        let env = Rc::clone(&self.env);
        let result = env.with(|ctx| self.apply_in(&ctx, call));
        if let Err(e) = &result {
            tracing::debug!(target: "bindings", helper = %self.name, "Helper failed: {}", e);
        }
        result
    }

    fn apply_in<'js>(&self, ctx: &Ctx<'js>, call: &HelperCall<'_>) -> BridgeResult<Option<String>> {
        let scope = CallScope::open(ctx, self.env.policy()).map_err(|e| self.failure(ctx, e))?;
        self.invoke(ctx, &scope, call)
            .map_err(|e| self.failure(ctx, BridgeError::Script(e)))
    }

    fn invoke<'js>(
        &self,
        ctx: &Ctx<'js>,
        scope: &CallScope<'js>,
        call: &HelperCall<'_>,
    ) -> rquickjs::Result<Option<String>> {
        let Some(body) = self.body(ctx)? else {
            return Err(Exception::throw_reference(
                ctx,
                "helper is no longer defined in the script environment",
            ));
        };

        let context = Value::Map(call.context.property_set().into_iter().collect());
        let js_context = scope.export(context.clone())?;
        let first = match call.params.first() {
            Some(value) => scope.export(value.clone())?,
            None => text_to_js(ctx, NOT_SET)?,
        };

        let options = Object::new(ctx.clone())?;
        options.set("name", self.name.as_str())?;
        options.set("hash", scope.export(Value::Map(call.hash.clone()))?)?;
        let rest: NativeSeq = call.params.iter().skip(1).cloned().collect();
        options.set("params", scope.export(Value::Seq(rest))?)?;
        for (key, block) in [("fn", Block::Primary), ("inverse", Block::Alternate)] {
            let callback = block_callback(
                ctx,
                Rc::clone(scope.session()),
                call.blocks.clone(),
                context.clone(),
                block,
            )?;
            options.set(key, callback)?;
        }

        let value: JsValue = body.call((js_context, first, options))?;
        scope.result_text(value)
    }

    /// Folds a failed call into `HelperExecution`, draining the pending
    /// exception so the context stays usable.
    fn failure(&self, ctx: &Ctx<'_>, err: BridgeError) -> BridgeError {
        match err {
            BridgeError::Script(rquickjs::Error::Exception) => {
                let (message, line) = caught_exception(ctx);
                BridgeError::HelperExecution {
                    helper: self.name.clone(),
                    message,
                    location: line.map(|l| format!("{}:{}", self.filename, l)),
                }
            }
            BridgeError::Script(other) => BridgeError::HelperExecution {
                helper: self.name.clone(),
                message: other.to_string(),
                location: None,
            },
            other => other,
        }
    }

    fn body<'js>(&self, ctx: &Ctx<'js>) -> rquickjs::Result<Option<Function<'js>>> {
        let handlebars: Object = ctx.globals().get("Handlebars")?;
        let helpers: Object = handlebars.get("helpers")?;
        helpers.get(self.name.as_str())
    }
}

impl fmt::Debug for JsHelper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsHelper")
            .field("name", &self.name)
            .field("filename", &self.filename)
            .finish()
    }
}

/// `options.fn` / `options.inverse`. Called without an argument the block
/// renders against the helper's own context. Without a renderer it yields
/// the empty string.
fn block_callback<'js>(
    ctx: &Ctx<'js>,
    session: Rc<JsSession>,
    blocks: Option<Rc<dyn BlockRenderer>>,
    default_context: Value,
    block: Block,
) -> rquickjs::Result<Function<'js>> {
    Function::new(
        ctx.clone(),
        move |ctx: Ctx<'js>, arg: Opt<JsValue<'js>>| -> rquickjs::Result<String> {
            let Some(blocks) = &blocks else {
                return Ok(String::new());
            };
            let value = match arg.0 {
                Some(v) if !v.is_undefined() => session.import(&ctx, v)?,
                _ => default_context.clone(),
            };
            let rendered = match block {
                Block::Primary => blocks.primary_block(&value),
                Block::Alternate => blocks.alternate_block(&value),
            };
            rendered.map_err(|e| Exception::throw_message(&ctx, &format!("block rendering failed: {e}")))
        },
    )
}
