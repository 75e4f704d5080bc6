//! Two-tier script environment
//!
//! A [`SharedEnvironment`] owns the QuickJS runtime and the context the
//! prelude was evaluated in; it is created once and never changed
//! afterwards except through helper registration. Each helper-source
//! evaluation and each helper call runs inside a [`CallScope`], which owns
//! that call's bridges and proxies and tears them down on drop.

use rquickjs::{Context, Ctx, Function, Object, Runtime, Value as JsValue};
use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::ops::Deref;
use std::path::Path;
use std::rc::Rc;

use super::helpers::{HelperRegistry, JsHelper};
use super::js::{caught_exception, JsScope};
use crate::bridge::TranslationPolicy;
use crate::config::{BridgeConfig, PreludeSource};
use crate::core::error::{BridgeError, BridgeResult};

/// Prelude shipped with the crate.
pub const EMBEDDED_PRELUDE: &str = include_str!("../assets/helpers.prelude.js");

const PRELUDE_NAME: &str = "helpers.prelude.js";

/// Runtime plus the context holding the prelude globals.
pub(crate) struct SharedEnvironment {
    // Declared before `runtime`: the context must be released first.
    context: Context,
    #[allow(dead_code)]
    runtime: Runtime,
    policy: TranslationPolicy,
    registered: Rc<RefCell<Vec<String>>>,
}

impl SharedEnvironment {
    pub(crate) fn initialize(config: &BridgeConfig) -> BridgeResult<Self> {
        let (name, source) = load_prelude(&config.prelude)?;

        let runtime = Runtime::new()
            .map_err(|e| BridgeError::Initialization(format!("failed to create runtime: {e}")))?;
        config.runtime.apply(&runtime);
        let context = Context::full(&runtime)
            .map_err(|e| BridgeError::Initialization(format!("failed to create context: {e}")))?;

        let registered = Rc::new(RefCell::new(Vec::new()));
        context.with(|ctx| -> BridgeResult<()> {
            install_host(&ctx, Rc::clone(&registered))
                .map_err(|e| BridgeError::Initialization(format!("failed to install host object: {e}")))?;
            ctx.eval::<(), _>(source.as_str()).map_err(|e| match e {
                rquickjs::Error::Exception => {
                    let (message, line) = caught_exception(&ctx);
                    let at = line.map(|l| format!(":{l}")).unwrap_or_default();
                    BridgeError::Initialization(format!("{name}{at}: {message}"))
                }
                other => BridgeError::Initialization(format!("{name}: {other}")),
            })
        })?;

        tracing::info!(target: "bindings", prelude = %name, policy = %config.policy, "Script environment initialized");
        Ok(Self {
            context,
            runtime,
            policy: config.policy,
            registered,
        })
    }

    pub(crate) fn policy(&self) -> TranslationPolicy {
        self.policy
    }

    pub(crate) fn with<F, R>(&self, f: F) -> R
    where
        F: for<'js> FnOnce(Ctx<'js>) -> R,
    {
        self.context.with(f)
    }

    fn take_registered(&self) -> Vec<String> {
        std::mem::take(&mut *self.registered.borrow_mut())
    }
}

fn load_prelude(source: &PreludeSource) -> BridgeResult<(String, String)> {
    match source {
        PreludeSource::Embedded => Ok((PRELUDE_NAME.to_string(), EMBEDDED_PRELUDE.to_string())),
        PreludeSource::Path(path) => {
            let text = fs::read_to_string(path).map_err(|e| {
                BridgeError::Initialization(format!("cannot read prelude {}: {e}", path.display()))
            })?;
            Ok((path.display().to_string(), text))
        }
    }
}

/// Installs `__host`, the prelude's only way back into Rust.
fn install_host<'js>(ctx: &Ctx<'js>, registered: Rc<RefCell<Vec<String>>>) -> rquickjs::Result<()> {
    let host = Object::new(ctx.clone())?;

    host.set(
        "log",
        Function::new(ctx.clone(), |level: String, msg: String| match level.as_str() {
            "error" => tracing::error!(target: "script.console", "{}", msg),
            "warn" => tracing::warn!(target: "script.console", "{}", msg),
            "debug" => tracing::debug!(target: "script.console", "{}", msg),
            _ => tracing::info!(target: "script.console", "{}", msg),
        })?,
    )?;

    host.set(
        "helperRegistered",
        Function::new(ctx.clone(), move |name: String| {
            registered.borrow_mut().push(name);
        })?,
    )?;

    ctx.globals().set("__host", host)
}

/// One helper call (or one helper-source evaluation). Dropping it closes
/// the session, on success and on error alike.
pub(crate) struct CallScope<'js> {
    scope: JsScope<'js>,
}

impl<'js> CallScope<'js> {
    pub(crate) fn open(ctx: &Ctx<'js>, policy: TranslationPolicy) -> BridgeResult<Self> {
        Ok(Self {
            scope: JsScope::open(ctx, policy)?,
        })
    }
}

impl<'js> Deref for CallScope<'js> {
    type Target = JsScope<'js>;

    fn deref(&self) -> &Self::Target {
        &self.scope
    }
}

impl Drop for CallScope<'_> {
    fn drop(&mut self) {
        self.scope.close();
    }
}

/// Wraps helper source so its top-level declarations land in a child
/// scope whose `this` inherits from the shared globals. The opening line is
/// shared with the source, keeping reported line numbers unchanged.
fn child_scope_script(source: &str) -> String {
    format!("(function () {{ {source}\n}}).call(Object.create(globalThis));")
}

/// Entry point: lazily initialized shared environment plus helper loading.
///
/// # Examples
///
/// ```no_run
/// use script_bridge::{BridgeConfig, HandlebarsJs, HelperSet};
///
/// let handlebars = HandlebarsJs::new(BridgeConfig::default())?;
/// let mut helpers = HelperSet::new();
/// handlebars.register_helpers(
///     &mut helpers,
///     "helpers.js",
///     "Handlebars.registerHelper('shout', function (s) { return String(s).toUpperCase(); });",
/// )?;
/// assert!(helpers.get("shout").is_some());
/// # Ok::<(), script_bridge::BridgeError>(())
/// ```
pub struct HandlebarsJs {
    config: BridgeConfig,
    shared: OnceCell<Rc<SharedEnvironment>>,
}

impl HandlebarsJs {
    pub fn new(config: BridgeConfig) -> BridgeResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            shared: OnceCell::new(),
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Evaluates the prelude now instead of on first registration.
    pub fn initialize(&self) -> BridgeResult<()> {
        self.shared().map(|_| ())
    }

    pub fn is_initialized(&self) -> bool {
        self.shared.get().is_some()
    }

    fn shared(&self) -> BridgeResult<&Rc<SharedEnvironment>> {
        if let Some(env) = self.shared.get() {
            return Ok(env);
        }
        let env = Rc::new(SharedEnvironment::initialize(&self.config)?);
        Ok(self.shared.get_or_init(|| env))
    }

    /// Evaluates `source` and registers every helper it declares. Either all
    /// of them are registered or, on a script error, none are.
    pub fn register_helpers(
        &self,
        registry: &mut dyn HelperRegistry,
        filename: &str,
        source: &str,
    ) -> BridgeResult<Vec<String>> {
        let env = Rc::clone(self.shared()?);
        env.take_registered();

        let script = child_scope_script(source);
        let (evaluated, names) = env.with(|ctx| {
            let previous = helper_table(&ctx);
            let evaluated = match ctx.eval::<(), _>(script) {
                Ok(()) => Ok(()),
                Err(rquickjs::Error::Exception) => {
                    let (message, line) = caught_exception(&ctx);
                    Err(BridgeError::HelperExecution {
                        helper: filename.to_string(),
                        message,
                        location: line.map(|l| format!("{filename}:{l}")),
                    })
                }
                Err(other) => Err(BridgeError::HelperExecution {
                    helper: filename.to_string(),
                    message: other.to_string(),
                    location: None,
                }),
            };
            let names = env.take_registered();
            if evaluated.is_err() {
                restore_helpers(&ctx, previous, &names);
            }
            (evaluated, names)
        });

        if let Err(e) = evaluated {
            tracing::warn!(target: "bindings", file = filename, "Helper script failed: {}", e);
            return Err(e);
        }

        for name in &names {
            registry.register_helper(name, JsHelper::new(name, filename, Rc::clone(&env)));
        }
        tracing::info!(target: "bindings", file = filename, count = names.len(), "Registered helpers");
        Ok(names)
    }

    /// Same as [`register_helpers`](Self::register_helpers), reading the
    /// script from disk.
    pub fn register_helpers_file<P: AsRef<Path>>(
        &self,
        registry: &mut dyn HelperRegistry,
        path: P,
    ) -> BridgeResult<Vec<String>> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.register_helpers(registry, &filename, &source)
    }
}

/// Copy of `Handlebars.helpers` taken before a helper script runs.
fn helper_table<'js>(ctx: &Ctx<'js>) -> rquickjs::Result<HashMap<String, JsValue<'js>>> {
    let handlebars: Object = ctx.globals().get("Handlebars")?;
    let helpers: Object = handlebars.get("helpers")?;
    helpers.props::<String, JsValue>().collect()
}

/// Undoes a failed script: names it redefined get their previous body
/// back, names it introduced are removed.
fn restore_helpers<'js>(
    ctx: &Ctx<'js>,
    previous: rquickjs::Result<HashMap<String, JsValue<'js>>>,
    names: &[String],
) {
    let restored = previous.and_then(|mut previous| {
        let handlebars: Object = ctx.globals().get("Handlebars")?;
        let helpers: Object = handlebars.get("helpers")?;
        for name in names {
            match previous.remove(name) {
                Some(body) => helpers.set(name.as_str(), body)?,
                None => helpers.remove(name.as_str())?,
            }
        }
        Ok(())
    });
    if let Err(e) = restored {
        tracing::warn!(target: "bindings", "Failed to roll back helpers: {}", e);
    }
}
