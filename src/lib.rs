//! # Script Bridge
//!
//! Exposes host mappings and sequences to JavaScript helpers running in an
//! embedded QuickJS runtime, through the runtime's dynamic-object protocol.
//!
//! ## Features
//!
//! - **Mapping / sequence bridges**: named members on ordered mappings,
//!   indexed slots plus `length` on sequences, wrong-shape access rejected
//! - **Translation policies**: eager (whole graph up front, plain JS values)
//!   or lazy (on access, `Proxy` backed, identity memoized per call)
//! - **Helper environment**: a shared prelude evaluated once, helper scripts
//!   evaluated in child scopes, helpers called Handlebars.js style
//! - **Configuration**: TOML/JSON files with environment overrides
//!
//! ## Example
//!
//! ```no_run
//! use script_bridge::{BridgeConfig, HandlebarsJs, HelperCall, HelperSet, NativeMap, Value};
//!
//! let handlebars = HandlebarsJs::new(BridgeConfig::load_or_default()?)?;
//! let mut helpers = HelperSet::new();
//! handlebars.register_helpers(
//!     &mut helpers,
//!     "helpers.js",
//!     "Handlebars.registerHelper('first', function (list) { return list[0]; });",
//! )?;
//!
//! let context = NativeMap::new();
//! let list = Value::from(vec!["a", "b"]);
//! let out = helpers.apply("first", &HelperCall::new(&context).param(list))?;
//! assert_eq!(out.as_deref(), Some("a"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Modules
//!
//! - [`value`]: host value model
//! - [`bridge`]: protocol, bridges and translator
//! - [`bindings`]: QuickJS adapter, environment and call adapter
//! - [`config`]: configuration
//! - [`logging`]: tracing setup

/// Core error types and macros
pub mod core;
/// Host value model: ordered mappings, sequences and primitives
pub mod value;
/// Dynamic-object bridges and the recursive translator
pub mod bridge;
/// QuickJS bindings for helper scripts
pub mod bindings;
/// Configuration system
pub mod config;
/// Logging initialization
pub mod logging;

pub use bindings::{
    BlockRenderer, HandlebarsJs, HelperCall, HelperRegistry, HelperSet, JsHelper, RenderContext,
};
pub use bridge::{
    needs_translation, Bridge, DynamicObject, Lookup, ObjectKind, TranslationPolicy, Translator,
};
pub use config::{BridgeConfig, ConfigError};
pub use core::error::{BridgeError, BridgeResult};
pub use value::{NativeMap, NativeSeq, StoreId, Value};
