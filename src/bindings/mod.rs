//! QuickJS binding layer
//!
//! Architecture:
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  HandlebarsJs ── register_helpers ──► HelperRegistry       │
//! │       │                                   │                │
//! │       v                                   v                │
//! │  SharedEnvironment (runtime + prelude)   JsHelper::apply   │
//! │                                           │                │
//! │                                           v                │
//! │                     CallScope ─► JsScope (proxies / eager) │
//! │                                           │                │
//! │                                           v                │
//! │                           bridge::Translator + Bridge      │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod environment;
pub mod helpers;
pub mod js;

pub use environment::{HandlebarsJs, EMBEDDED_PRELUDE};
pub use helpers::{
    BlockRenderer, HelperCall, HelperRegistry, HelperSet, JsHelper, RenderContext, NOT_SET,
};
