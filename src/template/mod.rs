//! Rewrite-then-execute template engine.
//!
//! Templates are text with `{{ ... }}` actions. A render runs three steps:
//!
//! 1. **Patch** ([`patch()`]): rewrite ambiguous dot references so that local
//!    context fields, reserved globals, environment variables, and segments
//!    each resolve where they should.
//! 2. **Compile** ([`Engine::compile`]): parse the patched text, resolving
//!    function names against the builtins and the [`HelperLibrary`].
//! 3. **Execute**: evaluate against the merged namespace (`Data` holds the
//!    local context; `OS`, `Env`, `Segments` and the other reserved names
//!    come from the installed [`SharedState`](crate::state::SharedState)).
//!
//! A render is all-or-nothing: any failure returns a [`TemplateError`] and no
//! output.
//!
//! # Process-wide facade
//!
//! Most callers hold an [`Engine`] directly. For callers that cannot thread
//! one through, [`init`] installs an engine process-wide and [`render`] uses
//! it. Installing again replaces the previous engine; [`reset`] removes it.
//!
//! ```
//! use std::sync::Arc;
//! use segtext::state::{MapEnvironment, SharedState};
//! use segtext::template;
//!
//! let state = Arc::new(SharedState::new("darwin"));
//! let env = Arc::new(MapEnvironment::new([("HELLO", "hello")]));
//! let engine = template::Engine::new(env, state);
//!
//! let context = serde_json::json!({"World": "world"});
//! let text = engine.render("{{ .Env.HELLO }} {{ .World }} on {{ .OS }}", &context).unwrap();
//! assert_eq!(text, "hello world on darwin");
//! ```

mod ast;
mod builtins;
mod context;
mod engine;
mod error;
mod exec;
mod helpers;
pub mod lexer;
mod namespace;
mod parser;
mod patch;
mod value;


pub use ast::Template;
pub use builtins::NAMES as BUILTINS;
pub use engine::Engine;
pub use error::{Result, TemplateError};
pub use helpers::HelperLibrary;
pub use namespace::RESERVED_SCALARS;
pub use patch::patch;
pub use value::{Fields, Function, Object, Value};

pub(crate) use builtins::sprintf;

use crate::state::{Environment, SharedState};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

static INSTALLED: RwLock<Option<Arc<Engine>>> = RwLock::new(None);

/// Install a new engine for `env` and `state`, replacing any installed one.
pub fn init(env: Arc<dyn Environment>, state: Arc<SharedState>) -> Arc<Engine> {
    install(Engine::new(env, state))
}

/// Install a configured engine, replacing any installed one.
pub fn install(engine: Engine) -> Arc<Engine> {
    let engine = Arc::new(engine);
    let previous = INSTALLED
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(Arc::clone(&engine));
    debug!(replaced = previous.is_some(), "installed template engine");
    engine
}

/// The installed engine, if any.
pub fn installed() -> Option<Arc<Engine>> {
    INSTALLED
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Remove the installed engine. Later [`render`] calls fail until [`init`].
pub fn reset() {
    INSTALLED
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
}

/// Render `template` with the installed engine.
///
/// # Errors
///
/// [`TemplateError::NotInitialized`] when no engine is installed; otherwise
/// whatever [`Engine::render`] returns.
pub fn render<T: Serialize + ?Sized>(template: &str, context: &T) -> Result<String> {
    installed()
        .ok_or(TemplateError::NotInitialized)?
        .render(template, context)
}
