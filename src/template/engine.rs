//! Engine: patch → compile → execute.

use super::ast::Template;
use super::builtins;
use super::context::to_context;
use super::error::Result;
use super::exec;
use super::helpers::HelperLibrary;
use super::namespace::build_root;
use super::parser;
use super::patch::patch;
use super::value::Value;
use crate::state::{Environment, SharedState};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Renders templates against local contexts and one installed
/// [`SharedState`].
///
/// Rendering is synchronous; an engine can be shared between threads and
/// used for any number of concurrent renders. Compiled templates are cached
/// by their patched text, which already reflects every part of the context
/// shape that influenced patching.
pub struct Engine {
    env: Arc<dyn Environment>,
    state: Arc<SharedState>,
    helpers: HelperLibrary,
    cache: Option<RwLock<HashMap<String, Arc<Template>>>>,
}

impl Engine {
    /// Create an engine with the standard helper library and caching on.
    pub fn new(env: Arc<dyn Environment>, state: Arc<SharedState>) -> Self {
        Self {
            env,
            state,
            helpers: HelperLibrary::standard(),
            cache: Some(RwLock::new(HashMap::new())),
        }
    }

    /// Compile every render from scratch.
    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    /// The shared state this engine renders against.
    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }

    /// The helper functions registered with every template.
    pub fn helpers(&self) -> &HelperLibrary {
        &self.helpers
    }

    /// Rewrite `template` for `context` without executing it.
    pub fn patch<T: Serialize + ?Sized>(&self, template: &str, context: &T) -> String {
        patch(template, &to_context(context))
    }

    /// Patch and execute `template` with `context` as the local context.
    pub fn render<T: Serialize + ?Sized>(&self, template: &str, context: &T) -> Result<String> {
        self.render_json(template, &to_context(context))
    }

    /// [`render`](Self::render) for a context already in serialized form.
    pub fn render_json(&self, template: &str, context: &JsonValue) -> Result<String> {
        let patched = patch(template, context);
        if patched != template {
            debug!(template, patched = %patched, "patched template");
        }
        self.render_patched(&patched, context)
    }

    /// Execute an already patched template. The context is exposed as
    /// `Data`; reserved names come from the shared state.
    pub fn render_patched(&self, patched: &str, context: &JsonValue) -> Result<String> {
        let template = self.compile(patched)?;
        let root = build_root(&self.state, Arc::clone(&self.env), Value::from(context));
        exec::execute(&template, &root, &self.helpers)
    }

    /// Compile patched template text, consulting the cache first.
    pub fn compile(&self, patched: &str) -> Result<Arc<Template>> {
        let Some(cache) = &self.cache else {
            return self.parse(patched).map(Arc::new);
        };

        if let Some(hit) = cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(patched)
        {
            debug!(template = patched, "template cache hit");
            return Ok(Arc::clone(hit));
        }

        let compiled = Arc::new(self.parse(patched)?);
        cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(patched.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Drop every cached template.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.write().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }

    /// Number of templates currently cached.
    pub fn cached_templates(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| {
            cache.read().unwrap_or_else(PoisonError::into_inner).len()
        })
    }

    fn parse(&self, patched: &str) -> Result<Template> {
        let is_function = |name: &str| builtins::is_builtin(name) || self.helpers.contains(name);
        parser::parse(patched, &is_function)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state)
            .field("cache", &self.cache.is_some())
            .finish()
    }
}
