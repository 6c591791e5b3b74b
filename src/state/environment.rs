//! Environment-variable accessor capability.

use std::collections::HashMap;

/// Read access to environment variables.
///
/// `getenv` returns an empty string for an unset key. There is no way to
/// distinguish "unset" from "set to empty".
pub trait Environment: Send + Sync {
    /// Look up an environment variable.
    fn getenv(&self, key: &str) -> String;
}

/// Reads the real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEnvironment;

impl Environment for OsEnvironment {
    fn getenv(&self, key: &str) -> String {
        std::env::var(key).unwrap_or_default()
    }
}

/// A fixed set of variables, optionally layered over another environment.
///
/// Used by the CLI for `--env KEY=VALUE` overrides and by tests.
#[derive(Default)]
pub struct MapEnvironment {
    vars: HashMap<String, String>,
    fallback: Option<Box<dyn Environment>>,
}

impl MapEnvironment {
    /// Create an environment holding exactly `vars`.
    pub fn new<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            fallback: None,
        }
    }

    /// Consult `fallback` for keys not held directly.
    pub fn with_fallback(mut self, fallback: impl Environment + 'static) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }
}

impl Environment for MapEnvironment {
    fn getenv(&self, key: &str) -> String {
        match self.vars.get(key) {
            Some(value) => value.clone(),
            None => self
                .fallback
                .as_ref()
                .map(|env| env.getenv(key))
                .unwrap_or_default(),
        }
    }
}

impl std::fmt::Debug for MapEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.vars.keys().collect();
        keys.sort();
        f.debug_struct("MapEnvironment")
            .field("keys", &keys)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}
