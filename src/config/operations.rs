//! Config loading, validation, and conversion into engine inputs.

use super::model::Config;
use crate::error::{Result, SegtextError};
use crate::state::{Environment, MapEnvironment, OsEnvironment, SharedState, platform_os};
use crate::template::Engine;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Registry method names a segment cannot shadow.
const RESERVED_SEGMENT_NAMES: &[&str] = &["Contains", "MustGet"];

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(SegtextError::UserError)` - Read error, parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            SegtextError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        debug!(path = %path.display(), "loaded config file");
        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| SegtextError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            SegtextError::UserError(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - segment names must be identifiers and not `Contains` or `MustGet`
    /// - `env` keys must be non-empty and contain no `=`
    pub fn validate(&self) -> Result<()> {
        for name in self.segments.keys() {
            validate_segment_name(name)?;
        }

        for key in self.env.keys() {
            if key.is_empty() || key.contains('=') {
                return Err(SegtextError::UserError(format!(
                    "invalid env key '{}': must be non-empty and contain no '='",
                    key
                )));
            }
        }

        Ok(())
    }

    /// Build the shared state this config describes.
    ///
    /// Unset fields fall back to the running system: the platform OS, the
    /// user from `env`, the machine's host name, and the current directory.
    pub fn shared_state(&self, env: &dyn Environment) -> SharedState {
        let dir = std::env::current_dir().ok();
        self.shared_state_in(env, dir.as_deref())
    }

    /// [`Config::shared_state`] with `dir` as the working directory.
    pub fn shared_state_in(&self, env: &dyn Environment, dir: Option<&Path>) -> SharedState {
        let mut state = SharedState::new(self.os.clone().unwrap_or_else(platform_os));
        state.shell = self.shell.clone();
        state.shell_version = self.shell_version.clone();
        state.user_name = self
            .user_name
            .clone()
            .unwrap_or_else(|| default_user_name(env));
        state.host_name = self.host_name.clone().unwrap_or_else(default_host_name);
        state.shlvl = env.getenv("SHLVL").parse().unwrap_or(0);
        state.vars = self.vars.clone();

        if let Some(dir) = dir {
            state.pwd = dir.display().to_string();
            state.folder = dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| state.pwd.clone());
        }

        for (name, value) in &self.segments {
            state.segments.set(name.clone(), value.clone());
        }

        state
    }

    /// The environment templates read: `overrides`, then `env`, then the
    /// process environment.
    pub fn environment(&self, overrides: &BTreeMap<String, String>) -> MapEnvironment {
        let mut vars = self.env.clone();
        vars.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        MapEnvironment::new(vars).with_fallback(OsEnvironment)
    }

    /// Build an engine over `env` and the state this config describes.
    pub fn engine(&self, env: Arc<dyn Environment>) -> Engine {
        let state = self.shared_state(env.as_ref());
        let engine = Engine::new(env, Arc::new(state));
        if self.cache_templates {
            engine
        } else {
            engine.without_cache()
        }
    }
}

/// Check that `name` can be reached as `.Segments.<name>`.
pub(crate) fn validate_segment_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let is_identifier = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_');

    if !is_identifier {
        return Err(SegtextError::UserError(format!(
            "invalid segment name '{}': must be an identifier",
            name
        )));
    }
    if RESERVED_SEGMENT_NAMES.contains(&name) {
        return Err(SegtextError::UserError(format!(
            "invalid segment name '{}': reserved for the segments registry",
            name
        )));
    }
    Ok(())
}

fn default_user_name(env: &dyn Environment) -> String {
    let user = env.getenv("USER");
    if user.is_empty() {
        env.getenv("USERNAME")
    } else {
        user
    }
}

fn default_host_name() -> String {
    match hostname::get() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(err) => {
            debug!(error = %err, "could not read host name");
            String::new()
        }
    }
}
