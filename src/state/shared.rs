//! SharedState definition.

use crate::registry::Registry;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Scalar globals exposed to every template, plus the segment registry.
///
/// Every scalar field is a reserved top-level name in templates (`.OS`,
/// `.Shell`, ...). The registry is shared through an `Arc` so producers can
/// keep a handle and keep inserting after the state is installed.
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    /// Operating system identifier (`linux`, `darwin`, `windows`, ...).
    pub os: String,
    /// Name of the shell the prompt is rendered for.
    pub shell: String,
    /// Version string of that shell.
    pub shell_version: String,
    /// Current user name.
    pub user_name: String,
    /// Host name of the machine.
    pub host_name: String,
    /// Current working directory.
    pub pwd: String,
    /// Base name of the current working directory.
    pub folder: String,
    /// Whether the user is an administrator/root.
    pub root: bool,
    /// Exit code of the last command.
    pub code: i64,
    /// Whether running inside WSL.
    pub wsl: bool,
    /// Number of prompts rendered in this session.
    pub prompt_count: i64,
    /// Shell nesting level.
    pub shlvl: i64,
    /// User-defined variables, exposed as `.Var`.
    pub vars: BTreeMap<String, JsonValue>,
    /// Registry of computed segment values, exposed as `.Segments`.
    pub segments: Arc<Registry<JsonValue>>,
}

impl SharedState {
    /// Create state for the given OS with every other field empty.
    pub fn new(os: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            ..Self::default()
        }
    }

    /// Share an existing registry instead of the default empty one.
    pub fn with_segments(mut self, segments: Arc<Registry<JsonValue>>) -> Self {
        self.segments = segments;
        self
    }

    /// Store a producer's value in the registry under `name`.
    ///
    /// The value is converted to its serialized form; a value that cannot be
    /// serialized is reported and nothing is stored.
    pub fn set_segment<T: Serialize + ?Sized>(
        &self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(value)?;
        self.segments.set(name, value);
        Ok(())
    }
}

/// The OS identifier for the running platform, using the names templates
/// conventionally compare against (`darwin` rather than `macos`).
pub fn platform_os() -> String {
    match std::env::consts::OS {
        "macos" => "darwin".to_string(),
        other => other.to_string(),
    }
}
