//! Config struct definition and default implementation.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Configuration for a segtext run.
///
/// Shared-state fields left unset are filled in from the running system when
/// the state is built. Unknown fields in the YAML are ignored for forward
/// compatibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Shared state
    // =========================================================================
    /// OS identifier exposed as `.OS` (default: the running platform).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,

    /// Shell name exposed as `.Shell`.
    pub shell: String,

    /// Shell version exposed as `.ShellVersion`.
    pub shell_version: String,

    /// User name exposed as `.UserName` (default: `$USER` or `$USERNAME`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,

    /// Host name exposed as `.HostName` (default: the machine's host name).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,

    /// User variables exposed as `.Var`.
    pub vars: BTreeMap<String, JsonValue>,

    /// Environment overrides consulted before the process environment.
    pub env: BTreeMap<String, String>,

    /// Pre-computed segment values exposed as `.Segments.<Name>`.
    pub segments: BTreeMap<String, JsonValue>,

    // =========================================================================
    // Engine
    // =========================================================================
    /// Whether compiled templates are cached across renders.
    #[serde(default = "default_true")]
    pub cache_templates: bool,

    // =========================================================================
    // Branch formatting
    // =========================================================================
    /// Branch replacements (`main`, `feat/*`, `*`) applied by `branch`.
    pub mapped_branches: BTreeMap<String, String>,

    /// Template applied to the mapped branch, rendered with `{{ .Branch }}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_template: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            os: None,
            shell: String::new(),
            shell_version: String::new(),
            user_name: None,
            host_name: None,
            vars: BTreeMap::new(),
            env: BTreeMap::new(),
            segments: BTreeMap::new(),
            cache_templates: default_true(),
            mapped_branches: BTreeMap::new(),
            branch_template: None,
        }
    }
}
