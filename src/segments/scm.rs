//! Source-control status values and branch formatting.

use crate::template::{Engine, Value, sprintf};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Counts of changed files in one area (working tree or index) of a
/// repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ScmStatus {
    /// Per-count format overrides, keyed by count name (`"Added"`), using
    /// `%d` for the value. Replaces the default ` +N` rendering.
    pub formats: BTreeMap<String, String>,
    pub unmerged: i64,
    pub deleted: i64,
    pub added: i64,
    pub modified: i64,
    pub moved: i64,
    pub conflicted: i64,
    pub untracked: i64,
    pub clean: i64,
    pub missing: i64,
    pub ignored: i64,
}

impl ScmStatus {
    /// Whether any count is non-zero.
    pub fn changed(&self) -> bool {
        self.counts().iter().any(|(_, _, value)| *value > 0)
    }

    /// `(name, default prefix, value)` in display order.
    fn counts(&self) -> [(&'static str, &'static str, i64); 10] {
        [
            ("Untracked", "?", self.untracked),
            ("Added", "+", self.added),
            ("Modified", "~", self.modified),
            ("Deleted", "-", self.deleted),
            ("Moved", ">", self.moved),
            ("Unmerged", "x", self.unmerged),
            ("Conflicted", "!", self.conflicted),
            ("Missing", "!", self.missing),
            ("Clean", "=", self.clean),
            ("Ignored", "Ø", self.ignored),
        ]
    }
}

/// Compact form such as `?1 +2 ~3`; zero counts are omitted.
impl fmt::Display for ScmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut status = String::new();
        for (name, prefix, value) in self.counts() {
            if value <= 0 {
                continue;
            }
            match self.formats.get(name) {
                Some(format) => status.push_str(&sprintf(format, &[Value::Int(value)])),
                None => status.push_str(&format!(" {}{}", prefix, value)),
            }
        }
        f.write_str(status.trim())
    }
}

/// Serializes every count plus the derived `Changed` and `String` fields.
impl Serialize for ScmStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ScmStatus", 13)?;
        state.serialize_field("Formats", &self.formats)?;
        for (name, _, value) in self.counts() {
            state.serialize_field(name, &value)?;
        }
        state.serialize_field("Changed", &self.changed())?;
        state.serialize_field("String", &self.to_string())?;
        state.end()
    }
}

/// Context the branch template is rendered with.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct BranchContext<'a> {
    branch: &'a str,
}

const WILDCARD: &str = "*";

/// Map `branch` through `mapped` and then through `template`.
///
/// Keys are tried in sorted order and the first match wins:
///
/// - `*` replaces any branch with its value
/// - `prefix/*` replaces a leading `prefix/` with its value
/// - any other key must equal the branch exactly
///
/// The result is rendered with `template` (context `{Branch}`) when one is
/// given. A template that fails to render leaves the mapped branch as is.
pub fn format_branch(
    engine: &Engine,
    branch: &str,
    mapped: &BTreeMap<String, String>,
    template: Option<&str>,
) -> String {
    let branch = map_branch(branch, mapped);

    let Some(template) = template.filter(|t| !t.is_empty()) else {
        return branch;
    };
    match engine.render(template, &BranchContext { branch: &branch }) {
        Ok(text) => text,
        Err(err) => {
            debug!(error = %err, template, "branch template failed; using mapped branch");
            branch
        }
    }
}

fn map_branch(branch: &str, mapped: &BTreeMap<String, String>) -> String {
    for (key, replacement) in mapped {
        if key == WILDCARD {
            return replacement.clone();
        }

        if let Some(prefix) = key.strip_suffix(WILDCARD) {
            if branch.starts_with(prefix) {
                return branch.replacen(prefix, replacement, 1);
            }
            continue;
        }

        if branch == key {
            return replacement.clone();
        }
    }
    branch.to_string()
}
