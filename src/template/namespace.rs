//! The merged namespace a patched template executes against.
//!
//! The root holds the reserved globals from [`SharedState`], the `Getenv`
//! accessor (also under `Env`), the `Segments` registry capability, and the
//! caller's local context under `Data`.

use super::builtins::expect_args;
use super::error::Result;
use super::value::{Object, Value};
use crate::registry::Registry;
use crate::state::{Environment, SharedState};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Key holding the local context.
pub const DATA: &str = "Data";
/// Environment-variable namespace written by template authors.
pub const ENV: &str = "Env";
/// The callable `Env.K` is rewritten to.
pub const GETENV: &str = "Getenv";
/// The segment registry namespace.
pub const SEGMENTS: &str = "Segments";
/// Registry presence check.
pub const CONTAINS: &str = "Contains";
/// Registry lookup that fails on absent names.
pub const MUST_GET: &str = "MustGet";

/// Reserved names resolved like `OS`: global unless the local context
/// carries a field of the same name.
pub const RESERVED_SCALARS: &[&str] = &[
    "OS",
    "Shell",
    "ShellVersion",
    "UserName",
    "HostName",
    "PWD",
    "Folder",
    "Root",
    "Code",
    "WSL",
    "PromptCount",
    "SHLVL",
    "Var",
];

/// Whether `name` is one of the registry's method names.
pub fn is_segments_method(name: &str) -> bool {
    name == CONTAINS || name == MUST_GET
}

/// `.Segments` as seen from templates.
pub(crate) struct SegmentsNamespace {
    registry: Arc<Registry<JsonValue>>,
}

impl SegmentsNamespace {
    pub(crate) fn new(registry: Arc<Registry<JsonValue>>) -> Self {
        Self { registry }
    }
}

impl Object for SegmentsNamespace {
    fn type_name(&self) -> &'static str {
        SEGMENTS
    }

    fn has_method(&self, name: &str) -> bool {
        is_segments_method(name)
    }

    fn call_method(&self, name: &str, args: &[Value]) -> Result<Value> {
        expect_args(name, args, 1)?;
        let segment = args[0].to_text();
        match name {
            CONTAINS => Ok(Value::Bool(self.registry.contains(&segment))),
            _ => Ok(Value::from(self.registry.must_get(&segment)?)),
        }
    }

    /// `$.Segments.Git` reads a segment directly; absent segments are a
    /// missing field rather than a lookup failure.
    fn get_field(&self, name: &str) -> Option<Value> {
        self.registry.get(name).map(Value::from)
    }
}

/// Build the execution root for one render.
pub(crate) fn build_root(state: &SharedState, env: Arc<dyn Environment>, data: Value) -> Value {
    let getenv = Value::func(move |args: &[Value]| {
        expect_args(GETENV, args, 1)?;
        Ok(Value::String(env.getenv(&args[0].to_text())))
    });

    let vars = state
        .vars
        .iter()
        .map(|(key, value)| (key.clone(), Value::from(value)))
        .collect();

    let mut root = BTreeMap::new();
    root.insert("OS".to_string(), Value::from(state.os.as_str()));
    root.insert("Shell".to_string(), Value::from(state.shell.as_str()));
    root.insert("ShellVersion".to_string(), Value::from(state.shell_version.as_str()));
    root.insert("UserName".to_string(), Value::from(state.user_name.as_str()));
    root.insert("HostName".to_string(), Value::from(state.host_name.as_str()));
    root.insert("PWD".to_string(), Value::from(state.pwd.as_str()));
    root.insert("Folder".to_string(), Value::from(state.folder.as_str()));
    root.insert("Root".to_string(), Value::Bool(state.root));
    root.insert("Code".to_string(), Value::Int(state.code));
    root.insert("WSL".to_string(), Value::Bool(state.wsl));
    root.insert("PromptCount".to_string(), Value::Int(state.prompt_count));
    root.insert("SHLVL".to_string(), Value::Int(state.shlvl));
    root.insert("Var".to_string(), Value::Map(vars));
    root.insert(GETENV.to_string(), getenv.clone());
    root.insert(ENV.to_string(), getenv);
    root.insert(
        SEGMENTS.to_string(),
        Value::Object(Arc::new(SegmentsNamespace::new(Arc::clone(&state.segments)))),
    );
    root.insert(DATA.to_string(), data);
    Value::Map(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MapEnvironment;
    use crate::template::TemplateError;
    use crate::template::value::Fields;
    use serde_json::json;

    fn root() -> Value {
        let mut state = SharedState::new("darwin");
        state.code = 1;
        state.vars.insert("Theme".to_string(), json!("dark"));
        state.set_segment("Git", &json!({"Repo": "segtext"})).unwrap();
        let env = Arc::new(MapEnvironment::new([("HELLO", "hello")]));
        build_root(&state, env, Value::from("local"))
    }

    #[test]
    fn test_root_exposes_every_reserved_scalar() {
        let root = root();
        for name in RESERVED_SCALARS {
            assert!(root.has_field(name), "missing {}", name);
        }
        assert_eq!(root.get_field("OS"), Some(Value::from("darwin")));
        assert_eq!(root.get_field("Code"), Some(Value::Int(1)));
        assert_eq!(root.get_field("Data"), Some(Value::from("local")));
    }

    #[test]
    fn test_getenv_and_env_are_the_same_callable() {
        let root = root();
        let Some(Value::Func(getenv)) = root.get_field(GETENV) else {
            panic!("Getenv is not callable");
        };
        assert_eq!(getenv(&[Value::from("HELLO")]).unwrap(), Value::from("hello"));
        assert_eq!(getenv(&[Value::from("UNSET")]).unwrap(), Value::from(""));
        assert_eq!(root.get_field(ENV), root.get_field(GETENV));
    }

    #[test]
    fn test_segments_methods() {
        let root = root();
        let Some(Value::Object(segments)) = root.get_field(SEGMENTS) else {
            panic!("Segments is not an object");
        };

        assert!(segments.has_method("Contains"));
        assert!(!segments.has_method("Git"));
        assert_eq!(
            segments.call_method("Contains", &[Value::from("Git")]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            segments
                .call_method("MustGet", &[Value::from("Git")])
                .unwrap()
                .get_field("Repo"),
            Some(Value::from("segtext"))
        );
        assert_eq!(
            segments.call_method("MustGet", &[Value::from("Path")]),
            Err(TemplateError::SegmentNotFound {
                name: "Path".to_string()
            })
        );
    }
}
