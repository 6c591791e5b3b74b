//! Tests for config functionality.

use crate::config::Config;
use crate::state::{Environment, MapEnvironment};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = Config::default();

    assert!(config.os.is_none());
    assert!(config.shell.is_empty());
    assert!(config.segments.is_empty());
    assert!(config.cache_templates);
    assert!(config.mapped_branches.is_empty());
    assert!(config.branch_template.is_none());
}

#[test]
fn test_parse_minimal_yaml() {
    let config = Config::from_yaml("").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_parse_full_yaml() {
    let yaml = r#"
os: darwin
shell: zsh
shell_version: "5.9"
user_name: jan
host_name: laptop
vars:
  Greeting: hi
  Count: 3
env:
  HELLO: hello
segments:
  Git:
    Branch: main
    Working:
      Modified: 2
  Path: ~/src
cache_templates: false
mapped_branches:
  "feat/*": "🚀 "
branch_template: "{{ .Branch }}"
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.os.as_deref(), Some("darwin"));
    assert_eq!(config.shell, "zsh");
    assert_eq!(config.shell_version, "5.9");
    assert_eq!(config.vars["Count"], json!(3));
    assert_eq!(config.env["HELLO"], "hello");
    assert_eq!(config.segments["Git"]["Working"]["Modified"], json!(2));
    assert_eq!(config.segments["Path"], json!("~/src"));
    assert!(!config.cache_templates);
    assert_eq!(config.mapped_branches["feat/*"], "🚀 ");
    assert_eq!(config.branch_template.as_deref(), Some("{{ .Branch }}"));
}

#[test]
fn test_unknown_fields_ignored() {
    let config = Config::from_yaml("shell: fish\nfuture_option: 42\n").unwrap();
    assert_eq!(config.shell, "fish");
}

#[test]
fn test_invalid_yaml_is_user_error() {
    let err = Config::from_yaml("shell: [unclosed").unwrap_err();
    assert!(err.to_string().contains("failed to parse config YAML"));
}

#[test]
fn test_segment_name_must_be_identifier() {
    let err = Config::from_yaml("segments:\n  my-seg: 1\n").unwrap_err();
    assert!(err.to_string().contains("invalid segment name 'my-seg'"));

    let err = Config::from_yaml("segments:\n  1st: 1\n").unwrap_err();
    assert!(err.to_string().contains("must be an identifier"));

    assert!(Config::from_yaml("segments:\n  _Git2: 1\n").is_ok());
}

#[test]
fn test_segment_name_cannot_shadow_registry_methods() {
    for name in ["Contains", "MustGet"] {
        let yaml = format!("segments:\n  {}: 1\n", name);
        let err = Config::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("reserved"), "{name}");
    }
}

#[test]
fn test_env_key_validation() {
    let mut config = Config::default();
    config.env.insert("A=B".to_string(), "x".to_string());
    assert!(config.validate().is_err());
}

#[test]
fn test_yaml_roundtrip_preserves_values() {
    let mut config = Config::from_yaml("shell: pwsh\nsegments:\n  Git: {Branch: main}\n").unwrap();
    config.cache_templates = false;

    let reparsed = Config::from_yaml(&config.to_yaml().unwrap()).unwrap();
    assert_eq!(reparsed, config);
}

#[test]
fn test_load_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("segtext.yaml");
    std::fs::write(&path, "os: windows\n").unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.os.as_deref(), Some("windows"));
}

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = Config::load(dir.path().join("missing.yaml")).unwrap_err();
    assert!(err.to_string().contains("failed to read config file"));
}

#[test]
fn test_environment_layers_overrides() {
    let mut config = Config::default();
    config.env.insert("A".to_string(), "config".to_string());
    config.env.insert("B".to_string(), "config".to_string());

    let mut overrides = BTreeMap::new();
    overrides.insert("B".to_string(), "cli".to_string());

    let env = config.environment(&overrides);
    assert_eq!(env.getenv("A"), "config");
    assert_eq!(env.getenv("B"), "cli");
    assert_eq!(env.getenv("SEGTEXT_SURELY_UNSET_VARIABLE"), "");
}

#[test]
fn test_shared_state_from_config() {
    let config = Config::from_yaml(
        r#"
os: darwin
shell: zsh
host_name: laptop
vars: {Theme: dark}
segments:
  Git: {Branch: main}
"#,
    )
    .unwrap();
    let env = MapEnvironment::new([("USER", "jan"), ("SHLVL", "2")]);

    let state = config.shared_state(&env);
    assert_eq!(state.os, "darwin");
    assert_eq!(state.shell, "zsh");
    assert_eq!(state.user_name, "jan");
    assert_eq!(state.host_name, "laptop");
    assert_eq!(state.shlvl, 2);
    assert_eq!(state.vars["Theme"], json!("dark"));
    assert_eq!(state.segments.get("Git"), Some(json!({"Branch": "main"})));
}

#[test]
fn test_shared_state_user_name_fallback() {
    let config = Config::default();
    let env = MapEnvironment::new([("USERNAME", "win-user")]);
    assert_eq!(config.shared_state(&env).user_name, "win-user");

    let config = Config {
        user_name: Some("explicit".to_string()),
        ..Config::default()
    };
    assert_eq!(config.shared_state(&env).user_name, "explicit");
}

#[test]
fn test_shared_state_uses_working_directory() {
    let dir = TempDir::new().unwrap();
    let project = dir.path().join("project");
    std::fs::create_dir(&project).unwrap();

    let state = Config::default().shared_state_in(&MapEnvironment::default(), Some(&project));
    assert_eq!(state.folder, "project");
    assert_eq!(state.pwd, project.display().to_string());
}

#[test]
fn test_shared_state_without_working_directory() {
    let state = Config::default().shared_state_in(&MapEnvironment::default(), None);
    assert_eq!(state.pwd, "");
    assert_eq!(state.folder, "");
}

#[test]
fn test_engine_renders_config_state() {
    let config = Config::from_yaml(
        r#"
os: linux
env: {HELLO: hello}
segments:
  Git: {Branch: main}
"#,
    )
    .unwrap();
    let engine = config.engine(Arc::new(config.environment(&BTreeMap::new())));

    let out = engine
        .render(
            "{{ .Env.HELLO }} {{ .Segments.Git.Branch }} {{ .OS }}",
            &json!({}),
        )
        .unwrap();
    assert_eq!(out, "hello main linux");
    assert_eq!(engine.cached_templates(), 1);
}

#[test]
fn test_engine_honors_cache_setting() {
    let config = Config {
        cache_templates: false,
        ..Config::default()
    };
    let engine = config.engine(Arc::new(MapEnvironment::default()));
    engine.render("{{ .OS }}", &json!({})).unwrap();
    assert_eq!(engine.cached_templates(), 0);
}
