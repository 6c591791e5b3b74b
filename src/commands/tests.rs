//! Tests for command implementations.

use super::branch::cmd_branch;
use super::funcs::cmd_funcs;
use super::patch::cmd_patch;
use super::render::cmd_render;
use super::*;
use crate::cli::{BranchArgs, PatchArgs, RenderArgs};
use crate::exit_codes;
use crate::template::TemplateError;
use tempfile::TempDir;

fn config(yaml: &str) -> Config {
    Config::from_yaml(yaml).unwrap()
}

fn render_args(template: &str) -> RenderArgs {
    RenderArgs {
        template: template.to_string(),
        context: None,
        context_file: None,
        segments: Vec::new(),
        env: Vec::new(),
    }
}

#[test]
fn test_parse_assignment() {
    assert_eq!(
        parse_assignment("A=b=c", "--env").unwrap(),
        ("A".to_string(), "b=c".to_string())
    );
    assert_eq!(
        parse_assignment("A=", "--env").unwrap(),
        ("A".to_string(), String::new())
    );

    for bad in ["novalue", "=x"] {
        let err = parse_assignment(bad, "--segment").unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
        assert!(err.to_string().contains("expected NAME=VALUE"));
    }
}

#[test]
fn test_parse_context_defaults_to_empty_object() {
    assert_eq!(parse_context(None, "--context").unwrap(), serde_json::json!({}));
    let err = parse_context(Some("{nope"), "--context").unwrap_err();
    assert!(err.to_string().contains("invalid context JSON in --context"));
}

#[test]
fn test_load_config_without_path() {
    assert_eq!(load_config(None).unwrap(), Config::default());
}

#[test]
fn test_render_with_context_env_and_segments() {
    let config = config("os: darwin\n");
    let args = RenderArgs {
        context: Some(r#"{"World": "world"}"#.to_string()),
        segments: vec![
            r#"Git={"Branch": "main"}"#.to_string(),
            "Path=~/src".to_string(),
        ],
        env: vec!["HELLO=hello".to_string()],
        ..render_args(
            "{{ .Env.HELLO }} {{ .World }} {{ .Segments.Git.Branch }} {{ .Segments.Path }} {{ .OS }}",
        )
    };

    let out = cmd_render(&config, args).unwrap();
    assert_eq!(out, "hello world main ~/src darwin");
}

#[test]
fn test_render_cli_env_overrides_config_env() {
    let config = config("env: {GREETING: config}\n");
    let args = RenderArgs {
        env: vec!["GREETING=cli".to_string()],
        ..render_args("{{ .Env.GREETING }}")
    };
    assert_eq!(cmd_render(&config, args).unwrap(), "cli");
}

#[test]
fn test_render_context_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("context.json");
    std::fs::write(&path, r#"{"Text": "from file"}"#).unwrap();

    let args = RenderArgs {
        context_file: Some(path),
        ..render_args("{{ .Text }}")
    };
    assert_eq!(cmd_render(&Config::default(), args).unwrap(), "from file");
}

#[test]
fn test_render_missing_context_file() {
    let dir = TempDir::new().unwrap();
    let args = RenderArgs {
        context_file: Some(dir.path().join("missing.json")),
        ..render_args("{{ .Text }}")
    };
    let err = cmd_render(&Config::default(), args).unwrap_err();
    assert!(err.to_string().contains("failed to read context file"));
}

#[test]
fn test_render_rejects_invalid_segment_name() {
    let args = RenderArgs {
        segments: vec!["MustGet=1".to_string()],
        ..render_args("x")
    };
    let err = cmd_render(&Config::default(), args).unwrap_err();
    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
}

#[test]
fn test_render_failure_is_render_error() {
    let err = cmd_render(&Config::default(), render_args("{{ .Segments.Nope.X }}")).unwrap_err();
    assert_eq!(err.exit_code(), exit_codes::RENDER_FAILURE);
    assert!(matches!(
        err,
        SegtextError::RenderError(TemplateError::SegmentNotFound { .. })
    ));
}

#[test]
fn test_patch_command() {
    let args = PatchArgs {
        template: "{{ .World }} {{ .OS }}".to_string(),
        context: Some(r#"{"World": "w"}"#.to_string()),
    };
    assert_eq!(cmd_patch(args).unwrap(), "{{ .Data.World }} {{ .OS }}");
}

#[test]
fn test_funcs_lists_builtins_and_helpers() {
    let out = cmd_funcs();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "builtins:");
    assert!(lines.contains(&"  printf"));
    assert!(lines.contains(&"helpers:"));
    assert!(lines.contains(&"  secondsRound"));
}

#[test]
fn test_branch_command_uses_config() {
    let config = config(
        r#"
mapped_branches:
  "feat/*": "f:"
branch_template: "[{{ .Branch }}]"
"#,
    );
    let args = BranchArgs {
        name: "feat/login".to_string(),
        template: None,
    };
    assert_eq!(cmd_branch(&config, args), "[f:login]");
}

#[test]
fn test_branch_template_argument_wins() {
    let config = config("branch_template: \"[{{ .Branch }}]\"\n");
    let args = BranchArgs {
        name: "main".to_string(),
        template: Some("{{ upper .Branch }}".to_string()),
    };
    assert_eq!(cmd_branch(&config, args), "MAIN");
}
