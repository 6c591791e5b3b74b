//! Tests for reference rewriting.

use super::*;
use serde_json::{Value as JsonValue, json};

fn context() -> JsonValue {
    json!({
        "OS": true,
        "World": true,
        "WorldTrend": "chaos",
        "Working": true,
        "Staging": true,
        "CPU": true,
    })
}

fn assert_patches(template: &str, expected: &str) {
    assert_eq!(patch(template, &context()), expected, "patching {:?}", template);
}

#[test]
fn test_literal_dots_are_untouched() {
    assert_patches(" ... ", " ... ");
    assert_patches("hello . what's up", "hello . what's up");
}

#[test]
fn test_range_variable_chain_is_untouched() {
    assert_patches(
        "{{range $cpu := .CPU}}{{round $cpu.Mhz 2 }} {{end}}",
        "{{range $cpu := .Data.CPU}}{{round $cpu.Mhz 2 }} {{end}}",
    );
}

#[test]
fn test_same_prefix_fields() {
    assert_patches(
        "{{ .Env.HELLO }} {{ .World }} {{ .WorldTrend }}",
        "{{ (call .Getenv \"HELLO\") }} {{ .Data.World }} {{ .Data.WorldTrend }}",
    );
}

#[test]
fn test_same_property_with_different_children() {
    assert_patches(
        "{{ .Env.HELLO }} {{ .World.Trend }} {{ .World.Hello }} {{ .World }}",
        "{{ (call .Getenv \"HELLO\") }} {{ .Data.World.Trend }} {{ .Data.World.Hello }} {{ .Data.World }}",
    );
}

#[test]
fn test_without_spaces() {
    assert_patches(
        "{{.Env.HELLO}} {{.World}}",
        "{{(call .Getenv \"HELLO\")}} {{.Data.World}}",
    );
    assert_patches(
        "{{.Env.HELLO}} {{.World}} {{.World}}",
        "{{(call .Getenv \"HELLO\")}} {{.Data.World}} {{.Data.World}}",
    );
}

#[test]
fn test_parenthesized_references() {
    assert_patches(
        "{{ if or (.Working.Changed) (.Staging.Changed) }}#FF9248{{ end }}",
        "{{ if or (.Data.Working.Changed) (.Data.Staging.Changed) }}#FF9248{{ end }}",
    );
}

#[test]
fn test_explicit_global_escape() {
    assert_patches("{{.$.OS}}", "{{.OS}}");
}

#[test]
fn test_local_field_overrides_reserved_name() {
    assert_patches("{{.OS}}", "{{.Data.OS}}");
}

#[test]
fn test_reserved_name_stays_global_without_local_field() {
    assert_eq!(patch("{{ .OS }} {{ .Shell }}", &json!({})), "{{ .OS }} {{ .Shell }}");
    assert_eq!(patch("{{ .OS }}", &JsonValue::Null), "{{ .OS }}");
}

#[test]
fn test_segments_contains_is_kept() {
    assert_patches(
        r#"{{.Segments.Contains "Git"}}"#,
        r#"{{.Segments.Contains "Git"}}"#,
    );
}

#[test]
fn test_segment_reference_becomes_must_get() {
    assert_patches(
        "{{.Segments.Git.Repo}}",
        r#"{{(.Segments.MustGet "Git").Repo}}"#,
    );
}

#[test]
fn test_unknown_field_on_fieldless_context_goes_to_data() {
    assert_eq!(patch("{{ .Hello }}", &json!({})), "{{ .Data.Hello }}");
}

#[test]
fn test_lone_dot_means_local_context() {
    assert_eq!(patch("{{ . }}", &json!("x")), "{{ .Data }}");
    assert_eq!(
        patch("{{ range . }}{{ . }}{{ end }}", &json!([1])),
        "{{ range .Data }}{{ . }}{{ end }}"
    );
}

#[test]
fn test_strings_and_comments_are_untouched() {
    assert_eq!(
        patch(r#"{{/* .Text */}}{{ eq .Text ".Net" }}"#, &json!({"Text": ".Net"})),
        r#"{{/* .Text */}}{{ eq .Data.Text ".Net" }}"#
    );
}

#[test]
fn test_range_body_keeps_element_references() {
    let template = r#"{{ range .Items }}{{ .Name }} {{ .Env.HOME }} {{ .Segments.Git.Repo }} {{ .$.OS }} {{ .Segments.Contains "Git" }}{{ end }}"#;
    let expected = r#"{{ range .Data.Items }}{{ .Name }} {{ (call $.Getenv "HOME") }} {{ ($.Segments.MustGet "Git").Repo }} {{ $.OS }} {{ $.Segments.Contains "Git" }}{{ end }}"#;
    assert_eq!(patch(template, &json!({"Items": []})), expected);
}

#[test]
fn test_else_of_range_is_outer_scope() {
    assert_eq!(
        patch(
            "{{ range .Items }}{{ .Name }}{{ else }}{{ .Name }}{{ end }}{{ .Name }}",
            &json!({}),
        ),
        "{{ range .Data.Items }}{{ .Name }}{{ else }}{{ .Data.Name }}{{ end }}{{ .Data.Name }}"
    );
}

#[test]
fn test_else_with_opens_a_new_element_scope() {
    assert_eq!(
        patch(
            "{{ with .A }}{{ .B }}{{ else with .C }}{{ .D }}{{ else }}{{ .E }}{{ end }}",
            &json!({}),
        ),
        "{{ with .Data.A }}{{ .B }}{{ else with .Data.C }}{{ .D }}{{ else }}{{ .Data.E }}{{ end }}"
    );
}

#[test]
fn test_if_does_not_change_scope() {
    assert_eq!(
        patch("{{ if .A }}{{ .B }}{{ else if .C }}{{ .D }}{{ end }}", &json!({})),
        "{{ if .Data.A }}{{ .Data.B }}{{ else if .Data.C }}{{ .Data.D }}{{ end }}"
    );
}

#[test]
fn test_if_inside_range_stays_nested() {
    assert_eq!(
        patch(
            "{{ range .Items }}{{ if .Ok }}{{ .OS }}{{ end }}{{ .Name }}{{ end }}",
            &json!({}),
        ),
        "{{ range .Data.Items }}{{ if .Ok }}{{ .OS }}{{ end }}{{ .Name }}{{ end }}"
    );
}

#[test]
fn test_root_variable_reserved_forms() {
    assert_eq!(
        patch(
            "{{ range .Items }}{{ $.Env.HOME }} {{ $.Segments.Git }} {{ $.Data.X }}{{ end }}",
            &json!({}),
        ),
        r#"{{ range .Data.Items }}{{ (call $.Getenv "HOME") }} {{ ($.Segments.MustGet "Git") }} {{ $.Data.X }}{{ end }}"#
    );
}

#[test]
fn test_trim_markers() {
    assert_eq!(
        patch("a  {{- .Text -}}  b", &json!({"Text": "x"})),
        "a  {{- .Data.Text -}}  b"
    );
}

#[test]
fn test_patch_is_idempotent() {
    let templates = [
        "{{ .Env.HELLO }} {{ .World }}",
        "{{.Segments.Git.Repo}} {{.Segments.Contains \"Git\"}}",
        "{{.$.Shell}} {{.OS}}",
        "{{ range .Items }}{{ .Env.HOME }}{{ .$.OS }}{{ end }}",
        "{{ . }}",
        "plain text",
    ];
    for template in templates {
        let once = patch(template, &context());
        assert_eq!(patch(&once, &context()), once, "patching {:?} twice", template);
    }
}

#[test]
fn test_broken_template_is_copied_after_lex_error() {
    assert_eq!(
        patch("{{ .World }} {{ \"unterminated }}", &context()),
        "{{ .Data.World }} {{ \"unterminated }}"
    );
    assert_eq!(
        patch("{{ if .Text }} world", &json!({"Text": "hi"})),
        "{{ if .Data.Text }} world"
    );
}
