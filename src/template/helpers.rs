//! The helper function library available inside every template.
//!
//! Helper names are part of the template-authoring surface: renaming one
//! breaks every template that uses it. Helpers are pure functions of their
//! arguments and never reach shared state; that only happens through the
//! `Env` and `Segments` namespaces.
//!
//! Most helpers take their subject last so they compose in pipelines:
//!
//! ```text
//! {{ .Branch | trimPrefix "feature/" | upper }}
//! ```
//!
//! `round VALUE PRECISION` and `replaceP PATTERN INPUT REPLACEMENT` keep the
//! argument order existing templates already rely on.

use super::builtins::{NativeFn, expect_args};
use super::error::{Result, TemplateError};
use super::value::Value;
use chrono::{DateTime, FixedOffset, Utc};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt::Write;

/// A named set of helper functions.
#[derive(Debug, Clone)]
pub struct HelperLibrary {
    functions: BTreeMap<&'static str, NativeFn>,
}

impl HelperLibrary {
    /// The standard library registered with every engine.
    pub fn standard() -> Self {
        let entries: [(&'static str, NativeFn); 30] = [
            ("contains", contains),
            ("hasPrefix", has_prefix),
            ("hasSuffix", has_suffix),
            ("lower", lower),
            ("upper", upper),
            ("title", title),
            ("trim", trim),
            ("trimPrefix", trim_prefix),
            ("trimSuffix", trim_suffix),
            ("trunc", trunc),
            ("replace", replace),
            ("repeat", repeat),
            ("splitList", split_list),
            ("join", join),
            ("default", default),
            ("empty", empty),
            ("toString", to_string),
            ("int", int),
            ("float64", float64),
            ("add", add),
            ("sub", sub),
            ("mul", mul),
            ("div", div),
            ("mod", modulo),
            ("round", round),
            ("replaceP", replace_pattern),
            ("matchP", match_pattern),
            ("secondsRound", seconds_round),
            ("readable", readable),
            ("date", date),
        ];
        Self {
            functions: entries.into_iter().collect(),
        }
    }

    /// Look up a helper by name.
    pub fn get(&self, name: &str) -> Option<NativeFn> {
        self.functions.get(name).copied()
    }

    /// Whether a helper named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Helper names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.functions.keys().copied()
    }
}

impl Default for HelperLibrary {
    fn default() -> Self {
        Self::standard()
    }
}

/// Text view of an argument; nil is empty.
fn text(value: &Value) -> String {
    match value {
        Value::Nil => String::new(),
        other => other.to_text(),
    }
}

fn int_arg(helper: &str, value: &Value) -> Result<i64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        other => other.as_i64(),
    }
    .ok_or_else(|| {
        TemplateError::execution(format!(
            "{}: expected an integer, got {} {}",
            helper,
            value.type_name(),
            value.to_text()
        ))
    })
}

fn float_arg(helper: &str, value: &Value) -> Result<f64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        other => other.as_f64(),
    }
    .ok_or_else(|| {
        TemplateError::execution(format!(
            "{}: expected a number, got {} {}",
            helper,
            value.type_name(),
            value.to_text()
        ))
    })
}

fn compile_pattern(helper: &str, pattern: &Value) -> Result<Regex> {
    Regex::new(&text(pattern))
        .map_err(|err| TemplateError::execution(format!("{}: invalid pattern: {}", helper, err)))
}

fn contains(args: &[Value]) -> Result<Value> {
    expect_args("contains", args, 2)?;
    Ok(Value::Bool(text(&args[1]).contains(&text(&args[0]))))
}

fn has_prefix(args: &[Value]) -> Result<Value> {
    expect_args("hasPrefix", args, 2)?;
    Ok(Value::Bool(text(&args[1]).starts_with(&text(&args[0]))))
}

fn has_suffix(args: &[Value]) -> Result<Value> {
    expect_args("hasSuffix", args, 2)?;
    Ok(Value::Bool(text(&args[1]).ends_with(&text(&args[0]))))
}

fn lower(args: &[Value]) -> Result<Value> {
    expect_args("lower", args, 1)?;
    Ok(Value::String(text(&args[0]).to_lowercase()))
}

fn upper(args: &[Value]) -> Result<Value> {
    expect_args("upper", args, 1)?;
    Ok(Value::String(text(&args[0]).to_uppercase()))
}

/// Uppercase the first letter of every word.
fn title(args: &[Value]) -> Result<Value> {
    expect_args("title", args, 1)?;
    let mut out = String::new();
    let mut at_word_start = true;
    for c in text(&args[0]).chars() {
        if at_word_start && c.is_alphabetic() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c.is_whitespace();
    }
    Ok(Value::String(out))
}

fn trim(args: &[Value]) -> Result<Value> {
    expect_args("trim", args, 1)?;
    Ok(Value::String(text(&args[0]).trim().to_string()))
}

fn trim_prefix(args: &[Value]) -> Result<Value> {
    expect_args("trimPrefix", args, 2)?;
    let (prefix, subject) = (text(&args[0]), text(&args[1]));
    Ok(Value::String(
        subject.strip_prefix(&prefix).unwrap_or(&subject).to_string(),
    ))
}

fn trim_suffix(args: &[Value]) -> Result<Value> {
    expect_args("trimSuffix", args, 2)?;
    let (suffix, subject) = (text(&args[0]), text(&args[1]));
    Ok(Value::String(
        subject.strip_suffix(&suffix).unwrap_or(&subject).to_string(),
    ))
}

/// `trunc N S` keeps the first N characters; a negative N keeps the last.
fn trunc(args: &[Value]) -> Result<Value> {
    expect_args("trunc", args, 2)?;
    let count = int_arg("trunc", &args[0])?;
    let subject = text(&args[1]);
    let total = subject.chars().count();
    let keep = usize::try_from(count.unsigned_abs()).unwrap_or(usize::MAX).min(total);
    let truncated: String = if count >= 0 {
        subject.chars().take(keep).collect()
    } else {
        subject.chars().skip(total - keep).collect()
    };
    Ok(Value::String(truncated))
}

fn replace(args: &[Value]) -> Result<Value> {
    expect_args("replace", args, 3)?;
    Ok(Value::String(
        text(&args[2]).replace(&text(&args[0]), &text(&args[1])),
    ))
}

/// Largest string `repeat` builds.
const MAX_REPEAT_LEN: usize = 1 << 20;

fn repeat(args: &[Value]) -> Result<Value> {
    expect_args("repeat", args, 2)?;
    let count = int_arg("repeat", &args[0])?;
    let count = usize::try_from(count)
        .map_err(|_| TemplateError::execution("repeat: negative count"))?;
    let subject = text(&args[1]);
    match subject.len().checked_mul(count) {
        Some(len) if len <= MAX_REPEAT_LEN => Ok(Value::String(subject.repeat(count))),
        _ => Err(TemplateError::execution(format!(
            "repeat: result longer than {} bytes",
            MAX_REPEAT_LEN
        ))),
    }
}

fn split_list(args: &[Value]) -> Result<Value> {
    expect_args("splitList", args, 2)?;
    let (separator, subject) = (text(&args[0]), text(&args[1]));
    Ok(Value::List(
        subject
            .split(separator.as_str())
            .map(Value::from)
            .collect(),
    ))
}

fn join(args: &[Value]) -> Result<Value> {
    expect_args("join", args, 2)?;
    let separator = text(&args[0]);
    let joined = match &args[1] {
        Value::List(items) => items
            .iter()
            .map(text)
            .collect::<Vec<_>>()
            .join(&separator),
        other => text(other),
    };
    Ok(Value::String(joined))
}

/// `default FALLBACK GIVEN` yields GIVEN unless it is empty.
fn default(args: &[Value]) -> Result<Value> {
    expect_args("default", args, 2)?;
    if args[1].is_truthy() {
        Ok(args[1].clone())
    } else {
        Ok(args[0].clone())
    }
}

fn empty(args: &[Value]) -> Result<Value> {
    expect_args("empty", args, 1)?;
    Ok(Value::Bool(!args[0].is_truthy()))
}

fn to_string(args: &[Value]) -> Result<Value> {
    expect_args("toString", args, 1)?;
    Ok(Value::String(text(&args[0])))
}

fn int(args: &[Value]) -> Result<Value> {
    expect_args("int", args, 1)?;
    let value = match &args[0] {
        Value::Nil => 0,
        Value::Bool(b) => i64::from(*b),
        Value::Float(f) => f.trunc() as i64,
        Value::String(s) => match s.trim().parse::<i64>() {
            Ok(i) => i,
            Err(_) => float_arg("int", &args[0])?.trunc() as i64,
        },
        other => int_arg("int", other)?,
    };
    Ok(Value::Int(value))
}

fn float64(args: &[Value]) -> Result<Value> {
    expect_args("float64", args, 1)?;
    let value = match &args[0] {
        Value::Nil => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        other => float_arg("float64", other)?,
    };
    Ok(Value::Float(value))
}

/// Apply an integer operation when both operands are ints, otherwise a
/// float operation.
fn arithmetic(
    helper: &str,
    args: &[Value],
    ints: fn(i64, i64) -> Option<i64>,
    floats: fn(f64, f64) -> f64,
) -> Result<Value> {
    expect_args(helper, args, 2)?;
    match (&args[0], &args[1]) {
        (Value::Int(a), Value::Int(b)) => ints(*a, *b).map(Value::Int).ok_or_else(|| {
            TemplateError::execution(format!("{}: integer overflow or division by zero", helper))
        }),
        (a, b) => Ok(Value::Float(floats(
            float_arg(helper, a)?,
            float_arg(helper, b)?,
        ))),
    }
}

fn add(args: &[Value]) -> Result<Value> {
    arithmetic("add", args, i64::checked_add, |a, b| a + b)
}

fn sub(args: &[Value]) -> Result<Value> {
    arithmetic("sub", args, i64::checked_sub, |a, b| a - b)
}

fn mul(args: &[Value]) -> Result<Value> {
    arithmetic("mul", args, i64::checked_mul, |a, b| a * b)
}

fn div(args: &[Value]) -> Result<Value> {
    expect_args("div", args, 2)?;
    if float_arg("div", &args[1])? == 0.0 {
        return Err(TemplateError::execution("div: division by zero"));
    }
    arithmetic("div", args, i64::checked_div, |a, b| a / b)
}

fn modulo(args: &[Value]) -> Result<Value> {
    expect_args("mod", args, 2)?;
    let a = int_arg("mod", &args[0])?;
    let b = int_arg("mod", &args[1])?;
    a.checked_rem(b)
        .map(Value::Int)
        .ok_or_else(|| TemplateError::execution("mod: division by zero"))
}

/// `round VALUE PRECISION` rounds half away from zero.
fn round(args: &[Value]) -> Result<Value> {
    expect_args("round", args, 2)?;
    let value = float_arg("round", &args[0])?;
    let precision = int_arg("round", &args[1])?;
    let precision = i32::try_from(precision)
        .map_err(|_| TemplateError::execution("round: precision out of range"))?;
    let factor = 10f64.powi(precision);
    let scaled = value * factor;
    if factor == 0.0 || !scaled.is_finite() {
        return Ok(Value::Float(value));
    }
    Ok(Value::Float(scaled.round() / factor))
}

/// `replaceP PATTERN INPUT REPLACEMENT`; the replacement may reference
/// capture groups as `$1`, `$2`, or `${name}`.
fn replace_pattern(args: &[Value]) -> Result<Value> {
    expect_args("replaceP", args, 3)?;
    let regex = compile_pattern("replaceP", &args[0])?;
    let input = text(&args[1]);
    let replacement = text(&args[2]);
    Ok(Value::String(
        regex.replace_all(&input, replacement.as_str()).into_owned(),
    ))
}

fn match_pattern(args: &[Value]) -> Result<Value> {
    expect_args("matchP", args, 2)?;
    let regex = compile_pattern("matchP", &args[0])?;
    Ok(Value::Bool(regex.is_match(&text(&args[1]))))
}

const SECONDS_ROUND_UNITS: [(i64, &str); 6] = [
    (31_560_000, "y"),
    (2_629_800, "mo"),
    (86_400, "d"),
    (3_600, "h"),
    (60, "m"),
    (1, "s"),
];

/// Render a duration in seconds as its non-zero units: `1h 1m 5s`.
fn seconds_round(args: &[Value]) -> Result<Value> {
    expect_args("secondsRound", args, 1)?;
    let mut remaining = int_arg("secondsRound", &args[0])?.unsigned_abs();
    if remaining == 0 {
        return Ok(Value::from("0s"));
    }

    let mut parts = Vec::new();
    for (unit, name) in SECONDS_ROUND_UNITS {
        let unit = unit.unsigned_abs();
        if remaining >= unit {
            parts.push(format!("{}{}", remaining / unit, name));
            remaining %= unit;
        }
    }
    Ok(Value::String(parts.join(" ")))
}

/// Human readable byte count: `512B`, `1.50KB`, `2.00GB`.
fn readable(args: &[Value]) -> Result<Value> {
    expect_args("readable", args, 1)?;
    const UNIT: f64 = 1024.0;
    const PREFIXES: [char; 6] = ['K', 'M', 'G', 'T', 'P', 'E'];

    let bytes = float_arg("readable", &args[0])?;
    if bytes.abs() < UNIT {
        return Ok(Value::String(format!("{}B", bytes as i64)));
    }

    let mut scaled = bytes / UNIT;
    let mut exponent = 0;
    while scaled.abs() >= UNIT && exponent < PREFIXES.len() - 1 {
        scaled /= UNIT;
        exponent += 1;
    }
    Ok(Value::String(format!("{:.2}{}B", scaled, PREFIXES[exponent])))
}

/// `date FORMAT VALUE`; VALUE is unix seconds (UTC) or an RFC 3339 string.
/// FORMAT uses strftime specifiers.
fn date(args: &[Value]) -> Result<Value> {
    expect_args("date", args, 2)?;
    let format = text(&args[0]);
    let moment: DateTime<FixedOffset> = match &args[1] {
        Value::String(s) => DateTime::parse_from_rfc3339(s).map_err(|err| {
            TemplateError::execution(format!("date: invalid timestamp {:?}: {}", s, err))
        })?,
        other => {
            let seconds = int_arg("date", other)?;
            DateTime::<Utc>::from_timestamp(seconds, 0)
                .ok_or_else(|| TemplateError::execution("date: timestamp out of range"))?
                .fixed_offset()
        }
    };

    let mut out = String::new();
    write!(out, "{}", moment.format(&format))
        .map_err(|_| TemplateError::execution(format!("date: invalid format {:?}", format)))?;
    Ok(Value::String(out))
}
