//! Functions built into the template language itself.
//!
//! These exist in every template independently of the helper library.
//! `and` and `or` short-circuit, so the executor evaluates them directly;
//! they are listed here only so the parser accepts them.

use super::error::{Result, TemplateError};
use super::value::Value;
use std::cmp::Ordering;

/// Signature shared by builtins and helper functions.
pub type NativeFn = fn(&[Value]) -> Result<Value>;

/// Names the executor evaluates lazily.
pub const LAZY: &[&str] = &["and", "or"];

/// Every builtin name, in the order `segtext funcs` lists them.
pub const NAMES: &[&str] = &[
    "and", "or", "not", "eq", "ne", "lt", "le", "gt", "ge", "len", "index", "slice", "print",
    "printf", "println", "call",
];

/// Look up an eagerly evaluated builtin.
pub fn lookup(name: &str) -> Option<NativeFn> {
    let f: NativeFn = match name {
        "not" => not,
        "eq" => eq,
        "ne" => ne,
        "lt" => lt,
        "le" => le,
        "gt" => gt,
        "ge" => ge,
        "len" => len,
        "index" => index,
        "slice" => slice,
        "print" => print,
        "printf" => printf,
        "println" => println,
        "call" => call,
        _ => return None,
    };
    Some(f)
}

/// Whether `name` is any builtin, lazy or not.
pub fn is_builtin(name: &str) -> bool {
    LAZY.contains(&name) || lookup(name).is_some()
}

pub(crate) fn expect_args(name: &str, args: &[Value], count: usize) -> Result<()> {
    if args.len() == count {
        Ok(())
    } else {
        Err(TemplateError::execution(format!(
            "wrong number of args for {}: want {} got {}",
            name,
            count,
            args.len()
        )))
    }
}

fn not(args: &[Value]) -> Result<Value> {
    expect_args("not", args, 1)?;
    Ok(Value::Bool(!args[0].is_truthy()))
}

/// Equality of basic values. Ints and floats compare numerically.
fn basic_eq(a: &Value, b: &Value) -> Result<bool> {
    match (a, b) {
        (Value::Nil, Value::Nil) => Ok(true),
        (Value::Nil, _) | (_, Value::Nil) => Ok(false),
        (Value::Bool(x), Value::Bool(y)) => Ok(x == y),
        (Value::String(x), Value::String(y)) => Ok(x == y),
        (Value::Int(x), Value::Int(y)) => Ok(x == y),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            Ok(a.as_f64() == b.as_f64())
        }
        (Value::List(_) | Value::Map(_) | Value::Func(_) | Value::Object(_), _)
        | (_, Value::List(_) | Value::Map(_) | Value::Func(_) | Value::Object(_)) => {
            Err(TemplateError::execution(format!(
                "non-comparable types {} and {}",
                a.type_name(),
                b.type_name()
            )))
        }
        _ => Err(TemplateError::execution(format!(
            "incompatible types for comparison: {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn eq(args: &[Value]) -> Result<Value> {
    if args.len() < 2 {
        return Err(TemplateError::execution("missing argument for comparison"));
    }
    for candidate in &args[1..] {
        if basic_eq(&args[0], candidate)? {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

fn ne(args: &[Value]) -> Result<Value> {
    expect_args("ne", args, 2)?;
    Ok(Value::Bool(!basic_eq(&args[0], &args[1])?))
}

fn compare(name: &str, args: &[Value]) -> Result<Ordering> {
    expect_args(name, args, 2)?;
    let (a, b) = (&args[0], &args[1]);
    let ordering = match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
    };
    ordering.ok_or_else(|| {
        TemplateError::execution(format!(
            "incompatible types for comparison: {} and {}",
            a.type_name(),
            b.type_name()
        ))
    })
}

fn lt(args: &[Value]) -> Result<Value> {
    Ok(Value::Bool(compare("lt", args)? == Ordering::Less))
}

fn le(args: &[Value]) -> Result<Value> {
    Ok(Value::Bool(compare("le", args)? != Ordering::Greater))
}

fn gt(args: &[Value]) -> Result<Value> {
    Ok(Value::Bool(compare("gt", args)? == Ordering::Greater))
}

fn ge(args: &[Value]) -> Result<Value> {
    Ok(Value::Bool(compare("ge", args)? != Ordering::Less))
}

fn len(args: &[Value]) -> Result<Value> {
    expect_args("len", args, 1)?;
    let n = match &args[0] {
        Value::String(s) => s.len(),
        Value::List(items) => items.len(),
        Value::Map(entries) => entries.len(),
        other => {
            return Err(TemplateError::execution(format!(
                "len of type {}",
                other.type_name()
            )));
        }
    };
    Ok(Value::Int(n as i64))
}

fn index(args: &[Value]) -> Result<Value> {
    let Some((collection, keys)) = args.split_first() else {
        return Err(TemplateError::execution("index of nothing"));
    };

    let mut current = collection.clone();
    for key in keys {
        current = match (&current, key) {
            (Value::List(items), key) => {
                let i = key.as_i64().ok_or_else(|| {
                    TemplateError::execution(format!(
                        "cannot index list with {}",
                        key.type_name()
                    ))
                })?;
                usize::try_from(i)
                    .ok()
                    .and_then(|i| items.get(i))
                    .cloned()
                    .ok_or_else(|| {
                        TemplateError::execution(format!("index out of range: {}", i))
                    })?
            }
            (Value::Map(entries), Value::String(k)) => {
                entries.get(k).cloned().unwrap_or(Value::Nil)
            }
            (Value::String(s), key) => {
                let i = key.as_i64().and_then(|i| usize::try_from(i).ok());
                match i.and_then(|i| s.as_bytes().get(i)) {
                    Some(b) => Value::Int(i64::from(*b)),
                    None => {
                        return Err(TemplateError::execution("string index out of range"));
                    }
                }
            }
            (Value::Nil, _) => return Err(TemplateError::execution("index of nil")),
            (other, key) => {
                return Err(TemplateError::execution(format!(
                    "cannot index {} with {}",
                    other.type_name(),
                    key.type_name()
                )));
            }
        };
    }
    Ok(current)
}

fn slice(args: &[Value]) -> Result<Value> {
    let Some((collection, bounds)) = args.split_first() else {
        return Err(TemplateError::execution("slice of nothing"));
    };
    if bounds.len() > 2 {
        return Err(TemplateError::execution("too many slice indexes"));
    }

    let len = match collection {
        Value::String(s) => s.len(),
        Value::List(items) => items.len(),
        other => {
            return Err(TemplateError::execution(format!(
                "can't slice item of type {}",
                other.type_name()
            )));
        }
    };

    let mut indexes = [0, len];
    for (slot, bound) in bounds.iter().enumerate() {
        indexes[slot] = bound
            .as_i64()
            .and_then(|i| usize::try_from(i).ok())
            .ok_or_else(|| TemplateError::execution("invalid slice index"))?;
    }
    let [start, end] = indexes;
    if start > end || end > len {
        return Err(TemplateError::execution(format!(
            "slice index out of range: {}:{}",
            start, end
        )));
    }

    match collection {
        Value::String(s) => s
            .get(start..end)
            .map(|sub| Value::String(sub.to_string()))
            .ok_or_else(|| TemplateError::execution("slice splits a character")),
        Value::List(items) => Ok(Value::List(items[start..end].to_vec())),
        other => Err(TemplateError::execution(format!(
            "can't slice item of type {}",
            other.type_name()
        ))),
    }
}

/// Concatenate operands, adding spaces between operands when neither side
/// is a string.
fn print(args: &[Value]) -> Result<Value> {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        let is_string = matches!(arg, Value::String(_));
        if i > 0 && !is_string && !matches!(args[i - 1], Value::String(_)) {
            out.push(' ');
        }
        out.push_str(&arg.to_text());
    }
    Ok(Value::String(out))
}

fn println(args: &[Value]) -> Result<Value> {
    let mut out = args
        .iter()
        .map(Value::to_text)
        .collect::<Vec<_>>()
        .join(" ");
    out.push('\n');
    Ok(Value::String(out))
}

fn printf(args: &[Value]) -> Result<Value> {
    let Some((format, rest)) = args.split_first() else {
        return Err(TemplateError::execution("printf requires a format string"));
    };
    let Value::String(format) = format else {
        return Err(TemplateError::execution(format!(
            "printf format must be a string, got {}",
            format.type_name()
        )));
    };
    Ok(Value::String(sprintf(format, rest)))
}

fn call(args: &[Value]) -> Result<Value> {
    let Some((target, rest)) = args.split_first() else {
        return Err(TemplateError::execution("call of nothing"));
    };
    match target {
        Value::Func(f) => f(rest),
        Value::Nil => Err(TemplateError::execution("call of nil")),
        other => Err(TemplateError::execution(format!(
            "non-function of type {}",
            other.type_name()
        ))),
    }
}

/// A parsed `%` directive.
#[derive(Debug, Default)]
struct Spec {
    left_align: bool,
    zero_pad: bool,
    plus: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

/// Largest width or precision a verb accepts.
const MAX_WIDTH: usize = u16::MAX as usize;

/// Format `args` according to `format` using the conventional verbs
/// `%v %s %d %f %e %g %t %q %x %X %c %%`.
pub(crate) fn sprintf(format: &str, args: &[Value]) -> String {
    let mut out = String::new();
    let mut args = args.iter();
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut spec = Spec::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => spec.left_align = true,
                '0' => spec.zero_pad = true,
                '+' => spec.plus = true,
                ' ' | '#' => {}
                _ => break,
            }
            chars.next();
        }
        spec.width = read_digits(&mut chars);
        if chars.peek() == Some(&'.') {
            chars.next();
            spec.precision = Some(read_digits(&mut chars).unwrap_or(0));
        }
        if spec.width.is_some_and(|width| width > MAX_WIDTH) {
            out.push_str("%!(BADWIDTH)");
            spec.width = None;
        }
        if spec.precision.is_some_and(|precision| precision > MAX_WIDTH) {
            out.push_str("%!(BADPREC)");
            spec.precision = None;
        }

        let Some(verb) = chars.next() else {
            out.push_str("%!(NOVERB)");
            break;
        };
        if verb == '%' {
            out.push('%');
            continue;
        }

        let Some(arg) = args.next() else {
            out.push_str(&format!("%!{}(MISSING)", verb));
            continue;
        };
        let body = format_verb(verb, &spec, arg);
        let numeric = arg.as_f64().is_some() && matches!(verb, 'd' | 'f' | 'e' | 'g' | 'v');
        out.push_str(&pad(&body, &spec, numeric));
    }

    let extra: Vec<String> = args
        .map(|arg| format!("{}={}", arg.type_name(), arg.to_text()))
        .collect();
    if !extra.is_empty() {
        out.push_str(&format!("%!(EXTRA {})", extra.join(", ")));
    }
    out
}

fn read_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<usize> {
    let mut digits = String::new();
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    if digits.is_empty() {
        return None;
    }
    // Too many digits for usize still counts as a (too large) width.
    Some(digits.parse().unwrap_or(usize::MAX))
}

fn format_verb(verb: char, spec: &Spec, arg: &Value) -> String {
    let signed = |text: String, negative: bool| {
        if spec.plus && !negative {
            format!("+{}", text)
        } else {
            text
        }
    };

    match (verb, arg) {
        ('v' | 's', Value::String(s)) => match spec.precision {
            Some(p) => s.chars().take(p).collect(),
            None => s.clone(),
        },
        ('v', other) => other.to_text(),
        ('s', other) => other.to_text(),
        ('d', value) if value.as_i64().is_some() => {
            let i = value.as_i64().unwrap_or_default();
            signed(i.to_string(), i < 0)
        }
        ('f' | 'F', value) if value.as_f64().is_some() => {
            let f = value.as_f64().unwrap_or_default();
            signed(format!("{:.*}", spec.precision.unwrap_or(6), f), f < 0.0)
        }
        ('e', value) if value.as_f64().is_some() => {
            let f = value.as_f64().unwrap_or_default();
            let text = format!("{:.*e}", spec.precision.unwrap_or(6), f);
            signed(normalize_exponent(&text), f < 0.0)
        }
        ('g', value) if value.as_f64().is_some() => {
            let f = value.as_f64().unwrap_or_default();
            signed(super::value::format_float(f), f < 0.0)
        }
        ('t', Value::Bool(b)) => b.to_string(),
        ('q', Value::String(s)) => format!("{:?}", s),
        ('q', Value::Int(i)) => match u32::try_from(*i).ok().and_then(char::from_u32) {
            Some(c) => format!("{:?}", c),
            None => format!("%!q(int={})", i),
        },
        ('x', Value::Int(i)) => format!("{:x}", i),
        ('X', Value::Int(i)) => format!("{:X}", i),
        ('x', Value::String(s)) => s.bytes().map(|b| format!("{:02x}", b)).collect(),
        ('X', Value::String(s)) => s.bytes().map(|b| format!("{:02X}", b)).collect(),
        ('c', Value::Int(i)) => u32::try_from(*i)
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| "\u{FFFD}".to_string()),
        (verb, other) => format!("%!{}({}={})", verb, other.type_name(), other.to_text()),
    }
}

/// `1.5e3` → `1.5e+03`.
fn normalize_exponent(text: &str) -> String {
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exponent.abs())
        }
        None => text.to_string(),
    }
}

fn pad(body: &str, spec: &Spec, numeric: bool) -> String {
    let Some(width) = spec.width else {
        return body.to_string();
    };
    let len = body.chars().count();
    if len >= width {
        return body.to_string();
    }
    let fill = width - len;
    if spec.left_align {
        format!("{}{}", body, " ".repeat(fill))
    } else if spec.zero_pad && numeric {
        match body.strip_prefix(['-', '+']) {
            Some(digits) => format!("{}{}{}", &body[..1], "0".repeat(fill), digits),
            None => format!("{}{}", "0".repeat(fill), body),
        }
    } else {
        format!("{}{}", " ".repeat(fill), body)
    }
}
