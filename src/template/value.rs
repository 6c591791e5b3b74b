//! Runtime values manipulated by executing templates.
//!
//! Local contexts and segment values arrive as `serde_json::Value` and are
//! converted into [`Value`]. The shared namespaces add two kinds JSON cannot
//! express: callables (`Getenv`) and objects with methods (`Segments`).

use super::error::{Result, TemplateError};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A callable value, invoked through the `call` builtin.
pub type Function = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// A value with named methods, such as the segment registry namespace.
pub trait Object: Send + Sync {
    /// Name used in diagnostics.
    fn type_name(&self) -> &'static str;

    /// Whether `name` is a method that can be invoked with arguments.
    fn has_method(&self, name: &str) -> bool;

    /// Invoke method `name`. Only called when `has_method(name)` is true.
    fn call_method(&self, name: &str, args: &[Value]) -> Result<Value>;

    /// Plain field lookup; objects expose none by default.
    fn get_field(&self, _name: &str) -> Option<Value> {
        None
    }
}

/// Field presence and lookup, independent of the concrete value shape.
///
/// The patcher asks the local context whether it carries a field before
/// deciding how to rewrite a reference; the executor uses the same
/// capability to resolve field chains.
pub trait Fields {
    /// Whether a field or text key named `name` exists.
    fn has_field(&self, name: &str) -> bool;

    /// The value of field `name`, if present.
    fn get_field(&self, name: &str) -> Option<Value>;
}

/// A dynamically typed template value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Func(Function),
    Object(Arc<dyn Object>),
}

impl Value {
    /// Wrap a closure as a callable value.
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Value::Func(Arc::new(f))
    }

    /// Name of the value's kind, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Func(_) => "func",
            Value::Object(obj) => obj.type_name(),
        }
    }

    /// Truthiness used by `if`, `with`, `and`, `or`, and `not`.
    ///
    /// False, zero, nil, and empty strings, lists, and maps are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
            Value::Func(_) | Value::Object(_) => true,
        }
    }

    /// Borrow the string content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of ints and floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integer view of ints and integral floats.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            _ => None,
        }
    }

    /// Text form used when a value is printed or coerced to a string.
    pub fn to_text(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Resolve field `name` for a field chain step.
    pub(crate) fn field(&self, name: &str) -> Result<Value> {
        match self {
            Value::Map(entries) => entries.get(name).cloned().ok_or_else(|| {
                TemplateError::missing_field(name, format!("map has no key \"{}\"", name))
            }),
            Value::Object(obj) => obj.get_field(name).ok_or_else(|| {
                TemplateError::missing_field(
                    name,
                    format!("{} has no field \"{}\"", obj.type_name(), name),
                )
            }),
            Value::Nil => Err(TemplateError::missing_field(
                name,
                format!("nil value evaluating .{}", name),
            )),
            other => Err(TemplateError::missing_field(
                name,
                format!("can't evaluate field {} in type {}", name, other.type_name()),
            )),
        }
    }
}

impl Fields for Value {
    fn has_field(&self, name: &str) -> bool {
        match self {
            Value::Map(entries) => entries.contains_key(name),
            Value::Object(obj) => obj.get_field(name).is_some(),
            _ => false,
        }
    }

    fn get_field(&self, name: &str) -> Option<Value> {
        self.field(name).ok()
    }
}

impl Fields for JsonValue {
    fn has_field(&self, name: &str) -> bool {
        self.as_object()
            .is_some_and(|object| object.contains_key(name))
    }

    fn get_field(&self, name: &str) -> Option<Value> {
        self.as_object()
            .and_then(|object| object.get(name))
            .map(Value::from)
    }
}

impl From<&JsonValue> for Value {
    fn from(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Nil,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Value::String(s.clone()),
            JsonValue::Array(items) => Value::List(items.iter().map(Value::from).collect()),
            JsonValue::Object(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        Value::from(&json)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Func(a), Value::Func(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Map(entries) => f.debug_map().entries(entries).finish(),
            Value::Func(_) => write!(f, "Func"),
            Value::Object(obj) => write!(f, "Object({})", obj.type_name()),
        }
    }
}

/// Formats like the conventional `%v` verb: `[a b]` for lists,
/// `map[k:v]` for maps, `<nil>` for nil.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "<nil>"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", format_float(*x)),
            Value::String(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "map[")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}:{}", key, value)?;
                }
                write!(f, "]")
            }
            Value::Func(_) => write!(f, "<func>"),
            Value::Object(obj) => write!(f, "<{}>", obj.type_name()),
        }
    }
}

/// Shortest round-trip float formatting, switching to exponent form for
/// very large or very small magnitudes (`1e+21`, `1e-05`).
pub(crate) fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }

    let abs = x.abs();
    if abs != 0.0 && !(1e-4..1e21).contains(&abs) {
        let formatted = format!("{:e}", x);
        if let Some((mantissa, exponent)) = formatted.split_once('e') {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            return format!("{}e{}{:02}", mantissa, sign, exponent.abs());
        }
        return formatted;
    }

    format!("{}", x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_object() {
        let value = Value::from(json!({"Text": "hello", "Count": 2, "Ratio": 0.5}));

        assert!(value.has_field("Text"));
        assert!(!value.has_field("Durp"));
        assert_eq!(value.get_field("Count"), Some(Value::Int(2)));
        assert_eq!(value.get_field("Ratio"), Some(Value::Float(0.5)));
    }

    #[test]
    fn test_json_fields_capability() {
        let context = json!({"World": true});

        assert!(context.has_field("World"));
        assert!(!context.has_field("OS"));
        assert!(!JsonValue::Null.has_field("World"));
        assert!(!json!("scalar").has_field("World"));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::List(vec![]).is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(Value::Float(0.1).is_truthy());
        assert!(Value::func(|_| Ok(Value::Nil)).is_truthy());
    }

    #[test]
    fn test_field_on_nil_is_missing_field() {
        let err = Value::Nil.field("Text").unwrap_err();
        assert!(matches!(err, TemplateError::MissingField { ref name, .. } if name == "Text"));
    }

    #[test]
    fn test_field_on_scalar_is_missing_field() {
        let err = Value::from("posh").field("Text").unwrap_err();
        assert!(err.to_string().contains("can't evaluate field Text in type string"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Nil.to_string(), "<nil>");
        assert_eq!(Value::Float(3.0).to_string(), "3");
        assert_eq!(Value::Float(3.14).to_string(), "3.14");
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::from("a")]).to_string(),
            "[1 a]"
        );
        assert_eq!(
            Value::from(json!({"b": 2, "a": 1})).to_string(),
            "map[a:1 b:2]"
        );
    }

    #[test]
    fn test_format_float_exponents() {
        assert_eq!(format_float(1e21), "1e+21");
        assert_eq!(format_float(0.00001), "1e-05");
        assert_eq!(format_float(-2.5e-7), "-2.5e-07");
        assert_eq!(format_float(0.0), "0");
        assert_eq!(format_float(f64::INFINITY), "+Inf");
    }

    #[test]
    fn test_as_i64_accepts_integral_floats() {
        assert_eq!(Value::Float(2.0).as_i64(), Some(2));
        assert_eq!(Value::Float(2.5).as_i64(), None);
        assert_eq!(Value::from("2").as_i64(), None);
    }
}
