//! Typed values produced by coercion
//!
//! [`Value`] mirrors the literal grammar accepted by [`parse_literal`]: a
//! handful of scalars plus four container kinds. Its [`Display`] output is the
//! literal form (top-level strings excepted), so a container written to the
//! environment with [`Environ::set`] reads back as the same container.
//!
//! [`parse_literal`]: crate::parse_literal
//! [`Environ::set`]: crate::Environ::set
//! [`Display`]: std::fmt::Display

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::fmt::{self, Write as _};

/// The kind of value a raw string is coerced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Bool,
    Int,
    Float,
    Str,
    List,
    Dict,
    Set,
    Tuple,
}

impl Shape {
    /// Container shapes are parsed with the literal parser.
    pub fn is_container(self) -> bool {
        matches!(self, Shape::List | Shape::Dict | Shape::Set | Shape::Tuple)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Shape::Bool => "bool",
            Shape::Int => "int",
            Shape::Float => "float",
            Shape::Str => "str",
            Shape::List => "list",
            Shape::Dict => "dict",
            Shape::Set => "set",
            Shape::Tuple => "tuple",
        };
        f.write_str(name)
    }
}

/// A value read from, or destined for, the environment.
///
/// `Set` holds unique elements in insertion order and `Dict` holds unique
/// keys in insertion order; use [`Value::set`] and [`Value::dict`] to build
/// them so that invariant holds. Both compare without regard to order.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Set(Vec<Value>),
    Dict(Vec<(Value, Value)>),
}

impl Value {
    /// Build a set, dropping repeated elements.
    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        let mut unique: Vec<Value> = Vec::new();
        for item in items {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        Value::Set(unique)
    }

    /// Build a dict; a repeated key keeps its first position and its last value.
    pub fn dict(pairs: impl IntoIterator<Item = (Value, Value)>) -> Self {
        let mut entries: Vec<(Value, Value)> = Vec::new();
        for (key, value) in pairs {
            match entries.iter().position(|(k, _)| *k == key) {
                Some(i) => entries[i].1 = value,
                None => entries.push((key, value)),
            }
        }
        Value::Dict(entries)
    }

    /// The shape of this value, or `None` for [`Value::None`].
    pub fn shape(&self) -> Option<Shape> {
        match self {
            Value::None => None,
            Value::Bool(_) => Some(Shape::Bool),
            Value::Int(_) => Some(Shape::Int),
            Value::Float(_) => Some(Shape::Float),
            Value::Str(_) => Some(Shape::Str),
            Value::List(_) => Some(Shape::List),
            Value::Tuple(_) => Some(Shape::Tuple),
            Value::Set(_) => Some(Shape::Set),
            Value::Dict(_) => Some(Shape::Dict),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Whether the value may be used as a dict key or set element.
    pub fn is_hashable(&self) -> bool {
        match self {
            Value::List(_) | Value::Set(_) | Value::Dict(_) => false,
            Value::Tuple(items) => items.iter().all(Value::is_hashable),
            _ => true,
        }
    }

    /// Whether the value is an empty container.
    pub fn is_empty_container(&self) -> bool {
        match self {
            Value::List(items) | Value::Tuple(items) | Value::Set(items) => items.is_empty(),
            Value::Dict(entries) => entries.is_empty(),
            _ => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float view; integers widen.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Elements of a list, tuple or set.
    pub fn as_items(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Tuple(items) | Value::Set(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Dict(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a dict entry by key.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.as_dict()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Literal form of the value, with strings quoted.
    pub fn repr(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_repr(&mut out);
        out
    }

    fn write_repr(&self, out: &mut String) -> fmt::Result {
        match self {
            Value::None => out.write_str("None"),
            Value::Bool(true) => out.write_str("True"),
            Value::Bool(false) => out.write_str("False"),
            Value::Int(i) => write!(out, "{i}"),
            Value::Float(x) => write_float(out, *x),
            Value::Str(s) => write_quoted(out, s),
            Value::List(items) => {
                out.push('[');
                write_items(out, items)?;
                out.push(']');
                Ok(())
            }
            Value::Tuple(items) => {
                out.push('(');
                write_items(out, items)?;
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
                Ok(())
            }
            // `{}` would read back as a dict
            Value::Set(items) if items.is_empty() => out.write_str("set()"),
            Value::Set(items) => {
                out.push('{');
                write_items(out, items)?;
                out.push('}');
                Ok(())
            }
            Value::Dict(entries) => {
                out.push('{');
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    key.write_repr(out)?;
                    out.push_str(": ");
                    value.write_repr(out)?;
                }
                out.push('}');
                Ok(())
            }
        }
    }
}

fn write_items(out: &mut String, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        item.write_repr(out)?;
    }
    Ok(())
}

fn write_float(out: &mut String, x: f64) -> fmt::Result {
    if x.is_nan() {
        out.write_str("nan")
    } else if x.is_infinite() {
        out.write_str(if x > 0.0 { "inf" } else { "-inf" })
    } else {
        // Debug keeps a fractional part or exponent, e.g. `1.0`, `1e-17`
        write!(out, "{x:?}")
    }
}

fn write_quoted(out: &mut String, s: &str) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c == '\x7f' => write!(out, "\\x{:02x}", c as u32)?,
            c => out.push(c),
        }
    }
    out.push(quote);
    Ok(())
}

impl fmt::Display for Value {
    /// Strings display bare; everything else displays as its literal form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            other => f.write_str(&other.repr()),
        }
    }
}

/// Exact comparison; no rounding through `f64` for integers above 2^53.
fn int_eq_float(int: i64, float: f64) -> bool {
    // i64::MIN as f64 is exactly -2^63; 2^63 itself is out of range
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    float.fract() == 0.0 && (-BOUND..BOUND).contains(&float) && float as i64 == int
}

/// Numbers compare by value across `Bool`, `Int` and `Float`, so `True`,
/// `1` and `1.0` are the same set element or dict key.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                int_eq_float(*a, *b)
            }
            (Value::Bool(a), Value::Int(b)) | (Value::Int(b), Value::Bool(a)) => {
                i64::from(*a) == *b
            }
            (Value::Bool(a), Value::Float(b)) | (Value::Float(b), Value::Bool(a)) => {
                int_eq_float(i64::from(*a), *b)
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len() && a.iter().all(|item| b.contains(item))
            }
            (Value::Dict(a), Value::Dict(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, value)| {
                        b.iter().any(|(other_key, other_value)| {
                            key == other_key && value == other_value
                        })
                    })
            }
            _ => false,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::None => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) | Value::Tuple(items) | Value::Set(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Dict(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    // Non-string keys are written in their literal form
                    match key {
                        Value::Str(s) => map.serialize_entry(s, value)?,
                        other => map.serialize_entry(&other.repr(), value)?,
                    }
                }
                map.end()
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::None,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::dict(
                map.into_iter()
                    .map(|(k, v)| (Value::Str(k), Value::from(v))),
            ),
        }
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
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

/// Rust types with a fixed coercion shape.
///
/// Used by [`Environ::get_or`](crate::Environ::get_or) to read a variable
/// straight into a native type.
pub trait Coercible: Sized {
    const SHAPE: Shape;

    fn into_value(self) -> Value;

    /// `None` if `value` is not of [`Self::SHAPE`].
    fn from_value(value: Value) -> Option<Self>;
}

impl Coercible for bool {
    const SHAPE: Shape = Shape::Bool;

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_bool()
    }
}

impl Coercible for i64 {
    const SHAPE: Shape = Shape::Int;

    fn into_value(self) -> Value {
        Value::Int(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_int()
    }
}

impl Coercible for f64 {
    const SHAPE: Shape = Shape::Float;

    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_float()
    }
}

impl Coercible for String {
    const SHAPE: Shape = Shape::Str;

    fn into_value(self) -> Value {
        Value::Str(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl Coercible for Vec<Value> {
    const SHAPE: Shape = Shape::List;

    fn into_value(self) -> Value {
        Value::List(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}
