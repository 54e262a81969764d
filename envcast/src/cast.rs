//! Coercion of raw environment strings into typed values

use crate::error::EnvError;
use crate::literal::{parse_literal, strip_underscores};
use crate::store::EnvStore;
use crate::value::{Shape, Value};
use std::fmt;
use std::rc::Rc;

/// Error type returned by custom converters.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A caller-supplied converter. It receives `None` when the variable is unset.
pub type Converter = Rc<dyn Fn(Option<&str>) -> Result<Value, BoxError>>;

/// Strings that read as `true`, compared after lowercasing.
pub const TRUTHY: &[&str] = &[
    "1",
    "y",
    "yes",
    "on",
    "active",
    "activated",
    "enabled",
    "true",
    "t",
    "ok",
    "yeah",
];

/// An explicit conversion target.
#[derive(Clone)]
pub enum Cast {
    /// One of the built-in shapes.
    Shape(Shape),
    /// A named custom converter.
    Custom { name: String, convert: Converter },
}

impl Cast {
    /// Wrap a converter function. `name` identifies it in log output.
    ///
    /// ```
    /// use envcast::{Cast, MemoryEnv, Value, coerce_in};
    ///
    /// let port = Cast::custom("port", |raw| match raw {
    ///     Some(raw) => Ok(Value::Int(raw.parse::<u16>()?.into())),
    ///     None => Ok(Value::Int(8080)),
    /// });
    ///
    /// let store = MemoryEnv::new();
    /// assert_eq!(coerce_in(&store, "PORT", None, Some(port)).unwrap(), Value::Int(8080));
    /// ```
    pub fn custom<F>(name: impl Into<String>, convert: F) -> Self
    where
        F: Fn(Option<&str>) -> Result<Value, BoxError> + 'static,
    {
        Cast::Custom {
            name: name.into(),
            convert: Rc::new(convert),
        }
    }

    /// Converter that parses the value as JSON. An unset variable yields
    /// [`Value::None`].
    pub fn json() -> Self {
        Cast::custom("json", |raw| match raw {
            Some(raw) => Ok(serde_json::from_str::<serde_json::Value>(raw)?.into()),
            None => Ok(Value::None),
        })
    }

    /// Result of casting an unset variable.
    fn apply_absent(&self, name: &str) -> Result<Value, EnvError> {
        match self {
            Cast::Shape(Shape::Bool) => Ok(Value::Bool(false)),
            Cast::Shape(_) => Ok(Value::None),
            Cast::Custom { convert, .. } => {
                convert(None).map_err(|e| EnvError::convert(name, self, e))
            }
        }
    }

    /// Convert a trimmed raw string. `Ok(None)` means the default should be
    /// used without it being an error.
    fn convert(&self, raw: &str) -> Result<Option<Value>, BoxError> {
        let shape = match self {
            Cast::Custom { convert, .. } => return convert(Some(raw)).map(Some),
            Cast::Shape(shape) => *shape,
        };
        if shape.is_container() {
            let value = parse_literal(raw)?;
            match value.shape() {
                Some(found) if found == shape => {}
                Some(found) => return Err(format!("expected {shape}, found {found}").into()),
                None => return Err(format!("expected {shape}, found None").into()),
            }
            return Ok((!value.is_empty_container()).then_some(value));
        }
        let value = match shape {
            Shape::Bool => Value::Bool(is_truthy(raw)),
            Shape::Int => Value::Int(number(raw)?.parse()?),
            Shape::Float => Value::Float(number(raw)?.parse()?),
            _ => Value::Str(raw.to_string()),
        };
        Ok(Some(value))
    }
}

impl From<Shape> for Cast {
    fn from(shape: Shape) -> Self {
        Cast::Shape(shape)
    }
}

impl fmt::Display for Cast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cast::Shape(shape) => shape.fmt(f),
            Cast::Custom { name, .. } => f.write_str(name),
        }
    }
}

impl fmt::Debug for Cast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cast::Shape(shape) => f.debug_tuple("Shape").field(shape).finish(),
            Cast::Custom { name, .. } => f.debug_struct("Custom").field("name", name).finish(),
        }
    }
}

/// `raw` with `1_000` style digit separators removed.
fn number(raw: &str) -> Result<String, BoxError> {
    strip_underscores(raw, false).ok_or_else(|| "invalid digit separator".into())
}

/// Whether `raw` is one of the [`TRUTHY`] tokens, ignoring case.
pub fn is_truthy(raw: &str) -> bool {
    let lowered = raw.to_lowercase();
    TRUTHY.contains(&lowered.as_str())
}

/// Read `name` from `store` and coerce it.
///
/// The target comes from `cast` when given, otherwise from the shape of
/// `default`. A `default` of [`Value::None`] counts as no default.
///
/// - Neither given: the raw string, untrimmed, or [`Value::None`] if unset.
/// - Unset with only a cast: the cast applied to the absence (`false` for
///   [`Shape::Bool`], [`Value::None`] for other shapes, whatever a custom
///   converter returns for `None`).
/// - Unset otherwise: the default.
/// - Set: the trimmed value converted to the target. A conversion that fails
///   is logged and replaced by the default, as is a container literal of the
///   wrong kind or an empty one.
///
/// # Errors
///
/// - [`EnvError::Conflict`] when both `default` and `cast` are given
/// - [`EnvError::Convert`] when a custom converter fails on an unset variable
pub fn coerce_in<S>(
    store: &S,
    name: &str,
    default: Option<Value>,
    cast: Option<Cast>,
) -> Result<Value, EnvError>
where
    S: EnvStore + ?Sized,
{
    let default = default.filter(|d| !d.is_none());
    let raw = store.var(name);

    if default.is_none() && cast.is_none() {
        return Ok(raw.map_or(Value::None, Value::Str));
    }
    if default.is_some() && cast.is_some() {
        return Err(EnvError::conflict(name));
    }

    let Some(raw) = raw else {
        return match (default, cast) {
            (None, Some(cast)) => cast.apply_absent(name),
            (default, _) => Ok(default.unwrap_or(Value::None)),
        };
    };

    let target = match (cast, default.as_ref().and_then(Value::shape)) {
        (Some(cast), _) => cast,
        (None, Some(shape)) => Cast::Shape(shape),
        (None, None) => return Ok(Value::Str(raw)),
    };
    let trimmed = raw.trim();

    match target.convert(trimmed) {
        Ok(Some(value)) => Ok(value),
        Ok(None) => {
            tracing::debug!(name, raw = trimmed, shape = %target, "empty container, using the default");
            Ok(default.unwrap_or(Value::None))
        }
        Err(error) => {
            tracing::error!(
                name,
                raw = trimmed,
                shape = %target,
                error = %error,
                "env var cast failed, the default will be used"
            );
            Ok(default.unwrap_or(Value::None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryEnv;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture_logs(f: impl FnOnce()) -> String {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = logs.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    fn env_with(value: &str) -> MemoryEnv {
        MemoryEnv::from_iter([("X", value)])
    }

    fn with_default(setting: &str, default: impl Into<Value>) -> Value {
        coerce_in(&env_with(setting), "X", Some(default.into()), None).unwrap()
    }

    fn with_cast(setting: &str, shape: Shape) -> Value {
        coerce_in(&env_with(setting), "X", None, Some(shape.into())).unwrap()
    }

    fn int_list(items: &[i64]) -> Value {
        Value::List(items.iter().copied().map(Value::Int).collect())
    }

    #[test]
    fn test_missing_without_default() {
        let store = MemoryEnv::new();
        assert_eq!(coerce_in(&store, "BLAH", None, None).unwrap(), Value::None);
        assert_eq!(
            coerce_in(&store, "BLAH", Some(Value::None), None).unwrap(),
            Value::None
        );
    }

    #[test]
    fn test_missing_returns_default() {
        let store = MemoryEnv::new();
        let value = coerce_in(&store, "BLAH", Some(Value::Int(5)), None).unwrap();
        assert_eq!(value, Value::Int(5));
    }

    #[test]
    fn test_no_target_returns_raw_untrimmed() {
        let value = coerce_in(&env_with("  padded "), "X", None, None).unwrap();
        assert_eq!(value, Value::from("  padded "));
    }

    #[test]
    fn test_default_and_cast_conflict() {
        let result = coerce_in(
            &MemoryEnv::new(),
            "X",
            Some(Value::Int(1)),
            Some(Shape::Int.into()),
        );
        assert!(matches!(result, Err(EnvError::Conflict { name }) if name == "X"));
    }

    #[test]
    fn test_truthy_tokens() {
        for token in TRUTHY {
            assert_eq!(with_default(token, false), Value::Bool(true), "{token}");
            assert_eq!(
                with_default(&token.to_uppercase(), false),
                Value::Bool(true),
                "{token}"
            );
        }
        for setting in ["Yes", "On", "Active", "True", " yes "] {
            assert_eq!(with_default(setting, false), Value::Bool(true), "{setting}");
        }
    }

    #[test]
    fn test_falsy_strings() {
        for setting in ["", "0", "123", "yas", "blah", "____", "heyy", "false", "False", "no"] {
            assert_eq!(with_default(setting, true), Value::Bool(false), "{setting}");
            assert_eq!(with_cast(setting, Shape::Bool), Value::Bool(false), "{setting}");
        }
    }

    #[test]
    fn test_int_default() {
        assert_eq!(with_default("123", 2), Value::Int(123));
        assert_eq!(with_default("-123", 123), Value::Int(-123));
        assert_eq!(with_default("0", 0), Value::Int(0));
        assert_eq!(with_default("heyy", 123), Value::Int(123));
        assert_eq!(with_default("1.0", 1), Value::Int(1));
        assert_eq!(with_default(" 7 ", 1), Value::Int(7));
    }

    #[test]
    fn test_int_digit_separators() {
        assert_eq!(with_default("1_000", 2), Value::Int(1000));
        assert_eq!(with_cast("-1_000_000", Shape::Int), Value::Int(-1_000_000));
        assert_eq!(with_cast("2_5.0_5", Shape::Float), Value::Float(25.05));
        for setting in ["1__0", "_1", "1_", "1_e5"] {
            assert_eq!(with_default(setting, 7), Value::Int(7), "{setting}");
        }
        assert_eq!(with_cast("1_.5", Shape::Float), Value::None);
    }

    #[test]
    fn test_float_default() {
        assert_eq!(with_default("0", 0.1), Value::Float(0.0));
        assert_eq!(with_default("1.2", 0.1), Value::Float(1.2));
        assert_eq!(with_default("-1.2", -0.1), Value::Float(-1.2));
    }

    #[test]
    fn test_str_default() {
        assert_eq!(with_default("blah", "heya"), Value::from("blah"));
        assert_eq!(with_default("1.053", "0"), Value::from("1.053"));
    }

    #[test]
    fn test_numeric_casts() {
        assert_eq!(with_cast("blah", Shape::Float), Value::None);
        assert_eq!(with_cast("1", Shape::Float), Value::Float(1.0));
        assert_eq!(with_cast("1", Shape::Float), Value::Int(1));
        assert_eq!(with_cast("1e-17", Shape::Float), Value::Float(1e-17));
        assert_eq!(with_cast("blah", Shape::Int), Value::None);
        assert_eq!(with_cast("1", Shape::Int), Value::Int(1));
        assert_eq!(with_cast("1.0", Shape::Int), Value::None);
        assert_eq!(with_cast("1.0", Shape::Float), Value::Float(1.0));
        assert_eq!(with_cast("1.0", Shape::Str), Value::from("1.0"));
    }

    #[test]
    fn test_dict_targets() {
        assert_eq!(
            with_default(r#"{"a": 1}"#, Value::Dict(vec![])),
            Value::dict([(Value::from("a"), Value::Int(1))])
        );
        assert_eq!(
            with_default(r#"{"a": "blah", "b": "bleh"}"#, Value::Dict(vec![])),
            Value::dict([
                (Value::from("a"), Value::from("blah")),
                (Value::from("b"), Value::from("bleh")),
            ])
        );
        assert_eq!(
            with_cast(r#"{"a": 123}"#, Shape::Dict),
            Value::dict([(Value::from("a"), Value::Int(123))])
        );
    }

    #[test]
    fn test_list_targets() {
        let empty = Value::List(vec![]);
        assert_eq!(with_default("[1, 2, 3]", empty.clone()), int_list(&[1, 2, 3]));
        assert_eq!(with_default("[]", empty.clone()), empty);
        assert_eq!(with_default("[", empty.clone()), empty);
        assert_eq!(with_default("[blah]", empty.clone()), empty);
        assert_eq!(
            with_default(r#"["blah"]"#, empty.clone()),
            Value::List(vec![Value::from("blah")])
        );
        assert_eq!(with_cast("1", Shape::List), Value::None);
        assert_eq!(with_cast("[1]", Shape::List), int_list(&[1]));
    }

    #[test]
    fn test_tuple_targets() {
        let pair = Value::Tuple(vec![Value::Int(1), Value::Int(2)]);
        let empty = Value::Tuple(vec![]);
        assert_eq!(with_default("blah", pair.clone()), pair);
        assert_eq!(with_default("blah", empty.clone()), empty);
        assert_eq!(with_default("(1, 2)", empty.clone()), pair);
        assert_eq!(with_default("(1,2)", empty.clone()), pair);
        assert_eq!(with_default("(   1   ,   2   )", empty.clone()), pair);
        assert_eq!(with_default("(1)", empty.clone()), empty);
        assert_eq!(
            with_default("(1,)", empty),
            Value::Tuple(vec![Value::Int(1)])
        );
    }

    #[test]
    fn test_set_targets() {
        let default = Value::set([Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(
            with_default("{1, 2}", default.clone()),
            Value::set([Value::Int(1), Value::Int(2)])
        );
        assert_eq!(with_default(r#"{"1":2}"#, default.clone()), default);
        assert_eq!(with_cast("{2}", Shape::Set), Value::set([Value::Int(2)]));
    }

    #[test]
    fn test_exact_container_kind() {
        let list = int_list(&[9]);
        assert_eq!(with_default("(1, 2)", list.clone()), list);
        assert_eq!(with_default("{1, 2}", list.clone()), list);
        assert_eq!(with_default("'[1]'", list.clone()), list);
    }

    #[test]
    fn test_empty_container_uses_default() {
        let list = int_list(&[9]);
        assert_eq!(with_default("[]", list.clone()), list);
        let dict = Value::dict([(Value::from("k"), Value::Int(0))]);
        assert_eq!(with_default("{}", dict.clone()), dict);
        assert_eq!(with_cast("()", Shape::Tuple), Value::None);
    }

    #[test]
    fn test_no_code_evaluation() {
        let cases = [
            ("list(1,2,3)", Value::List(vec![])),
            ("set([2])", Value::set([])),
            ("dict(a=1)", Value::Dict(vec![])),
        ];
        for (setting, default) in cases {
            assert_eq!(with_default(setting, default.clone()), default, "{setting}");
        }
    }

    #[test]
    fn test_custom_cast_present_and_absent() {
        let doubled = Cast::custom("doubled", |raw| match raw {
            Some(raw) => Ok(Value::Int(raw.parse::<i64>()? * 2)),
            None => Ok(Value::Int(0)),
        });
        let value = coerce_in(&env_with(" 21 "), "X", None, Some(doubled.clone())).unwrap();
        assert_eq!(value, Value::Int(42));

        let value = coerce_in(&env_with("nope"), "X", None, Some(doubled.clone())).unwrap();
        assert_eq!(value, Value::None);

        let value = coerce_in(&MemoryEnv::new(), "X", None, Some(doubled)).unwrap();
        assert_eq!(value, Value::Int(0));
    }

    #[test]
    fn test_custom_cast_failure_on_absent_is_surfaced() {
        let strict = Cast::custom("strict", |raw| match raw {
            Some(raw) => Ok(Value::from(raw)),
            None => Err("value is required".into()),
        });
        let result = coerce_in(&MemoryEnv::new(), "X", None, Some(strict));
        match result {
            Err(EnvError::Convert { name, shape, message }) => {
                assert_eq!(name, "X");
                assert_eq!(shape, "strict");
                assert_eq!(message, "value is required");
            }
            other => panic!("Expected Convert error, got {other:?}"),
        }
    }

    #[test]
    fn test_builtin_cast_on_absent() {
        let store = MemoryEnv::new();
        assert_eq!(
            coerce_in(&store, "X", None, Some(Shape::Bool.into())).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            coerce_in(&store, "X", None, Some(Shape::Int.into())).unwrap(),
            Value::None
        );
    }

    #[test]
    fn test_json_cast() {
        let value = coerce_in(&env_with(r#"{"on": true, "n": null}"#), "X", None, Some(Cast::json()))
            .unwrap();
        assert_eq!(
            value,
            Value::dict([
                (Value::from("on"), Value::Bool(true)),
                (Value::from("n"), Value::None),
            ])
        );
        let value = coerce_in(&env_with("{'single': 1}"), "X", None, Some(Cast::json())).unwrap();
        assert_eq!(value, Value::None);
    }

    #[test]
    fn test_failed_cast_is_logged_as_error() {
        let logs = capture_logs(|| {
            assert_eq!(with_default("heyy", 123), Value::Int(123));
        });
        assert!(logs.contains("ERROR"), "{logs}");
        assert!(logs.contains(r#"name="X""#), "{logs}");
        assert!(logs.contains(r#"raw="heyy""#), "{logs}");
        assert!(logs.contains("shape=int"), "{logs}");
    }

    #[test]
    fn test_bool_and_empty_container_are_not_errors() {
        let logs = capture_logs(|| {
            assert_eq!(with_default("heyy", true), Value::Bool(false));
        });
        assert!(!logs.contains("ERROR"), "{logs}");

        let logs = capture_logs(|| {
            let list = int_list(&[9]);
            assert_eq!(with_default("[]", list.clone()), list);
        });
        assert!(!logs.contains("ERROR"), "{logs}");
        assert!(logs.contains("DEBUG"), "{logs}");
        assert!(logs.contains("shape=list"), "{logs}");
    }
}
