//! Typed access to environment variables
//!
//! `envcast` reads environment variables and converts their string values
//! into booleans, numbers, strings or containers. A malformed value never
//! turns into an error: the conversion failure is logged through `tracing`
//! and the caller's default is used instead.
//!
//! # Features
//!
//! - **Default-driven typing**: the shape of the default picks the conversion
//! - **Safe container parsing**: lists, dicts, sets and tuples are read with a
//!   literal-only parser that never evaluates anything
//! - **Scoped overrides**: set a variable until a guard drops, even on panic
//! - **Env files**: load `NAME=value` files with `#` comments
//! - **Injectable store**: run against the process environment or an
//!   isolated in-memory table
//!
//! # Value Parsing
//!
//! The target shape comes from the default (or an explicit [`Cast`]):
//!
//! - Booleans: `1, y, yes, on, active, activated, enabled, true, t, ok, yeah`
//!   (any case) are true, everything else is false
//! - Integers and floats: `WORKERS=4`, `RATIO=0.25` (`1.0` is not an integer)
//! - Strings: the value with surrounding whitespace removed
//! - Containers: `TAGS=['api', 'v2']`, `LIMITS={"cpu": 2}`, `PAIR=(1, 2)`,
//!   `IDS={1, 2}`; the literal must be of exactly the requested kind
//!
//! # Example
//!
//! ```rust
//! use envcast::{Shape, Value};
//!
//! # fn main() -> Result<(), envcast::EnvError> {
//! let env = envcast::environ();
//! env.set("APP_WORKERS", 8)?;
//! env.set("APP_DEBUG", "yes")?;
//! env.set("APP_TAGS", "['api', 'v2']")?;
//!
//! assert_eq!(env.get_or("APP_WORKERS", 1_i64), 8);
//! assert!(env.get_or("APP_DEBUG", false));
//! assert_eq!(
//!     env.get("APP_TAGS", None, Some(Shape::List.into()))?,
//!     Value::List(vec!["api".into(), "v2".into()]),
//! );
//!
//! // Malformed values fall back to the default
//! env.set("APP_WORKERS", "eight")?;
//! assert_eq!(env.get_or("APP_WORKERS", 1_i64), 1);
//! # for key in ["APP_WORKERS", "APP_DEBUG", "APP_TAGS"] { env.remove(key); }
//! # Ok(())
//! # }
//! ```
//!
//! # Scoped overrides
//!
//! ```rust
//! # fn main() -> Result<(), envcast::EnvError> {
//! let env = envcast::environ();
//! let seen = env.with_var("APP_LEVEL", 3, || env.get_or("APP_LEVEL", 0_i64))?;
//! assert_eq!(seen, 3);
//! assert!(!env.contains("APP_LEVEL"));
//! # Ok(())
//! # }
//! ```

mod cast;
mod environ;
mod error;
mod file;
mod literal;
mod store;
mod value;

pub use cast::{coerce_in, is_truthy, BoxError, Cast, Converter, TRUTHY};
pub use environ::{EnvGuard, Environ};
pub use error::EnvError;
pub use literal::{parse_literal, LiteralError};
pub use store::{EnvStore, MemoryEnv, ProcessEnv};
pub use value::{Coercible, Shape, Value};

use std::path::Path;

/// Facade over the process environment.
pub fn environ() -> Environ<ProcessEnv> {
    Environ::new()
}

/// Read `name` from the process environment and coerce it.
///
/// See [`coerce_in`].
pub fn coerce(name: &str, default: Option<Value>, cast: Option<Cast>) -> Result<Value, EnvError> {
    coerce_in(&ProcessEnv, name, default, cast)
}

/// Load an env file into the process environment.
///
/// See [`Environ::load_env_file`].
pub fn load_env_file(path: impl AsRef<Path>, raises: bool) -> Result<(), EnvError> {
    environ().load_env_file(path, raises)
}
