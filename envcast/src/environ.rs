//! Mapping-style facade over an environment table

use crate::cast::{coerce_in, Cast};
use crate::error::EnvError;
use crate::store::{EnvStore, ProcessEnv};
use crate::value::{Coercible, Value};
use std::ffi::{OsStr, OsString};
use std::fmt::Display;

/// A dict-like view of an [`EnvStore`] with typed reads.
///
/// `Environ::new()` wraps the process environment; use
/// [`Environ::with_store`] with a [`MemoryEnv`](crate::MemoryEnv) for an
/// isolated table.
///
/// ```
/// use envcast::{Environ, MemoryEnv, Value};
///
/// let env = Environ::with_store(MemoryEnv::new());
/// env.set("WORKERS", 4).unwrap();
/// env.set("TAGS", Value::List(vec!["api".into(), "v2".into()])).unwrap();
///
/// assert_eq!(env.get_or("WORKERS", 1_i64), 4);
/// assert_eq!(env.raw("TAGS").as_deref(), Some("['api', 'v2']"));
/// assert_eq!(
///     env.get("TAGS", Some(Value::List(vec![])), None).unwrap(),
///     Value::List(vec!["api".into(), "v2".into()]),
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct Environ<S = ProcessEnv> {
    store: S,
}

impl Environ<ProcessEnv> {
    /// Facade over the process environment.
    pub fn new() -> Self {
        Self { store: ProcessEnv }
    }
}

impl<S: EnvStore> Environ<S> {
    pub fn with_store(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Coerce `key` using an optional default or cast.
    ///
    /// See [`coerce_in`] for the full fallback rules.
    ///
    /// # Errors
    ///
    /// - [`EnvError::Conflict`] when both `default` and `cast` are given
    /// - [`EnvError::Convert`] when a custom converter fails on an unset variable
    pub fn get(
        &self,
        key: &str,
        default: Option<Value>,
        cast: Option<Cast>,
    ) -> Result<Value, EnvError> {
        coerce_in(&self.store, key, default, cast)
    }

    /// Read `key` as `T`, falling back to `default` when it is unset or
    /// cannot be converted.
    pub fn get_or<T>(&self, key: &str, default: T) -> T
    where
        T: Coercible + Clone,
    {
        self.get(key, Some(default.clone().into_value()), None)
            .ok()
            .and_then(T::from_value)
            .unwrap_or(default)
    }

    /// A deferred [`get`](Self::get) that reads the store anew on every call.
    pub fn get_callable(
        &self,
        key: impl Into<String>,
        default: Option<Value>,
        cast: Option<Cast>,
    ) -> impl Fn() -> Result<Value, EnvError>
    where
        S: Clone + 'static,
    {
        let store = self.store.clone();
        let key = key.into();
        move || coerce_in(&store, &key, default.clone(), cast.clone())
    }

    /// The raw string stored under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.store.var(key)
    }

    /// Store the string form of `value` under `key`.
    ///
    /// A [`Value`] is stored in its literal form, so containers read back
    /// through [`get`](Self::get) with a default of the same kind.
    pub fn set(&self, key: &str, value: impl Display) -> Result<(), EnvError> {
        self.store.set_var(key, &value.to_string())
    }

    /// Remove `key`, returning its previous value.
    pub fn remove(&self, key: &str) -> Option<String> {
        self.store.remove_var(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.store.contains(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.store.keys()
    }

    /// Key/value pairs currently set.
    pub fn iter(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.store.keys().into_iter().filter_map(move |key| {
            let value = self.store.var(&key)?;
            Some((key, value))
        })
    }

    /// Temporarily set `name` to `value` until the returned guard drops.
    ///
    /// On drop the variable is restored to its prior value, or removed if it
    /// was unset. This also happens when unwinding from a panic.
    ///
    /// ```
    /// use envcast::{Environ, MemoryEnv, Value};
    ///
    /// let env = Environ::with_store(MemoryEnv::new());
    /// {
    ///     let _guard = env.scoped("BLAH", 123).unwrap();
    ///     assert_eq!(env.get_or("BLAH", 0_i64), 123);
    /// }
    /// assert!(!env.contains("BLAH"));
    /// ```
    pub fn scoped(
        &self,
        name: impl Into<String>,
        value: impl Display,
    ) -> Result<EnvGuard<'_, S>, EnvError> {
        let name = name.into();
        let previous = self.store.var_os(&name);
        self.store.set_var(&name, &value.to_string())?;
        Ok(EnvGuard {
            store: &self.store,
            name,
            previous,
        })
    }

    /// Run `f` with `name` temporarily set to `value`.
    pub fn with_var<R>(
        &self,
        name: impl Into<String>,
        value: impl Display,
        f: impl FnOnce() -> R,
    ) -> Result<R, EnvError> {
        let _guard = self.scoped(name, value)?;
        Ok(f())
    }
}

/// Restores a variable changed by [`Environ::scoped`] when dropped.
#[must_use = "the variable is restored as soon as the guard is dropped"]
#[derive(Debug)]
pub struct EnvGuard<'a, S: EnvStore> {
    store: &'a S,
    name: String,
    previous: Option<OsString>,
}

impl<S: EnvStore> EnvGuard<'_, S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value the variable had before the override, byte for byte.
    pub fn previous(&self) -> Option<&OsStr> {
        self.previous.as_deref()
    }
}

impl<S: EnvStore> Drop for EnvGuard<'_, S> {
    fn drop(&mut self) {
        match &self.previous {
            Some(previous) => {
                if let Err(e) = self.store.set_var_os(&self.name, previous) {
                    tracing::warn!(name = %self.name, error = %e, "failed to restore env var");
                }
            }
            None => {
                self.store.remove_var(&self.name);
            }
        }
    }
}
