//! Key-value tables that back an [`Environ`](crate::Environ)

use crate::error::EnvError;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::env;
use std::ffi::{OsStr, OsString};
use std::rc::Rc;

/// A mutable name-to-string table.
///
/// Methods take `&self`: the process environment is global, and
/// [`MemoryEnv`] shares its table between clones, so a deferred accessor or
/// scope guard holding a clone observes later writes.
pub trait EnvStore {
    /// Current value of `key`, if set.
    fn var(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`.
    ///
    /// # Errors
    ///
    /// Rejects keys that are empty or contain `=` or NUL, and values that
    /// contain NUL.
    fn set_var(&self, key: &str, value: &str) -> Result<(), EnvError>;

    /// Remove `key`, returning its previous value.
    fn remove_var(&self, key: &str) -> Option<String>;

    /// All keys currently set.
    fn keys(&self) -> Vec<String>;

    fn contains(&self, key: &str) -> bool {
        self.var(key).is_some()
    }

    /// Value of `key` exactly as stored, for writing back with
    /// [`set_var_os`](Self::set_var_os).
    fn var_os(&self, key: &str) -> Option<OsString> {
        self.var(key).map(OsString::from)
    }

    /// Store a value captured with [`var_os`](Self::var_os).
    fn set_var_os(&self, key: &str, value: &OsStr) -> Result<(), EnvError> {
        self.set_var(key, &value.to_string_lossy())
    }
}

fn valid_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(['=', '\0'])
}

fn check(key: &str, value: &OsStr) -> Result<(), EnvError> {
    if !valid_key(key) {
        return Err(EnvError::InvalidKey {
            key: key.to_string(),
        });
    }
    if value.as_encoded_bytes().contains(&0) {
        return Err(EnvError::InvalidValue {
            key: key.to_string(),
        });
    }
    Ok(())
}

/// The environment of the current process.
///
/// Values that are not valid Unicode are read lossily through
/// [`var`](EnvStore::var) and exactly through [`var_os`](EnvStore::var_os).
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvStore for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        if !valid_key(key) {
            return None;
        }
        env::var_os(key).map(|v| v.to_string_lossy().into_owned())
    }

    fn set_var(&self, key: &str, value: &str) -> Result<(), EnvError> {
        self.set_var_os(key, OsStr::new(value))
    }

    fn var_os(&self, key: &str) -> Option<OsString> {
        if !valid_key(key) {
            return None;
        }
        env::var_os(key)
    }

    fn set_var_os(&self, key: &str, value: &OsStr) -> Result<(), EnvError> {
        check(key, value)?;
        env::set_var(key, value);
        Ok(())
    }

    fn remove_var(&self, key: &str) -> Option<String> {
        let previous = self.var(key)?;
        env::remove_var(key);
        Some(previous)
    }

    fn keys(&self) -> Vec<String> {
        env::vars_os()
            .map(|(k, _)| k.to_string_lossy().into_owned())
            .collect()
    }
}

/// An in-memory table, isolated from the process environment.
///
/// Clones share the same table.
///
/// ```
/// use envcast::{EnvStore, MemoryEnv};
///
/// let store = MemoryEnv::from_iter([("PORT", "8080")]);
/// let view = store.clone();
/// store.set_var("HOST", "localhost").unwrap();
/// assert_eq!(view.var("HOST").as_deref(), Some("localhost"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryEnv {
    vars: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current table.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.vars.borrow().clone()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let vars = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            vars: Rc::new(RefCell::new(vars)),
        }
    }
}

impl EnvStore for MemoryEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.borrow().get(key).cloned()
    }

    fn set_var(&self, key: &str, value: &str) -> Result<(), EnvError> {
        check(key, OsStr::new(value))?;
        self.vars
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_var(&self, key: &str) -> Option<String> {
        self.vars.borrow_mut().remove(key)
    }

    fn keys(&self) -> Vec<String> {
        self.vars.borrow().keys().cloned().collect()
    }
}
