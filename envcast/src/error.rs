//! Error types for environment variable access

use std::path::PathBuf;

/// Errors surfaced by envcast.
///
/// Malformed variable values are never reported here: coercion contains
/// those failures and falls back to the default. What remains are usage
/// mistakes, store rejections and env-file I/O.
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    /// Both a default and a cast were supplied for the same lookup.
    #[error("Either a default or a cast may be given for '{name}', not both")]
    Conflict {
        /// Name of the environment variable being read
        name: String,
    },

    /// A custom converter failed while being applied to an unset variable.
    ///
    /// Failures on a *set* variable fall back to the default instead.
    #[error("Failed to convert unset environment variable '{name}' as {shape}: {message}")]
    Convert {
        /// Name of the environment variable being read
        name: String,
        /// Target shape of the conversion
        shape: String,
        /// Error message from the converter
        message: String,
    },

    /// The key cannot be stored in an environment table.
    ///
    /// Keys must be non-empty and must not contain `=` or NUL.
    #[error("Invalid environment variable name '{key}'")]
    InvalidKey {
        /// The rejected key
        key: String,
    },

    /// The value for `key` contains a NUL byte.
    #[error("Invalid value for environment variable '{key}': contains NUL")]
    InvalidValue {
        /// Key the value was meant for
        key: String,
    },

    /// The env file does not exist and strict loading was requested.
    #[error("Env file '{}' not found", .path.display())]
    FileNotFound {
        /// Path that was looked up
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Failed to read the env file for a reason other than it being missing.
    #[error("Failed to read env file '{}': {source}", .path.display())]
    FileRead {
        /// Path of the env file
        path: PathBuf,
        /// Underlying I/O error that caused the failure
        source: std::io::Error,
    },
}

impl EnvError {
    pub(crate) fn conflict(name: impl Into<String>) -> Self {
        Self::Conflict { name: name.into() }
    }

    pub(crate) fn convert(
        name: impl Into<String>,
        shape: impl std::fmt::Display,
        message: impl std::fmt::Display,
    ) -> Self {
        Self::Convert {
            name: name.into(),
            shape: shape.to_string(),
            message: message.to_string(),
        }
    }
}
