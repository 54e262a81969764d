//! Loading `NAME=value` files into an environment table

use crate::environ::Environ;
use crate::error::EnvError;
use crate::store::EnvStore;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

impl<S: EnvStore> Environ<S> {
    /// Load variables from an env file.
    ///
    /// Each line is trimmed. Blank lines and lines starting with `#` are
    /// skipped; every other line is split on its first `=` into a name and a
    /// value, both trimmed, and stored with [`Environ::set`]. There is no
    /// quoting or escaping. A line without `=` stores an empty value.
    ///
    /// ```text
    /// # This sets the log level for all the loggers in the program
    /// LOGGER_LEVEL=info
    ///
    /// # Hourly backups are stored at this path
    /// BACKUP_PATH=/data/backups/
    /// ```
    ///
    /// # Errors
    ///
    /// - [`EnvError::FileNotFound`] when the file is missing and `raises` is
    ///   true; with `raises` false a missing file is a no-op
    /// - [`EnvError::FileRead`] for any other I/O failure, including a file
    ///   that is not valid UTF-8
    /// - [`EnvError::InvalidKey`] / [`EnvError::InvalidValue`] when a line
    ///   cannot be stored; lines before it have already been applied
    pub fn load_env_file(&self, path: impl AsRef<Path>, raises: bool) -> Result<(), EnvError> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if raises {
                    return Err(EnvError::FileNotFound {
                        path: path.to_path_buf(),
                        source: e,
                    });
                }
                tracing::debug!(path = %path.display(), "env file not found, skipping");
                return Ok(());
            }
            Err(e) => {
                return Err(EnvError::FileRead {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| EnvError::FileRead {
                path: path.to_path_buf(),
                source: e,
            })?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (name, value) = line.split_once('=').unwrap_or((line, ""));
            let (name, value) = (name.trim(), value.trim());
            self.set(name, value)?;
            tracing::debug!(name, path = %path.display(), "loaded env var from file");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryEnv;
    use crate::value::Value;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn memory() -> Environ<MemoryEnv> {
        Environ::with_store(MemoryEnv::new())
    }

    fn env_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn test_loads_with_comment() {
        let file = env_file("# This is a comment\nX_SET=123");
        let env = memory();
        env.load_env_file(file.path(), false).unwrap();
        assert_eq!(env.raw("X_SET").as_deref(), Some("123"));
        assert_eq!(env.get("X_SET", Some(Value::Int(1)), None).unwrap(), Value::Int(123));
        assert_eq!(env.keys(), vec!["X_SET".to_string()]);
    }

    #[test]
    fn test_trims_and_splits_on_first_equals() {
        let file = env_file(
            "\n   # indented comment\n  URL = postgres://h/db?a=b  \n\nEMPTY=\nBARE\n\tTAB=\tx\n",
        );
        let env = memory();
        env.load_env_file(file.path(), true).unwrap();
        let snapshot = env.store().snapshot();
        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot["URL"], "postgres://h/db?a=b");
        assert_eq!(snapshot["EMPTY"], "");
        assert_eq!(snapshot["BARE"], "");
        assert_eq!(snapshot["TAB"], "x");
    }

    #[test]
    fn test_hash_inside_value_is_kept() {
        let file = env_file("COLOR=#ff0000\n");
        let env = memory();
        env.load_env_file(file.path(), false).unwrap();
        assert_eq!(env.raw("COLOR").as_deref(), Some("#ff0000"));
    }

    #[test]
    fn test_missing_file_is_noop() {
        let dir = tempdir().unwrap();
        let env = Environ::with_store(MemoryEnv::from_iter([("KEEP", "1")]));
        let before = env.store().snapshot();
        env.load_env_file(dir.path().join("missing.env"), false).unwrap();
        assert_eq!(env.store().snapshot(), before);
    }

    #[test]
    fn test_missing_file_raises() {
        let dir = tempdir().unwrap();
        let env = memory();
        let result = env.load_env_file(dir.path().join("missing.env"), true);
        match result {
            Err(EnvError::FileNotFound { path, source }) => {
                assert!(path.ends_with("missing.env"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("Expected FileNotFound error, got {other:?}"),
        }
        assert!(env.keys().is_empty());
    }

    #[test]
    fn test_directory_is_read_error() {
        let dir = tempdir().unwrap();
        let env = memory();
        let result = env.load_env_file(dir.path(), false);
        assert!(matches!(result, Err(EnvError::FileRead { .. })));
    }

    #[test]
    fn test_invalid_utf8_is_read_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"GOOD=1\nBAD=\xff\xfe\n").unwrap();
        let env = memory();
        let result = env.load_env_file(file.path(), false);
        assert!(matches!(result, Err(EnvError::FileRead { .. })));
        assert_eq!(env.raw("GOOD").as_deref(), Some("1"));
    }

    #[test]
    fn test_line_without_name_is_rejected() {
        let file = env_file("=orphan\n");
        let env = memory();
        let result = env.load_env_file(file.path(), false);
        assert!(matches!(result, Err(EnvError::InvalidKey { .. })));
    }
}
