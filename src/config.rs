//! Run configuration, loaded from a TOML file.
//!
//! ```toml
//! backend = "sqlite"    # or "duckdb"
//! database = "data.db"  # or ":memory:"
//! input = "query.sql"   # or "-" for stdin
//! output = "out"        # directory, defaults to the working directory
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{BoxError, ExportError};
use crate::Location;

/// The database engine to export from.
///
/// Only engines enabled at compile time can be selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// SQLite.
    #[cfg(feature = "sqlite")]
    Sqlite,
    /// DuckDB.
    #[cfg(feature = "duckdb")]
    DuckDb,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite => "sqlite",
            #[cfg(feature = "duckdb")]
            Self::DuckDb => "duckdb",
        })
    }
}

/// Where the query comes from, where it runs and where its result goes.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// The database engine.
    pub backend: BackendKind,
    /// The database to query.
    pub database: Location,
    /// The SQL script. `-` reads it from stdin.
    pub input: PathBuf,
    /// The directory the output document is written to.
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_output() -> PathBuf {
    PathBuf::from(".")
}

impl Config {
    /// Load and validate the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Fails with [`ExportError::Config`] if the file cannot be read or parsed, or describes an
    /// unusable run.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let path = path.as_ref();
        let failed = |source: BoxError| ExportError::Config {
            path: path.to_owned(),
            source,
        };

        let contents = fs::read_to_string(path).map_err(|err| failed(err.into()))?;
        let config: Self = toml::from_str(&contents).map_err(|err| failed(err.into()))?;
        config.validate().map_err(|reason| failed(reason.into()))?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.input.as_os_str().is_empty() {
            return Err("`input` must name a file, or `-` for stdin".to_owned());
        }
        if let Location::OnDisk { path } = &self.database {
            if path.as_os_str().is_empty() {
                return Err("`database` must name a file, or `:memory:`".to_owned());
            }
        }
        if !self.output.is_dir() {
            return Err(format!(
                "output directory {} does not exist",
                self.output.display()
            ));
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;

    fn write(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("config.toml");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().display().to_string();
        let path = write(
            dir.path(),
            &format!(
                "backend = \"sqlite\"\ndatabase = \"data.db\"\ninput = \"-\"\noutput = {output:?}\n"
            ),
        );

        let config = Config::from_path(&path).unwrap();
        assert_eq!(config.backend, BackendKind::Sqlite);
        assert_eq!(config.database, Location::from("data.db"));
        assert_eq!(config.input, PathBuf::from("-"));
        assert_eq!(config.output, dir.path());
    }

    #[test]
    fn output_defaults_to_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "backend = \"sqlite\"\ndatabase = \":memory:\"\ninput = \"query.sql\"\n",
        );

        let config = Config::from_path(&path).unwrap();
        assert_eq!(config.database, Location::InMemory);
        assert_eq!(config.output, PathBuf::from("."));
    }

    #[test]
    fn rejects_bad_configs() {
        let dir = tempfile::tempdir().unwrap();
        for contents in [
            "backend = \"sqlite\"\ninput = \"q.sql\"\n",
            "backend = \"oracle\"\ndatabase = \"d\"\ninput = \"q.sql\"\n",
            "backend = \"sqlite\"\ndatabase = \"d\"\ninput = \"\"\n",
            "backend = \"sqlite\"\ndatabase = \"d\"\ninput = \"q\"\noutput = \"/no/such/dir\"\n",
            "backend = \"sqlite\"\ndatabase = \"d\"\ninput = \"q\"\nextra = 1\n",
        ] {
            let path = write(dir.path(), contents);
            let err = Config::from_path(&path).unwrap_err();
            assert!(matches!(err, ExportError::Config { .. }), "{contents}: {err:?}");
        }
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_path(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ExportError::Config { .. }));
    }
}
