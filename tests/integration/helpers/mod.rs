use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use querydump::config::BackendKind;
use querydump::{Config, Location};
use rusqlite::Connection;
use tempfile::TempDir;

/// A scratch directory holding a SQLite database, a SQL script and the output of a run.
pub(crate) struct Fixture {
    pub(crate) dir: TempDir,
}

impl Fixture {
    /// Create the database by running `setup` against a fresh file.
    pub(crate) fn new(setup: &str) -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let connection = Connection::open(dir.path().join("data.db"))?;
        connection.execute_batch(setup)?;
        connection.close().map_err(|(_, err)| err)?;
        Ok(Self { dir })
    }

    pub(crate) fn database(&self) -> PathBuf {
        self.dir.path().join("data.db")
    }

    /// Write the SQL script and return a configuration that runs it.
    pub(crate) fn config(&self, sql: &str) -> Result<Config> {
        let input = self.dir.path().join("query.sql");
        fs::write(&input, sql)?;
        Ok(Config {
            backend: BackendKind::Sqlite,
            database: Location::from(self.database()),
            input,
            output: self.dir.path().to_owned(),
        })
    }

    /// Every JSON document in the output directory.
    pub(crate) fn outputs(&self) -> Result<Vec<PathBuf>> {
        json_files(self.dir.path())
    }
}

fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|extension| extension == "json") {
            files.push(path);
        }
    }
    Ok(files)
}
