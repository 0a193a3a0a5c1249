use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer};

/// The path that selects an in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// The location of a database.
#[non_exhaustive] // future-proofing for options like network storage
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Location {
    /// An in-memory database. Only useful for tests and queries that do not read any tables.
    InMemory,
    /// A database stored on the disk. It must already exist.
    OnDisk {
        /// The path to the database. This is permitted to be a path to a network file system, if
        /// desired.
        path: PathBuf,
    },
}

impl<T> From<T> for Location
where
    T: Into<PathBuf>,
{
    fn from(path: T) -> Self {
        let path = path.into();
        if path.as_os_str() == IN_MEMORY {
            Self::InMemory
        } else {
            Self::OnDisk { path }
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InMemory => f.write_str(IN_MEMORY),
            Self::OnDisk { path } => write!(f, "{}", path.display()),
        }
    }
}

impl<'de> Deserialize<'de> for Location {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        PathBuf::deserialize(deserializer).map(Self::from)
    }
}
