//! JSON manifest listing the annotations of a set of files.
//!
//! ```json
//! {
//!   "hello_world.txt": [
//!     { "start": 0, "end": 5, "open": "<b>", "close": "</b>" },
//!     { "start": 7, "end": 12, "open": "<i>", "close": "</i>", "priority": 1 }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Annotation;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read manifest {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Entry {
    pub start: i64,
    pub end: i64,
    pub open: String,
    pub close: String,
    #[serde(default)]
    pub priority: i32,
}

impl From<&Entry> for Annotation {
    fn from(e: &Entry) -> Self {
        Annotation::new(e.start, e.end, e.open.as_bytes(), e.close.as_bytes())
            .with_priority(e.priority)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    files: HashMap<String, Vec<Entry>>,
}

impl Manifest {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let json = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// File names in the manifest, in no particular order.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn annotations(&self, file: &str) -> Option<Vec<Annotation>> {
        self.files
            .get(file)
            .map(|entries| entries.iter().map(Annotation::from).collect())
    }
}
