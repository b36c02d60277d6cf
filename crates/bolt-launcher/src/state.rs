use std::io;
use std::path::{Path, PathBuf};

use crate::archive::write_file;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Hash,
    Id,
    Version,
}

impl MarkerKind {
    pub fn label(self) -> &'static str {
        match self {
            MarkerKind::Hash => "hash",
            MarkerKind::Id => "id",
            MarkerKind::Version => "version",
        }
    }
}

/// Single-value file recording which payload was last deployed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMarker {
    pub kind: MarkerKind,
    pub path: PathBuf,
    pub value: String,
}

impl StateMarker {
    pub fn new(kind: MarkerKind, path: impl Into<PathBuf>, value: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            value: value.into(),
        }
    }

    /// Overwrites the marker file in full.
    pub fn save(&self) -> io::Result<()> {
        write_file(&self.path, self.value.as_bytes(), 0o644)
    }

    /// Body for a launch that succeeded but could not record this marker.
    pub fn unsaved_body(&self) -> String {
        format!("OK, but unable to save {} file\n", self.kind.label())
    }
}

/// Current marker value, or `None` when nothing has been deployed yet.
pub fn read_marker(path: &Path) -> Option<String> {
    std::fs::read_to_string(path).ok()
}
