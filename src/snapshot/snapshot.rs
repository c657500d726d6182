use std::path::{Path, PathBuf};

use hashlink::LinkedHashMap;

use crate::snapshot::{Entry, EntryKind, RelPath, Timestamp};

/// Immutable record of one directory subtree at a point in time.
///
/// Entries are keyed by their path relative to the scan root and iterate in
/// traversal order: a parent directory always precedes its children, siblings
/// appear in whatever order the platform listing returned them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    root_path: PathBuf,
    max_depth: i64,
    taken_at: Timestamp,
    entries: LinkedHashMap<RelPath, Entry>,
}

impl Snapshot {
    pub(crate) fn from_parts(
        root_path: PathBuf,
        max_depth: i64,
        taken_at: Timestamp,
        entries: LinkedHashMap<RelPath, Entry>,
    ) -> Self {
        Snapshot {
            root_path,
            max_depth,
            taken_at,
            entries,
        }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn max_depth(&self) -> i64 {
        self.max_depth
    }

    pub fn taken_at(&self) -> Timestamp {
        self.taken_at
    }

    pub fn get(&self, path: &RelPath) -> Option<&Entry> {
        self.entries.get(path)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&RelPath, &Entry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.kind == EntryKind::File)
            .count()
    }

    pub fn directory_count(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.kind == EntryKind::Directory)
            .count()
    }
}
