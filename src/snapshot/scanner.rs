use std::hash::Hasher;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use hashlink::LinkedHashMap;
use metrohash::MetroHash64;
use snafu::{OptionExt, Snafu, ensure};
use tracing::{debug, warn};

use crate::ext::BestEffortPathExt;
use crate::snapshot::provider::{DirChild, FilesystemProvider, PlatformFs};
use crate::snapshot::{Entry, EntryKind, RelPath, Snapshot, Timestamp};

pub const DEFAULT_MAX_DEPTH: i64 = 8;

/// Result of one scan. `skipped` lists the directories that could not be
/// read; an empty list means the snapshot covers the whole subtree.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub snapshot: Snapshot,
    pub skipped: Vec<PathBuf>,
}

impl ScanOutcome {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Walks a directory tree down to a bounded depth and captures one [`Entry`]
/// per node found. Stateless between calls; a scan never writes to the
/// filesystem.
pub struct TreeSnapshotter<F: FilesystemProvider = PlatformFs> {
    provider: F,
    hash_contents: bool,
}

impl TreeSnapshotter {
    pub fn new() -> Self {
        Self::with_provider(PlatformFs)
    }
}

impl<F: FilesystemProvider> TreeSnapshotter<F> {
    pub fn with_provider(provider: F) -> Self {
        TreeSnapshotter {
            provider,
            hash_contents: false,
        }
    }

    /// Enables content fingerprinting for every file. Without it, contents
    /// are only hashed as a fallback when no modification time is available.
    pub fn hash_contents(mut self, enabled: bool) -> Self {
        self.hash_contents = enabled;
        self
    }

    /// Captures a snapshot of the subtree under `root`.
    ///
    /// `max_depth` bounds the walk in directory levels below the root: 0
    /// records only the root's immediate children, and a directory sitting at
    /// the bound is recorded but not expanded. An unreadable directory is
    /// recorded without children, noted in the outcome's `skipped` list, and
    /// the walk continues with the rest of the tree.
    pub fn scan(&self, root: &Path, max_depth: i64) -> Result<ScanOutcome, ScanError> {
        ensure!(max_depth >= 0, InvalidDepthSnafu { max_depth });
        let root_path = self
            .provider
            .resolve_root(root)
            .context(RootNotFoundSnafu { path: root })?;
        let taken_at = Timestamp::from(SystemTime::now());

        let mut entries = LinkedHashMap::new();
        let mut skipped = Vec::new();
        // Explicit work stack instead of recursion, so pathological nesting
        // cannot exhaust the call stack. Children are pushed in reverse to
        // pop in listing order, which keeps the walk depth-first pre-order.
        let mut stack: Vec<WorkItem> = Vec::new();

        self.push_children(&mut stack, &mut skipped, &root_path, &RelPath::root(), max_depth);

        while let Some(item) = stack.pop() {
            match item.kind {
                EntryKind::Directory => {
                    entries.insert(item.rel.clone(), Entry::directory());
                    if item.remaining > 0 {
                        self.push_children(
                            &mut stack,
                            &mut skipped,
                            &item.path,
                            &item.rel,
                            item.remaining - 1,
                        );
                    }
                }
                EntryKind::File => {
                    entries.insert(item.rel, self.file_entry(&item.path));
                }
            }
        }

        debug!(
            "Captured {} entries under {}",
            entries.len(),
            root_path.best_effort_path_display()
        );
        Ok(ScanOutcome {
            snapshot: Snapshot::from_parts(root_path, max_depth, taken_at, entries),
            skipped,
        })
    }

    fn push_children(
        &self,
        stack: &mut Vec<WorkItem>,
        skipped: &mut Vec<PathBuf>,
        dir: &Path,
        rel: &RelPath,
        remaining: i64,
    ) {
        match self.provider.list_dir(dir) {
            Ok(children) => {
                for DirChild { name, kind } in children.into_iter().rev() {
                    stack.push(WorkItem {
                        path: dir.join(&name),
                        rel: rel.child(&name),
                        kind,
                        remaining,
                    });
                }
            }
            Err(e) => {
                warn!(
                    "Could not list {}: {}",
                    dir.best_effort_path_display(),
                    e
                );
                skipped.push(dir.to_path_buf());
            }
        }
    }

    fn file_entry(&self, path: &Path) -> Entry {
        let metadata = match self.provider.file_metadata(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(
                    "Could not read metadata for {}: {}",
                    path.best_effort_path_display(),
                    e
                );
                return Entry::file(0, None, None);
            }
        };
        let modified_at = metadata.modified_at.map(Timestamp::from);
        let content_hash = if self.hash_contents || modified_at.is_none() {
            self.hash_file(path)
        } else {
            None
        };
        Entry::file(metadata.size_bytes, modified_at, content_hash)
    }

    fn hash_file(&self, path: &Path) -> Option<u64> {
        match self.provider.read_file(path) {
            Ok(bytes) => {
                let mut hasher = MetroHash64::default();
                hasher.write(&bytes);
                Some(hasher.finish())
            }
            Err(e) => {
                warn!(
                    "Could not hash contents of {}: {}",
                    path.best_effort_path_display(),
                    e
                );
                None
            }
        }
    }
}

struct WorkItem {
    path: PathBuf,
    rel: RelPath,
    kind: EntryKind,
    remaining: i64,
}

#[derive(Debug, Snafu)]
pub enum ScanError {
    #[snafu(display("Scan root {} does not exist or is not a directory", path.best_effort_path_display()))]
    RootNotFound { path: PathBuf },
    #[snafu(display("Maximum scan depth must not be negative, got {}", max_depth))]
    InvalidDepth { max_depth: i64 },
}
