//! Point-in-time snapshots of directory subtrees.
//!
//! A scan walks a directory tree down to a caller-chosen depth and records
//! one entry per file or directory found, with size and modification-time
//! metadata. Two snapshots of the same root can then be compared to report
//! added, removed, and modified paths.

mod diff;
mod entry;
mod provider;
mod scanner;
mod snapshot;

pub use diff::SnapshotDiff;
pub use entry::{Entry, EntryKind, RelPath, Timestamp};
pub use provider::{DirChild, FileMetadata, FilesystemProvider, PlatformFs};
pub use scanner::{DEFAULT_MAX_DEPTH, ScanError, ScanOutcome, TreeSnapshotter};
pub use snapshot::Snapshot;
