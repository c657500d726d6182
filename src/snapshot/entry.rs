use std::fmt;
use std::time::SystemTime;

use bincode::{Decode, Encode};
use derive_more::{Deref, Display};

/// Identity of one node inside a snapshot: the path segments leading from the
/// scan root to the node. Unique within a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deref, Encode, Decode)]
pub struct RelPath(Vec<String>);

impl RelPath {
    /// The empty path, denoting the scan root itself.
    pub fn root() -> Self {
        RelPath(Vec::new())
    }

    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.to_string());
        RelPath(segments)
    }
}

impl fmt::Display for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl From<&str> for RelPath {
    fn from(path: &str) -> Self {
        RelPath(
            path.split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

/// Seconds and nanoseconds since the Unix epoch. Pre-epoch times clamp to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode)]
pub struct Timestamp {
    secs: u64,
    nanos: u32,
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        time.duration_since(SystemTime::UNIX_EPOCH)
            .map(|elapsed| Timestamp {
                secs: elapsed.as_secs(),
                nanos: elapsed.subsec_nanos(),
            })
            .unwrap_or(Timestamp { secs: 0, nanos: 0 })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Encode, Decode)]
pub enum EntryKind {
    #[display("file")]
    File,
    #[display("directory")]
    Directory,
}

/// Metadata captured for one filesystem node during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Entry {
    pub kind: EntryKind,
    pub size_bytes: u64,
    pub modified_at: Option<Timestamp>,
    pub content_hash: Option<u64>,
}

impl Entry {
    pub fn directory() -> Self {
        Entry {
            kind: EntryKind::Directory,
            size_bytes: 0,
            modified_at: None,
            content_hash: None,
        }
    }

    pub fn file(size_bytes: u64, modified_at: Option<Timestamp>, content_hash: Option<u64>) -> Self {
        Entry {
            kind: EntryKind::File,
            size_bytes,
            modified_at,
            content_hash,
        }
    }
}
