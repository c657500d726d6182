use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::warn;

use crate::ext::BestEffortPathExt;
use crate::snapshot::EntryKind;

/// One child of a directory, in the order the platform listing returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirChild {
    pub name: String,
    pub kind: EntryKind,
}

#[derive(Debug, Clone, Copy)]
pub struct FileMetadata {
    pub size_bytes: u64,
    pub modified_at: Option<SystemTime>,
}

/// The platform calls a scan needs, kept behind a trait so tests can
/// substitute an in-memory tree with unreadable directories or files that
/// report no modification time.
pub trait FilesystemProvider {
    /// Resolves a scan root to an absolute path, or `None` when it does not
    /// exist or is not a directory.
    fn resolve_root(&self, path: &Path) -> Option<PathBuf>;
    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirChild>>;
    fn file_metadata(&self, path: &Path) -> io::Result<FileMetadata>;
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Thin wrapper over `std::fs`. Symlinks are classified as files and never
/// followed; their metadata describes the link itself.
pub struct PlatformFs;

impl FilesystemProvider for PlatformFs {
    fn resolve_root(&self, path: &Path) -> Option<PathBuf> {
        path.canonicalize().ok().filter(|resolved| resolved.is_dir())
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirChild>> {
        let mut children = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(
                        "Skipping unreadable entry under {}: {}",
                        path.best_effort_path_display(),
                        e
                    );
                    continue;
                }
            };
            let kind = match entry.file_type() {
                Ok(file_type) if file_type.is_dir() => EntryKind::Directory,
                Ok(_) => EntryKind::File,
                Err(e) => {
                    warn!(
                        "Skipping entry with unreadable type under {}: {}",
                        path.best_effort_path_display(),
                        e
                    );
                    continue;
                }
            };
            children.push(DirChild {
                name: entry.file_name().to_string_lossy().to_string(),
                kind,
            });
        }
        Ok(children)
    }

    fn file_metadata(&self, path: &Path) -> io::Result<FileMetadata> {
        let metadata = path.symlink_metadata()?;
        Ok(FileMetadata {
            size_bytes: metadata.len(),
            modified_at: metadata.modified().ok(),
        })
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}
