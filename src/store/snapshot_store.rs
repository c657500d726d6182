use std::path::{Path, PathBuf};

use bincode::{Decode, Encode};
use compio::fs;
use hashlink::LinkedHashMap;
use snafu::{ResultExt, Snafu};
use tracing::{debug, info, warn};

use crate::ext::BestEffortPathExt;
use crate::snapshot::{Entry, RelPath, Snapshot, Timestamp};

const SNAPSHOT_DIR: &str = ".treesnap";
const SNAPSHOT_EXTENSION: &str = "snap";
const COMPRESSION_LEVEL: i32 = 0;

/// On-disk form of a snapshot; the ordered entry map flattens to pairs and
/// the root path to its display form.
#[derive(Debug, Encode, Decode)]
struct SnapshotRecord {
    root_path: String,
    max_depth: i64,
    taken_at: Timestamp,
    entries: Vec<(RelPath, Entry)>,
}

impl From<&Snapshot> for SnapshotRecord {
    fn from(snapshot: &Snapshot) -> Self {
        SnapshotRecord {
            root_path: snapshot.root_path().to_string_lossy().to_string(),
            max_depth: snapshot.max_depth(),
            taken_at: snapshot.taken_at(),
            entries: snapshot
                .entries()
                .map(|(path, entry)| (path.clone(), entry.clone()))
                .collect(),
        }
    }
}

impl From<SnapshotRecord> for Snapshot {
    fn from(record: SnapshotRecord) -> Self {
        let mut entries = LinkedHashMap::new();
        for (path, entry) in record.entries {
            entries.insert(path, entry);
        }
        Snapshot::from_parts(
            PathBuf::from(record.root_path),
            record.max_depth,
            record.taken_at,
            entries,
        )
    }
}

/// Persists snapshots under `<root>/.treesnap/<name>.snap` so a later
/// invocation can diff against a stored baseline.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: &Path) -> Self {
        SnapshotStore {
            dir: root.join(SNAPSHOT_DIR),
        }
    }

    /// Loads a stored snapshot. A missing file is a normal "no baseline yet"
    /// condition; an undecodable file is discarded with a warning and treated
    /// the same way.
    pub async fn read(&self, name: &str) -> Result<Option<Snapshot>, StoreError> {
        let path = self.snapshot_path(name);
        debug!(
            "Reading snapshot '{}' from {}",
            name,
            path.best_effort_path_display()
        );
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No stored snapshot named '{}'", name);
                return Ok(None);
            }
            Err(e) => return Err(e).context(ReadSnafu { path }),
        };

        let decompressed = match zstd::decode_all(&bytes[..]) {
            Ok(decompressed) => decompressed,
            Err(e) => {
                warn!("Discarding undecodable snapshot '{}': {}", name, e);
                return Ok(None);
            }
        };
        match bincode::decode_from_slice::<SnapshotRecord, _>(
            &decompressed,
            bincode::config::standard(),
        ) {
            Ok((record, _)) => Ok(Some(record.into())),
            Err(e) => {
                warn!("Discarding undecodable snapshot '{}': {}", name, e);
                Ok(None)
            }
        }
    }

    pub async fn write(&self, name: &str, snapshot: &Snapshot) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).await.context(CreateDirSnafu {
            path: self.dir.clone(),
        })?;

        let record = SnapshotRecord::from(snapshot);
        let bytes =
            bincode::encode_to_vec(&record, bincode::config::standard()).context(EncodeSnafu)?;
        let compressed = zstd::encode_all(&bytes[..], COMPRESSION_LEVEL).context(CompressSnafu)?;

        let path = self.snapshot_path(name);
        debug!(
            "Writing snapshot '{}' to {}",
            name,
            path.best_effort_path_display()
        );
        fs::write(&path, compressed).await.0.context(WriteSnafu { path })?;
        Ok(())
    }

    fn snapshot_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{SNAPSHOT_EXTENSION}"))
    }
}

/// Derives a store key from a scan root, stable across invocations from the
/// same working directory.
pub fn snapshot_name(root: &Path) -> String {
    let display = root.best_effort_path_display();
    let sanitized: String = display
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = sanitized.trim_matches('_');
    if trimmed.is_empty() {
        "root".to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug, Snafu)]
pub enum StoreError {
    #[snafu(display("Failed to read stored snapshot {}", path.best_effort_path_display()))]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to create snapshot directory {}", path.best_effort_path_display()))]
    CreateDirError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to encode snapshot"))]
    EncodeError { source: bincode::error::EncodeError },
    #[snafu(display("Failed to compress snapshot"))]
    CompressError { source: std::io::Error },
    #[snafu(display("Failed to write snapshot {}", path.best_effort_path_display()))]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::EntryKind;
    use rstest::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn sample_snapshot() -> Snapshot {
        let mut entries = LinkedHashMap::new();
        entries.insert(RelPath::from("dir"), Entry::directory());
        entries.insert(
            RelPath::from("dir/a.txt"),
            Entry::file(
                42,
                Some(Timestamp::from(
                    SystemTime::UNIX_EPOCH + Duration::new(1_000, 500),
                )),
                Some(0xDEAD_BEEF),
            ),
        );
        entries.insert(RelPath::from("b.txt"), Entry::file(0, None, None));
        Snapshot::from_parts(
            PathBuf::from("/scan/root"),
            4,
            Timestamp::from(SystemTime::UNIX_EPOCH + Duration::from_secs(2_000)),
            entries,
        )
    }

    #[compio::test]
    async fn write_then_read_round_trips_the_snapshot() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let store = SnapshotStore::new(dir.path());
        let snapshot = sample_snapshot();

        store
            .write("demo", &snapshot)
            .await
            .expect("Failed to write snapshot");
        let restored = store
            .read("demo")
            .await
            .expect("Failed to read snapshot")
            .expect("Snapshot missing after write");

        assert_eq!(restored, snapshot);
        assert!(restored.entries().eq(snapshot.entries()));
        assert_eq!(
            restored.get(&RelPath::from("dir")).map(|e| e.kind),
            Some(EntryKind::Directory)
        );
    }

    #[compio::test]
    async fn reading_a_missing_snapshot_returns_none() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let store = SnapshotStore::new(dir.path());

        let result = store.read("absent").await.expect("Read failed");
        assert!(result.is_none());
    }

    #[compio::test]
    async fn an_undecodable_snapshot_is_treated_as_missing() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let store_dir = dir.path().join(SNAPSHOT_DIR);
        std::fs::create_dir_all(&store_dir).expect("Failed to create store directory");
        std::fs::write(store_dir.join("bad.snap"), b"not a snapshot")
            .expect("Failed to write garbage");

        let store = SnapshotStore::new(dir.path());
        let result = store.read("bad").await.expect("Read failed");
        assert!(result.is_none());
    }

    #[rstest]
    #[case("/tmp/demo", "tmp_demo")]
    #[case("/var/lib/some-app/v1.2", "var_lib_some-app_v1.2")]
    #[case("/", "root")]
    fn snapshot_names_are_sanitized_path_forms(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(snapshot_name(Path::new(path)), expected);
    }
}
