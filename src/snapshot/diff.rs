use crate::snapshot::{Entry, RelPath, Snapshot};

/// Differences between two snapshots of the same root.
///
/// The three lists are pairwise disjoint. `added` follows the later
/// snapshot's traversal order, `removed` and `modified` the earlier one's,
/// so the result is deterministic given the inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    pub added: Vec<RelPath>,
    pub removed: Vec<RelPath>,
    pub modified: Vec<RelPath>,
}

impl SnapshotDiff {
    pub fn between(earlier: &Snapshot, later: &Snapshot) -> Self {
        let mut diff = SnapshotDiff::default();

        for (path, _) in later.entries() {
            if earlier.get(path).is_none() {
                diff.added.push(path.clone());
            }
        }

        for (path, old_entry) in earlier.entries() {
            match later.get(path) {
                None => diff.removed.push(path.clone()),
                Some(new_entry) if Self::entry_changed(old_entry, new_entry) => {
                    diff.modified.push(path.clone());
                }
                Some(_) => {}
            }
        }

        diff
    }

    /// A path counts as modified when its kind, size, or modification time
    /// changed. Content hashes only weigh in when both snapshots recorded
    /// one, so comparing a hashed snapshot against an unhashed one never
    /// fabricates modifications.
    fn entry_changed(earlier: &Entry, later: &Entry) -> bool {
        if earlier.kind != later.kind {
            return true;
        }
        if earlier.size_bytes != later.size_bytes {
            return true;
        }
        if earlier.modified_at != later.modified_at {
            return true;
        }
        matches!(
            (earlier.content_hash, later.content_hash),
            (Some(a), Some(b)) if a != b
        )
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Timestamp;
    use hashlink::LinkedHashMap;
    use rstest::*;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime};

    fn stamp(secs: u64) -> Timestamp {
        Timestamp::from(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
    }

    fn snapshot_with(entries: Vec<(&str, Entry)>) -> Snapshot {
        let mut map = LinkedHashMap::new();
        for (path, entry) in entries {
            map.insert(RelPath::from(path), entry);
        }
        Snapshot::from_parts(PathBuf::from("/scan"), 8, stamp(0), map)
    }

    #[test]
    fn a_snapshot_compared_with_itself_is_unchanged() {
        let snapshot = snapshot_with(vec![
            ("dir", Entry::directory()),
            ("dir/f.txt", Entry::file(10, Some(stamp(100)), None)),
        ]);
        let diff = SnapshotDiff::between(&snapshot, &snapshot);
        assert!(diff.is_empty());
    }

    #[test]
    fn a_size_change_is_reported_as_modified() {
        let earlier = snapshot_with(vec![("f.txt", Entry::file(10, Some(stamp(100)), None))]);
        let later = snapshot_with(vec![("f.txt", Entry::file(20, Some(stamp(100)), None))]);

        let diff = SnapshotDiff::between(&earlier, &later);
        assert_eq!(diff.modified, vec![RelPath::from("f.txt")]);
        assert!(diff.added.is_empty());
        assert!(diff.removed.is_empty());
    }

    #[test]
    fn a_modification_time_change_alone_is_reported_as_modified() {
        let earlier = snapshot_with(vec![("f.txt", Entry::file(10, Some(stamp(100)), None))]);
        let later = snapshot_with(vec![("f.txt", Entry::file(10, Some(stamp(101)), None))]);

        let diff = SnapshotDiff::between(&earlier, &later);
        assert_eq!(diff.modified, vec![RelPath::from("f.txt")]);
    }

    #[test]
    fn a_path_present_on_one_side_lands_in_removed_or_added() {
        let with_g = snapshot_with(vec![
            ("f.txt", Entry::file(1, Some(stamp(1)), None)),
            ("g.txt", Entry::file(2, Some(stamp(2)), None)),
        ]);
        let without_g = snapshot_with(vec![("f.txt", Entry::file(1, Some(stamp(1)), None))]);

        let forward = SnapshotDiff::between(&with_g, &without_g);
        assert_eq!(forward.removed, vec![RelPath::from("g.txt")]);
        assert!(forward.added.is_empty());
        assert!(forward.modified.is_empty());

        let reverse = SnapshotDiff::between(&without_g, &with_g);
        assert_eq!(reverse.added, vec![RelPath::from("g.txt")]);
        assert!(reverse.removed.is_empty());
        assert!(reverse.modified.is_empty());
    }

    #[test]
    fn a_kind_change_at_the_same_path_is_reported_as_modified() {
        let earlier = snapshot_with(vec![("node", Entry::file(0, None, None))]);
        let later = snapshot_with(vec![("node", Entry::directory())]);

        let diff = SnapshotDiff::between(&earlier, &later);
        assert_eq!(diff.modified, vec![RelPath::from("node")]);
    }

    #[rstest]
    #[case(Some(1), Some(2), true)]
    #[case(Some(1), Some(1), false)]
    #[case(Some(1), None, false)]
    #[case(None, Some(2), false)]
    #[case(None, None, false)]
    fn content_hashes_compare_only_when_both_sides_recorded_one(
        #[case] earlier_hash: Option<u64>,
        #[case] later_hash: Option<u64>,
        #[case] expect_modified: bool,
    ) {
        let earlier = snapshot_with(vec![("f.txt", Entry::file(5, Some(stamp(50)), earlier_hash))]);
        let later = snapshot_with(vec![("f.txt", Entry::file(5, Some(stamp(50)), later_hash))]);

        let diff = SnapshotDiff::between(&earlier, &later);
        assert_eq!(!diff.modified.is_empty(), expect_modified);
    }

    #[test]
    fn changes_land_in_disjoint_buckets() {
        let earlier = snapshot_with(vec![
            ("keep.txt", Entry::file(1, Some(stamp(1)), None)),
            ("gone.txt", Entry::file(2, Some(stamp(2)), None)),
            ("grow.txt", Entry::file(3, Some(stamp(3)), None)),
        ]);
        let later = snapshot_with(vec![
            ("keep.txt", Entry::file(1, Some(stamp(1)), None)),
            ("grow.txt", Entry::file(30, Some(stamp(3)), None)),
            ("new.txt", Entry::file(4, Some(stamp(4)), None)),
        ]);

        let diff = SnapshotDiff::between(&earlier, &later);
        assert_eq!(diff.added, vec![RelPath::from("new.txt")]);
        assert_eq!(diff.removed, vec![RelPath::from("gone.txt")]);
        assert_eq!(diff.modified, vec![RelPath::from("grow.txt")]);
    }
}
