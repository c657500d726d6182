mod snapshot_store;

pub use snapshot_store::{SnapshotStore, StoreError, snapshot_name};
