use std::path::{Path, PathBuf};
use std::time::Duration;

use snafu::Snafu;
use snafu::prelude::*;
use tracing::{debug, info, warn};

use crate::application::RuntimeConfig;
use crate::cli::Command;
use crate::config::{ProfileRegistry, ProfileRegistryCreationError, ScanProfile};
use crate::report;
use crate::runner::{RunnerCreationError, ScanRunError, ScanRunner};
use crate::snapshot::{
    DEFAULT_MAX_DEPTH, ScanError, ScanOutcome, SnapshotDiff, TreeSnapshotter,
};
use crate::store::{SnapshotStore, StoreError, snapshot_name};

pub struct Application;

impl Application {
    pub async fn run(config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let config: RuntimeConfig = config.into();
        match config.command.clone() {
            Command::Scan {
                paths,
                max_depth,
                hash,
            } => Self::scan(&config.root, paths, max_depth, hash).await,
            Command::Diff {
                target,
                max_depth,
                hash,
                update,
            } => Self::diff(&config.root, &target, max_depth, hash, update).await,
            Command::Watch {
                target,
                max_depth,
                hash,
                interval,
                count,
            } => Self::watch(&config.root, &target, max_depth, hash, interval, count).await,
        }
    }

    async fn scan(
        root: &Path,
        paths: Vec<PathBuf>,
        max_depth: Option<i64>,
        hash: bool,
    ) -> Result<(), ApplicationError> {
        let profiles = if paths.is_empty() {
            let registry = ProfileRegistry::read(root)
                .await
                .context(ProfileRegistrySnafu)?;
            let profiles: Vec<ScanProfile> = registry.get_profiles_iter().cloned().collect();
            ensure!(!profiles.is_empty(), NoScanTargetsSnafu);
            profiles
        } else {
            paths
                .into_iter()
                .map(|path| Self::ad_hoc_profile(path, max_depth, hash))
                .collect()
        };

        let outcomes = ScanRunner::new()
            .context(RunnerCreationSnafu)?
            .run(profiles)
            .await
            .context(ScanRunSnafu)?;

        let store = SnapshotStore::new(root);
        for outcome in &outcomes {
            report::print_scan_summary(outcome);
            store
                .write(&outcome.profile.name, &outcome.outcome.snapshot)
                .await
                .context(StoreSnafu)?;
        }
        info!("Stored {} snapshot(s)", outcomes.len());

        Ok(())
    }

    async fn diff(
        root: &Path,
        target: &Path,
        max_depth: Option<i64>,
        hash: bool,
        update: bool,
    ) -> Result<(), ApplicationError> {
        let profile = Self::resolve_profile(root, target, max_depth, hash).await;
        let snapshotter = TreeSnapshotter::new().hash_contents(profile.hash_contents);
        let scanned = snapshotter
            .scan(&profile.root, profile.max_depth)
            .context(ScanSnafu)?;
        Self::report_partial(&scanned);

        let store = SnapshotStore::new(root);
        match store.read(&profile.name).await.context(StoreSnafu)? {
            Some(earlier) => {
                let diff = SnapshotDiff::between(&earlier, &scanned.snapshot);
                report::print_diff(&profile.name, &diff);
                if update {
                    store
                        .write(&profile.name, &scanned.snapshot)
                        .await
                        .context(StoreSnafu)?;
                    info!("Updated baseline '{}'", profile.name);
                }
            }
            None => {
                info!(
                    "No baseline for '{}' yet; storing the current snapshot",
                    profile.name
                );
                store
                    .write(&profile.name, &scanned.snapshot)
                    .await
                    .context(StoreSnafu)?;
            }
        }

        Ok(())
    }

    async fn watch(
        root: &Path,
        target: &Path,
        max_depth: Option<i64>,
        hash: bool,
        interval: u64,
        count: u64,
    ) -> Result<(), ApplicationError> {
        let profile = Self::resolve_profile(root, target, max_depth, hash).await;
        let snapshotter = TreeSnapshotter::new().hash_contents(profile.hash_contents);

        let mut baseline = snapshotter
            .scan(&profile.root, profile.max_depth)
            .context(ScanSnafu)?;
        Self::report_partial(&baseline);
        info!("Watching '{}' every {}s", profile.name, interval);

        let mut rounds = 0u64;
        loop {
            compio::time::sleep(Duration::from_secs(interval)).await;

            let current = snapshotter
                .scan(&profile.root, profile.max_depth)
                .context(ScanSnafu)?;
            let diff = SnapshotDiff::between(&baseline.snapshot, &current.snapshot);
            if diff.is_empty() {
                debug!("No changes in '{}'", profile.name);
            } else {
                report::print_diff(&profile.name, &diff);
            }
            baseline = current;

            rounds += 1;
            if count != 0 && rounds >= count {
                break;
            }
        }

        Ok(())
    }

    /// A target names a configured profile when one matches; otherwise it is
    /// taken as a path to scan with the given options.
    async fn resolve_profile(
        root: &Path,
        target: &Path,
        max_depth: Option<i64>,
        hash: bool,
    ) -> ScanProfile {
        if let Some(name) = target.to_str() {
            let registry = match ProfileRegistry::read(root).await {
                Ok(registry) => registry,
                Err(e) => {
                    debug!("No usable profile file: {}", e);
                    ProfileRegistry::empty()
                }
            };
            if let Some(profile) = registry.get_profile_by_name(name) {
                let mut profile = profile.clone();
                if let Some(depth) = max_depth {
                    profile.max_depth = depth;
                }
                return profile;
            }
        }
        Self::ad_hoc_profile(target.to_path_buf(), max_depth, hash)
    }

    fn ad_hoc_profile(path: PathBuf, max_depth: Option<i64>, hash: bool) -> ScanProfile {
        ScanProfile::new(
            snapshot_name(&path),
            path,
            max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
            hash,
        )
    }

    fn report_partial(outcome: &ScanOutcome) {
        if !outcome.is_complete() {
            warn!(
                "Snapshot is partial; {} directories could not be read",
                outcome.skipped.len()
            );
        }
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Critical failure encountered while loading scan profiles"))]
    ProfileRegistryError {
        source: ProfileRegistryCreationError,
    },
    #[snafu(display("No scan targets given and no profiles configured"))]
    NoScanTargets,
    #[snafu(display("Critical failure encountered during runner creation"))]
    RunnerCreationError { source: RunnerCreationError },
    #[snafu(display("Critical failure encountered during scan run"))]
    ScanRunError { source: ScanRunError },
    #[snafu(display("Critical failure encountered during scan"))]
    ScanError { source: ScanError },
    #[snafu(display("Critical failure encountered in the snapshot store"))]
    StoreError { source: StoreError },
}
