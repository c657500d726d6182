use std::num::NonZeroUsize;
use std::thread::available_parallelism;

use compio::dispatcher::{Dispatcher, DispatcherBuilder};
use compio::runtime::spawn;
use futures::StreamExt;
use futures_channel::mpsc::{self, UnboundedSender};
use snafu::{ResultExt, Snafu, ensure};
use tracing::{debug, info};

use crate::config::ScanProfile;
use crate::snapshot::{ScanError, ScanOutcome, TreeSnapshotter};

/// Default number of worker threads when unable to determine system parallelism
const DEFAULT_WORKER_THREADS: usize = 1;

/// Snapshot produced for one profile.
#[derive(Debug)]
pub struct ProfileOutcome {
    pub profile: ScanProfile,
    pub outcome: ScanOutcome,
}

/// Fans scans out over a worker-thread dispatcher. Each profile's root is
/// walked by an independent scan; the runner only coordinates dispatch and
/// result collection.
pub struct ScanRunner {
    dispatcher: Dispatcher,
}

impl ScanRunner {
    pub fn new() -> Result<Self, RunnerCreationError> {
        let workers_num = Self::determine_worker_count();
        debug!("Using {} worker threads for scanning", workers_num);

        let dispatcher = DispatcherBuilder::new()
            .worker_threads(workers_num)
            .build()
            .context(DispatcherSnafu)?;

        Ok(Self { dispatcher })
    }

    fn determine_worker_count() -> NonZeroUsize {
        available_parallelism()
            .map(|n| n.get())
            .map(NonZeroUsize::new)
            .ok()
            .flatten()
            .unwrap_or_else(|| NonZeroUsize::new(DEFAULT_WORKER_THREADS).unwrap())
    }

    /// Runs one scan per profile and collects every outcome. The first
    /// failing scan fails the whole run.
    pub async fn run(&self, profiles: Vec<ScanProfile>) -> Result<Vec<ProfileOutcome>, ScanRunError> {
        let expected = profiles.len();
        let (result_sender, mut result_receiver) =
            mpsc::unbounded::<Result<ProfileOutcome, ProfileScanError>>();

        debug!("Dispatching {} scans", expected);
        for profile in profiles {
            self.dispatch_scan(result_sender.clone(), profile)?;
        }
        drop(result_sender);

        let mut outcomes = Vec::with_capacity(expected);
        while let Some(result) = result_receiver.next().await {
            let outcome = result.context(ProfileScanSnafu)?;
            info!(
                "Captured snapshot '{}' with {} entries",
                outcome.profile.name,
                outcome.outcome.snapshot.len()
            );
            outcomes.push(outcome);
        }

        ensure!(outcomes.len() == expected, RunEndedPrematurelySnafu);
        Ok(outcomes)
    }

    /// Dispatch one scan to the worker pool and forward its result to the
    /// collection channel.
    fn dispatch_scan(
        &self,
        result_sender: UnboundedSender<Result<ProfileOutcome, ProfileScanError>>,
        profile: ScanProfile,
    ) -> Result<(), ScanRunError> {
        let profile_name = profile.name.clone();

        let receiver = self
            .dispatcher
            .dispatch(move || async move {
                let snapshotter = TreeSnapshotter::new().hash_contents(profile.hash_contents);
                match snapshotter.scan(&profile.root, profile.max_depth) {
                    Ok(outcome) => Ok(ProfileOutcome { profile, outcome }),
                    Err(source) => Err(ProfileScanError::ScanFailed {
                        profile_name: profile.name.clone(),
                        source,
                    }),
                }
            })
            .map_err(|e| ScanRunError::ScanDispatchError {
                profile_name: profile_name.clone(),
                error: e.to_string(),
            })?;

        debug!("Dispatched scan for profile '{}'", profile_name);

        spawn(async move {
            let result = match receiver.await {
                Ok(inner) => inner,
                Err(e) => {
                    debug!("Scan for '{}' was canceled: {}", profile_name, e);
                    Err(ProfileScanError::Canceled { source: e })
                }
            };

            if let Err(send_err) = result_sender.unbounded_send(result) {
                debug!(
                    "Failed to deliver scan result for '{}': {}",
                    profile_name, send_err
                );
            }
        })
        .detach();

        Ok(())
    }
}

#[derive(Debug, Snafu)]
pub enum RunnerCreationError {
    #[snafu(display("Failed to create scan dispatcher"))]
    DispatcherError { source: std::io::Error },
}

#[derive(Debug, Snafu)]
pub enum ScanRunError {
    #[snafu(display("Failed to dispatch scan for profile '{}': {}", profile_name, error))]
    ScanDispatchError {
        profile_name: String,
        error: String,
    },
    #[snafu(display("A dispatched scan failed"))]
    ProfileScanError { source: ProfileScanError },
    #[snafu(display("Scan run ended before all results arrived"))]
    RunEndedPrematurely,
}

#[derive(Debug, Snafu)]
pub enum ProfileScanError {
    #[snafu(display("Scan for profile '{}' failed", profile_name))]
    ScanFailed {
        profile_name: String,
        source: ScanError,
    },
    #[snafu(display("Scan got canceled"))]
    Canceled {
        source: futures_channel::oneshot::Canceled,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn profile_for(name: &str, root: PathBuf) -> ScanProfile {
        ScanProfile::new(name.to_string(), root, 4, false)
    }

    #[compio::test]
    async fn run_collects_one_outcome_per_profile() {
        let first = TempDir::new().expect("Failed to create temp directory");
        let second = TempDir::new().expect("Failed to create temp directory");
        fs::write(first.path().join("a.txt"), "a").expect("Failed to write file");
        fs::write(second.path().join("b.txt"), "b").expect("Failed to write file");
        fs::write(second.path().join("c.txt"), "c").expect("Failed to write file");

        let runner = ScanRunner::new().expect("Failed to create runner");
        let outcomes = runner
            .run(vec![
                profile_for("first", first.path().to_path_buf()),
                profile_for("second", second.path().to_path_buf()),
            ])
            .await
            .expect("Run failed");

        assert_eq!(outcomes.len(), 2);
        let total_entries: usize = outcomes
            .iter()
            .map(|outcome| outcome.outcome.snapshot.len())
            .sum();
        assert_eq!(total_entries, 3);
    }

    #[compio::test]
    async fn a_failing_scan_fails_the_run() {
        let existing = TempDir::new().expect("Failed to create temp directory");

        let runner = ScanRunner::new().expect("Failed to create runner");
        let result = runner
            .run(vec![
                profile_for("ok", existing.path().to_path_buf()),
                profile_for("broken", PathBuf::from("/definitely/not/here")),
            ])
            .await;

        assert!(matches!(
            result,
            Err(ScanRunError::ProfileScanError { .. })
        ));
    }

    #[compio::test]
    async fn running_zero_profiles_yields_zero_outcomes() {
        let runner = ScanRunner::new().expect("Failed to create runner");
        let outcomes = runner.run(Vec::new()).await.expect("Run failed");
        assert!(outcomes.is_empty());
    }
}
