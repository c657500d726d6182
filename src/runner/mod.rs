mod scan_runner;

pub use scan_runner::{
    ProfileOutcome, ProfileScanError, RunnerCreationError, ScanRunError, ScanRunner,
};
