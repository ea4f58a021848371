use crate::{domain::Version, series::sample::VersionedSample};

/// Keeps the prefix of `samples` whose version is at or below `horizon`.
///
/// Versions past the horizon may not be indexed by the transaction tables yet.
/// `samples` must be sorted by version.
pub fn truncate_at_horizon(mut samples: Vec<VersionedSample>, horizon: Version) -> Vec<VersionedSample> {
    let stable = samples.partition_point(|s| s.version <= horizon);
    samples.truncate(stable);
    samples
}
