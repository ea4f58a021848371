use crate::{
    error::{FeedResult, UpstreamError},
    series::sample::VersionedSample,
};

/// Drops samples that repeat the economic state of the last retained sample.
///
/// The first and the last sample of the input are always retained, so the shape of the
/// series (where it starts, where it currently stands) survives compaction. A last sample
/// that merely repeats the last retained row (same version, same state) takes that row's
/// place instead of being appended. Inputs of length <= 1 are returned unchanged.
pub fn compact(samples: Vec<VersionedSample>) -> Vec<VersionedSample> {
    let len = samples.len();
    if len <= 1 {
        return samples;
    }

    let mut retained: Vec<VersionedSample> = Vec::with_capacity(len);
    for (i, sample) in samples.into_iter().enumerate() {
        let is_last = i + 1 == len;
        let repeat = retained.last().copied().filter(|prev| prev.same_state(&sample));
        match repeat {
            None => retained.push(sample),
            Some(_) if !is_last => {}
            Some(prev) if prev.version == sample.version => {
                if let Some(slot) = retained.last_mut() {
                    *slot = sample;
                }
            }
            Some(_) => retained.push(sample),
        }
    }
    retained
}

/// Bisection over the version axis requires strictly increasing versions.
///
/// Upstream may repeat a version; that is tolerated only when compaction folded the
/// repeated rows away.
pub fn ensure_strictly_increasing(samples: &[VersionedSample]) -> FeedResult<()> {
    match samples.windows(2).find(|w| w[0].version >= w[1].version) {
        Some(w) => Err(UpstreamError::Malformed(format!(
            "version {} appears more than once with differing state",
            w[1].version
        ))
        .into()),
        None => Ok(()),
    }
}
