//! Batch distribution for parallel projection.
//!
//! Splits trials into batches for parallel execution or progress reporting. Each batch
//! owns its own random stream, so the split is fixed by the trial count, never by the
//! number of worker threads.

/// Split `total` items into up to `num_batches` ranges `[start, end)`.
/// Batches are as equal in size as possible; later batches may be smaller.
///
/// # Example
/// ```
/// # use playoff_odds::parallel::batch_ranges;
/// let ranges = batch_ranges(100, 4);
/// assert_eq!(ranges, vec![(0, 25), (25, 50), (50, 75), (75, 100)]);
/// ```
pub fn batch_ranges(total: usize, num_batches: usize) -> Vec<(usize, usize)> {
    if total == 0 || num_batches == 0 {
        return Vec::new();
    }
    let num_batches = num_batches.min(total);
    let base = total / num_batches;
    let remainder = total % num_batches;
    let mut ranges = Vec::with_capacity(num_batches);
    let mut start = 0;
    for i in 0..num_batches {
        let size = base + if i < remainder { 1 } else { 0 };
        let end = start + size;
        ranges.push((start, end));
        start = end;
    }
    ranges
}

/// Fixed number of random streams a projection is split into.
pub const TRIAL_STREAMS: usize = 64;

/// A contiguous run of trials played out from one random stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialBatch {
    /// Stream index; seeds the batch's RNG.
    pub stream: u64,
    pub trials: usize,
}

/// Split `trials` across [TRIAL_STREAMS] streams (fewer when there are fewer trials).
pub fn trial_batches(trials: usize) -> Vec<TrialBatch> {
    batch_ranges(trials, TRIAL_STREAMS)
        .into_iter()
        .enumerate()
        .map(|(stream, (start, end))| TrialBatch {
            stream: stream as u64,
            trials: end - start,
        })
        .collect()
}
