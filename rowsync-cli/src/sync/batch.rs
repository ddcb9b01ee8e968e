//! Batching of the change set

use std::fmt;

/// Records per upsert statement unless configured otherwise
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// One size-bounded slice of the change set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Batch<'a, T> {
    /// 1-based position within the run
    pub number: usize,
    pub total: usize,
    pub records: &'a [T],
}

impl<T> fmt::Display for Batch<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "batch {}/{} ({} records)",
            self.number,
            self.total,
            self.records.len()
        )
    }
}

/// Split `records` into consecutive batches of at most `batch_size` records.
///
/// Concatenating the batches in order gives back `records` exactly. An empty
/// input yields no batches. A `batch_size` of 0 is treated as 1; configuration
/// validation rejects it before a run starts.
pub fn plan_batches<T>(records: &[T], batch_size: usize) -> Vec<Batch<'_, T>> {
    let batch_size = batch_size.max(1);
    let total = records.len().div_ceil(batch_size);

    records
        .chunks(batch_size)
        .enumerate()
        .map(|(i, chunk)| Batch {
            number: i + 1,
            total,
            records: chunk,
        })
        .collect()
}
