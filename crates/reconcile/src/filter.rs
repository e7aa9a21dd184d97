use ledgersync_core::{DateBounds, NormalizedTransaction};

/// Keeps records dated inside `bounds` (inclusive; a missing bound is open).
pub fn filter_by_date(
    batch: Vec<NormalizedTransaction>,
    bounds: DateBounds,
) -> Vec<NormalizedTransaction> {
    if bounds.is_unbounded() {
        return batch;
    }
    batch.into_iter().filter(|t| bounds.contains(t.date)).collect()
}
