use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct ProcessingCounters {
    pub headers_submitted: AtomicU64,
    pub headers_inserted: AtomicU64,
    pub headers_ignored: AtomicU64,
    pub reorg_counts: AtomicU64,
    pub ancestor_requests: AtomicU64,
    /// Monotonic gauge of the highest header number ever stored
    pub highest_header_number: AtomicU64,
}

impl ProcessingCounters {
    pub fn snapshot(&self) -> ProcessingCountersSnapshot {
        ProcessingCountersSnapshot {
            headers_submitted: self.headers_submitted.load(Ordering::Relaxed),
            headers_inserted: self.headers_inserted.load(Ordering::Relaxed),
            headers_ignored: self.headers_ignored.load(Ordering::Relaxed),
            reorg_counts: self.reorg_counts.load(Ordering::Relaxed),
            ancestor_requests: self.ancestor_requests.load(Ordering::Relaxed),
            highest_header_number: self.highest_header_number.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ProcessingCountersSnapshot {
    pub headers_submitted: u64,
    pub headers_inserted: u64,
    pub headers_ignored: u64,
    pub reorg_counts: u64,
    pub ancestor_requests: u64,
    pub highest_header_number: u64,
}

impl core::ops::Sub for &ProcessingCountersSnapshot {
    type Output = ProcessingCountersSnapshot;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::Output {
            headers_submitted: self.headers_submitted.saturating_sub(rhs.headers_submitted),
            headers_inserted: self.headers_inserted.saturating_sub(rhs.headers_inserted),
            headers_ignored: self.headers_ignored.saturating_sub(rhs.headers_ignored),
            reorg_counts: self.reorg_counts.saturating_sub(rhs.reorg_counts),
            ancestor_requests: self.ancestor_requests.saturating_sub(rhs.ancestor_requests),
            // Gauges are carried over as-is
            highest_header_number: self.highest_header_number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_sub() {
        let counters = ProcessingCounters::default();
        counters.headers_submitted.fetch_add(10, Ordering::Relaxed);
        counters.highest_header_number.fetch_max(7, Ordering::Relaxed);
        let before = counters.snapshot();

        counters.headers_submitted.fetch_add(5, Ordering::Relaxed);
        counters.highest_header_number.fetch_max(3, Ordering::Relaxed);
        let after = counters.snapshot();

        let delta = &after - &before;
        assert_eq!(delta.headers_submitted, 5);
        assert_eq!(delta.highest_header_number, 7);
    }
}
