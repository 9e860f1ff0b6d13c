//! Per-file statistics.
//!
//! Counters are atomic and can be read while reads are in flight.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one partition file.
#[derive(Debug, Default)]
pub struct FileStats {
    opens: AtomicU64,
    releases: AtomicU64,
    reads: AtomicU64,
    short_reads: AtomicU64,
    idle_timeouts: AtomicU64,
    bytes_read: AtomicU64,
    messages_read: AtomicU64,
    dropped_records: AtomicU64,
    errors: AtomicU64,
}

impl FileStats {
    /// Creates a stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_open(&self) {
        self.opens.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_release(&self) {
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a completed read.
    pub(crate) fn record_read(&self, bytes: u64, messages: u64, short: bool, idle: bool) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
        self.messages_read.fetch_add(messages, Ordering::Relaxed);
        if short {
            self.short_reads.fetch_add(1, Ordering::Relaxed);
        }
        if idle {
            self.idle_timeouts.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_dropped(&self, count: u64) {
        self.dropped_records.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time copy of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            opens: self.opens.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            short_reads: self.short_reads.load(Ordering::Relaxed),
            idle_timeouts: self.idle_timeouts.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            messages_read: self.messages_read.load(Ordering::Relaxed),
            dropped_records: self.dropped_records.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`FileStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Successful opens.
    pub opens: u64,
    /// Releases, including ones with no session installed.
    pub releases: u64,
    /// Completed reads of either kind.
    pub reads: u64,
    /// Windowed reads that returned less than requested.
    pub short_reads: u64,
    /// Reads that ended because the partition went quiet.
    pub idle_timeouts: u64,
    /// Bytes returned by reads, separators included.
    pub bytes_read: u64,
    /// Messages returned by reads.
    pub messages_read: u64,
    /// Messages too large for any read window.
    pub dropped_records: u64,
    /// Failed operations.
    pub errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let stats = FileStats::new();
        stats.record_open();
        stats.record_read(9, 3, false, true);
        stats.record_read(5, 2, true, false);
        stats.record_dropped(1);
        stats.record_release();

        let snap = stats.snapshot();
        assert_eq!(snap.opens, 1);
        assert_eq!(snap.releases, 1);
        assert_eq!(snap.reads, 2);
        assert_eq!(snap.bytes_read, 14);
        assert_eq!(snap.messages_read, 5);
        assert_eq!(snap.short_reads, 1);
        assert_eq!(snap.idle_timeouts, 1);
        assert_eq!(snap.dropped_records, 1);
        assert_eq!(snap.errors, 0);
    }
}
