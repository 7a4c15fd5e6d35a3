//! Benchmark report

use std::fmt;
use std::time::Duration;

use bytes::Bytes;

use crate::cursor::Entry;

/// Outcome of reading one key back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadBack {
    pub key: String,
    pub value: Option<Bytes>,
}

/// Outcome of the seeked scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Total entries yielded before the sentinel
    pub count: usize,
    /// The first entries, up to the configured sample size
    pub sample: Vec<Entry>,
}

/// Everything a completed run measured
#[derive(Debug, Clone)]
pub struct BenchReport {
    pub writes: u64,
    pub write_elapsed: Duration,
    pub reads: Vec<ReadBack>,
    pub scan: ScanSummary,
    pub compaction_elapsed: Duration,
    pub total_elapsed: Duration,
}

impl BenchReport {
    /// Sequential write throughput
    pub fn writes_per_sec(&self) -> f64 {
        let secs = self.write_elapsed.as_secs_f64();
        if secs > 0.0 {
            self.writes as f64 / secs
        } else {
            0.0
        }
    }

    /// Keys read back with a value
    pub fn reads_found(&self) -> usize {
        self.reads.iter().filter(|read| read.value.is_some()).count()
    }
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} writes in {:.3}s ({:.0} writes/sec), {}/{} reads found, {} scanned, compaction {:.3}s, total {:.3}s",
            self.writes,
            self.write_elapsed.as_secs_f64(),
            self.writes_per_sec(),
            self.reads_found(),
            self.reads.len(),
            self.scan.count,
            self.compaction_elapsed.as_secs_f64(),
            self.total_elapsed.as_secs_f64(),
        )
    }
}
