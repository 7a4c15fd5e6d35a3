//! Benchmark Driver
//!
//! Runs the full store contract in one sequential pass and reports timing.
//!
//! ## Steps
//! 1. Open the store (create if missing)
//! 2. Write `num_writes` keys in increasing order, one at a time
//! 3. Read back keys `0..read_back`
//! 4. Scan from `seek_key` with a limited cursor, then end it
//! 5. Compact the whole keyspace
//! 6. Close the store
//!
//! Any failure aborts the remaining steps and is returned to the caller.

mod progress;
mod report;

use std::time::Instant;

use crate::config::{BenchConfig, IteratorOptions};
use crate::cursor::Cursor;
use crate::engine::{Engine, EngineIterator};
use crate::error::{display_key, Result};
use crate::store::Store;

pub use progress::Progress;
pub use report::{BenchReport, ReadBack, ScanSummary};

/// Key written for index `i`
pub fn bench_key(i: u64) -> String {
    i.to_string()
}

/// Value written for index `i`
pub fn bench_value(i: u64) -> String {
    format!("abc{i}")
}

/// Drives one benchmark run against a store
pub struct BenchmarkDriver<E: Engine> {
    store: Store<E>,
    config: BenchConfig,
}

impl<E: Engine> BenchmarkDriver<E> {
    pub fn new(engine: E, config: BenchConfig) -> Self {
        Self {
            store: Store::new(engine),
            config,
        }
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Run every step in order
    pub async fn run(mut self) -> Result<BenchReport> {
        let started = Instant::now();

        // Step 1: Open
        self.store.open(self.config.open_options).await?;
        tracing::info!("NUM_WRITE = {}", self.config.num_writes);

        // Step 2: Sequential writes
        let write_elapsed = {
            let mut progress = Progress::start(self.config.progress_interval);
            for i in 0..self.config.num_writes {
                self.store.put(bench_key(i), bench_value(i)).await?;
                if let Some(elapsed) = progress.record() {
                    tracing::info!(
                        "wrote {} keys   {:.3} elap sec",
                        progress.completed(),
                        elapsed.as_secs_f64()
                    );
                }
            }
            progress.elapsed()
        };

        // Step 3: Read back
        let mut reads = Vec::new();
        for i in 0..self.config.read_back {
            let key = bench_key(i);
            let value = self.store.get(&key).await?;
            match &value {
                Some(value) => tracing::info!("testVal = {}", display_key(value)),
                None => tracing::info!("testVal = <not found>"),
            }
            reads.push(ReadBack { key, value });
        }

        // Step 4: Seeked scan; the cursor is ended before any scan error
        // is reported
        let options = IteratorOptions::new().limit(self.config.scan_limit);
        let mut cursor = self.store.iterator(options)?;
        let scanned = Self::scan(&mut cursor, &self.config).await;
        let ended = cursor.end().await;
        let scan = scanned?;
        ended?;
        tracing::info!("scanned {} entries from {:?}", scan.count, self.config.seek_key);

        // Step 5: Full-range compaction
        tracing::info!("begin compact");
        let compaction_started = Instant::now();
        self.store.compact().await?;
        let compaction_elapsed = compaction_started.elapsed();
        tracing::info!("end compact");

        // Step 6: Close
        self.store.close().await?;
        tracing::info!("closed");

        let report = BenchReport {
            writes: self.config.num_writes,
            write_elapsed,
            reads,
            scan,
            compaction_elapsed,
            total_elapsed: started.elapsed(),
        };
        tracing::info!("{}", report);
        Ok(report)
    }

    /// Seek, then pull until the sentinel
    async fn scan<I: EngineIterator>(
        cursor: &mut Cursor<I>,
        config: &BenchConfig,
    ) -> Result<ScanSummary> {
        cursor.seek(&config.seek_key)?;

        let mut summary = ScanSummary::default();
        while let Some(entry) = cursor.next().await? {
            summary.count += 1;
            if summary.sample.len() < config.sample_size {
                tracing::info!(
                    "key = {}   val = {}",
                    display_key(&entry.key),
                    display_key(&entry.value)
                );
                summary.sample.push(entry);
            }
        }
        Ok(summary)
    }
}
