//! Configuration for kvbench
//!
//! Option records for the store, its cursors and the benchmark driver, each
//! with sensible defaults and a builder.

use std::ops::Bound;

// =============================================================================
// Open Options
// =============================================================================

/// Options passed to [`Store::open`](crate::Store::open)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    /// Create the database if it does not exist yet
    pub create_if_missing: bool,

    /// Fail if the database already exists
    pub error_if_exists: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            error_if_exists: false,
        }
    }
}

impl OpenOptions {
    /// Create a new options builder
    pub fn builder() -> OpenOptionsBuilder {
        OpenOptionsBuilder::default()
    }
}

/// Builder for OpenOptions
#[derive(Default)]
pub struct OpenOptionsBuilder {
    options: OpenOptions,
}

impl OpenOptionsBuilder {
    /// Create the database if it is missing
    pub fn create_if_missing(mut self, yes: bool) -> Self {
        self.options.create_if_missing = yes;
        self
    }

    /// Refuse to open a database that already exists
    pub fn error_if_exists(mut self, yes: bool) -> Self {
        self.options.error_if_exists = yes;
        self
    }

    pub fn build(self) -> OpenOptions {
        self.options
    }
}

// =============================================================================
// Iterator Options
// =============================================================================

/// Range, limit and direction for a cursor
///
/// Bounds default to unbounded on both ends. Setting `gt` replaces an earlier
/// `gte` (and vice versa); the same holds for `lt` / `lte`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IteratorOptions {
    /// Lower bound of the key range
    pub lower: Bound<Vec<u8>>,

    /// Upper bound of the key range
    pub upper: Bound<Vec<u8>>,

    /// Maximum number of entries to yield (`None` = unlimited)
    pub limit: Option<usize>,

    /// Yield entries in descending key order
    pub reverse: bool,
}

impl Default for IteratorOptions {
    fn default() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
            limit: None,
            reverse: false,
        }
    }
}

impl IteratorOptions {
    /// Unbounded, unlimited, ascending
    pub fn new() -> Self {
        Self::default()
    }

    /// Only keys strictly greater than `key`
    pub fn gt(mut self, key: impl AsRef<[u8]>) -> Self {
        self.lower = Bound::Excluded(key.as_ref().to_vec());
        self
    }

    /// Only keys greater than or equal to `key`
    pub fn gte(mut self, key: impl AsRef<[u8]>) -> Self {
        self.lower = Bound::Included(key.as_ref().to_vec());
        self
    }

    /// Only keys strictly less than `key`
    pub fn lt(mut self, key: impl AsRef<[u8]>) -> Self {
        self.upper = Bound::Excluded(key.as_ref().to_vec());
        self
    }

    /// Only keys less than or equal to `key`
    pub fn lte(mut self, key: impl AsRef<[u8]>) -> Self {
        self.upper = Bound::Included(key.as_ref().to_vec());
        self
    }

    /// Stop after `limit` entries
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Iterate in descending key order
    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }
}

// =============================================================================
// Benchmark Configuration
// =============================================================================

/// Workload shape for [`BenchmarkDriver`](crate::driver::BenchmarkDriver)
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Number of sequential writes
    pub num_writes: u64,

    /// Log cumulative elapsed time every N writes
    pub progress_interval: u64,

    /// Read back keys `0..read_back` after the write phase
    pub read_back: u64,

    /// Key the scan cursor seeks to
    pub seek_key: String,

    /// Limit handed to the scan cursor
    pub scan_limit: usize,

    /// Number of scanned entries to log and keep in the report
    pub sample_size: usize,

    /// Options used when opening the store
    pub open_options: OpenOptions,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            num_writes: 1000,
            progress_interval: 10_000,
            read_back: 25,
            seek_key: "50".to_string(),
            scan_limit: 50_000,
            sample_size: 9,
            open_options: OpenOptions::default(),
        }
    }
}

impl BenchConfig {
    /// Create a new config builder
    pub fn builder() -> BenchConfigBuilder {
        BenchConfigBuilder::default()
    }
}

/// Builder for BenchConfig
#[derive(Default)]
pub struct BenchConfigBuilder {
    config: BenchConfig,
}

impl BenchConfigBuilder {
    /// Set the number of writes
    pub fn num_writes(mut self, count: u64) -> Self {
        self.config.num_writes = count;
        self
    }

    /// Set how often write progress is logged
    pub fn progress_interval(mut self, every: u64) -> Self {
        self.config.progress_interval = every;
        self
    }

    /// Set how many keys are read back
    pub fn read_back(mut self, count: u64) -> Self {
        self.config.read_back = count;
        self
    }

    /// Set the key the scan seeks to
    pub fn seek_key(mut self, key: impl Into<String>) -> Self {
        self.config.seek_key = key.into();
        self
    }

    /// Set the scan cursor limit
    pub fn scan_limit(mut self, limit: usize) -> Self {
        self.config.scan_limit = limit;
        self
    }

    /// Set how many scanned entries are sampled
    pub fn sample_size(mut self, count: usize) -> Self {
        self.config.sample_size = count;
        self
    }

    /// Set the open options
    pub fn open_options(mut self, options: OpenOptions) -> Self {
        self.config.open_options = options;
        self
    }

    pub fn build(self) -> BenchConfig {
        self.config
    }
}
