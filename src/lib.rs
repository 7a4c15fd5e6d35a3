//! # kvbench
//!
//! Async driver and smoke-test benchmark for embedded key-value engines:
//! - Callback-style engine boundary with a worker thread per engine
//! - Single-result futures for open / put / get / compact / close
//! - Scoped cursors that are always released
//! - A sequential benchmark driver with progress and timing
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Benchmark Driver                          │
//! │        (open → writes → reads → scan → compact → close)     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ await
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │    Store    │─creates─►│   Cursor    │
//!   │  (futures)  │          │  (futures)  │
//!   └──────┬──────┘          └──────┬──────┘
//!          │ job + callback         │
//!          ▼                        ▼
//!   ┌─────────────────────────────────────┐
//!   │     Engine worker (sled / memory)   │
//!   └─────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod engine;
mod completion;
pub mod cursor;
pub mod store;
pub mod driver;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{EngineError, KvError, Result};
pub use config::{BenchConfig, IteratorOptions, OpenOptions};
pub use cursor::{Cursor, Entry};
pub use store::Store;
pub use driver::{BenchReport, BenchmarkDriver};
pub use engine::{Engine, MemoryEngine};
#[cfg(feature = "sled")]
pub use engine::SledEngine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of kvbench
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
