//! Write progress tracking

use std::time::{Duration, Instant};

/// Emits a progress line every `interval` completed writes
pub struct Progress {
    started: Instant,
    interval: u64,
    completed: u64,
}

impl Progress {
    /// `interval == 0` disables progress lines
    pub fn start(interval: u64) -> Self {
        Self {
            started: Instant::now(),
            interval,
            completed: 0,
        }
    }

    /// Record one completed write; returns the elapsed time when a progress
    /// line is due
    pub fn record(&mut self) -> Option<Duration> {
        self.completed += 1;
        if self.interval > 0 && self.completed % self.interval == 0 {
            Some(self.started.elapsed())
        } else {
            None
        }
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
