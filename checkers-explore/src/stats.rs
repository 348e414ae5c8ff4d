//! Explorer statistics and progress logging

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

/// Resident memory of this process in bytes
#[cfg(target_os = "linux")]
pub fn memory_usage() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    let line = status.lines().find(|l| l.starts_with("VmRSS:"))?;
    let kb: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kb * 1024)
}

#[cfg(not(target_os = "linux"))]
pub fn memory_usage() -> Option<u64> {
    None
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Counters collected by the coordinator
#[derive(Debug, Clone, Serialize)]
pub struct ExploreStats {
    /// Successful expansions merged into the graph
    pub expanded: u64,
    /// Edges into nodes that were already known
    pub transpositions: u64,
    pub terminals: u64,
    /// Failed expansions that were put back on the frontier
    pub retries: u64,
    /// Nodes abandoned after exhausting their retries
    pub failures: u64,
    pub max_depth: u32,

    #[serde(skip)]
    start_time: Instant,
    #[serde(skip)]
    last_log_time: Instant,
    #[serde(skip)]
    last_log_expanded: u64,
}

impl Default for ExploreStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ExploreStats {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            expanded: 0,
            transpositions: 0,
            terminals: 0,
            retries: 0,
            failures: 0,
            max_depth: 0,
            start_time: now,
            last_log_time: now,
            last_log_expanded: 0,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Expansions per second since the start
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.expanded as f64 / secs
        } else {
            0.0
        }
    }

    pub fn should_log(&self, interval_secs: u64) -> bool {
        self.last_log_time.elapsed().as_secs() >= interval_secs
    }

    /// Log one progress line and reset the log timer
    pub fn log_progress(&mut self, nodes: usize, frontier: usize, in_flight: usize, decided: usize) {
        let since = self.last_log_time.elapsed().as_secs_f64();
        let rate = if since > 0.0 {
            (self.expanded - self.last_log_expanded) as f64 / since
        } else {
            self.rate()
        };
        let mem = memory_usage().map(format_bytes).unwrap_or_else(|| "?".to_string());

        info!(
            nodes,
            frontier,
            in_flight,
            decided,
            expanded = self.expanded,
            transpositions = self.transpositions,
            depth = self.max_depth,
            rate = %format!("{rate:.0}/s"),
            mem = %mem,
            "explore progress"
        );

        self.last_log_time = Instant::now();
        self.last_log_expanded = self.expanded;
    }
}
