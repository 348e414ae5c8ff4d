//! Checkers Explore - State-space exploration of 6x6 checkers
//!
//! This crate builds the deduplicated graph of reachable boards:
//! - Search nodes keyed by packed board keys (transpositions merge)
//! - LIFO or priority frontier
//! - Parallel expansion on a worker pool, single-owner merging
//! - Backward induction of win/loss/draw outcomes
//! - Periodic JSON snapshots and resume

pub mod config;
pub mod node;
pub mod graph;
pub mod frontier;
pub mod worker;
pub mod explorer;
pub mod snapshot;
pub mod stats;

// Re-exports for convenient access
pub use config::{ExplorerConfig, FrontierOrder};
pub use node::{OutcomeStats, SearchNode};
pub use graph::{MergeOutcome, StateGraph};
pub use frontier::Frontier;
pub use worker::{expand, ChildInfo, Expander, ExpandError, Expansion, WorkerPool};
pub use explorer::{ExploreError, ExploreSummary, Explorer, StopReason};
pub use snapshot::{load_graph, save_graph, Snapshot, SnapshotError};
pub use stats::ExploreStats;
