//! Exploration driver
//!
//! A single coordinator owns the graph and the frontier. It keeps at most
//! `workers` jobs in flight, merges results as they arrive and handles
//! retries, limits, snapshots and the stop flag.
//!
//! ## Architecture (4-layer granularity)
//! - Level 1: `run` (orchestration)
//! - Level 2: `fill_workers`, `handle_result`
//! - Level 3: snapshot / progress housekeeping
//! - Level 4: limit checks

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use checkers_core::{Board, BoardKey, GameState};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, error, info, warn};

use crate::config::ExplorerConfig;
use crate::frontier::Frontier;
use crate::graph::StateGraph;
use crate::snapshot::{self, SnapshotError};
use crate::stats::ExploreStats;
use crate::worker::{default_expander, Expander, JobResult, WorkerPool};

/// Explorer errors
#[derive(Debug, thiserror::Error)]
pub enum ExploreError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("worker pool disconnected with {0} jobs in flight")]
    WorkersDisconnected(usize),
}

/// Why `run` returned
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Frontier exhausted
    Complete,
    NodeLimit,
    Interrupted,
}

/// Result of a run
#[derive(Clone, Debug)]
pub struct ExploreSummary {
    pub stop_reason: StopReason,
    pub nodes: usize,
    pub decided: usize,
    pub frontier: usize,
    pub root_outcome: Option<GameState>,
    pub stats: ExploreStats,
}

pub struct Explorer {
    config: ExplorerConfig,
    graph: StateGraph,
    frontier: Frontier,
    expander: Expander,
    /// Keys currently being expanded
    in_flight: FxHashSet<BoardKey>,
    /// Failed attempts per key
    attempts: FxHashMap<BoardKey, u32>,
    stats: ExploreStats,
    stop: Arc<AtomicBool>,
}

impl Explorer {
    /// Explore from `root`
    pub fn new(root: &Board, config: ExplorerConfig) -> Self {
        Self::from_graph(StateGraph::new(root), config)
    }

    /// Continue from an existing graph; every unexpanded node within the
    /// depth limit goes back on the frontier
    pub fn from_graph(graph: StateGraph, config: ExplorerConfig) -> Self {
        let mut frontier = Frontier::new(config.order);
        for node in graph.pending() {
            if within_depth(&config, node.depth) {
                frontier.push(node.key, node.priority);
            }
        }
        Self {
            config,
            graph,
            frontier,
            expander: default_expander(),
            in_flight: FxHashSet::default(),
            attempts: FxHashMap::default(),
            stats: ExploreStats::new(),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Resume from a snapshot file
    pub fn resume(path: &Path, config: ExplorerConfig) -> Result<Self, ExploreError> {
        let graph = snapshot::load_graph(path)?;
        info!(path = %path.display(), nodes = graph.len(), "resumed from snapshot");
        Ok(Self::from_graph(graph, config))
    }

    /// Replace the expansion function run by workers
    pub fn with_expander(mut self, expander: Expander) -> Self {
        self.expander = expander;
        self
    }

    /// Flag that stops the run once in-flight jobs are merged
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn graph(&self) -> &StateGraph {
        &self.graph
    }

    pub fn into_graph(self) -> StateGraph {
        self.graph
    }

    // ========================================================================
    // LEVEL 1 - ORCHESTRATION
    // ========================================================================

    /// Explore until the frontier is empty, a limit is hit or the stop flag
    /// is raised. In-flight jobs are always drained and merged before
    /// returning, and a final snapshot is written if configured.
    pub fn run(&mut self) -> Result<ExploreSummary, ExploreError> {
        let pool = WorkerPool::new(self.config.workers, Arc::clone(&self.expander))?;
        info!(
            workers = pool.workers(),
            order = ?self.config.order,
            nodes = self.graph.len(),
            frontier = self.frontier.len(),
            "exploration started"
        );

        let mut last_snapshot = Instant::now();
        let mut stop_reason = StopReason::Complete;

        loop {
            if stop_reason == StopReason::Complete {
                if self.stop.load(Ordering::SeqCst) {
                    info!(in_flight = self.in_flight.len(), "stop requested, draining workers");
                    stop_reason = StopReason::Interrupted;
                } else if self.node_limit_reached() {
                    info!(nodes = self.graph.len(), "node limit reached");
                    stop_reason = StopReason::NodeLimit;
                }
            }

            if stop_reason == StopReason::Complete {
                self.fill_workers(&pool);
            }
            if self.in_flight.is_empty() {
                break;
            }

            let job = pool
                .recv()
                .ok_or(ExploreError::WorkersDisconnected(self.in_flight.len()))?;
            self.handle_result(job);

            if self.stats.should_log(self.config.log_interval_secs) {
                self.log_progress();
            }
            if let Some(path) = &self.config.snapshot_path {
                if last_snapshot.elapsed().as_secs() >= self.config.snapshot_interval_secs {
                    // Failures are retried at the next interval
                    if let Err(e) = snapshot::save_graph(&self.graph, path) {
                        warn!(error = %e, "snapshot failed");
                    } else {
                        debug!(path = %path.display(), nodes = self.graph.len(), "snapshot written");
                    }
                    last_snapshot = Instant::now();
                }
            }
        }

        if let Some(path) = &self.config.snapshot_path {
            let written = snapshot::save_graph(&self.graph, path)?;
            info!(path = %path.display(), nodes = written, "final snapshot written");
        }

        self.log_progress();
        let summary = ExploreSummary {
            stop_reason,
            nodes: self.graph.len(),
            decided: self.graph.decided_count(),
            frontier: self.frontier.len(),
            root_outcome: self.graph.root_outcome(),
            stats: self.stats.clone(),
        };
        info!(
            reason = ?summary.stop_reason,
            nodes = summary.nodes,
            decided = summary.decided,
            root = ?summary.root_outcome,
            elapsed = ?self.stats.elapsed(),
            "exploration finished"
        );
        Ok(summary)
    }

    // ========================================================================
    // LEVEL 2 - SCHEDULING AND MERGING
    // ========================================================================

    /// Submit frontier nodes until every worker slot is busy
    fn fill_workers(&mut self, pool: &WorkerPool) {
        while self.in_flight.len() < pool.workers() {
            let Some(key) = self.frontier.pop() else {
                break;
            };
            let needs_work = self.graph.get(key).is_some_and(|n| n.needs_expansion());
            if !needs_work || self.in_flight.contains(&key) {
                continue;
            }
            self.in_flight.insert(key);
            pool.submit(key);
        }
    }

    fn handle_result(&mut self, job: JobResult) {
        self.in_flight.remove(&job.key);

        let expansion = match job.result {
            Ok(expansion) => expansion,
            Err(e) => {
                self.retry_or_abandon(job.key, e.to_string());
                return;
            }
        };

        let root_was_decided = self.graph.root_outcome().is_some();
        let merged = self.graph.merge_expansion(&expansion);
        self.attempts.remove(&job.key);
        self.stats.expanded += 1;
        self.stats.transpositions += merged.transpositions as u64;
        self.stats.terminals += merged.terminals as u64;

        for (key, priority) in merged.discovered {
            let depth = self.graph.get(key).map_or(0, |n| n.depth);
            self.stats.max_depth = self.stats.max_depth.max(depth);
            if within_depth(&self.config, depth) {
                self.frontier.push(key, priority);
            }
        }

        // Reached sooner through a transposition; may now fit under the depth limit
        for (key, priority) in merged.shallower {
            let depth = self.graph.get(key).map_or(0, |n| n.depth);
            if within_depth(&self.config, depth) {
                self.frontier.push(key, priority);
            }
        }

        if merged.decided > 0 {
            debug!(key = %job.key, decided = merged.decided, "outcomes propagated");
        }
        if let Some(outcome) = self.graph.root_outcome().filter(|_| !root_was_decided) {
            info!(outcome = ?outcome, expanded = self.stats.expanded, "root decided");
        }
    }

    fn retry_or_abandon(&mut self, key: BoardKey, reason: String) {
        let attempts = self.attempts.entry(key).or_insert(0);
        *attempts += 1;
        if *attempts <= self.config.max_retries {
            warn!(key = %key, attempt = *attempts, error = %reason, "expansion failed, retrying");
            self.stats.retries += 1;
            let priority = self.graph.get(key).map_or(0.0, |n| n.priority);
            self.frontier.push(key, priority);
        } else {
            error!(key = %key, attempts = *attempts, error = %reason, "expansion abandoned");
            self.stats.failures += 1;
        }
    }

    // ========================================================================
    // LEVEL 3 - HOUSEKEEPING
    // ========================================================================

    fn log_progress(&mut self) {
        self.stats.log_progress(
            self.graph.len(),
            self.frontier.len(),
            self.in_flight.len(),
            self.graph.decided_count(),
        );
    }

    // ========================================================================
    // LEVEL 4 - LIMITS
    // ========================================================================

    fn node_limit_reached(&self) -> bool {
        self.config
            .max_nodes
            .is_some_and(|max| self.graph.len() >= max)
    }
}

fn within_depth(config: &ExplorerConfig, depth: u32) -> bool {
    config.max_depth.map_or(true, |max| depth <= max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FrontierOrder;
    use crate::node::SearchNode;
    use crate::worker::{expand, ChildInfo, ExpandError, Expansion};
    use checkers_core::Coord;
    use std::sync::atomic::AtomicUsize;

    fn c(x: i8, y: i8) -> Coord {
        Coord::new(x, y)
    }

    fn config() -> ExplorerConfig {
        ExplorerConfig::default().with_workers(2)
    }

    fn key_after(moves: &[(Coord, Coord)]) -> BoardKey {
        let mut board = Board::new();
        for &(from, to) in moves {
            board.make_move(from, to);
        }
        BoardKey::from_board(&board)
    }

    #[test]
    fn test_forced_win_is_solved() {
        // The only move captures the last negative piece
        let board = Board::with_pieces(&[(c(2, 2), 1), (c(3, 1), -1)], 1);
        let mut explorer = Explorer::new(&board, config());
        let summary = explorer.run().unwrap();

        assert_eq!(summary.stop_reason, StopReason::Complete);
        assert_eq!(summary.nodes, 2);
        assert_eq!(summary.root_outcome, Some(GameState::PositiveWins));
        assert_eq!(summary.stats.terminals, 1);
    }

    #[test]
    fn test_transposition_from_initial_position() {
        let a = (c(0, 4), c(1, 3));
        let x = (c(1, 1), c(0, 2));
        let b = (c(4, 4), c(5, 3));

        let mut explorer = Explorer::new(&Board::new(), config().with_max_depth(2));
        let summary = explorer.run().unwrap();
        assert_eq!(summary.stop_reason, StopReason::Complete);
        assert!(summary.stats.transpositions > 0);

        let graph = explorer.graph();
        let target = key_after(&[a, x, b]);
        assert_eq!(target, key_after(&[b, x, a]));

        let node = graph.get(target).unwrap();
        assert_eq!(node.depth, 3);
        assert!(node.parents.contains(&key_after(&[a, x])));
        assert!(node.parents.contains(&key_after(&[b, x])));
        // Depth-3 nodes are recorded but not expanded
        assert!(!node.is_expanded());
    }

    #[test]
    fn test_shallower_transposition_is_expanded() {
        // 0 -> {5, 1}, 1 -> 2 -> 3, 5 -> 3, 3 -> 4. LIFO with one worker takes
        // the long branch first, so 3 is seen at depth 3 before 5 lifts it to 2.
        let edges: Expander = Arc::new(|key: BoardKey| -> Result<Expansion, ExpandError> {
            let next: &[u64] = match key.0 {
                0 => &[5, 1],
                1 => &[2],
                2 | 5 => &[3],
                3 => &[4],
                _ => &[],
            };
            let children = next
                .iter()
                .map(|&k| ChildInfo {
                    key: BoardKey(k),
                    game_state: GameState::NotOver,
                    turn_sign: 1,
                    priority: 0.0,
                })
                .collect();
            Ok(Expansion { key, children })
        });

        let graph = StateGraph::with_root(SearchNode::new(BoardKey(0), 0, GameState::NotOver, 1));
        let config = config().with_workers(1).with_max_depth(2);
        let mut explorer = Explorer::from_graph(graph, config).with_expander(edges);
        let summary = explorer.run().unwrap();

        assert_eq!(summary.stop_reason, StopReason::Complete);
        let graph = explorer.graph();
        let node = graph.get(BoardKey(3)).unwrap();
        assert_eq!(node.depth, 2);
        assert!(node.is_expanded());
        assert_eq!(graph.get(BoardKey(4)).unwrap().depth, 3);
        assert!(!graph.get(BoardKey(4)).unwrap().is_expanded());
    }

    #[test]
    fn test_lifo_and_priority_agree() {
        let run = |order| {
            let mut explorer = Explorer::new(
                &Board::new(),
                config().with_max_depth(2).with_order(order),
            );
            explorer.run().unwrap();
            let graph = explorer.into_graph();
            let mut keys: Vec<_> = graph.nodes().map(|n| (n.key, n.parents.len())).collect();
            keys.sort();
            keys
        };
        assert_eq!(
            run(FrontierOrder::Lifo),
            run(FrontierOrder::Priority)
        );
    }

    #[test]
    fn test_failed_expansion_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let flaky: Expander = Arc::new(move |key: BoardKey| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("worker crashed");
            }
            expand(key)
        });

        let board = Board::with_pieces(&[(c(2, 2), 1), (c(3, 1), -1)], 1);
        let mut explorer = Explorer::new(&board, config()).with_expander(flaky);
        let summary = explorer.run().unwrap();

        assert_eq!(summary.stats.retries, 1);
        assert_eq!(summary.stats.failures, 0);
        assert_eq!(summary.root_outcome, Some(GameState::PositiveWins));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_retries_are_bounded() {
        let failing: Expander = Arc::new(|_key: BoardKey| -> Result<Expansion, ExpandError> {
            Err(ExpandError::Panicked("always".to_string()))
        });
        let config = config().with_max_retries(2);
        let mut explorer = Explorer::new(&Board::new(), config).with_expander(failing);
        let summary = explorer.run().unwrap();

        assert_eq!(summary.stats.retries, 2);
        assert_eq!(summary.stats.failures, 1);
        // The graph was never touched
        assert_eq!(summary.nodes, 1);
        assert!(explorer.graph().children(explorer.graph().root()).is_none());
    }

    #[test]
    fn test_node_limit() {
        let mut explorer = Explorer::new(&Board::new(), config().with_max_nodes(50));
        let summary = explorer.run().unwrap();
        assert_eq!(summary.stop_reason, StopReason::NodeLimit);
        assert!(summary.nodes >= 50);
        assert!(summary.frontier > 0);
    }

    #[test]
    fn test_stop_flag_and_resume() {
        let path = std::env::temp_dir().join(format!("checkers_explore_{}.json", std::process::id()));

        let mut explorer = Explorer::new(
            &Board::new(),
            config().with_max_depth(1).with_snapshot(&path, 3600),
        );
        explorer.stop_flag().store(true, Ordering::SeqCst);
        let summary = explorer.run().unwrap();
        assert_eq!(summary.stop_reason, StopReason::Interrupted);
        assert_eq!(summary.nodes, 1);
        assert_eq!(summary.stats.expanded, 0);

        // The final snapshot holds the untouched root; resuming finishes the job
        let mut resumed = Explorer::resume(&path, config().with_max_depth(1)).unwrap();
        let summary = resumed.run().unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(summary.stop_reason, StopReason::Complete);
        let graph = resumed.graph();
        assert_eq!(graph.children(graph.root()).unwrap().len(), 5);
        assert!(summary.nodes > 6);
    }
}
