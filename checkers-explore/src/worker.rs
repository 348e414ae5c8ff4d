//! Node expansion and the worker pool
//!
//! Workers are pure: a key goes in, the child list comes out over a
//! channel. Only the coordinator touches the graph.
//!
//! ## Architecture
//! - Level 2: `WorkerPool` (submit / receive)
//! - Level 3: `expand` (one node)

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

use checkers_core::{Board, BoardKey, CodecError, GameState, MaterialValue, ValueFunction};

/// Expansion errors; the node stays in the frontier and is retried
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExpandError {
    #[error("undecodable key: {0}")]
    Codec(#[from] CodecError),

    #[error("expansion panicked: {0}")]
    Panicked(String),
}

/// A successor as reported by a worker
#[derive(Clone, Debug, PartialEq)]
pub struct ChildInfo {
    pub key: BoardKey,
    pub game_state: GameState,
    pub turn_sign: i8,
    pub priority: f32,
}

/// All successors of one node
#[derive(Clone, Debug, PartialEq)]
pub struct Expansion {
    pub key: BoardKey,
    pub children: Vec<ChildInfo>,
}

/// Expansion function run by workers
pub type Expander = Arc<dyn Fn(BoardKey) -> Result<Expansion, ExpandError> + Send + Sync>;

// ============================================================================
// EXPANSION (Level 3)
// ============================================================================

/// Expand one node: apply every legal move to a copy of its board
pub fn expand(key: BoardKey) -> Result<Expansion, ExpandError> {
    let board = key.to_board()?;
    let mut children: Vec<ChildInfo> = Vec::new();
    if board.game_state().is_over() {
        return Ok(Expansion { key, children });
    }

    let heuristic = MaterialValue::default();
    for mv in board.legal_moves() {
        let mut next = board.clone();
        next.apply(mv);
        let child_key = BoardKey::from_board(&next);
        if children.iter().any(|c| c.key == child_key) {
            continue;
        }
        children.push(ChildInfo {
            key: child_key,
            game_state: next.game_state(),
            turn_sign: next.turn_sign(),
            priority: priority(&heuristic, &next),
        });
    }
    Ok(Expansion { key, children })
}

/// Material imbalance: lopsided positions resolve soonest
fn priority(heuristic: &MaterialValue, board: &Board) -> f32 {
    heuristic.value(board).abs()
}

pub fn default_expander() -> Expander {
    Arc::new(expand)
}

// ============================================================================
// WORKER POOL (Level 2)
// ============================================================================

/// Result of one submitted job
#[derive(Debug)]
pub struct JobResult {
    pub key: BoardKey,
    pub result: Result<Expansion, ExpandError>,
}

/// Fixed-size pool of expansion workers
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    expander: Expander,
    tx: Sender<JobResult>,
    rx: Receiver<JobResult>,
}

impl WorkerPool {
    pub fn new(workers: usize, expander: Expander) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("expand-{i}"))
            .build()?;
        let (tx, rx) = channel();
        Ok(Self {
            pool,
            expander,
            tx,
            rx,
        })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Queue `key` for expansion. Panics inside the expander are reported
    /// as `ExpandError::Panicked`.
    pub fn submit(&self, key: BoardKey) {
        let expander = Arc::clone(&self.expander);
        let tx = self.tx.clone();
        self.pool.spawn(move || {
            let result = catch_unwind(AssertUnwindSafe(|| expander(key))).unwrap_or_else(|payload| {
                Err(ExpandError::Panicked(panic_message(payload.as_ref())))
            });
            // The receiver only goes away with the pool
            let _ = tx.send(JobResult { key, result });
        });
    }

    /// Block until the next job finishes
    pub fn recv(&self) -> Option<JobResult> {
        self.rx.recv().ok()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
