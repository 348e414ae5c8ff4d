//! Tabular move memory learned from finished games
//!
//! Each entry scores a move made by a given piece value on a given turn.
//! Move choice is softmax over the stored values (unknown moves weigh 1).
//! After a game every distinct move that was played is nudged by
//! `3 * 0.9^n`, towards the winner's moves and away from the loser's. Draws
//! push every played move down by half that amount.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::game::{Board, GameState, Move};
use crate::policy::{legal_moves_or_err, PolicyError};

/// Base reward of an episode before length decay
const REWARD_SCALE: f32 = 3.0;

/// Per-move decay of the episode reward
const REWARD_DECAY: f32 = 0.9;

const MEMORY_FILE_VERSION: u32 = 1;

/// Memory table key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemoryKey {
    /// Piece value on the source square
    pub piece: i8,
    pub turn_sign: i8,
    pub mv: Move,
}

impl MemoryKey {
    /// Key for playing `mv` on `board` (before the move is applied)
    pub fn for_move(board: &Board, mv: Move) -> Self {
        Self {
            piece: board.get(mv.from),
            turn_sign: board.turn_sign(),
            mv,
        }
    }
}

/// A finished game as seen by the memory: every move played, by either side
#[derive(Clone, Debug, Default)]
pub struct Episode {
    pub moves: Vec<MemoryKey>,
    pub outcome: Option<GameState>,
}

impl Episode {
    pub fn record(&mut self, board: &Board, mv: Move) {
        self.moves.push(MemoryKey::for_move(board, mv));
    }
}

#[derive(Serialize, Deserialize)]
struct MemoryFile {
    version: u32,
    entries: Vec<(MemoryKey, f32)>,
}

/// Move-choice policy backed by an instance-owned memory table
#[derive(Clone, Debug)]
pub struct MemoryPolicy {
    table: FxHashMap<MemoryKey, f32>,
    rng: ChaCha8Rng,
}

impl MemoryPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            table: FxHashMap::default(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn get(&self, key: &MemoryKey) -> Option<f32> {
        self.table.get(key).copied()
    }

    /// Choice weight of a move, `exp(value)` or 1 for unseen moves
    fn weight(&self, key: &MemoryKey) -> f32 {
        match self.table.get(key) {
            Some(value) => {
                let w = value.exp();
                if w.is_finite() {
                    w
                } else {
                    1.0
                }
            }
            None => 1.0,
        }
    }

    pub fn decide_move(&mut self, board: &Board) -> Result<Move, PolicyError> {
        let moves = legal_moves_or_err(board)?;
        let weights: Vec<f32> = moves
            .iter()
            .map(|&mv| self.weight(&MemoryKey::for_move(board, mv)))
            .collect();

        let total: f32 = weights.iter().sum();
        let mut r = self.rng.gen::<f32>() * total;
        for (mv, w) in moves.iter().zip(&weights) {
            r -= w;
            if r <= 0.0 {
                return Ok(*mv);
            }
        }
        // Float rounding left a sliver past the last weight
        Ok(moves[moves.len() - 1])
    }

    /// Update the table from a finished game played by `bot_sign`.
    /// Unfinished episodes are ignored.
    pub fn record_episode(&mut self, episode: &Episode, bot_sign: i8) {
        let outcome = match episode.outcome {
            Some(state) if state.is_over() => state,
            _ => return,
        };

        let played: FxHashSet<MemoryKey> = episode.moves.iter().copied().collect();
        let magnitude = REWARD_SCALE * REWARD_DECAY.powi(played.len() as i32);

        for key in played {
            let delta = match outcome.winner() {
                Some(winner) => (winner * bot_sign * key.turn_sign) as f32 * magnitude,
                None => -magnitude / 2.0,
            };
            *self.table.entry(key).or_insert(0.0) += delta;
        }
    }

    /// Sum the tables of several policies into a fresh one
    pub fn combine<'a>(policies: impl IntoIterator<Item = &'a MemoryPolicy>, seed: u64) -> Self {
        let mut combined = MemoryPolicy::new(seed);
        for policy in policies {
            for (key, value) in &policy.table {
                *combined.table.entry(*key).or_insert(0.0) += value;
            }
        }
        combined
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut entries: Vec<(MemoryKey, f32)> =
            self.table.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let file = MemoryFile {
            version: MEMORY_FILE_VERSION,
            entries,
        };
        let json = serde_json::to_string(&file)?;
        fs::write(path, json).with_context(|| format!("writing memory to {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path, seed: u64) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading memory from {}", path.display()))?;
        let file: MemoryFile = serde_json::from_str(&json)
            .with_context(|| format!("parsing memory file {}", path.display()))?;
        if file.version != MEMORY_FILE_VERSION {
            bail!("unsupported memory file version {}", file.version);
        }

        let mut policy = MemoryPolicy::new(seed);
        policy.table.extend(file.entries);
        Ok(policy)
    }
}
