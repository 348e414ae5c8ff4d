//! Configuration types for matches and training
//!
//! Level 4 - Utilities and configuration

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use checkers_core::{GreedyValuePolicy, MaterialValue, MemoryPolicy, Policy, RandomPolicy};
use serde::{Deserialize, Serialize};

/// Policy kind for automated players
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyKind {
    /// Uniform over legal moves
    #[default]
    Random,
    /// One-ply greedy over material value
    Greedy,
    /// Tabular memory learned from games
    Memory,
}

/// How to build a player
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub kind: PolicyKind,
    /// Random seed for reproducibility (None = derived from the match seed)
    pub seed: Option<u64>,
    /// Greedy only: bonus for capturing moves
    pub capture_bonus: f32,
    /// Greedy only: material value of a king
    pub king_weight: f32,
    /// Memory only: table to start from
    pub memory_path: Option<PathBuf>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            kind: PolicyKind::Random,
            seed: None,
            capture_bonus: 0.5,
            king_weight: MaterialValue::default().king_weight,
            memory_path: None,
        }
    }
}

impl PolicyConfig {
    pub fn random() -> Self {
        Self::default()
    }

    pub fn greedy() -> Self {
        Self {
            kind: PolicyKind::Greedy,
            ..Default::default()
        }
    }

    pub fn memory(path: Option<PathBuf>) -> Self {
        Self {
            kind: PolicyKind::Memory,
            memory_path: path,
            ..Default::default()
        }
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build the policy; `fallback_seed` is used when no seed is set
    pub fn build(&self, fallback_seed: u64) -> Result<Policy> {
        let seed = self.seed.unwrap_or(fallback_seed);
        let policy = match self.kind {
            PolicyKind::Random => Policy::Random(RandomPolicy::new(seed)),
            PolicyKind::Greedy => {
                let value = MaterialValue {
                    king_weight: self.king_weight,
                    ..Default::default()
                };
                Policy::Greedy(
                    GreedyValuePolicy::new(Arc::new(value)).with_capture_bonus(self.capture_bonus),
                )
            }
            PolicyKind::Memory => match &self.memory_path {
                Some(path) if path.exists() => Policy::Memory(MemoryPolicy::load(path, seed)?),
                _ => Policy::Memory(MemoryPolicy::new(seed)),
            },
        };
        Ok(policy)
    }
}

/// Match configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Games in the match (even counts give each side equal colours)
    pub games: usize,
    /// Moves after which an unfinished game is scored as a draw
    pub max_moves: u32,
    /// Whether to run games in parallel
    pub parallel: bool,
    pub seed: u64,
    pub enable_should_capture_rule: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            games: 10,
            max_moves: 200,
            parallel: true,
            seed: 42,
            enable_should_capture_rule: true,
        }
    }
}

impl MatchConfig {
    pub fn new(games: usize) -> Self {
        Self {
            games,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Training loop configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainConfig {
    pub episodes: usize,
    pub max_moves: u32,
    pub seed: u64,
    /// Episodes between progress lines
    pub log_interval: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            episodes: 1000,
            max_moves: 200,
            seed: 42,
            log_interval: 100,
        }
    }
}

impl TrainConfig {
    pub fn new(episodes: usize) -> Self {
        Self {
            episodes,
            ..Default::default()
        }
    }
}
