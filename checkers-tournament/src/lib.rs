//! Checkers Tournament - Games between policies
//!
//! This crate provides game-playing infrastructure:
//! - Single games between any two players
//! - Matches between policies (sequential or parallel)
//! - Training episodes for the memory policy
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: train (orchestration)
//! - Level 2: play_match (phases)
//! - Level 3: play_game (steps)
//! - Level 4: configuration

mod config;
mod game_runner;
mod match_play;
mod training;

pub use config::{MatchConfig, PolicyConfig, PolicyKind, TrainConfig};
pub use game_runner::{play_game, GameOutcome};
pub use match_play::{play_match, MatchResult};
pub use training::{train, TrainingReport};
