//! Checkers Core - 6x6 checkers engine and players
//!
//! This crate provides the core game logic:
//! - Board geometry (square grid, diagonal directions)
//! - Board engine with mandatory capture, chain captures and promotion
//! - Byte and packed integer keys for boards
//! - Position evaluation and player policies

pub mod board;
pub mod game;
pub mod codec;
pub mod eval;
pub mod policy;
pub mod memory;

// Re-exports for convenient access
pub use board::{Coord, DIRECTIONS, SIZE};
pub use game::{Board, GameState, Move, MoveOutcome, MAX_MOVES_WITHOUT_CAPTURE};
pub use codec::{features, from_key, to_key, BoardKey, CodecError, KeyFormat};
pub use eval::{MaterialValue, ValueFunction, WIN_VALUE};
pub use policy::{DecideMove, GreedyValuePolicy, Policy, PolicyError, RandomPolicy};
pub use memory::{Episode, MemoryKey, MemoryPolicy};
