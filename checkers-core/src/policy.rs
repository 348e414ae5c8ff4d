//! Player policies: the `decide_move` capability and its variants
//!
//! A policy only reads the board it is handed. Returned moves are always
//! drawn from [`Board::legal_moves`], so callers may apply them directly.

use std::fmt;
use std::sync::Arc;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::eval::{MaterialValue, ValueFunction};
use crate::game::{Board, Move};
use crate::memory::MemoryPolicy;

/// Policy errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("moves for this player come from user input, not from decide_move")]
    RequiresUserInput,

    #[error("no legal moves for player {turn_sign}")]
    NoLegalMoves { turn_sign: i8 },
}

/// The `decide_move` capability shared by every player
pub trait DecideMove {
    fn decide_move(&mut self, board: &Board) -> Result<Move, PolicyError>;
}

/// A player
#[derive(Clone, Debug)]
pub enum Policy {
    /// Human proxy; the presentation layer routes its moves instead
    UserInput,
    Random(RandomPolicy),
    Greedy(GreedyValuePolicy),
    Memory(MemoryPolicy),
}

impl Policy {
    /// Choose a move for the side to move on `board`
    pub fn decide_move(&mut self, board: &Board) -> Result<Move, PolicyError> {
        match self {
            Policy::UserInput => Err(PolicyError::RequiresUserInput),
            Policy::Random(policy) => policy.decide_move(board),
            Policy::Greedy(policy) => policy.decide_move(board),
            Policy::Memory(policy) => policy.decide_move(board),
        }
    }

    /// Restart the random stream of stochastic policies
    pub fn reseed(&mut self, seed: u64) {
        match self {
            Policy::Random(policy) => policy.reseed(seed),
            Policy::Memory(policy) => policy.reseed(seed),
            Policy::UserInput | Policy::Greedy(_) => {}
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Policy::UserInput => "user",
            Policy::Random(_) => "random",
            Policy::Greedy(_) => "greedy",
            Policy::Memory(_) => "memory",
        }
    }
}

impl DecideMove for Policy {
    fn decide_move(&mut self, board: &Board) -> Result<Move, PolicyError> {
        Policy::decide_move(self, board)
    }
}

impl DecideMove for RandomPolicy {
    fn decide_move(&mut self, board: &Board) -> Result<Move, PolicyError> {
        RandomPolicy::decide_move(self, board)
    }
}

impl DecideMove for GreedyValuePolicy {
    fn decide_move(&mut self, board: &Board) -> Result<Move, PolicyError> {
        GreedyValuePolicy::decide_move(self, board)
    }
}

impl DecideMove for MemoryPolicy {
    fn decide_move(&mut self, board: &Board) -> Result<Move, PolicyError> {
        MemoryPolicy::decide_move(self, board)
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub(crate) fn legal_moves_or_err(board: &Board) -> Result<Vec<Move>, PolicyError> {
    let moves = board.legal_moves();
    if moves.is_empty() {
        return Err(PolicyError::NoLegalMoves {
            turn_sign: board.turn_sign(),
        });
    }
    Ok(moves)
}

// ============================================================================
// RANDOM
// ============================================================================

/// Uniform choice over all legal `(from, to)` pairs
#[derive(Clone, Debug)]
pub struct RandomPolicy {
    rng: ChaCha8Rng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    pub fn decide_move(&mut self, board: &Board) -> Result<Move, PolicyError> {
        let moves = legal_moves_or_err(board)?;
        Ok(moves[self.rng.gen_range(0..moves.len())])
    }
}

// ============================================================================
// GREEDY VALUE
// ============================================================================

/// One-ply greedy search over a [`ValueFunction`].
///
/// Every successor is scored from the mover's point of view, plus
/// `capture_bonus` when the move captures. Ties keep the first move in
/// enumeration order.
#[derive(Clone)]
pub struct GreedyValuePolicy {
    value: Arc<dyn ValueFunction>,
    pub capture_bonus: f32,
}

impl GreedyValuePolicy {
    pub fn new(value: Arc<dyn ValueFunction>) -> Self {
        Self {
            value,
            capture_bonus: 0.0,
        }
    }

    pub fn with_capture_bonus(mut self, bonus: f32) -> Self {
        self.capture_bonus = bonus;
        self
    }

    pub fn decide_move(&self, board: &Board) -> Result<Move, PolicyError> {
        let moves = legal_moves_or_err(board)?;
        let mover = board.turn_sign() as f32;

        let mut best = moves[0];
        let mut best_score = f32::NEG_INFINITY;
        for mv in moves {
            let mut next = board.clone();
            let outcome = next.apply(mv);
            let mut score = mover * self.value.value(&next);
            if outcome.captured {
                score += self.capture_bonus;
            }
            if score > best_score {
                best_score = score;
                best = mv;
            }
        }
        Ok(best)
    }
}

impl Default for GreedyValuePolicy {
    fn default() -> Self {
        Self::new(Arc::new(MaterialValue::default()))
    }
}

impl fmt::Debug for GreedyValuePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreedyValuePolicy")
            .field("capture_bonus", &self.capture_bonus)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Coord;

    fn c(x: i8, y: i8) -> Coord {
        Coord::new(x, y)
    }

    #[test]
    fn test_user_input_errors() {
        let mut policy = Policy::UserInput;
        assert_eq!(
            policy.decide_move(&Board::new()),
            Err(PolicyError::RequiresUserInput)
        );
    }

    #[test]
    fn test_random_is_legal_and_reproducible() {
        let board = Board::new();
        let mut a = RandomPolicy::new(42);
        let mut b = RandomPolicy::new(42);
        for _ in 0..20 {
            let mv = a.decide_move(&board).unwrap();
            assert!(board.is_move_correct(mv.from, mv.to));
            assert_eq!(mv, b.decide_move(&board).unwrap());
        }

        a.reseed(7);
        b.reseed(7);
        assert_eq!(a.decide_move(&board).unwrap(), b.decide_move(&board).unwrap());
    }

    #[test]
    fn test_dynamic_dispatch() {
        let board = Board::new();
        let mut players: Vec<Box<dyn DecideMove>> = vec![
            Box::new(RandomPolicy::new(1)),
            Box::new(GreedyValuePolicy::default()),
            Box::new(Policy::Memory(MemoryPolicy::new(2))),
        ];
        for player in &mut players {
            let mv = player.decide_move(&board).unwrap();
            assert!(board.is_move_correct(mv.from, mv.to));
        }
    }

    #[test]
    fn test_no_legal_moves() {
        // Negative simple piece blocked on the bottom row
        let board = Board::with_pieces(&[(c(1, 5), -1), (c(4, 4), 1)], -1);
        let mut policy = Policy::Random(RandomPolicy::new(0));
        assert_eq!(
            policy.decide_move(&board),
            Err(PolicyError::NoLegalMoves { turn_sign: -1 })
        );
    }

    #[test]
    fn test_greedy_prefers_promotion() {
        // Promotion gains king weight over any quiet move
        let board = Board::with_pieces(&[(c(1, 1), 1), (c(4, 4), 1), (c(5, 1), -1)], 1);
        let mv = GreedyValuePolicy::default().decide_move(&board).unwrap();
        assert_eq!(mv.from, c(1, 1));
        assert_eq!(mv.to.y, 0);
    }

    #[test]
    fn test_greedy_plays_for_negative() {
        // The negative player wins outright by capturing the last positive piece
        let board = Board::with_pieces(&[(c(2, 2), -1), (c(3, 3), 1), (c(0, 0), -1)], -1);
        let mv = GreedyValuePolicy::default().decide_move(&board).unwrap();
        assert_eq!(mv, Move::new(c(2, 2), c(4, 4)));
    }

    #[test]
    fn test_greedy_custom_value_function() {
        // A value function that rewards the positive player for low x
        let policy = GreedyValuePolicy::new(Arc::new(|b: &Board| {
            -(b.pieces().map(|(pos, _)| pos.x as f32).sum::<f32>())
        }));
        let board = Board::with_pieces(&[(c(2, 4), 1), (c(5, 1), -1)], 1);
        assert_eq!(policy.decide_move(&board).unwrap(), Move::new(c(2, 4), c(1, 3)));
    }
}
