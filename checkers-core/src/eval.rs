//! Position evaluation

use serde::{Deserialize, Serialize};

use crate::board::sign;
use crate::game::{Board, GameState, SIMPLE};

/// Win value (effectively infinite)
pub const WIN_VALUE: f32 = 100000.0;

/// Scores a board from the positive player's perspective.
///
/// Learned models plug in here; [`crate::policy::GreedyValuePolicy`] only
/// ever calls `value` on successor boards.
pub trait ValueFunction: Send + Sync {
    fn value(&self, board: &Board) -> f32;
}

impl<F> ValueFunction for F
where
    F: Fn(&Board) -> f32 + Send + Sync,
{
    fn value(&self, board: &Board) -> f32 {
        self(board)
    }
}

/// Material count: simple pieces are worth 1, kings `king_weight`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaterialValue {
    pub king_weight: f32,
    /// Bonus per row a simple piece has advanced
    pub advance_weight: f32,
}

impl Default for MaterialValue {
    fn default() -> Self {
        Self {
            king_weight: 3.0,
            advance_weight: 0.05,
        }
    }
}

impl ValueFunction for MaterialValue {
    fn value(&self, board: &Board) -> f32 {
        match board.game_state() {
            GameState::PositiveWins => return WIN_VALUE,
            GameState::NegativeWins => return -WIN_VALUE,
            GameState::Draw => return 0.0,
            GameState::NotOver => {}
        }

        board
            .pieces()
            .map(|(pos, piece)| {
                let owner = sign(piece) as f32;
                if piece.abs() == SIMPLE {
                    // Rows travelled from the owner's back rank
                    let advanced = if piece > 0 { 5 - pos.y } else { pos.y } as f32;
                    owner * (1.0 + self.advance_weight * advanced)
                } else {
                    owner * self.king_weight
                }
            })
            .sum()
    }
}
