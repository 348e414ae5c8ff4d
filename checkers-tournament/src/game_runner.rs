//! Game runner - executes single games
//!
//! Level 3 - Step-level implementation

use checkers_core::{Board, DecideMove, Episode, GameState, Move, PolicyError};

/// Outcome of a single game
#[derive(Clone, Debug)]
pub struct GameOutcome {
    /// Final game state; `NotOver` if the move cap was hit
    pub result: GameState,
    /// Move history
    pub moves: Vec<Move>,
    pub captures: u32,
    pub promotions: u32,
    /// The same game as seen by a memory policy
    pub episode: Episode,
}

impl GameOutcome {
    /// Sign of the winner (None for draws and unfinished games)
    pub fn winner(&self) -> Option<i8> {
        self.result.winner()
    }

    /// Drawn by rule or stopped at the move cap
    pub fn is_draw(&self) -> bool {
        self.winner().is_none()
    }

    pub fn is_unfinished(&self) -> bool {
        self.result == GameState::NotOver
    }

    pub fn length(&self) -> usize {
        self.moves.len()
    }
}

/// Play one game from `initial` until it ends or `max_moves` moves were made.
///
/// A move that continues a capture chain counts as one move, so the same
/// player may be asked several times in a row.
pub fn play_game(
    positive: &mut dyn DecideMove,
    negative: &mut dyn DecideMove,
    initial: Board,
    max_moves: u32,
) -> Result<GameOutcome, PolicyError> {
    let mut board = initial;
    let mut moves = Vec::new();
    let mut episode = Episode::default();
    let mut captures = 0;
    let mut promotions = 0;

    while !board.game_state().is_over() && moves.len() < max_moves as usize {
        let mv = if board.turn_sign() > 0 {
            positive.decide_move(&board)?
        } else {
            negative.decide_move(&board)?
        };

        episode.record(&board, mv);
        let outcome = board.apply(mv);
        captures += outcome.captured as u32;
        promotions += outcome.promoted as u32;
        moves.push(mv);
    }

    let result = board.game_state();
    episode.outcome = Some(result);
    Ok(GameOutcome {
        result,
        moves,
        captures,
        promotions,
        episode,
    })
}
