//! Match play - multiple games between two policies
//!
//! Level 2 - Phase-level implementation

use checkers_core::{Board, Policy, PolicyError};
use rayon::prelude::*;
use tracing::debug;

use crate::config::MatchConfig;
use crate::game_runner::{play_game, GameOutcome};

/// Result of a match (multiple games)
#[derive(Clone, Debug, Default)]
pub struct MatchResult {
    /// Wins for the first policy
    pub a_wins: u32,
    /// Wins for the second policy
    pub b_wins: u32,
    /// Draws, including games stopped at the move cap
    pub draws: u32,
    /// Games stopped at the move cap
    pub unfinished: u32,
    /// Average game length in moves
    pub avg_moves: f32,
    pub total_captures: u32,
    /// Total games played
    pub games_played: u32,
    /// Individual game outcomes
    pub game_outcomes: Vec<GameOutcome>,
}

impl MatchResult {
    /// Create empty result
    pub fn empty() -> Self {
        Self::default()
    }

    /// Win rate of the first policy
    pub fn a_win_rate(&self) -> f32 {
        self.rate(self.a_wins)
    }

    /// Win rate of the second policy
    pub fn b_win_rate(&self) -> f32 {
        self.rate(self.b_wins)
    }

    pub fn draw_rate(&self) -> f32 {
        self.rate(self.draws)
    }

    /// Score of the first policy: wins 1, draws 0.5
    pub fn score_for_a(&self) -> f32 {
        self.a_wins as f32 + 0.5 * self.draws as f32
    }

    fn rate(&self, count: u32) -> f32 {
        if self.games_played == 0 {
            0.0
        } else {
            count as f32 / self.games_played as f32
        }
    }
}

/// Play a match between two policies (Level 2 phase)
///
/// Colours alternate: the first policy plays positive in even games. Each
/// game gets fresh copies of both policies, reseeded from the match seed,
/// so sequential and parallel runs give identical results.
pub fn play_match(a: &Policy, b: &Policy, config: &MatchConfig) -> Result<MatchResult, PolicyError> {
    if config.games == 0 {
        return Ok(MatchResult::empty());
    }

    let game_configs = prepare_game_configs(config.games);
    let results = if config.parallel {
        game_configs
            .par_iter()
            .map(|gc| play_single_game(a, b, gc, config))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        game_configs
            .iter()
            .map(|gc| play_single_game(a, b, gc, config))
            .collect::<Result<Vec<_>, _>>()?
    };
    Ok(aggregate_results(results))
}

// ============================================================================
// Level 3 - Steps
// ============================================================================

/// Configuration for a single game in a match
#[derive(Clone, Copy)]
struct GameConfig {
    /// Whether the first policy plays positive this game
    a_is_positive: bool,
    /// Game index (for seeding)
    game_index: usize,
}

/// Outcome of a game plus which side each policy took
struct GameOutcomeWithContext {
    outcome: GameOutcome,
    a_is_positive: bool,
}

/// Prepare game configurations for a match
fn prepare_game_configs(games: usize) -> Vec<GameConfig> {
    (0..games)
        .map(|i| GameConfig {
            a_is_positive: i % 2 == 0, // Alternate colours
            game_index: i,
        })
        .collect()
}

fn play_single_game(
    a: &Policy,
    b: &Policy,
    gc: &GameConfig,
    config: &MatchConfig,
) -> Result<GameOutcomeWithContext, PolicyError> {
    let seed = config.seed.wrapping_add(2 * gc.game_index as u64);
    let mut a = a.clone();
    let mut b = b.clone();
    a.reseed(seed);
    b.reseed(seed.wrapping_add(1));

    let mut board = Board::new();
    board.set_enable_should_capture_rule(config.enable_should_capture_rule);

    let outcome = if gc.a_is_positive {
        play_game(&mut a, &mut b, board, config.max_moves)?
    } else {
        play_game(&mut b, &mut a, board, config.max_moves)?
    };
    debug!(
        game = gc.game_index,
        result = ?outcome.result,
        moves = outcome.length(),
        "game finished"
    );

    Ok(GameOutcomeWithContext {
        outcome,
        a_is_positive: gc.a_is_positive,
    })
}

/// Aggregate game results into match result
fn aggregate_results(results: Vec<GameOutcomeWithContext>) -> MatchResult {
    let mut result = MatchResult::empty();
    let mut total_moves = 0usize;

    for game in results {
        let a_sign = if game.a_is_positive { 1 } else { -1 };
        match game.outcome.winner() {
            Some(winner) if winner == a_sign => result.a_wins += 1,
            Some(_) => result.b_wins += 1,
            None => result.draws += 1,
        }
        if game.outcome.is_unfinished() {
            result.unfinished += 1;
        }
        total_moves += game.outcome.length();
        result.total_captures += game.outcome.captures;
        result.games_played += 1;
        result.game_outcomes.push(game.outcome);
    }

    if result.games_played > 0 {
        result.avg_moves = total_moves as f32 / result.games_played as f32;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkers_core::{GreedyValuePolicy, RandomPolicy};

    #[test]
    fn test_empty_match() {
        let p = Policy::Random(RandomPolicy::new(0));
        let result = play_match(&p, &p, &MatchConfig::new(0)).unwrap();
        assert_eq!(result.games_played, 0);
        assert_eq!(result.a_win_rate(), 0.0);
    }

    #[test]
    fn test_match_totals() {
        let a = Policy::Greedy(GreedyValuePolicy::default());
        let b = Policy::Random(RandomPolicy::new(0));
        let result = play_match(&a, &b, &MatchConfig::new(6).sequential()).unwrap();

        assert_eq!(result.games_played, 6);
        assert_eq!(result.a_wins + result.b_wins + result.draws, 6);
        assert!(result.unfinished <= result.draws);
        assert!(result.avg_moves > 0.0);
        assert_eq!(result.game_outcomes.len(), 6);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let a = Policy::Random(RandomPolicy::new(0));
        let b = Policy::Random(RandomPolicy::new(0));
        let config = MatchConfig::new(8).with_seed(11);

        let parallel = play_match(&a, &b, &config).unwrap();
        let sequential = play_match(&a, &b, &config.clone().sequential()).unwrap();

        assert_eq!(parallel.a_wins, sequential.a_wins);
        assert_eq!(parallel.b_wins, sequential.b_wins);
        assert_eq!(parallel.draws, sequential.draws);
        for (p, s) in parallel.game_outcomes.iter().zip(&sequential.game_outcomes) {
            assert_eq!(p.moves, s.moves);
        }
    }

    #[test]
    fn test_user_input_fails_match() {
        let a = Policy::UserInput;
        let b = Policy::Random(RandomPolicy::new(0));
        assert_eq!(
            play_match(&a, &b, &MatchConfig::new(2)).unwrap_err(),
            PolicyError::RequiresUserInput
        );
    }
}
