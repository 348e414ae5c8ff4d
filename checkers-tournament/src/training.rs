//! Training loop for the memory policy
//!
//! Level 1 - Orchestration

use checkers_core::{Board, MemoryPolicy, Policy, PolicyError};
use tracing::info;

use crate::config::TrainConfig;
use crate::game_runner::play_game;

/// Summary of a training run
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrainingReport {
    pub episodes: usize,
    pub learner_wins: u32,
    pub opponent_wins: u32,
    pub draws: u32,
    /// Memory entries after training
    pub table_size: usize,
}

impl TrainingReport {
    pub fn learner_win_rate(&self) -> f32 {
        if self.episodes == 0 {
            0.0
        } else {
            self.learner_wins as f32 / self.episodes as f32
        }
    }
}

/// Play `config.episodes` games between `learner` and `opponent`,
/// updating the learner's memory after each one. The learner alternates
/// colours, starting as the positive player.
pub fn train(
    learner: &mut MemoryPolicy,
    opponent: &mut Policy,
    config: &TrainConfig,
) -> Result<TrainingReport, PolicyError> {
    let mut report = TrainingReport::default();
    learner.reseed(config.seed);
    opponent.reseed(config.seed.wrapping_add(1));

    for episode in 0..config.episodes {
        let bot_sign: i8 = if episode % 2 == 0 { 1 } else { -1 };
        let outcome = if bot_sign > 0 {
            play_game(learner, opponent, Board::new(), config.max_moves)?
        } else {
            play_game(opponent, learner, Board::new(), config.max_moves)?
        };

        learner.record_episode(&outcome.episode, bot_sign);
        match outcome.winner() {
            Some(winner) if winner == bot_sign => report.learner_wins += 1,
            Some(_) => report.opponent_wins += 1,
            None => report.draws += 1,
        }
        report.episodes += 1;

        if config.log_interval > 0 && report.episodes % config.log_interval == 0 {
            info!(
                episodes = report.episodes,
                wins = report.learner_wins,
                losses = report.opponent_wins,
                draws = report.draws,
                table = learner.len(),
                "training progress"
            );
        }
    }

    report.table_size = learner.len();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkers_core::RandomPolicy;

    fn config(episodes: usize) -> TrainConfig {
        TrainConfig {
            episodes,
            max_moves: 150,
            seed: 5,
            log_interval: 0,
        }
    }

    #[test]
    fn test_training_fills_memory() {
        let mut learner = MemoryPolicy::new(0);
        let mut opponent = Policy::Random(RandomPolicy::new(0));
        let report = train(&mut learner, &mut opponent, &config(20)).unwrap();

        assert_eq!(report.episodes, 20);
        assert_eq!(report.learner_wins + report.opponent_wins + report.draws, 20);
        assert_eq!(report.table_size, learner.len());
        assert!(!learner.is_empty());
    }

    #[test]
    fn test_training_is_reproducible() {
        let run = || {
            let mut learner = MemoryPolicy::new(0);
            let mut opponent = Policy::Random(RandomPolicy::new(0));
            train(&mut learner, &mut opponent, &config(10)).unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_zero_episodes() {
        let mut learner = MemoryPolicy::new(0);
        let mut opponent = Policy::Random(RandomPolicy::new(0));
        let report = train(&mut learner, &mut opponent, &config(0)).unwrap();
        assert_eq!(report.episodes, 0);
        assert_eq!(report.learner_win_rate(), 0.0);
    }
}
