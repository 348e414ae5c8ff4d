//! Integration tests for the checkers workspace
//!
//! Tests the full stack: board engine, codec, explorer, snapshots,
//! matches and memory training

use std::path::PathBuf;

use checkers_core::{
    from_key, to_key, Board, BoardKey, Coord, GameState, KeyFormat, MemoryPolicy,
    Policy, RandomPolicy,
};
use checkers_explore::{load_graph, Explorer, ExplorerConfig, FrontierOrder, StopReason};
use checkers_tournament::{play_game, play_match, train, MatchConfig, PolicyConfig, TrainConfig};

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("checkers_it_{}_{}.json", name, std::process::id()))
}

fn sorted_keys(explorer: &Explorer) -> Vec<BoardKey> {
    let mut keys: Vec<BoardKey> = explorer.graph().nodes().map(|n| n.key).collect();
    keys.sort();
    keys
}

// ============================================================================
// ENGINE + CODEC
// ============================================================================

#[test]
fn test_random_games_survive_codec() {
    for seed in 0..5 {
        let mut positive = RandomPolicy::new(seed);
        let mut negative = RandomPolicy::new(seed + 100);
        let mut board = Board::new();
        let mut plies = 0;

        while !board.game_state().is_over() && plies < 300 {
            let full = to_key(&board, KeyFormat::Full);
            assert_eq!(from_key(&full).unwrap(), board);

            let packed = BoardKey::from_board(&board);
            let restored = packed.to_board().unwrap();
            assert_eq!(restored, board);
            assert_eq!(restored.legal_moves(), board.legal_moves());

            let mv = if board.turn_sign() > 0 {
                positive.decide_move(&board).unwrap()
            } else {
                negative.decide_move(&board).unwrap()
            };
            board.apply(mv);
            plies += 1;
        }
    }
}

#[test]
fn test_game_without_capture_rule() {
    let mut board = Board::new();
    board.set_enable_should_capture_rule(false);

    let mut a = RandomPolicy::new(1);
    let mut b = RandomPolicy::new(2);
    let outcome = play_game(&mut a, &mut b, board, 300).unwrap();

    assert_eq!(outcome.length(), outcome.moves.len());
    assert!(outcome.result.is_over() || outcome.length() == 300);
}

// ============================================================================
// EXPLORER
// ============================================================================

#[test]
fn test_interrupted_exploration_resumes_to_same_graph() {
    let path = temp_path("resume");
    let base = ExplorerConfig::default().with_workers(3).with_max_depth(2);

    let mut reference = Explorer::new(&Board::new(), base.clone());
    let reference_summary = reference.run().unwrap();
    assert_eq!(reference_summary.stop_reason, StopReason::Complete);

    let mut partial = Explorer::new(
        &Board::new(),
        base.clone().with_max_nodes(20).with_snapshot(&path, 3600),
    );
    let partial_summary = partial.run().unwrap();
    assert_eq!(partial_summary.stop_reason, StopReason::NodeLimit);
    assert!(partial_summary.nodes < reference_summary.nodes);

    let mut resumed = Explorer::resume(&path, base.with_order(FrontierOrder::Priority)).unwrap();
    let resumed_summary = resumed.run().unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(resumed_summary.stop_reason, StopReason::Complete);
    assert_eq!(resumed_summary.nodes, reference_summary.nodes);
    assert_eq!(sorted_keys(&resumed), sorted_keys(&reference));
}

#[test]
fn test_solved_endgame_snapshot() {
    // Positive captures into the last row; negative has nothing left
    let board = Board::with_pieces(&[(Coord::new(2, 2), 1), (Coord::new(3, 1), -1)], 1);
    let path = temp_path("endgame");

    let config = ExplorerConfig::default().with_workers(2).with_snapshot(&path, 3600);
    let mut explorer = Explorer::new(&board, config);
    let summary = explorer.run().unwrap();
    assert_eq!(summary.root_outcome, Some(GameState::PositiveWins));

    let graph = load_graph(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    let root = graph.get(graph.root()).unwrap();
    assert_eq!(root.outcome, Some(GameState::PositiveWins));
    assert_eq!(root.key.to_board().unwrap(), board);
    for child in graph.children(graph.root()).unwrap() {
        assert_eq!(graph.parents(*child), &[graph.root()]);
    }
}

// ============================================================================
// MATCHES + TRAINING
// ============================================================================

#[test]
fn test_match_between_configured_policies() {
    let a = PolicyConfig::greedy().build(0).unwrap();
    let b = PolicyConfig::random().with_seed(9).build(0).unwrap();
    let config = MatchConfig::new(8).with_seed(3);

    let result = play_match(&a, &b, &config).unwrap();
    assert_eq!(result.games_played, 8);
    assert_eq!(result.a_wins + result.b_wins + result.draws, 8);
    assert!((result.score_for_a() - (result.a_wins as f32 + 0.5 * result.draws as f32)).abs() < 1e-6);
}

#[test]
fn test_train_save_and_replay() {
    let path = temp_path("memory");

    let mut learner = MemoryPolicy::new(0);
    let mut opponent = Policy::Random(RandomPolicy::new(0));
    let config = TrainConfig {
        episodes: 30,
        max_moves: 150,
        seed: 7,
        log_interval: 0,
    };
    let report = train(&mut learner, &mut opponent, &config).unwrap();
    assert_eq!(report.episodes, 30);
    learner.save(&path).unwrap();

    let loaded = MemoryPolicy::load(&path, 0).unwrap();
    assert_eq!(loaded.len(), learner.len());

    let combined = MemoryPolicy::combine([&learner, &loaded], 0);
    assert_eq!(combined.len(), learner.len());

    // A trained table plays through the policy config like any other player
    let memory = PolicyConfig::memory(Some(path.clone())).build(1).unwrap();
    assert_eq!(memory.name(), "memory");
    let random = PolicyConfig::random().build(2).unwrap();
    let result = play_match(&memory, &random, &MatchConfig::new(4).sequential()).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(result.games_played, 4);
}
