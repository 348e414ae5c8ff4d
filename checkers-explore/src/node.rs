//! Search nodes of the state graph

use checkers_core::{BoardKey, GameState};
use serde::{Deserialize, Serialize};

/// Decided-children tally of a node
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeStats {
    pub positive_wins: u32,
    pub negative_wins: u32,
    pub draws: u32,
}

impl OutcomeStats {
    pub fn record(&mut self, outcome: GameState) {
        match outcome {
            GameState::PositiveWins => self.positive_wins += 1,
            GameState::NegativeWins => self.negative_wins += 1,
            GameState::Draw => self.draws += 1,
            GameState::NotOver => {}
        }
    }

    pub fn decided(&self) -> u32 {
        self.positive_wins + self.negative_wins + self.draws
    }
}

/// A reachable board in the explored graph
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchNode {
    /// Shallowest depth at which the board was discovered
    pub depth: u32,
    pub key: BoardKey,
    pub game_state: GameState,
    /// Side to move on this board
    pub turn_sign: i8,
    /// Frontier priority, computed by the worker that discovered the node
    pub priority: f32,
    /// Every distinct parent edge seen so far
    pub parents: Vec<BoardKey>,
    /// `None` until the node has been expanded
    pub children: Option<Vec<BoardKey>>,
    /// Backward-induction value once decided; never changes afterwards
    pub outcome: Option<GameState>,
    pub stats: OutcomeStats,
}

impl SearchNode {
    pub fn new(key: BoardKey, depth: u32, game_state: GameState, turn_sign: i8) -> Self {
        Self {
            depth,
            key,
            game_state,
            turn_sign,
            priority: 0.0,
            parents: Vec::new(),
            children: None,
            // Terminal boards are decided on discovery
            outcome: game_state.is_over().then_some(game_state),
            stats: OutcomeStats::default(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.game_state.is_over()
    }

    pub fn is_expanded(&self) -> bool {
        self.children.is_some()
    }

    pub fn is_decided(&self) -> bool {
        self.outcome.is_some()
    }

    /// Whether the node still needs a worker
    pub fn needs_expansion(&self) -> bool {
        !self.is_terminal() && !self.is_expanded()
    }

    /// Record a parent edge; returns false if it was already known
    pub fn add_parent(&mut self, parent: BoardKey) -> bool {
        if self.parents.contains(&parent) {
            return false;
        }
        self.parents.push(parent);
        true
    }
}
