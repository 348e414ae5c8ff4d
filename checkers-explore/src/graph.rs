//! Deduplicated state graph with backward induction
//!
//! Nodes are keyed by [`BoardKey`]; transpositions merge into one node with
//! several parents, so the structure is a DAG. Keys carry the move counter,
//! which rules out cycles: every move either captures (fewer pieces) or
//! bumps the counter, and the counter is capped by the draw rule.
//!
//! Backward induction rule: a node is decided as soon as one child is
//! decided as a win for the node's mover, or once every child is decided,
//! taking the best outcome for the mover (win > draw > loss). Decided nodes
//! are never reopened.
//!
//! ## Architecture
//! - Level 2: `merge_expansion` (one worker result)
//! - Level 3: `propagate` (worklist over ancestors)
//! - Level 4: queries

use std::collections::VecDeque;

use checkers_core::{Board, BoardKey, GameState};
use rustc_hash::FxHashMap;

use crate::node::{OutcomeStats, SearchNode};
use crate::worker::Expansion;

/// Effect of merging one expansion
#[derive(Debug, Default, PartialEq)]
pub struct MergeOutcome {
    /// Newly discovered nodes that still need expansion, with priorities
    pub discovered: Vec<(BoardKey, f32)>,
    /// Edges to nodes that were already known
    pub transpositions: usize,
    /// Newly discovered terminal nodes
    pub terminals: usize,
    /// Nodes that became decided during propagation
    pub decided: usize,
    /// Known unexpanded nodes whose depth dropped through a shorter path
    pub shallower: Vec<(BoardKey, f32)>,
}

/// The explored state graph. Owned by the coordinator only.
#[derive(Debug)]
pub struct StateGraph {
    root: BoardKey,
    nodes: FxHashMap<BoardKey, SearchNode>,
}

impl StateGraph {
    pub fn new(root: &Board) -> Self {
        let key = BoardKey::from_board(root);
        Self::with_root(SearchNode::new(key, 0, root.game_state(), root.turn_sign()))
    }

    pub fn with_root(root: SearchNode) -> Self {
        let key = root.key;
        let mut nodes = FxHashMap::default();
        nodes.insert(key, root);
        Self { root: key, nodes }
    }

    /// Rebuild from stored nodes; the root must be among them
    pub fn from_nodes(root: BoardKey, nodes: impl IntoIterator<Item = SearchNode>) -> Option<Self> {
        let nodes: FxHashMap<BoardKey, SearchNode> =
            nodes.into_iter().map(|node| (node.key, node)).collect();
        nodes.contains_key(&root).then_some(Self { root, nodes })
    }

    // ========================================================================
    // MERGE (Level 2)
    // ========================================================================

    /// Merge a worker result into the graph.
    ///
    /// Idempotent: merging the same expansion twice adds no nodes and no
    /// edges. A node expanded twice keeps the union of both child lists.
    pub fn merge_expansion(&mut self, expansion: &Expansion) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        let parent_key = expansion.key;
        let depth = match self.nodes.get(&parent_key) {
            Some(parent) => parent.depth + 1,
            None => return outcome,
        };

        let mut decided_children = false;
        let mut lowered = Vec::new();
        for child in &expansion.children {
            match self.nodes.get_mut(&child.key) {
                Some(existing) => {
                    if existing.add_parent(parent_key) {
                        outcome.transpositions += 1;
                    }
                    if depth < existing.depth {
                        lowered.push(child.key);
                    }
                    decided_children |= existing.is_decided();
                }
                None => {
                    let mut node = SearchNode::new(child.key, depth, child.game_state, child.turn_sign);
                    node.priority = child.priority;
                    node.add_parent(parent_key);
                    if node.is_terminal() {
                        outcome.terminals += 1;
                        decided_children = true;
                    } else {
                        outcome.discovered.push((child.key, child.priority));
                    }
                    self.nodes.insert(child.key, node);
                }
            }
        }

        if let Some(parent) = self.nodes.get_mut(&parent_key) {
            let children = parent.children.get_or_insert_with(Vec::new);
            for child in &expansion.children {
                if !children.contains(&child.key) {
                    children.push(child.key);
                }
            }
        }

        for key in lowered {
            self.lower_depth(key, depth, &mut outcome.shallower);
        }

        // An expanded node with no decided children cannot be decided yet,
        // but an empty child list only happens for terminal boards
        if decided_children || expansion.children.is_empty() {
            outcome.decided = self.propagate(parent_key);
        }
        outcome
    }

    /// Lower `start` to `depth` and carry the change down through expanded
    /// descendants. Unexpanded nodes that moved up are collected in
    /// `shallower` so a depth-limited search can schedule them.
    fn lower_depth(&mut self, start: BoardKey, depth: u32, shallower: &mut Vec<(BoardKey, f32)>) {
        let mut queue = VecDeque::from([(start, depth)]);
        while let Some((key, depth)) = queue.pop_front() {
            let Some(node) = self.nodes.get_mut(&key) else {
                continue;
            };
            if depth >= node.depth {
                continue;
            }
            node.depth = depth;
            match &node.children {
                Some(children) => queue.extend(children.iter().map(|&c| (c, depth + 1))),
                None if node.needs_expansion() => shallower.push((key, node.priority)),
                None => {}
            }
        }
    }

    // ========================================================================
    // BACKWARD INDUCTION (Level 3)
    // ========================================================================

    /// Re-evaluate `start` and every ancestor whose value may have changed.
    /// Returns the number of nodes that became decided.
    fn propagate(&mut self, start: BoardKey) -> usize {
        let mut decided = 0;
        let mut worklist = VecDeque::from([start]);

        while let Some(key) = worklist.pop_front() {
            let Some(outcome) = self.evaluate(key) else {
                continue;
            };
            let Some(node) = self.nodes.get_mut(&key) else {
                continue;
            };
            node.outcome = Some(outcome);
            decided += 1;
            worklist.extend(node.parents.iter().copied());
        }
        decided
    }

    /// Value of an undecided, expanded node from its full current child set.
    /// Refreshes the node's child tally as a side effect.
    fn evaluate(&mut self, key: BoardKey) -> Option<GameState> {
        let node = self.nodes.get(&key)?;
        if node.is_decided() {
            return None;
        }
        let children = node.children.as_ref()?;
        let mover = node.turn_sign;
        let win = GameState::win_for(mover);

        let mut stats = OutcomeStats::default();
        let mut all_decided = true;
        for child in children {
            match self.nodes.get(child).and_then(|c| c.outcome) {
                Some(outcome) => stats.record(outcome),
                None => all_decided = false,
            }
        }

        let has_win = match win {
            GameState::PositiveWins => stats.positive_wins > 0,
            _ => stats.negative_wins > 0,
        };
        let result = if has_win {
            Some(win)
        } else if all_decided && !children.is_empty() {
            Some(if stats.draws > 0 {
                GameState::Draw
            } else {
                GameState::win_for(-mover)
            })
        } else {
            None
        };

        if let Some(node) = self.nodes.get_mut(&key) {
            node.stats = stats;
        }
        result
    }

    // ========================================================================
    // QUERIES (Level 4)
    // ========================================================================

    pub fn root(&self) -> BoardKey {
        self.root
    }

    pub fn root_outcome(&self) -> Option<GameState> {
        self.nodes.get(&self.root).and_then(|n| n.outcome)
    }

    pub fn get(&self, key: BoardKey) -> Option<&SearchNode> {
        self.nodes.get(&key)
    }

    pub fn contains(&self, key: BoardKey) -> bool {
        self.nodes.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn parents(&self, key: BoardKey) -> &[BoardKey] {
        self.nodes.get(&key).map(|n| n.parents.as_slice()).unwrap_or(&[])
    }

    /// Children of an expanded node, `None` if unknown or unexpanded
    pub fn children(&self, key: BoardKey) -> Option<&[BoardKey]> {
        self.nodes.get(&key)?.children.as_deref()
    }

    pub fn decided_count(&self) -> usize {
        self.nodes.values().filter(|n| n.is_decided()).count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &SearchNode> {
        self.nodes.values()
    }

    /// Nodes still waiting for a worker, sorted by key
    pub fn pending(&self) -> Vec<&SearchNode> {
        let mut pending: Vec<&SearchNode> =
            self.nodes.values().filter(|n| n.needs_expansion()).collect();
        pending.sort_by_key(|n| n.key);
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::ChildInfo;

    fn child(key: u64, game_state: GameState, turn_sign: i8) -> ChildInfo {
        ChildInfo {
            key: BoardKey(key),
            game_state,
            turn_sign,
            priority: 0.0,
        }
    }

    fn expansion(key: u64, children: Vec<ChildInfo>) -> Expansion {
        Expansion {
            key: BoardKey(key),
            children,
        }
    }

    fn open_root() -> StateGraph {
        StateGraph::with_root(SearchNode::new(BoardKey(0), 0, GameState::NotOver, 1))
    }

    #[test]
    fn test_transposition_merges_into_one_node() {
        let mut graph = open_root();
        graph.merge_expansion(&expansion(
            0,
            vec![child(1, GameState::NotOver, -1), child(2, GameState::NotOver, -1)],
        ));
        graph.merge_expansion(&expansion(1, vec![child(3, GameState::NotOver, 1)]));
        let merged = graph.merge_expansion(&expansion(2, vec![child(3, GameState::NotOver, 1)]));

        assert_eq!(graph.len(), 4);
        assert_eq!(merged.transpositions, 1);
        assert!(merged.discovered.is_empty());
        assert_eq!(graph.parents(BoardKey(3)), &[BoardKey(1), BoardKey(2)]);
        assert_eq!(graph.get(BoardKey(3)).unwrap().depth, 2);
    }

    #[test]
    fn test_shorter_path_lowers_depths() {
        let mut graph = open_root();
        graph.merge_expansion(&expansion(
            0,
            vec![child(5, GameState::NotOver, -1), child(1, GameState::NotOver, -1)],
        ));
        graph.merge_expansion(&expansion(1, vec![child(2, GameState::NotOver, 1)]));
        graph.merge_expansion(&expansion(2, vec![child(3, GameState::NotOver, -1)]));
        graph.merge_expansion(&expansion(3, vec![child(4, GameState::NotOver, 1)]));
        assert_eq!(graph.get(BoardKey(4)).unwrap().depth, 4);

        // 5 sits at depth 1, so 3 moves up to 2 and its open child 4 to 3
        let merged = graph.merge_expansion(&expansion(5, vec![child(3, GameState::NotOver, -1)]));
        assert_eq!(merged.transpositions, 1);
        assert_eq!(graph.get(BoardKey(3)).unwrap().depth, 2);
        assert_eq!(graph.get(BoardKey(4)).unwrap().depth, 3);
        assert_eq!(merged.shallower, vec![(BoardKey(4), 0.0)]);

        // Same depth again changes nothing
        let again = graph.merge_expansion(&expansion(5, vec![child(3, GameState::NotOver, -1)]));
        assert!(again.shallower.is_empty());
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut graph = open_root();
        let exp = expansion(
            0,
            vec![child(1, GameState::NotOver, -1), child(2, GameState::Draw, -1)],
        );
        let first = graph.merge_expansion(&exp);
        let second = graph.merge_expansion(&exp);

        assert_eq!(first.discovered, vec![(BoardKey(1), 0.0)]);
        assert_eq!(first.terminals, 1);
        assert_eq!(second, MergeOutcome::default());
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.children(BoardKey(0)).unwrap().len(), 2);
        assert_eq!(graph.parents(BoardKey(1)), &[BoardKey(0)]);
    }

    #[test]
    fn test_duplicate_expansion_takes_union() {
        let mut graph = open_root();
        graph.merge_expansion(&expansion(0, vec![child(1, GameState::NotOver, -1)]));
        graph.merge_expansion(&expansion(0, vec![child(2, GameState::NotOver, -1)]));
        assert_eq!(
            graph.children(BoardKey(0)).unwrap(),
            &[BoardKey(1), BoardKey(2)]
        );
    }

    #[test]
    fn test_winning_child_decides_early() {
        let mut graph = open_root();
        graph.merge_expansion(&expansion(
            0,
            vec![child(1, GameState::NotOver, -1), child(2, GameState::NotOver, -1)],
        ));
        assert_eq!(graph.root_outcome(), None);

        // Node 1: negative to move, its only reply loses
        let merged = graph.merge_expansion(&expansion(1, vec![child(3, GameState::PositiveWins, 1)]));
        assert_eq!(merged.decided, 2);
        assert_eq!(graph.get(BoardKey(1)).unwrap().outcome, Some(GameState::PositiveWins));
        // Root decided although node 2 is still open
        assert_eq!(graph.root_outcome(), Some(GameState::PositiveWins));
        assert!(graph.get(BoardKey(2)).unwrap().outcome.is_none());
    }

    #[test]
    fn test_all_children_needed_without_a_win() {
        let mut graph = open_root();
        graph.merge_expansion(&expansion(
            0,
            vec![child(1, GameState::NegativeWins, 1), child(2, GameState::NotOver, -1)],
        ));
        assert_eq!(graph.root_outcome(), None);
        assert_eq!(graph.get(BoardKey(0)).unwrap().stats.negative_wins, 1);

        graph.merge_expansion(&expansion(2, vec![child(3, GameState::Draw, 1)]));
        // Draw beats loss for the root's mover
        assert_eq!(graph.get(BoardKey(2)).unwrap().outcome, Some(GameState::Draw));
        assert_eq!(graph.root_outcome(), Some(GameState::Draw));
    }

    #[test]
    fn test_forced_loss() {
        let mut graph = open_root();
        graph.merge_expansion(&expansion(
            0,
            vec![child(1, GameState::NegativeWins, -1), child(2, GameState::NegativeWins, 1)],
        ));
        assert_eq!(graph.root_outcome(), Some(GameState::NegativeWins));
        assert_eq!(graph.decided_count(), 3);
    }

    #[test]
    fn test_decided_nodes_are_not_reopened() {
        let mut graph = open_root();
        graph.merge_expansion(&expansion(0, vec![child(1, GameState::Draw, -1)]));
        assert_eq!(graph.root_outcome(), Some(GameState::Draw));

        // A late duplicate expansion reveals a win; the root stays a draw
        graph.merge_expansion(&expansion(0, vec![child(2, GameState::PositiveWins, -1)]));
        assert_eq!(graph.root_outcome(), Some(GameState::Draw));
    }

    #[test]
    fn test_transposition_to_decided_node_propagates() {
        let mut graph = open_root();
        graph.merge_expansion(&expansion(
            0,
            vec![child(1, GameState::NotOver, -1), child(2, GameState::NotOver, -1)],
        ));
        graph.merge_expansion(&expansion(1, vec![child(3, GameState::NegativeWins, 1)]));
        assert_eq!(graph.get(BoardKey(1)).unwrap().outcome, Some(GameState::NegativeWins));

        // Node 2 reaches the same decided child
        graph.merge_expansion(&expansion(2, vec![child(3, GameState::NegativeWins, 1)]));
        assert_eq!(graph.get(BoardKey(2)).unwrap().outcome, Some(GameState::NegativeWins));
        assert_eq!(graph.root_outcome(), Some(GameState::NegativeWins));
    }

    #[test]
    fn test_unknown_parent_is_ignored() {
        let mut graph = open_root();
        let merged = graph.merge_expansion(&expansion(42, vec![child(1, GameState::NotOver, 1)]));
        assert_eq!(merged, MergeOutcome::default());
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_pending_and_from_nodes() {
        let mut graph = open_root();
        graph.merge_expansion(&expansion(
            0,
            vec![child(5, GameState::NotOver, -1), child(4, GameState::Draw, -1)],
        ));
        let pending: Vec<_> = graph.pending().iter().map(|n| n.key).collect();
        assert_eq!(pending, vec![BoardKey(5)]);

        let rebuilt = StateGraph::from_nodes(graph.root(), graph.nodes().cloned()).unwrap();
        assert_eq!(rebuilt.len(), 3);
        assert!(StateGraph::from_nodes(BoardKey(99), graph.nodes().cloned()).is_none());
    }
}
