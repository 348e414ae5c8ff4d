//! Frontier of discovered but unexpanded nodes

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use checkers_core::BoardKey;

use crate::config::FrontierOrder;

#[derive(Clone, Copy, Debug)]
struct Prioritized {
    priority: f32,
    key: BoardKey,
}

impl PartialEq for Prioritized {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Prioritized {}

impl PartialOrd for Prioritized {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Prioritized {
    /// Highest priority first, then smallest key
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then_with(|| other.key.cmp(&self.key))
    }
}

#[derive(Debug)]
enum Pending {
    Lifo(Vec<BoardKey>),
    Priority(BinaryHeap<Prioritized>),
}

/// Pending nodes in expansion order
#[derive(Debug)]
pub struct Frontier {
    pending: Pending,
}

impl Frontier {
    pub fn new(order: FrontierOrder) -> Self {
        let pending = match order {
            FrontierOrder::Lifo => Pending::Lifo(Vec::new()),
            FrontierOrder::Priority => Pending::Priority(BinaryHeap::new()),
        };
        Self { pending }
    }

    pub fn push(&mut self, key: BoardKey, priority: f32) {
        match &mut self.pending {
            Pending::Lifo(stack) => stack.push(key),
            Pending::Priority(heap) => heap.push(Prioritized { priority, key }),
        }
    }

    pub fn pop(&mut self) -> Option<BoardKey> {
        match &mut self.pending {
            Pending::Lifo(stack) => stack.pop(),
            Pending::Priority(heap) => heap.pop().map(|p| p.key),
        }
    }

    pub fn len(&self) -> usize {
        match &self.pending {
            Pending::Lifo(stack) => stack.len(),
            Pending::Priority(heap) => heap.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifo_order() {
        let mut frontier = Frontier::new(FrontierOrder::Lifo);
        for k in [3, 1, 2] {
            frontier.push(BoardKey(k), 0.0);
        }
        assert_eq!(frontier.len(), 3);
        assert_eq!(frontier.pop(), Some(BoardKey(2)));
        assert_eq!(frontier.pop(), Some(BoardKey(1)));
        assert_eq!(frontier.pop(), Some(BoardKey(3)));
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_priority_order_with_key_tie_break() {
        let mut frontier = Frontier::new(FrontierOrder::Priority);
        frontier.push(BoardKey(7), 1.0);
        frontier.push(BoardKey(4), 2.5);
        frontier.push(BoardKey(9), 1.0);
        frontier.push(BoardKey(2), 1.0);

        let order: Vec<_> = std::iter::from_fn(|| frontier.pop()).collect();
        assert_eq!(order, vec![BoardKey(4), BoardKey(2), BoardKey(7), BoardKey(9)]);
    }
}
