//! Search tree nodes.
//!
//! Nodes live in the arena of a [`SearchTree`](crate::mcts::tree::SearchTree)
//! and refer to each other through [`NodeId`] indices. Values are accumulated
//! from the perspective of the side to move at the node itself, so a parent
//! reads a child's value as `1 - mean`.

use crate::game::position::{GameStatus, Position};
use shakmaty::Move;
use std::cell::OnceCell;
use std::collections::HashMap;

/// Index of a node inside its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
pub struct SearchNode {
    /// Position reached at this node
    pub position: Position,

    /// Parent node, `None` for the root
    pub parent: Option<NodeId>,

    /// Move played from the parent to reach this node
    pub incoming_move: Option<Move>,

    /// Children in legal-move generation order
    pub children: Vec<NodeId>,

    /// Child lookup by move
    pub child_index: HashMap<Move, NodeId>,

    /// Number of simulations that passed through this node
    pub visit_count: u32,

    /// Sum of backpropagated values, for the side to move at this node
    pub value_sum: f64,

    /// Prior probability of `incoming_move`, 1.0 at the root
    pub prior: f32,

    /// Termination status of `position`, filled on first use
    status: OnceCell<GameStatus>,

    /// Whether the oracle has been queried and children created
    pub expanded: bool,
}

impl SearchNode {
    pub fn new(position: Position, parent: Option<NodeId>, incoming_move: Option<Move>, prior: f32) -> Self {
        Self {
            position,
            parent,
            incoming_move,
            children: Vec::new(),
            child_index: HashMap::new(),
            visit_count: 0,
            value_sum: 0.0,
            prior,
            status: OnceCell::new(),
            expanded: false,
        }
    }

    /// Termination status of `position`.
    ///
    /// Move generation runs once, the first time a simulation reaches the
    /// node, so children that are never selected never pay for it.
    pub fn status(&self) -> GameStatus {
        *self.status.get_or_init(|| self.position.status())
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    /// Whether the status has been computed yet.
    pub fn status_known(&self) -> bool {
        self.status.get().is_some()
    }

    /// Average value for the side to move here, `None` before the first visit.
    pub fn mean_value(&self) -> Option<f64> {
        if self.visit_count == 0 {
            None
        } else {
            Some(self.value_sum / self.visit_count as f64)
        }
    }

    /// Records one simulation result seen from this node's side to move.
    pub fn record(&mut self, value: f64) {
        self.visit_count += 1;
        self.value_sum += value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node() {
        let node = SearchNode::new(Position::starting(), None, None, 1.0);
        assert_eq!(node.visit_count, 0);
        assert_eq!(node.prior, 1.0);
        assert!(!node.expanded);
        assert!(!node.is_terminal());
        assert!(node.children.is_empty());
        assert_eq!(node.mean_value(), None);
    }

    #[test]
    fn test_mean_value() {
        let mut node = SearchNode::new(Position::starting(), None, None, 1.0);
        node.record(1.0);
        node.record(0.0);
        node.record(0.5);
        assert_eq!(node.visit_count, 3);
        assert!((node.mean_value().unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_terminal_status_is_cached() {
        let stalemate = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let node = SearchNode::new(stalemate, None, None, 1.0);
        assert!(!node.status_known());
        assert!(node.is_terminal());
        assert!(node.status_known());
        assert_eq!(node.status(), GameStatus::Stalemate);
    }

    #[test]
    fn test_status_is_not_computed_on_creation() {
        let node = SearchNode::new(Position::starting(), None, None, 0.5);
        assert!(!node.status_known());
        assert_eq!(node.status(), GameStatus::Ongoing);
        assert!(node.status_known());
    }
}
