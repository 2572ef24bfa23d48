//! Selection and backpropagation for PUCT search
//!
//! Score of a child seen from its parent:
//!
//! `Q(child) + c_puct × P(child) × sqrt(N(parent)) / (1 + N(child))`
//!
//! where `Q(child) = 1 - mean(child)` because child values are stored for the
//! side to move at the child. Unvisited children use the first-play-urgency
//! value instead of a mean.

use crate::mcts::hyperparameters::MctsConfig;
use crate::mcts::node::{NodeId, SearchNode};
use crate::mcts::tree::SearchTree;

/// PUCT score of `child` for a parent with `parent_visits` visits
pub fn puct_score(child: &SearchNode, parent_visits: u32, config: &MctsConfig) -> f64 {
    let q = match child.mean_value() {
        Some(mean) => 1.0 - mean,
        None => config.fpu_value,
    };
    let exploration = config.c_puct * f64::from(child.prior) * f64::from(parent_visits).sqrt()
        / (1.0 + f64::from(child.visit_count));
    q + exploration
}

/// Selects the child with the highest PUCT score
///
/// # Returns
/// The best child, or None if the node has no children.
/// Ties go to the child generated first.
pub fn select_child(tree: &SearchTree, parent: NodeId, config: &MctsConfig) -> Option<NodeId> {
    let parent_visits = tree.node(parent).visit_count;
    let mut best: Option<(NodeId, f64)> = None;

    for &child in tree.children(parent) {
        let score = puct_score(tree.node(child), parent_visits, config);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((child, score)),
        }
    }

    best.map(|(id, _)| id)
}

/// Walks down from the root until a terminal or unexpanded node
///
/// # Returns
/// The visited path, root first, leaf last
pub fn select_leaf(tree: &SearchTree, config: &MctsConfig) -> Vec<NodeId> {
    let mut path = vec![tree.root()];
    let mut current = tree.root();

    loop {
        let node = tree.node(current);
        if node.is_terminal() || !node.expanded {
            break;
        }
        match select_child(tree, current, config) {
            Some(next) => {
                path.push(next);
                current = next;
            }
            None => break,
        }
    }

    path
}

/// Adds `leaf_value` along `path`, flipping perspective at every ply
///
/// `leaf_value` is for the side to move at the last node of `path`.
pub fn backpropagate(tree: &mut SearchTree, path: &[NodeId], leaf_value: f64) {
    let mut value = leaf_value;
    for &id in path.iter().rev() {
        tree.node_mut(id).record(value);
        value = 1.0 - value;
    }
}
