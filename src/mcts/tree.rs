//! Arena-backed search tree.
//!
//! The tree owns every node in a flat `Vec`; parent and child links are
//! [`NodeId`] indices into it. Re-rooting copies the surviving subtree into a
//! fresh arena, so siblings of the played move are dropped with the old tree.

use crate::game::position::Position;
use crate::mcts::node::{NodeId, SearchNode};
use shakmaty::Move;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct SearchTree {
    nodes: Vec<SearchNode>,
    /// Whether exploration noise is already mixed into the root's child priors
    root_noised: bool,
}

impl SearchTree {
    pub fn new(position: Position) -> Self {
        Self {
            nodes: vec![SearchNode::new(position, None, None, 1.0)],
            root_noised: false,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root_node(&self) -> &SearchNode {
        &self.nodes[0]
    }

    pub fn node(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut SearchNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root_noised(&self) -> bool {
        self.root_noised
    }

    pub fn mark_root_noised(&mut self) {
        self.root_noised = true;
    }

    /// Appends a child of `parent` reached by `mv`.
    ///
    /// If `parent` already has a child for `mv`, that child is returned and
    /// nothing is added.
    pub fn add_child(&mut self, parent: NodeId, mv: Move, position: Position, prior: f32) -> NodeId {
        if let Some(&existing) = self.nodes[parent.0].child_index.get(&mv) {
            return existing;
        }

        let id = NodeId(self.nodes.len());
        self.nodes
            .push(SearchNode::new(position, Some(parent), Some(mv.clone()), prior));
        let parent_node = &mut self.nodes[parent.0];
        parent_node.children.push(id);
        parent_node.child_index.insert(mv, id);
        id
    }

    pub fn child(&self, parent: NodeId, mv: &Move) -> Option<NodeId> {
        self.nodes[parent.0].child_index.get(mv).copied()
    }

    pub fn children(&self, parent: NodeId) -> &[NodeId] {
        &self.nodes[parent.0].children
    }

    /// Node ids from the root down to `id`, both included.
    pub fn path_from_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Re-roots the tree at the child reached by `mv`.
    ///
    /// Returns `None` when the root has no such child. Statistics of the kept
    /// subtree are preserved. The new root's priors have never been noised.
    pub fn into_subtree(self, mv: &Move) -> Option<SearchTree> {
        let new_root = self.child(self.root(), mv)?;

        let mut nodes: Vec<SearchNode> = Vec::new();
        let mut remap: HashMap<NodeId, NodeId> = HashMap::new();
        let mut stack = vec![new_root];
        let mut old: Vec<Option<SearchNode>> = self.nodes.into_iter().map(Some).collect();

        // Depth-first copy; parents are always copied before their children.
        while let Some(old_id) = stack.pop() {
            let Some(mut node) = old[old_id.0].take() else {
                continue;
            };
            let new_id = NodeId(nodes.len());
            remap.insert(old_id, new_id);

            node.parent = match node.parent {
                Some(p) if old_id != new_root => remap.get(&p).copied(),
                _ => None,
            };
            if old_id == new_root {
                node.incoming_move = None;
                node.prior = 1.0;
            }
            for &child in node.children.iter().rev() {
                stack.push(child);
            }
            nodes.push(node);
        }

        // Children were pushed with their old ids, translate them.
        for node in &mut nodes {
            node.children = node
                .children
                .iter()
                .filter_map(|c| remap.get(c).copied())
                .collect();
            for id in node.child_index.values_mut() {
                if let Some(&mapped) = remap.get(id) {
                    *id = mapped;
                }
            }
        }

        Some(SearchTree {
            nodes,
            root_noised: false,
        })
    }

    /// Panics if any structural invariant of the tree is broken.
    ///
    /// Checks parent/child links, one child per move, visit-count sums and
    /// value ranges. Meant for tests and debug assertions.
    pub fn assert_invariants(&self) {
        assert!(self.nodes[0].parent.is_none(), "root has a parent");

        for (index, node) in self.nodes.iter().enumerate() {
            let id = NodeId(index);
            if index != 0 {
                let (Some(parent), Some(mv)) = (node.parent, node.incoming_move.as_ref()) else {
                    panic!("non-root node {index} without parent link");
                };
                assert_eq!(self.child(parent, mv), Some(id), "parent does not index child {index}");
            }

            assert_eq!(node.children.len(), node.child_index.len(), "duplicate child moves at {index}");
            let legal = node.position.legal_moves();
            let mut child_visits = 0u64;
            for &child in &node.children {
                let child_node = self.node(child);
                assert_eq!(child_node.parent, Some(id));
                let Some(mv) = child_node.incoming_move.as_ref() else {
                    panic!("child of {index} without move");
                };
                assert!(legal.contains(mv), "illegal child move at {index}");
                child_visits += u64::from(child_node.visit_count);
            }
            assert!(
                u64::from(node.visit_count) >= child_visits,
                "node {index} has {} visits but children have {child_visits}",
                node.visit_count
            );

            if let Some(mean) = node.mean_value() {
                assert!((0.0..=1.0).contains(&mean), "mean value {mean} out of range at {index}");
            }
            assert!(!node.value_sum.is_nan());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_all(tree: &mut SearchTree, id: NodeId) {
        let position = tree.node(id).position.clone();
        for mv in position.legal_moves() {
            let next = position.play(&mv).unwrap();
            tree.add_child(id, mv, next, 0.1);
        }
        tree.node_mut(id).expanded = true;
    }

    #[test]
    fn test_add_and_lookup_children() {
        let mut tree = SearchTree::new(Position::starting());
        let root = tree.root();
        expand_all(&mut tree, root);

        assert_eq!(tree.len(), 21);
        assert_eq!(tree.children(tree.root()).len(), 20);

        let e4 = Position::starting().parse_uci("e2e4").unwrap();
        let child = tree.child(tree.root(), &e4).unwrap();
        assert_eq!(tree.node(child).incoming_move.as_ref(), Some(&e4));
        assert_eq!(tree.path_from_root(child), vec![tree.root(), child]);
        tree.assert_invariants();
    }

    #[test]
    fn test_add_child_is_idempotent() {
        let mut tree = SearchTree::new(Position::starting());
        let position = Position::starting();
        let mv = position.parse_uci("g1f3").unwrap();
        let next = position.play(&mv).unwrap();

        let first = tree.add_child(tree.root(), mv.clone(), next.clone(), 0.5);
        let second = tree.add_child(tree.root(), mv, next, 0.5);
        assert_eq!(first, second);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_into_subtree_keeps_only_reachable_nodes() {
        let mut tree = SearchTree::new(Position::starting());
        let root = tree.root();
        expand_all(&mut tree, root);

        let e4 = Position::starting().parse_uci("e2e4").unwrap();
        let child = tree.child(root, &e4).unwrap();
        expand_all(&mut tree, child);
        tree.node_mut(child).record(0.25);
        assert_eq!(tree.len(), 41);

        tree.mark_root_noised();
        let subtree = tree.into_subtree(&e4).unwrap();
        assert_eq!(subtree.len(), 21);
        assert!(!subtree.root_noised());
        let new_root = subtree.root_node();
        assert!(new_root.parent.is_none());
        assert!(new_root.incoming_move.is_none());
        assert_eq!(new_root.visit_count, 1);
        assert_eq!(new_root.children.len(), 20);
        subtree.assert_invariants();
    }

    #[test]
    fn test_into_subtree_unknown_move() {
        let tree = SearchTree::new(Position::starting());
        let e4 = Position::starting().parse_uci("e2e4").unwrap();
        assert!(tree.into_subtree(&e4).is_none());
    }

    #[test]
    #[should_panic]
    fn test_invariants_catch_bad_visit_counts() {
        let mut tree = SearchTree::new(Position::starting());
        let root = tree.root();
        expand_all(&mut tree, root);
        let first = tree.children(root)[0];
        tree.node_mut(first).record(1.0);
        tree.assert_invariants();
    }
}
