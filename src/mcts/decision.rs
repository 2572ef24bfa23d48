//! Final move decision from the root statistics.

use crate::mcts::algorithm::SearchError;
use crate::mcts::node::NodeId;
use crate::mcts::tree::SearchTree;
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;
use shakmaty::Move;

/// Visit counts of the root's children, in generation order.
pub fn visit_distribution(tree: &SearchTree) -> Vec<(Move, u32)> {
    tree.children(tree.root())
        .iter()
        .filter_map(|&id| {
            let node = tree.node(id);
            node.incoming_move.clone().map(|mv| (mv, node.visit_count))
        })
        .collect()
}

pub fn validate_temperature(temperature: f64) -> Result<(), SearchError> {
    if temperature.is_finite() && temperature >= 0.0 {
        Ok(())
    } else {
        Err(SearchError::InvalidTemperature(temperature))
    }
}

/// Picks the root child to play.
///
/// - no visited child: highest prior, first on ties
/// - `temperature == 0`: most visited, first on ties
/// - otherwise: sampled with weight `visits^(1 / temperature)` among visited children
pub fn choose_child<R: Rng + ?Sized>(
    tree: &SearchTree,
    temperature: f64,
    rng: &mut R,
) -> Result<Option<NodeId>, SearchError> {
    validate_temperature(temperature)?;

    let children = tree.children(tree.root());
    let visited: Vec<NodeId> = children
        .iter()
        .copied()
        .filter(|&id| tree.node(id).visit_count > 0)
        .collect();

    if visited.is_empty() {
        let mut best: Option<(NodeId, f32)> = None;
        for &id in children {
            let prior = tree.node(id).prior;
            match best {
                Some((_, p)) if prior <= p => {}
                _ => best = Some((id, prior)),
            }
        }
        return Ok(best.map(|(id, _)| id));
    }

    if temperature == 0.0 {
        let mut best = visited[0];
        for &id in &visited[1..] {
            if tree.node(id).visit_count > tree.node(best).visit_count {
                best = id;
            }
        }
        return Ok(Some(best));
    }

    // Normalize in log space so visits^(1/T) cannot overflow for small T.
    let logs: Vec<f64> = visited
        .iter()
        .map(|&id| f64::from(tree.node(id).visit_count).ln() / temperature)
        .collect();
    let max_log = logs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let weights: Vec<f64> = logs.iter().map(|l| (l - max_log).exp()).collect();

    match WeightedIndex::new(&weights) {
        Ok(dist) => Ok(Some(visited[dist.sample(rng)])),
        Err(e) => {
            log::warn!("Cannot sample from visit counts ({}), playing the most visited move", e);
            choose_child(tree, 0.0, rng)
        }
    }
}
