//! Monte Carlo Tree Search move selection guided by a policy/value oracle.
//!
//! Every simulation runs the four classic phases: select a leaf by PUCT,
//! expand it with one oracle call, evaluate it (oracle value, or the game
//! result for terminal nodes), and backpropagate the value towards the root,
//! flipping perspective at each ply. After the budget is spent the move is
//! picked from the root's visit counts, see [`choose_child`].
//!
//! The search is single-threaded and synchronous. All randomness (root noise,
//! temperature sampling) comes from the caller's RNG, so a seeded RNG gives a
//! reproducible search.

use crate::game::position::{uci, GameStatus, Position, PositionError};
use crate::mcts::decision::{choose_child, validate_temperature, visit_distribution};
use crate::mcts::hyperparameters::MctsConfig;
use crate::mcts::mcts_result::MctsResult;
use crate::mcts::node::NodeId;
use crate::mcts::selection::{backpropagate, select_leaf};
use crate::mcts::tree::SearchTree;
use crate::neural::oracle::{OracleError, PolicyValueOracle};
use crate::neural::policy_decode::evaluate_position;
use rand::Rng;
use rand_distr::{Distribution, Gamma};
use shakmaty::Move;
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("no move to search from a finished game ({0:?})")]
    TerminalPosition(GameStatus),

    #[error("simulation budget must be at least 1")]
    InvalidBudget,

    #[error("temperature must be finite and non-negative, got {0}")]
    InvalidTemperature(f64),

    #[error("oracle failed during search: {0}")]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Position(#[from] PositionError),
}

/// Search driver: an oracle handle plus the search options.
pub struct Mcts<'a, O: PolicyValueOracle + ?Sized> {
    oracle: &'a O,
    config: MctsConfig,
}

impl<'a, O: PolicyValueOracle + ?Sized> Mcts<'a, O> {
    pub fn new(oracle: &'a O, config: MctsConfig) -> Self {
        Self { oracle, config }
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// Runs a fresh search from `position` and returns the chosen move only.
    pub fn select_move<R: Rng + ?Sized>(
        &self,
        position: &Position,
        simulation_budget: u32,
        temperature: f64,
        rng: &mut R,
    ) -> Result<Move, SearchError> {
        self.search(position, simulation_budget, temperature, rng)
            .map(|result| result.best_move)
    }

    /// Runs a fresh search from `position`.
    pub fn search<R: Rng + ?Sized>(
        &self,
        position: &Position,
        simulation_budget: u32,
        temperature: f64,
        rng: &mut R,
    ) -> Result<MctsResult, SearchError> {
        let mut tree = SearchTree::new(position.clone());
        self.search_tree(&mut tree, simulation_budget, temperature, rng)
    }

    /// Runs `simulation_budget` more simulations on an existing tree.
    ///
    /// The tree keeps its statistics afterwards so that the caller can
    /// re-root it at the played move and search again.
    pub fn search_tree<R: Rng + ?Sized>(
        &self,
        tree: &mut SearchTree,
        simulation_budget: u32,
        temperature: f64,
        rng: &mut R,
    ) -> Result<MctsResult, SearchError> {
        let root = tree.root();
        let status = tree.node(root).status();
        if status.is_terminal() {
            return Err(SearchError::TerminalPosition(status));
        }
        if simulation_budget == 0 {
            return Err(SearchError::InvalidBudget);
        }
        validate_temperature(temperature)?;

        let legal_moves = tree.node(root).position.legal_moves();
        if legal_moves.len() == 1 && self.config.short_circuit_forced_moves {
            let forced = legal_moves[0].clone();
            log::debug!("Forced move {}, skipping search", uci(&forced));
            return Ok(MctsResult {
                visit_distribution: vec![(forced.clone(), 0)],
                best_move: forced,
                root_visits: tree.node(root).visit_count,
                root_value: tree.node(root).mean_value().unwrap_or(0.5),
                simulations_run: 0,
                tree_size: tree.len(),
                stopped_early: false,
            });
        }

        if tree.node(root).expanded {
            self.noise_expanded_root(tree, rng);
        }

        let start = Instant::now();
        let deadline = self
            .config
            .max_duration_ms
            .map(|ms| start + Duration::from_millis(ms));

        let mut simulations_run = 0u32;
        let mut stopped_early = false;
        while simulations_run < simulation_budget {
            if simulations_run > 0 && deadline.is_some_and(|d| Instant::now() >= d) {
                stopped_early = true;
                break;
            }
            self.simulate(tree, rng)?;
            simulations_run += 1;
        }

        let best = match choose_child(tree, temperature, rng)? {
            Some(id) => id,
            None => return Err(SearchError::TerminalPosition(status)),
        };
        let best_move = match tree.node(best).incoming_move.clone() {
            Some(mv) => mv,
            None => return Err(SearchError::TerminalPosition(status)),
        };

        let root_node = tree.node(root);
        let result = MctsResult {
            best_move,
            visit_distribution: visit_distribution(tree),
            root_visits: root_node.visit_count,
            root_value: root_node.mean_value().unwrap_or(0.5),
            simulations_run,
            tree_size: tree.len(),
            stopped_early,
        };

        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "[MCTS] {} sims in {:?}{}: best={} value={:.3} nodes={} top={:?}",
                simulations_run,
                start.elapsed(),
                if stopped_early { " (time limit)" } else { "" },
                uci(&result.best_move),
                result.root_value,
                result.tree_size,
                result.top_moves(3)
            );
        }

        Ok(result)
    }

    fn simulate<R: Rng + ?Sized>(&self, tree: &mut SearchTree, rng: &mut R) -> Result<(), SearchError> {
        let path = select_leaf(tree, &self.config);
        let Some(&leaf) = path.last() else {
            return Ok(());
        };

        let node = tree.node(leaf);
        let value = match node.status().value_for(node.position.side_to_move()) {
            Some(terminal_value) => terminal_value,
            None => self.expand(tree, leaf, rng)?,
        };

        backpropagate(tree, &path, f64::from(value));
        Ok(())
    }

    /// Creates one child per legal move and returns the oracle value of the node.
    fn expand<R: Rng + ?Sized>(&self, tree: &mut SearchTree, id: NodeId, rng: &mut R) -> Result<f32, SearchError> {
        let position = tree.node(id).position.clone();
        let legal_moves = position.legal_moves();
        let evaluation = evaluate_position(self.oracle, &position, &legal_moves, self.config.policy_smoothing)?;

        let mut priors = evaluation.priors;
        if id == tree.root() {
            if let Some(alpha) = self.config.dirichlet_alpha {
                add_dirichlet_noise(&mut priors, alpha, self.config.dirichlet_epsilon, rng);
                tree.mark_root_noised();
            }
        }

        for (mv, prior) in priors {
            let next = position.play(&mv)?;
            tree.add_child(id, mv, next, prior);
        }
        tree.node_mut(id).expanded = true;

        Ok(evaluation.value)
    }

    /// Noises the child priors of a root that was expanded before it became
    /// the root, as happens after re-rooting a reused tree.
    fn noise_expanded_root<R: Rng + ?Sized>(&self, tree: &mut SearchTree, rng: &mut R) {
        let Some(alpha) = self.config.dirichlet_alpha else {
            return;
        };
        if tree.root_noised() {
            return;
        }

        let children = tree.children(tree.root()).to_vec();
        let mut priors: Vec<(Move, f32)> = children
            .iter()
            .filter_map(|&id| {
                let node = tree.node(id);
                node.incoming_move.clone().map(|mv| (mv, node.prior))
            })
            .collect();
        add_dirichlet_noise(&mut priors, alpha, self.config.dirichlet_epsilon, rng);
        for (&id, (_, prior)) in children.iter().zip(priors) {
            tree.node_mut(id).prior = prior;
        }
        tree.mark_root_noised();
        log::trace!("Root noise applied to {} reused children", children.len());
    }
}

/// Mixes Dirichlet(alpha) noise into `priors`: `p = (1 - epsilon) * p + epsilon * noise`.
pub fn add_dirichlet_noise<R: Rng + ?Sized>(priors: &mut [(Move, f32)], alpha: f64, epsilon: f64, rng: &mut R) {
    if priors.len() < 2 {
        return;
    }
    let gamma = match Gamma::new(alpha, 1.0) {
        Ok(gamma) => gamma,
        Err(e) => {
            log::warn!("Skipping root noise, invalid alpha {}: {}", alpha, e);
            return;
        }
    };

    let noise: Vec<f64> = (0..priors.len()).map(|_| gamma.sample(rng)).collect();
    let sum: f64 = noise.iter().sum();
    if !(sum.is_finite() && sum > 0.0) {
        return;
    }

    for ((_, prior), n) in priors.iter_mut().zip(noise) {
        *prior = ((1.0 - epsilon) * f64::from(*prior) + epsilon * n / sum) as f32;
    }
}

/// One-shot search: builds the tree, runs the budget and returns the move.
pub fn select_move<O, R>(
    position: &Position,
    oracle: &O,
    simulation_budget: u32,
    temperature: f64,
    config: &MctsConfig,
    rng: &mut R,
) -> Result<Move, SearchError>
where
    O: PolicyValueOracle + ?Sized,
    R: Rng + ?Sized,
{
    Mcts::new(oracle, config.clone()).select_move(position, simulation_budget, temperature, rng)
}
