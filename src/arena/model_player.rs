use crate::game::position::Position;
use crate::mcts::algorithm::{Mcts, SearchError};
use crate::mcts::hyperparameters::MctsConfig;
use crate::mcts::mcts_result::MctsResult;
use crate::mcts::tree::SearchTree;
use crate::neural::oracle::PolicyValueOracle;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shakmaty::Move;

/// The model side of a game: oracle, search options, RNG and, optionally,
/// the search tree carried over from the previous move.
pub struct ModelPlayer<'a> {
    oracle: &'a dyn PolicyValueOracle,
    config: MctsConfig,
    rng: StdRng,
    name: String,
    tree: Option<SearchTree>,
}

impl<'a> ModelPlayer<'a> {
    pub fn new(oracle: &'a dyn PolicyValueOracle, config: MctsConfig, seed: u64) -> Self {
        Self {
            oracle,
            config,
            rng: StdRng::seed_from_u64(seed),
            name: "Model".to_string(),
            tree: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// Forgets any tree kept from the previous game.
    pub fn new_game(&mut self) {
        self.tree = None;
    }

    /// Searches `position` and returns the full search result.
    ///
    /// With `reuse_tree`, the tree left by earlier moves is continued when its
    /// root is `position`; otherwise a fresh tree is built.
    pub fn choose_move(
        &mut self,
        position: &Position,
        simulations: u32,
        temperature: f64,
        reuse_tree: bool,
    ) -> Result<MctsResult, SearchError> {
        let mut tree = match self.tree.take() {
            Some(tree) if reuse_tree && tree.root_node().position.fen() == position.fen() => {
                log::trace!("Reusing search tree with {} nodes", tree.len());
                tree
            }
            _ => SearchTree::new(position.clone()),
        };

        let mcts = Mcts::new(self.oracle, self.config.clone());
        let result = mcts.search_tree(&mut tree, simulations, temperature, &mut self.rng)?;

        if reuse_tree {
            self.tree = Some(tree);
        }
        Ok(result)
    }

    /// Follows a move played by either side, re-rooting the kept tree.
    pub fn observe_move(&mut self, mv: &Move) {
        if let Some(tree) = self.tree.take() {
            self.tree = tree.into_subtree(mv);
        }
    }

    pub fn kept_tree_size(&self) -> usize {
        self.tree.as_ref().map_or(0, SearchTree::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::oracle::UniformOracle;

    #[test]
    fn test_tree_is_kept_and_rerooted() {
        let oracle = UniformOracle::default();
        let mut player = ModelPlayer::new(&oracle, MctsConfig::default(), 3);
        let start = Position::starting();

        let result = player.choose_move(&start, 60, 0.0, true).unwrap();
        let size_before = player.kept_tree_size();
        assert!(size_before > 20);

        player.observe_move(&result.best_move);
        let size_after = player.kept_tree_size();
        assert!(size_after > 0 && size_after < size_before);
    }

    #[test]
    fn test_unknown_reply_drops_tree() {
        let oracle = UniformOracle::default();
        let mut player = ModelPlayer::new(&oracle, MctsConfig::default(), 3);
        let start = Position::starting();

        // One simulation: the root is expanded, its children are not.
        let result = player.choose_move(&start, 1, 0.0, true).unwrap();
        player.observe_move(&result.best_move);
        assert_eq!(player.kept_tree_size(), 1);

        let after = start.play(&result.best_move).unwrap();
        let reply = after.legal_moves()[0].clone();
        player.observe_move(&reply);
        assert_eq!(player.kept_tree_size(), 0);
    }

    #[test]
    fn test_without_reuse_nothing_is_kept() {
        let oracle = UniformOracle::default();
        let mut player = ModelPlayer::new(&oracle, MctsConfig::default(), 3).with_name("uniform");
        player.choose_move(&Position::starting(), 10, 0.0, false).unwrap();
        assert_eq!(player.kept_tree_size(), 0);
        assert_eq!(player.name(), "uniform");
    }
}
