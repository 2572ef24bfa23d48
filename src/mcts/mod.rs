pub mod algorithm;
pub mod decision;
pub mod hyperparameters;
pub mod mcts_result;
pub mod node;
pub mod selection;
pub mod tree;

pub use algorithm::{select_move, Mcts, SearchError};
pub use hyperparameters::MctsConfig;
pub use mcts_result::MctsResult;
pub use tree::SearchTree;
