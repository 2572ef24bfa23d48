use crate::game::position::uci;
use shakmaty::Move;

/// Outcome of one search from a root position.
#[derive(Debug, Clone)]
pub struct MctsResult {
    pub best_move: Move,
    /// Root children and their visit counts, in legal-move order
    pub visit_distribution: Vec<(Move, u32)>,
    pub root_visits: u32,
    /// Mean value at the root, for the side to move there
    pub root_value: f64,
    pub simulations_run: u32,
    pub tree_size: usize,
    /// The wall-clock limit ended the search before the budget was spent
    pub stopped_early: bool,
}

impl MctsResult {
    /// The `n` most visited moves as `(uci, visits)`, for logging
    pub fn top_moves(&self, n: usize) -> Vec<(String, u32)> {
        let mut moves: Vec<(String, u32)> = self
            .visit_distribution
            .iter()
            .map(|(mv, visits)| (uci(mv), *visits))
            .collect();
        moves.sort_by(|a, b| b.1.cmp(&a.1));
        moves.truncate(n);
        moves
    }
}
