//! Behaviour of the search as seen through the public API.

use assert_matches::assert_matches;
use chess_arena::game::position::uci;
use chess_arena::game::{GameStatus, Position};
use chess_arena::mcts::decision::choose_child;
use chess_arena::mcts::node::NodeId;
use chess_arena::mcts::{select_move, Mcts, MctsConfig, SearchError, SearchTree};
use chess_arena::neural::UniformOracle;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};

const MATE_IN_ONE: &str = "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1";
const STALEMATE: &str = "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1";
const FORCED: &str = "R6k/8/5K2/8/8/8/8/8 b - - 0 1";

fn searched_tree(fen: &str, budget: u32, seed: u64) -> SearchTree {
    let oracle = UniformOracle::default();
    let mcts = Mcts::new(&oracle, MctsConfig::default());
    let mut tree = SearchTree::new(Position::from_fen(fen).unwrap());
    let mut rng = StdRng::seed_from_u64(seed);
    mcts.search_tree(&mut tree, budget, 0.0, &mut rng).unwrap();
    tree
}

#[test]
fn test_single_legal_move_is_returned() {
    let oracle = UniformOracle::default();
    let mut rng = StdRng::seed_from_u64(1);
    let position = Position::from_fen(FORCED).unwrap();
    let mv = select_move(&position, &oracle, 50, 1.0, &MctsConfig::default(), &mut rng).unwrap();
    assert_eq!(uci(&mv), "h8h7");
}

#[test]
fn test_root_visits_match_budget() {
    for budget in [1, 2, 17, 120] {
        let tree = searched_tree(MATE_IN_ONE, budget, 5);
        assert_eq!(tree.root_node().visit_count, budget);
    }
}

#[test]
fn test_root_visits_are_one_plus_children() {
    let tree = searched_tree(&Position::starting().fen(), 90, 9);
    let root = tree.root();
    let child_sum: u32 = tree
        .children(root)
        .iter()
        .map(|&c| tree.node(c).visit_count)
        .sum();
    assert_eq!(tree.node(root).visit_count, child_sum + 1);
}

#[test]
fn test_values_stay_in_unit_interval_and_moves_are_unique() {
    let tree = searched_tree(MATE_IN_ONE, 300, 11);
    tree.assert_invariants();

    for index in 0..tree.len() {
        let node = tree.node(NodeId(index));
        if let Some(mean) = node.mean_value() {
            assert!((0.0..=1.0).contains(&mean));
        }
        let moves: HashSet<String> = tree
            .children(NodeId(index))
            .iter()
            .filter_map(|&c| tree.node(c).incoming_move.as_ref().map(uci))
            .collect();
        assert_eq!(moves.len(), tree.children(NodeId(index)).len());
    }
}

#[test]
fn test_zero_temperature_is_deterministic() {
    let oracle = UniformOracle::default();
    let position = Position::starting();
    let config = MctsConfig::default();

    let first = select_move(&position, &oracle, 60, 0.0, &config, &mut StdRng::seed_from_u64(1)).unwrap();
    for seed in 2..6 {
        let again = select_move(&position, &oracle, 60, 0.0, &config, &mut StdRng::seed_from_u64(seed)).unwrap();
        assert_eq!(first, again);
    }
}

#[test]
fn test_high_temperature_samples_visited_moves_evenly() {
    let tree = searched_tree(&Position::starting().fen(), 100, 3);
    let root = tree.root();
    assert_eq!(tree.children(root).len(), 20);
    assert!(tree.children(root).iter().all(|&c| tree.node(c).visit_count > 0));

    let mut rng = StdRng::seed_from_u64(77);
    let mut counts: HashMap<NodeId, u32> = HashMap::new();
    for _ in 0..4000 {
        let id = choose_child(&tree, 1e6, &mut rng).unwrap().unwrap();
        *counts.entry(id).or_insert(0) += 1;
    }

    assert_eq!(counts.len(), 20);
    for (&id, &count) in &counts {
        assert!((100..=300).contains(&count), "{:?} drawn {} times", id, count);
    }
}

#[test]
fn test_starting_position_returns_legal_move() {
    let oracle = UniformOracle::default();
    let position = Position::starting();
    let mut rng = StdRng::seed_from_u64(21);
    let mv = select_move(&position, &oracle, 50, 0.2, &MctsConfig::default(), &mut rng).unwrap();
    assert!(position.legal_moves().contains(&mv));

    let mcts = Mcts::new(&oracle, MctsConfig::default());
    let result = mcts.search(&position, 50, 0.0, &mut rng).unwrap();
    assert_eq!(result.root_visits, 50);
    assert!(position.legal_moves().contains(&result.best_move));
}

#[test]
fn test_search_after_playing_starts_from_fresh_tree() {
    let oracle = UniformOracle::default();
    let mcts = Mcts::new(&oracle, MctsConfig::default());
    let mut rng = StdRng::seed_from_u64(13);

    let position = Position::starting();
    let first = mcts.search(&position, 40, 0.0, &mut rng).unwrap();
    let next = position.play(&first.best_move).unwrap();
    let second = mcts.search(&next, 40, 0.0, &mut rng).unwrap();

    assert_eq!(second.root_visits, 40);
    assert!(next.legal_moves().contains(&second.best_move));

    // re-rooting keeps only the played subtree
    let mut tree = SearchTree::new(position);
    mcts.search_tree(&mut tree, 40, 0.0, &mut rng).unwrap();
    let total = tree.len();
    let kept = tree.into_subtree(&first.best_move).unwrap();
    assert!(kept.len() < total);
    assert!(kept.root_node().parent.is_none());
    kept.assert_invariants();
}

#[test]
fn test_finds_mate_in_one() {
    let oracle = UniformOracle::default();
    let position = Position::from_fen(MATE_IN_ONE).unwrap();
    let mut rng = StdRng::seed_from_u64(4);
    let mv = select_move(&position, &oracle, 200, 0.0, &MctsConfig::default(), &mut rng).unwrap();
    assert_eq!(uci(&mv), "a1a8");
}

#[test]
fn test_mate_in_one_dominates_visits() {
    let oracle = UniformOracle::default();
    let mcts = Mcts::new(&oracle, MctsConfig::default());
    let mut rng = StdRng::seed_from_u64(8);
    let result = mcts
        .search(&Position::from_fen(MATE_IN_ONE).unwrap(), 200, 0.0, &mut rng)
        .unwrap();
    assert_eq!(result.top_moves(1)[0].0, "a1a8");
    assert!(result.root_value > 0.5);
}

#[test]
fn test_terminal_root_is_rejected() {
    let oracle = UniformOracle::default();
    let position = Position::from_fen(STALEMATE).unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    let err = select_move(&position, &oracle, 10, 0.0, &MctsConfig::default(), &mut rng).unwrap_err();
    assert_matches!(err, SearchError::TerminalPosition(GameStatus::Stalemate));
}

#[test]
fn test_invalid_arguments() {
    let oracle = UniformOracle::default();
    let position = Position::starting();
    let config = MctsConfig::default();
    let mut rng = StdRng::seed_from_u64(1);

    assert_matches!(
        select_move(&position, &oracle, 0, 0.0, &config, &mut rng),
        Err(SearchError::InvalidBudget)
    );
    assert_matches!(
        select_move(&position, &oracle, 10, -0.5, &config, &mut rng),
        Err(SearchError::InvalidTemperature(_))
    );
}
