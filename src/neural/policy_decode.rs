//! Decoding of oracle output into priors over the legal moves of a position.
//!
//! The raw distribution covers the whole move vocabulary. Only legal moves keep
//! their mass, which is renormalized and mixed with a uniform floor so that no
//! legal move is starved, however little mass the oracle gave it.

use crate::game::position::{uci, Position};
use crate::neural::move_vocabulary::MoveVocabulary;
use crate::neural::oracle::{OracleError, OracleOutput, PolicyValueOracle};
use crate::neural::tensor_conversion::encode;
use shakmaty::Move;

/// Smallest share of uniform mass mixed into the priors.
pub const MIN_SMOOTHING: f32 = 1e-3;

/// Value used when the oracle answers with NaN.
pub const NEUTRAL_VALUE: f32 = 0.5;

/// Priors and value of one expansion.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Legal moves with their priors, in legal-move generation order.
    pub priors: Vec<(Move, f32)>,
    /// Win probability for the side to move, in `[0, 1]`.
    pub value: f32,
}

/// Clamps a value-head output into `[0, 1]`.
pub fn sanitize_value(value: f32) -> f32 {
    if value.is_nan() {
        NEUTRAL_VALUE
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn legal_mass(policy: &[f32], index: Option<usize>) -> f32 {
    match index.and_then(|i| policy.get(i)) {
        Some(&p) if p.is_finite() && p > 0.0 => p,
        _ => 0.0,
    }
}

/// Maps `policy` onto `legal_moves`.
///
/// Each move gets `(1 - smoothing) * mass / total + smoothing / n`, with
/// `smoothing` held to at least [`MIN_SMOOTHING`] so every legal move keeps a
/// positive prior. With no usable mass at all the result is uniform. The
/// output sums to one.
pub fn decode(
    policy: &[f32],
    legal_moves: &[Move],
    vocabulary: &MoveVocabulary,
    smoothing: f32,
) -> Vec<(Move, f32)> {
    if legal_moves.is_empty() {
        return Vec::new();
    }

    let n = legal_moves.len() as f32;
    let smoothing = if smoothing.is_finite() {
        smoothing.clamp(MIN_SMOOTHING, 1.0)
    } else {
        MIN_SMOOTHING
    };

    let masses: Vec<f32> = legal_moves
        .iter()
        .map(|mv| legal_mass(policy, vocabulary.index_of(&uci(mv))))
        .collect();
    let total: f32 = masses.iter().sum();

    if !(total.is_finite() && total > 0.0) {
        log::debug!(
            "Oracle gave no usable mass to {} legal moves, using uniform priors",
            legal_moves.len()
        );
        return legal_moves.iter().cloned().map(|mv| (mv, 1.0 / n)).collect();
    }

    legal_moves
        .iter()
        .cloned()
        .zip(masses)
        .map(|(mv, mass)| (mv, (1.0 - smoothing) * mass / total + smoothing / n))
        .collect()
}

/// Encodes `position`, calls the oracle once and decodes its answer.
pub fn evaluate_position<O: PolicyValueOracle + ?Sized>(
    oracle: &O,
    position: &Position,
    legal_moves: &[Move],
    smoothing: f32,
) -> Result<Evaluation, OracleError> {
    let output: OracleOutput = oracle.evaluate(&encode(position))?;

    if output.policy.len() != oracle.vocabulary().len() {
        log::warn!(
            "Oracle policy has {} entries for a vocabulary of {}",
            output.policy.len(),
            oracle.vocabulary().len()
        );
    }
    if !(0.0..=1.0).contains(&output.value) {
        log::warn!("Oracle value {} outside [0, 1], clamping", output.value);
    }

    Ok(Evaluation {
        priors: decode(&output.policy, legal_moves, oracle.vocabulary(), smoothing),
        value: sanitize_value(output.value),
    })
}
