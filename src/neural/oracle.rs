//! Policy/value oracle boundary.
//!
//! The search never touches a network directly: it goes through
//! [`PolicyValueOracle`], which takes the fixed-shape [`OracleInput`] and answers
//! with a distribution over the move vocabulary plus a win probability for the
//! side to move.

use crate::game::position::Position;
use crate::neural::move_vocabulary::MoveVocabulary;
use crate::neural::tensor_conversion::{encode, OracleInput};

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("inference failed: {0}")]
    Inference(String),

    #[error("model loading failed: {0}")]
    Load(String),

    #[error("oracle output has {actual} policy entries, vocabulary has {expected}")]
    ShapeMismatch { expected: usize, actual: usize },
}

/// Raw answer of the oracle. `policy` is indexed by the oracle's vocabulary,
/// `value` is the win probability of the side to move.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleOutput {
    pub policy: Vec<f32>,
    pub value: f32,
}

/// Trait for policy/value evaluation, so the search can run against a real
/// network or a deterministic stub.
pub trait PolicyValueOracle {
    /// Vocabulary that indexes `OracleOutput::policy`.
    fn vocabulary(&self) -> &MoveVocabulary;

    /// One blocking forward pass for a single position.
    fn evaluate(&self, input: &OracleInput) -> Result<OracleOutput, OracleError>;

    /// Runs a few forward passes on the starting position.
    fn warm_up(&self) -> Result<(), OracleError> {
        let input = encode(&Position::starting());
        for _ in 0..3 {
            self.evaluate(&input)?;
        }
        Ok(())
    }
}

impl<T: PolicyValueOracle + ?Sized> PolicyValueOracle for &T {
    fn vocabulary(&self) -> &MoveVocabulary {
        (**self).vocabulary()
    }

    fn evaluate(&self, input: &OracleInput) -> Result<OracleOutput, OracleError> {
        (**self).evaluate(input)
    }
}

impl<T: PolicyValueOracle + ?Sized> PolicyValueOracle for Box<T> {
    fn vocabulary(&self) -> &MoveVocabulary {
        (**self).vocabulary()
    }

    fn evaluate(&self, input: &OracleInput) -> Result<OracleOutput, OracleError> {
        (**self).evaluate(input)
    }

    fn warm_up(&self) -> Result<(), OracleError> {
        (**self).warm_up()
    }
}

/// Uniform policy over the whole vocabulary and a constant value.
///
/// Stands in for the network when no checkpoint is available.
#[derive(Debug, Clone)]
pub struct UniformOracle {
    vocabulary: MoveVocabulary,
    value: f32,
}

impl UniformOracle {
    pub fn new(value: f32) -> Self {
        Self::with_vocabulary(MoveVocabulary::standard(), value)
    }

    pub fn with_vocabulary(vocabulary: MoveVocabulary, value: f32) -> Self {
        Self { vocabulary, value }
    }
}

impl Default for UniformOracle {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl PolicyValueOracle for UniformOracle {
    fn vocabulary(&self) -> &MoveVocabulary {
        &self.vocabulary
    }

    fn evaluate(&self, _input: &OracleInput) -> Result<OracleOutput, OracleError> {
        let n = self.vocabulary.len();
        Ok(OracleOutput {
            policy: vec![1.0 / n as f32; n],
            value: self.value,
        })
    }
}
