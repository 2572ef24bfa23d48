#[cfg(feature = "torch")]
pub mod model_io;
pub mod move_vocabulary;
pub mod oracle;
pub mod policy_decode;
pub mod tensor_conversion;
#[cfg(feature = "torch")]
pub mod transformer;

// Re-export key components for convenience
pub use move_vocabulary::MoveVocabulary;
pub use oracle::{OracleError, OracleOutput, PolicyValueOracle, UniformOracle};
#[cfg(feature = "torch")]
pub use transformer::{ModelConfig, TransformerOracle};
