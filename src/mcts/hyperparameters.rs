//! MCTS Hyperparameters Configuration
//!
//! This module defines all tunable knobs of the search. The simulation budget
//! and the temperature are per-call arguments and live outside this struct.

use serde::{Deserialize, Serialize};

/// MCTS hyperparameters configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MctsConfig {
    // ========== Selection ==========
    /// Exploration constant of the PUCT formula
    /// Higher values = more weight on the prior, more exploration
    /// Default: 1.5
    pub c_puct: f64,

    /// Value assumed for a child that has never been visited (first-play urgency)
    /// 0.5 = unknown moves are treated as even
    /// Default: 0.5
    pub fpu_value: f64,

    // ========== Priors ==========
    /// Share of uniform probability mixed into the decoded priors,
    /// so every legal move keeps at least `policy_smoothing / n`
    /// Default: 0.05
    pub policy_smoothing: f32,

    /// Dirichlet concentration for root noise. `None` disables the noise.
    /// Default: None
    pub dirichlet_alpha: Option<f64>,

    /// Weight of the Dirichlet noise in the root priors
    /// Default: 0.25
    pub dirichlet_epsilon: f64,

    // ========== Budget ==========
    /// Return the only legal move without consulting the oracle
    /// Default: true
    pub short_circuit_forced_moves: bool,

    /// Wall-clock limit checked between simulations. `None` = budget only.
    /// Default: None
    pub max_duration_ms: Option<u64>,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            c_puct: 1.5,
            fpu_value: 0.5,
            policy_smoothing: 0.05,
            dirichlet_alpha: None,
            dirichlet_epsilon: 0.25,
            short_circuit_forced_moves: true,
            max_duration_ms: None,
        }
    }
}

impl MctsConfig {
    /// Enable root exploration noise, as used for self-play style games
    pub fn with_dirichlet_noise(mut self, alpha: f64, epsilon: f64) -> Self {
        self.dirichlet_alpha = Some(alpha);
        self.dirichlet_epsilon = epsilon;
        self
    }

    /// Check every parameter is in its admissible range
    pub fn validate(&self) -> Result<(), String> {
        if !(self.c_puct.is_finite() && self.c_puct > 0.0) {
            return Err(format!("c_puct must be positive, got {}", self.c_puct));
        }
        if !(0.0..=1.0).contains(&self.fpu_value) {
            return Err(format!("fpu_value must be in [0, 1], got {}", self.fpu_value));
        }
        if !(self.policy_smoothing > 0.0 && self.policy_smoothing <= 1.0) {
            return Err(format!(
                "policy_smoothing must be in (0, 1], got {}",
                self.policy_smoothing
            ));
        }
        if !(0.0..=1.0).contains(&self.dirichlet_epsilon) {
            return Err(format!(
                "dirichlet_epsilon must be in [0, 1], got {}",
                self.dirichlet_epsilon
            ));
        }
        if let Some(alpha) = self.dirichlet_alpha {
            if !(alpha.is_finite() && alpha > 0.0) {
                return Err(format!("dirichlet_alpha must be positive, got {}", alpha));
            }
        }
        Ok(())
    }

    /// Create a configuration string for logging
    pub fn to_config_string(&self) -> String {
        format!(
            "c_puct[{:.2}]_fpu[{:.2}]_smooth[{:.3}]_noise[{}]_forced[{}]",
            self.c_puct,
            self.fpu_value,
            self.policy_smoothing,
            match self.dirichlet_alpha {
                Some(alpha) => format!("{:.2},{:.2}", alpha, self.dirichlet_epsilon),
                None => "off".to_string(),
            },
            self.short_circuit_forced_moves
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = MctsConfig::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.c_puct, 1.5);
        assert_eq!(params.fpu_value, 0.5);
        assert!(params.short_circuit_forced_moves);
        assert!(params.dirichlet_alpha.is_none());
    }

    #[test]
    fn test_invalid_values() {
        let mut params = MctsConfig::default();
        params.c_puct = 0.0;
        assert!(params.validate().is_err());

        let mut params = MctsConfig::default();
        params.policy_smoothing = 1.5;
        assert!(params.validate().is_err());

        // zero smoothing would let the oracle starve legal moves
        let mut params = MctsConfig::default();
        params.policy_smoothing = 0.0;
        assert!(params.validate().is_err());

        let mut params = MctsConfig::default();
        params.policy_smoothing = f32::NAN;
        assert!(params.validate().is_err());

        let mut params = MctsConfig::default();
        params.fpu_value = -0.1;
        assert!(params.validate().is_err());

        let params = MctsConfig::default().with_dirichlet_noise(0.0, 0.25);
        assert!(params.validate().is_err());

        let params = MctsConfig::default().with_dirichlet_noise(0.3, 2.0);
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let params: MctsConfig = serde_json::from_str(r#"{"c_puct": 2.5}"#).unwrap();
        assert_eq!(params.c_puct, 2.5);
        assert_eq!(params.policy_smoothing, 0.05);
        assert_eq!(params.max_duration_ms, None);
    }

    #[test]
    fn test_config_string() {
        let params = MctsConfig::default();
        let config = params.to_config_string();
        assert!(config.contains("c_puct[1.50]"));
        assert!(config.contains("noise[off]"));

        let noisy = params.with_dirichlet_noise(0.3, 0.25).to_config_string();
        assert!(noisy.contains("noise[0.30,0.25]"));
    }
}
