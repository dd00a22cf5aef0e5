use crate::core::models::topology::BondOrder;
use thiserror::Error;

/// Pairs farther apart than this, in angstroms, are never considered bonded.
pub const DEFAULT_DISTANCE_CUTOFF: f64 = 2.0;

/// Likelihood a bond order must strictly exceed to be admissible at a distance.
pub const DEFAULT_ACCEPTANCE_THRESHOLD: f64 = 0.0;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Tunable parameters of a topology inference pass.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceConfig {
    pub distance_cutoff: f64,
    pub acceptance_threshold: f64,
    /// Highest bond order the search may assign.
    pub max_bond_order: BondOrder,
    /// Fold the unbonded likelihood of candidate pairs left at order zero into the score.
    pub score_unbonded_pairs: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            distance_cutoff: DEFAULT_DISTANCE_CUTOFF,
            acceptance_threshold: DEFAULT_ACCEPTANCE_THRESHOLD,
            max_bond_order: BondOrder::Triple,
            score_unbonded_pairs: false,
        }
    }
}

#[derive(Default)]
pub struct InferenceConfigBuilder {
    distance_cutoff: Option<f64>,
    acceptance_threshold: Option<f64>,
    max_bond_order: Option<BondOrder>,
    score_unbonded_pairs: Option<bool>,
}

impl InferenceConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn distance_cutoff(mut self, cutoff: f64) -> Self {
        self.distance_cutoff = Some(cutoff);
        self
    }
    pub fn acceptance_threshold(mut self, threshold: f64) -> Self {
        self.acceptance_threshold = Some(threshold);
        self
    }
    pub fn max_bond_order(mut self, order: BondOrder) -> Self {
        self.max_bond_order = Some(order);
        self
    }
    pub fn score_unbonded_pairs(mut self, enabled: bool) -> Self {
        self.score_unbonded_pairs = Some(enabled);
        self
    }

    /// Fills unset parameters with defaults and validates the result.
    pub fn build(self) -> Result<InferenceConfig, ConfigError> {
        let defaults = InferenceConfig::default();
        let config = InferenceConfig {
            distance_cutoff: self.distance_cutoff.unwrap_or(defaults.distance_cutoff),
            acceptance_threshold: self
                .acceptance_threshold
                .unwrap_or(defaults.acceptance_threshold),
            max_bond_order: self.max_bond_order.unwrap_or(defaults.max_bond_order),
            score_unbonded_pairs: self
                .score_unbonded_pairs
                .unwrap_or(defaults.score_unbonded_pairs),
        };

        if !config.distance_cutoff.is_finite() || config.distance_cutoff <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "distance_cutoff",
                reason: format!("must be a positive length, got {}", config.distance_cutoff),
            });
        }
        if !(0.0..1.0).contains(&config.acceptance_threshold) {
            return Err(ConfigError::InvalidParameter {
                name: "acceptance_threshold",
                reason: format!("must lie in [0, 1), got {}", config.acceptance_threshold),
            });
        }
        if !config.max_bond_order.is_bonded() {
            return Err(ConfigError::InvalidParameter {
                name: "max_bond_order",
                reason: "must be at least a single bond".to_string(),
            });
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_uses_defaults_for_unset_parameters() {
        let config = InferenceConfigBuilder::new().build().unwrap();
        assert_eq!(config, InferenceConfig::default());
        assert_eq!(config.distance_cutoff, 2.0);
        assert_eq!(config.max_bond_order, BondOrder::Triple);
    }

    #[test]
    fn build_keeps_explicit_values() {
        let config = InferenceConfigBuilder::new()
            .distance_cutoff(1.8)
            .acceptance_threshold(0.01)
            .max_bond_order(BondOrder::Double)
            .score_unbonded_pairs(true)
            .build()
            .unwrap();
        assert_eq!(config.distance_cutoff, 1.8);
        assert_eq!(config.acceptance_threshold, 0.01);
        assert_eq!(config.max_bond_order, BondOrder::Double);
        assert!(config.score_unbonded_pairs);
    }

    #[test]
    fn build_rejects_invalid_values() {
        let err = InferenceConfigBuilder::new()
            .distance_cutoff(-1.0)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidParameter {
                name: "distance_cutoff",
                ..
            }
        ));
        assert!(
            InferenceConfigBuilder::new()
                .distance_cutoff(f64::NAN)
                .build()
                .is_err()
        );
        assert!(
            InferenceConfigBuilder::new()
                .acceptance_threshold(1.0)
                .build()
                .is_err()
        );
        assert!(
            InferenceConfigBuilder::new()
                .max_bond_order(BondOrder::Unbonded)
                .build()
                .is_err()
        );
    }
}
