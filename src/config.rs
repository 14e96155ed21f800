//! Run configuration for the genetic search
//!
//! The configuration is an immutable value handed to the engine at
//! construction. It can be loaded from YAML; missing keys take defaults.

use crate::error::{AntennaError, AntennaResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters of one optimization run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaConfig {
    /// Number of individuals (P), constant across the run
    pub population_size: usize,
    /// Antennae per individual (N)
    pub n_antennae: usize,
    /// Transmit power, carried for a downstream physical-coverage model
    pub default_power: f64,
    /// Probability that an adjacent pair recombines
    pub p_crossover: f64,
    /// Per-antenna probability of a Gaussian displacement
    pub p_mutation: f64,
    /// Standard deviation of the displacement, per coordinate
    pub mutation_std: f64,
    pub n_generations: usize,
    /// Nearest weighted points served by each antenna site
    pub k_neighbors: usize,
    /// Seed for the random source; `None` draws one from entropy
    pub seed: Option<u64>,
    /// Score individuals on the rayon pool
    pub parallel_scoring: bool,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 25,
            n_antennae: 5,
            default_power: 0.2,
            p_crossover: 0.5,
            p_mutation: 1.0,
            mutation_std: 0.1,
            n_generations: 50,
            k_neighbors: 10,
            seed: None,
            parallel_scoring: true,
        }
    }
}

impl GaConfig {
    pub fn from_yaml_str(text: &str) -> AntennaResult<Self> {
        let config: GaConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> AntennaResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Check sizes and probabilities; every failure is a configuration error.
    pub fn validate(&self) -> AntennaResult<()> {
        if self.population_size == 0 {
            return Err(AntennaError::Configuration(
                "population_size must be at least 1".to_string(),
            ));
        }
        if self.n_antennae == 0 {
            return Err(AntennaError::Configuration(
                "n_antennae must be at least 1".to_string(),
            ));
        }
        if self.k_neighbors == 0 {
            return Err(AntennaError::Configuration(
                "k_neighbors must be at least 1".to_string(),
            ));
        }
        for (name, p) in [("p_crossover", self.p_crossover), ("p_mutation", self.p_mutation)] {
            if !(0.0..=1.0).contains(&p) {
                return Err(AntennaError::Configuration(format!(
                    "{} must be between 0.0 and 1.0, got {}",
                    name, p
                )));
            }
        }
        if !self.mutation_std.is_finite() || self.mutation_std < 0.0 {
            return Err(AntennaError::Configuration(format!(
                "mutation_std must be finite and non-negative, got {}",
                self.mutation_std
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.population_size, 25);
        assert_eq!(config.n_antennae, 5);
    }

    #[test]
    fn test_yaml_partial_override() {
        let config = GaConfig::from_yaml_str(
            "population_size: 4\nn_antennae: 30\np_crossover: 0.8\nmutation_std: 0.15\nseed: 0\n",
        )
        .unwrap();
        assert_eq!(config.population_size, 4);
        assert_eq!(config.n_antennae, 30);
        assert_eq!(config.seed, Some(0));
        assert_eq!(config.n_generations, 50);
    }

    #[test]
    fn test_invalid_probability() {
        let config = GaConfig { p_mutation: 1.5, ..GaConfig::default() };
        assert!(matches!(config.validate(), Err(AntennaError::Configuration(_))));
    }

    #[test]
    fn test_zero_sizes_rejected() {
        for config in [
            GaConfig { population_size: 0, ..GaConfig::default() },
            GaConfig { n_antennae: 0, ..GaConfig::default() },
            GaConfig { k_neighbors: 0, ..GaConfig::default() },
        ] {
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn test_negative_std_rejected() {
        let config = GaConfig { mutation_std: -0.1, ..GaConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_yaml_type_is_error() {
        assert!(matches!(
            GaConfig::from_yaml_str("population_size: many"),
            Err(AntennaError::Yaml(_))
        ));
    }
}
