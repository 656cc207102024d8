//! Configuration for a single self-play agent.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{SelfPlayError, SelfPlayResult};

/// Exploration rate used when nothing else is configured.
pub const DEFAULT_EPSILON: f64 = 0.1;

/// Configuration for one agent.
///
/// # Example
/// ```
/// use kuhn_selfplay::bandit::AgentConfig;
///
/// let config = AgentConfig::default().with_seed(7);
/// assert_eq!(config.epsilon, 0.1);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Probability of playing a uniformly random arm instead of the greedy one.
    pub epsilon: f64,

    /// Random seed for reproducibility.
    ///
    /// If `None`, the agent's RNG is seeded from entropy.
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            seed: None,
        }
    }
}

impl AgentConfig {
    /// Create a new AgentConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set exploration rate.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Builder method: set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> SelfPlayResult<()> {
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(SelfPlayError::InvalidEpsilon(self.epsilon));
        }
        Ok(())
    }

    /// RNG seeded from `seed`, or from entropy when unset.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}
