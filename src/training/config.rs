//! Configuration and statistics for self-play training runs.

use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::bandit::{AgentConfig, DEFAULT_EPSILON};
use crate::error::{SelfPlayError, SelfPlayResult};

/// Configuration for a self-play training run.
///
/// # Example
/// ```
/// use kuhn_selfplay::training::TrainingConfig;
///
/// let config = TrainingConfig::default().with_hands(50_000).with_seed(42);
/// assert!(!config.interleave);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of hands to play.
    pub hands: u64,

    /// Exploration rate of Player 1 (the bettor).
    pub epsilon1: f64,

    /// Exploration rate of Player 2 (the caller).
    pub epsilon2: f64,

    /// Hands between learning-curve points.
    pub log_interval: u64,

    /// Alternate which agent learns while the other is frozen.
    ///
    /// When enabled, every `learning_interval` hands one agent switches to
    /// evaluation mode and the other resumes learning.
    pub interleave: bool,

    /// Hands between learner switches when `interleave` is on.
    pub learning_interval: u64,

    /// Random seed for reproducibility.
    ///
    /// The two agents and the dealer each get their own stream derived from
    /// this seed. If `None`, every stream is seeded from entropy.
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            hands: 10_000_000,
            epsilon1: DEFAULT_EPSILON,
            epsilon2: DEFAULT_EPSILON,
            log_interval: 100,
            interleave: false,
            learning_interval: 1_000,
            seed: None,
        }
    }
}

impl TrainingConfig {
    /// Create a new TrainingConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set number of hands.
    pub fn with_hands(mut self, hands: u64) -> Self {
        self.hands = hands;
        self
    }

    /// Builder method: set both exploration rates.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon1 = epsilon;
        self.epsilon2 = epsilon;
        self
    }

    /// Builder method: set learning-curve interval.
    pub fn with_log_interval(mut self, interval: u64) -> Self {
        self.log_interval = interval;
        self
    }

    /// Builder method: enable interleaved learning with the given interval.
    pub fn with_interleave(mut self, learning_interval: u64) -> Self {
        self.interleave = true;
        self.learning_interval = learning_interval;
        self
    }

    /// Builder method: set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> SelfPlayResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Parse configuration from a JSON string. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> SelfPlayResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> SelfPlayResult<()> {
        self.agent1().validate()?;
        self.agent2().validate()?;
        if self.log_interval == 0 {
            return Err(SelfPlayError::ZeroInterval("log_interval"));
        }
        if self.interleave && self.learning_interval == 0 {
            return Err(SelfPlayError::ZeroInterval("learning_interval"));
        }
        Ok(())
    }

    /// Agent configuration for Player 1.
    pub fn agent1(&self) -> AgentConfig {
        AgentConfig {
            epsilon: self.epsilon1,
            seed: self.derived_seed(0),
        }
    }

    /// Agent configuration for Player 2.
    pub fn agent2(&self) -> AgentConfig {
        AgentConfig {
            epsilon: self.epsilon2,
            seed: self.derived_seed(1),
        }
    }

    /// RNG for dealing cards.
    pub fn dealer_rng(&self) -> StdRng {
        match self.derived_seed(2) {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn derived_seed(&self, stream: u64) -> Option<u64> {
        self.seed.map(|seed| seed.wrapping_mul(3).wrapping_add(stream))
    }
}

/// Statistics tracked during training.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingStats {
    /// Total number of hands played.
    pub hands: u64,

    /// Total time spent training (in seconds).
    pub elapsed_seconds: f64,

    /// Hands per second.
    pub hands_per_second: f64,

    /// Sum of Player 1's payoffs over all hands.
    pub total_payoff1: i64,

    /// Hands in which Player 2 had to act (Player 1 bet).
    pub p2_decisions: u64,
}

impl TrainingStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update hands per second based on elapsed time.
    pub fn update_rate(&mut self) {
        if self.elapsed_seconds > 0.0 {
            self.hands_per_second = self.hands as f64 / self.elapsed_seconds;
        }
    }

    /// Average payoff of Player 1 while training, 0 before any hand.
    pub fn mean_payoff1(&self) -> f64 {
        if self.hands == 0 {
            0.0
        } else {
            self.total_payoff1 as f64 / self.hands as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_run() {
        let config = TrainingConfig::default();
        assert_eq!(config.hands, 10_000_000);
        assert_eq!(config.epsilon1, 0.1);
        assert_eq!(config.epsilon2, 0.1);
        assert_eq!(config.log_interval, 100);
        assert!(!config.interleave);
        assert_eq!(config.learning_interval, 1_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        let bad = TrainingConfig::new().with_epsilon(-0.5);
        assert!(matches!(bad.validate(), Err(SelfPlayError::InvalidEpsilon(_))));

        let bad = TrainingConfig::new().with_log_interval(0);
        assert!(matches!(bad.validate(), Err(SelfPlayError::ZeroInterval("log_interval"))));

        let bad = TrainingConfig::new().with_interleave(0);
        assert!(matches!(bad.validate(), Err(SelfPlayError::ZeroInterval("learning_interval"))));

        // The learning interval only matters while interleaving
        let mut fine = TrainingConfig::new();
        fine.learning_interval = 0;
        assert!(fine.validate().is_ok());
    }

    #[test]
    fn test_json_partial_fields() {
        let config = TrainingConfig::from_json_str(r#"{"hands": 500, "seed": 3, "interleave": true}"#).unwrap();
        assert_eq!(config.hands, 500);
        assert_eq!(config.seed, Some(3));
        assert!(config.interleave);
        assert_eq!(config.epsilon1, 0.1);

        assert!(TrainingConfig::from_json_str(r#"{"epsilon2": 2.0}"#).is_err());
        assert!(TrainingConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn test_derived_seeds_differ() {
        let config = TrainingConfig::new().with_seed(10);
        let seeds = [config.agent1().seed, config.agent2().seed, config.derived_seed(2)];
        assert_eq!(seeds, [Some(30), Some(31), Some(32)]);

        let unseeded = TrainingConfig::new();
        assert_eq!(unseeded.agent1().seed, None);
    }

    #[test]
    fn test_stats_rate() {
        let mut stats = TrainingStats::new();
        assert_eq!(stats.mean_payoff1(), 0.0);
        stats.hands = 1_000;
        stats.elapsed_seconds = 2.0;
        stats.total_payoff1 = -250;
        stats.update_rate();
        assert_eq!(stats.hands_per_second, 500.0);
        assert_eq!(stats.mean_payoff1(), -0.25);
    }
}
