//! # Kuhn Self-Play
//!
//! Two agents learn to play a simplified Kuhn Poker by playing against each
//! other. Each agent is an epsilon-greedy bandit over a grid of
//! fixed-probability policies, one grid per card, updated by a weighted
//! running average of the payoffs it receives.
//!
//! This is a stochastic-approximation learner, not an equilibrium solver:
//! how close it gets to the equilibrium is an empirical question.
//!
//! ## Quick Start
//!
//! ```
//! use kuhn_selfplay::training::{Trainer, TrainingConfig};
//! use kuhn_selfplay::games::kuhn::Card;
//!
//! let config = TrainingConfig::default().with_seed(42);
//! let mut trainer = Trainer::new(config).unwrap();
//! trainer.train(10_000).unwrap();
//!
//! let king_bet = trainer.agent1().greedy_probability(Card::King);
//! assert!((0.0..=1.0).contains(&king_bet));
//! ```
//!
//! ## Modules
//!
//! - [`games`]: Kuhn Poker dealing and hand resolution
//! - [`bandit`]: policy table and epsilon-greedy agent
//! - [`training`]: self-play loop, evaluation, checkpoints, telemetry
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Trainer (self-play loop)                    │
//! │  - Reward routing         - Learning curves / value functions   │
//! │  - Interleaved learning   - Evaluation / checkpoints            │
//! └─────────────────────────────────────────────────────────────────┘
//!                  │                               │
//!                  ▼                               ▼
//!          ┌──────────────┐   Player trait  ┌──────────────┐
//!          │    Agent     │◀────────────────│  KuhnEngine  │
//!          │ (PolicyTable)│                 │ (deal, play) │
//!          └──────────────┘                 └──────────────┘
//! ```

#![warn(missing_docs)]

/// Epsilon-greedy bandit agent and its policy table.
pub mod bandit;

/// Crate error type.
pub mod error;

/// Game implementations module.
pub mod games;

/// Self-play training loop and telemetry.
pub mod training;

// Re-export commonly used types at crate root for convenience
pub use bandit::{Agent, AgentConfig, Decision, Mode, PolicyTable};
pub use error::{SelfPlayError, SelfPlayResult};
pub use games::kuhn::{Card, KuhnAction, KuhnEngine, Outcome};
pub use training::{Trainer, TrainingConfig, TrainingStats};
