//! Self-play training and reporting.
//!
//! The [`Trainer`] owns two [`Agent`](crate::bandit::Agent)s and a
//! [`KuhnEngine`](crate::games::kuhn::KuhnEngine) and runs the loop:
//!
//! 1. Deal and resolve a hand
//! 2. Reward Player 1 with its payoff
//! 3. Reward Player 2 only if it acted (Player 1 bet)
//! 4. Every `log_interval` hands, sample both learning curves
//! 5. With `interleave` on, every `learning_interval` hands swap which
//!    agent learns while the other stays frozen
//!
//! Telemetry reads agents and writes JSON; it never changes them.

pub mod config;
pub mod telemetry;
pub mod trainer;

pub use config::{TrainingConfig, TrainingStats};
pub use telemetry::{CardValues, LearningCurve, ValueFunction};
pub use trainer::{EvaluationReport, Seat, Trainer, TrainerState};
