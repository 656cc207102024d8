//! Epsilon-greedy bandit over fixed-probability policies.
//!
//! # Overview
//!
//! Every card gets a grid of 101 arms. Arm `i` is the stochastic policy
//! "bet (or call) with probability `i / 100`". The agent treats the arms
//! as a multi-armed bandit:
//!
//! 1. With probability `epsilon` it plays a uniformly random arm, otherwise
//!    the arm with the highest value estimate (lowest index on ties)
//! 2. The chosen arm's probability then randomizes the actual game action
//! 3. The hand's payoff is folded into the arm's value estimate
//!
//! # Update rule
//!
//! ```text
//! weight += w
//! value  += (reward - value) * w / weight
//! ```
//!
//! where `w` is `epsilon / 101` for an exploring pick and
//! `(1 - epsilon) / 101` for a greedy pick. The first reward credited to an
//! arm therefore sets its value exactly.
//!
//! # Example
//!
//! ```
//! use kuhn_selfplay::bandit::Agent;
//! use kuhn_selfplay::games::kuhn::Card;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut agent = Agent::new(0.1, StdRng::seed_from_u64(1)).unwrap();
//! let (_action, decision) = agent.action(Card::King);
//! agent.reward(decision, 1.0).unwrap();
//! ```

pub mod agent;
pub mod config;
pub mod table;

pub use agent::{Agent, AgentState, Decision, Mode};
pub use config::{AgentConfig, DEFAULT_EPSILON};
pub use table::{Arm, PolicyTable, TableExport, ARM_COUNT};
