//! Read-only reporting on agent policies.
//!
//! Nothing here mutates an agent. The JSON files written by
//! [`LearningCurve::save_json`] and [`ValueFunction::save_json`] carry the
//! data needed to plot how the greedy policy evolves and what the learned
//! value-versus-probability curve looks like for each card.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::bandit::{Agent, PolicyTable};
use crate::error::SelfPlayResult;
use crate::games::kuhn::Card;

/// Equilibrium betting probability of Player 1 per card (J, Q, K) in this
/// variant, where Player 2 never gets to bet after a check.
pub const REFERENCE_BET: [f64; 3] = [1.0 / 3.0, 0.0, 1.0];

/// Equilibrium calling probability of Player 2 per card (J, Q, K).
pub const REFERENCE_CALL: [f64; 3] = [0.0, 1.0 / 3.0, 1.0];

/// Player 1's expected payoff per hand at equilibrium.
pub const REFERENCE_VALUE: f64 = 1.0 / 18.0;

fn write_json<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> SelfPlayResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

/// Greedy probability per card sampled over the course of training.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningCurve {
    /// What the probability is the probability of ("betting", "calling").
    pub action_name: String,
    /// Hand index of each sample.
    pub episodes: Vec<u64>,
    /// One series per card, Jack first, aligned with `episodes`.
    pub probabilities: [Vec<f64>; 3],
}

impl LearningCurve {
    /// Empty curve for the given action label.
    pub fn new(action_name: &str) -> Self {
        Self {
            action_name: action_name.to_string(),
            ..Default::default()
        }
    }

    /// Append the agent's current greedy probabilities.
    pub fn log<R: Rng>(&mut self, episode: u64, agent: &Agent<R>) {
        for card in Card::ALL {
            self.probabilities[card.index()].push(agent.greedy_probability(card));
        }
        self.episodes.push(episode);
    }

    /// Number of samples recorded.
    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    /// True before the first sample.
    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    /// Most recent sample for `card`.
    pub fn latest(&self, card: Card) -> Option<f64> {
        self.probabilities[card.index()].last().copied()
    }

    /// Write the curve as pretty JSON.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> SelfPlayResult<()> {
        write_json(self, path)
    }
}

/// Learned value of every arm for one card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardValues {
    /// Card the curve belongs to.
    pub card: Card,
    /// Arm probabilities, 0.00 to 1.00.
    pub probabilities: Vec<f64>,
    /// Arm value estimates, aligned with `probabilities`.
    pub values: Vec<f64>,
}

/// Value-versus-probability curves of one player, for every card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueFunction {
    /// Seat number, 1 or 2.
    pub player: u8,
    /// Axis label ("betting" or "calling").
    pub action_name: String,
    /// One curve per card.
    pub cards: Vec<CardValues>,
}

impl ValueFunction {
    /// Capture the current values of a policy table.
    pub fn from_table(player: u8, action_name: &str, table: &PolicyTable) -> Self {
        let cards = Card::ALL
            .iter()
            .map(|&card| {
                let arms = table.arms(card);
                CardValues {
                    card,
                    probabilities: arms.iter().map(|arm| arm.probability()).collect(),
                    values: arms.iter().map(|arm| arm.value).collect(),
                }
            })
            .collect();

        Self {
            player,
            action_name: action_name.to_string(),
            cards,
        }
    }

    /// Write the curves as pretty JSON.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> SelfPlayResult<()> {
        write_json(self, path)
    }
}

/// Print greedy probabilities beside the equilibrium reference.
pub fn print_policies<R: Rng>(agent1: &Agent<R>, agent2: &Agent<R>) {
    println!("\n========================================");
    println!("  Greedy policies");
    println!("========================================");
    println!("  {:<8} {:>10} {:>10} {:>10} {:>10}", "Card", "P1 bet", "(ref)", "P2 call", "(ref)");
    for card in Card::ALL {
        let i = card.index();
        println!(
            "  {:<8} {:>10.2} {:>10.2} {:>10.2} {:>10.2}",
            card.name(),
            agent1.greedy_probability(card),
            REFERENCE_BET[i],
            agent2.greedy_probability(card),
            REFERENCE_CALL[i]
        );
    }
}
