//! Per-card table of discretized policy arms.
//!
//! Each card owns [`ARM_COUNT`] arms. Arm `i` stands for the fixed
//! stochastic policy "bet (or call) with probability `i / 100`" and carries
//! a running estimate of the reward that policy earns.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{SelfPlayError, SelfPlayResult};
use crate::games::kuhn::Card;

/// Number of arms per card, covering probabilities 0.00 to 1.00.
pub const ARM_COUNT: usize = 101;

/// One fixed-probability candidate policy for a card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arm {
    probability: f64,
    /// Weighted running mean of the rewards credited to this arm.
    pub value: f64,
    /// Cumulative selection mass credited to this arm. Never decreases.
    pub weight: f64,
}

impl Arm {
    fn at(index: usize) -> Self {
        Self {
            probability: grid_probability(index),
            value: 0.0,
            weight: 0.0,
        }
    }

    /// Probability of betting (or calling) when this arm is played.
    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Fold one reward into the running mean with selection mass `weight`.
    pub(crate) fn credit(&mut self, reward: f64, weight: f64) {
        if weight <= 0.0 {
            return;
        }
        self.weight += weight;
        self.value += (reward - self.value) * weight / self.weight;
    }
}

// Text round trips may move a float by an ulp.
const GRID_TOLERANCE: f64 = 1e-9;

fn grid_probability(index: usize) -> f64 {
    index as f64 / 100.0
}

/// Arms for every card, all starting at value 0 and weight 0.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyTable {
    arms: [Vec<Arm>; 3],
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyTable {
    /// Fresh table with the full probability grid for each card.
    pub fn new() -> Self {
        let row = || (0..ARM_COUNT).map(Arm::at).collect::<Vec<_>>();
        Self {
            arms: [row(), row(), row()],
        }
    }

    /// All arms of one card, indexed by arm number.
    pub fn arms(&self, card: Card) -> &[Arm] {
        &self.arms[card.index()]
    }

    /// A single arm.
    ///
    /// # Panics
    /// If `index >= ARM_COUNT`.
    pub fn arm(&self, card: Card, index: usize) -> &Arm {
        &self.arms[card.index()][index]
    }

    pub(crate) fn arm_mut(&mut self, card: Card, index: usize) -> &mut Arm {
        &mut self.arms[card.index()][index]
    }

    /// Index of the arm with the greatest value.
    ///
    /// Ties go to the lowest index: a later arm has to be strictly better to
    /// replace the running best.
    pub fn greedy(&self, card: Card) -> usize {
        let arms = self.arms(card);
        let mut best = 0;
        for (i, arm) in arms.iter().enumerate() {
            if arm.value > arms[best].value {
                best = i;
            }
        }
        best
    }

    /// Probability attached to the current greedy arm.
    pub fn greedy_probability(&self, card: Card) -> f64 {
        self.arm(card, self.greedy(card)).probability
    }

    /// Uniformly random arm index in `0..ARM_COUNT`.
    pub fn random_arm<R: Rng>(&self, rng: &mut R) -> usize {
        rng.gen_range(0..ARM_COUNT)
    }

    /// Export table to serializable format.
    pub fn export(&self) -> TableExport {
        TableExport {
            arms: self.arms.iter().cloned().collect(),
        }
    }

    /// Import table from serialized format.
    ///
    /// Rejects anything that is not three cards of [`ARM_COUNT`] arms on the
    /// `i / 100` probability grid, or that holds a negative or non-finite
    /// weight.
    pub fn import(data: TableExport) -> SelfPlayResult<Self> {
        let mut rows: [Vec<Arm>; 3] = data.arms.try_into().map_err(|rows: Vec<Vec<Arm>>| {
            SelfPlayError::CorruptTable(format!("expected 3 cards, found {}", rows.len()))
        })?;

        for (card, row) in rows.iter_mut().enumerate() {
            if row.len() != ARM_COUNT {
                return Err(SelfPlayError::CorruptTable(format!(
                    "card {} has {} arms, expected {}",
                    card,
                    row.len(),
                    ARM_COUNT
                )));
            }
            for (i, arm) in row.iter_mut().enumerate() {
                if (arm.probability - grid_probability(i)).abs() > GRID_TOLERANCE {
                    return Err(SelfPlayError::CorruptTable(format!(
                        "card {} arm {} has probability {}",
                        card, i, arm.probability
                    )));
                }
                if !arm.weight.is_finite() || arm.weight < 0.0 || !arm.value.is_finite() {
                    return Err(SelfPlayError::CorruptTable(format!(
                        "card {} arm {} has value {} and weight {}",
                        card, i, arm.value, arm.weight
                    )));
                }
                arm.probability = grid_probability(i);
            }
        }

        Ok(Self { arms: rows })
    }
}

/// Serializable export format for a policy table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableExport {
    /// Arms per card, Jack first.
    pub arms: Vec<Vec<Arm>>,
}
