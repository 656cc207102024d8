//! Epsilon-greedy learner over the arms of a [`PolicyTable`].
//!
//! An agent does not choose actions directly. For each card it picks one of
//! the fixed-probability arms (uniformly at random with probability
//! `epsilon`, otherwise the greedy arm) and then lets that arm's probability
//! decide between checking/folding and betting/calling.
//!
//! The arm that was picked travels back to the caller as a [`Decision`].
//! Handing that decision to [`Agent::reward`] together with the hand's payoff
//! folds the payoff into the arm's weighted running mean.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::bandit::config::AgentConfig;
use crate::bandit::table::{PolicyTable, TableExport, ARM_COUNT};
use crate::error::{SelfPlayError, SelfPlayResult};
use crate::games::kuhn::{Card, KuhnAction, Player};

static NEXT_AGENT_ID: AtomicU64 = AtomicU64::new(0);

fn next_agent_id() -> u64 {
    NEXT_AGENT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Whether rewards update the policy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Explore with probability epsilon and learn from rewards.
    #[default]
    Learning,
    /// Always play the greedy arm; rewards are ignored.
    Evaluating,
}

/// Record of one action, needed to credit the hand's payoff.
///
/// Not `Clone`: a decision can be rewarded at most once.
#[derive(Debug, PartialEq)]
pub struct Decision {
    agent: u64,
    card: Card,
    arm: usize,
    weight: f64,
}

impl Decision {
    /// Card the agent held.
    pub fn card(&self) -> Card {
        self.card
    }

    /// Index of the arm that was played.
    pub fn arm(&self) -> usize {
        self.arm
    }

    /// Selection mass the reward will be credited with: `epsilon / 101` for
    /// an exploring pick, `(1 - epsilon) / 101` for a greedy pick.
    pub fn weight(&self) -> f64 {
        self.weight
    }
}

/// A self-play learner.
#[derive(Debug)]
pub struct Agent<R: Rng = StdRng> {
    id: u64,
    epsilon: f64,
    mode: Mode,
    table: PolicyTable,
    rng: R,
}

impl Agent<StdRng> {
    /// Create an agent from configuration, seeding its RNG from
    /// `config.seed` or from entropy.
    pub fn from_config(config: &AgentConfig) -> SelfPlayResult<Self> {
        Agent::new(config.epsilon, config.rng())
    }
}

impl<R: Rng> Agent<R> {
    /// Create a learning agent with a zeroed table.
    ///
    /// # Errors
    /// [`SelfPlayError::InvalidEpsilon`] unless `0 <= epsilon <= 1`.
    pub fn new(epsilon: f64, rng: R) -> SelfPlayResult<Self> {
        Self::with_table(epsilon, PolicyTable::new(), rng)
    }

    fn with_table(epsilon: f64, table: PolicyTable, rng: R) -> SelfPlayResult<Self> {
        if !(0.0..=1.0).contains(&epsilon) {
            return Err(SelfPlayError::InvalidEpsilon(epsilon));
        }
        Ok(Self {
            id: next_agent_id(),
            epsilon,
            mode: Mode::Learning,
            table,
            rng,
        })
    }

    /// Process-unique identity stamped on every decision this agent makes.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Exploration rate.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch between learning and frozen evaluation.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Read-only view of the learned values.
    pub fn policy_table(&self) -> &PolicyTable {
        &self.table
    }

    /// Betting (or calling) probability of the current greedy arm.
    pub fn greedy_probability(&self, card: Card) -> f64 {
        self.table.greedy_probability(card)
    }

    /// Pick an arm for `card` and sample an action from it.
    pub fn action(&mut self, card: Card) -> (KuhnAction, Decision) {
        let explore = self.mode == Mode::Learning && self.rng.gen::<f64>() < self.epsilon;

        let (arm, weight) = if explore {
            (self.table.random_arm(&mut self.rng), self.epsilon / ARM_COUNT as f64)
        } else {
            (self.table.greedy(card), (1.0 - self.epsilon) / ARM_COUNT as f64)
        };

        let probability = self.table.arm(card, arm).probability();
        let action = if self.rng.gen::<f64>() < probability {
            KuhnAction::BetOrCall
        } else {
            KuhnAction::CheckOrFold
        };

        let decision = Decision {
            agent: self.id,
            card,
            arm,
            weight,
        };
        (action, decision)
    }

    /// Credit `reward` to the arm recorded in `decision`.
    ///
    /// Does nothing while evaluating. Decisions carrying zero mass leave the
    /// arm untouched.
    ///
    /// # Errors
    /// [`SelfPlayError::ForeignDecision`] if `decision` came from another
    /// agent.
    pub fn reward(&mut self, decision: Decision, reward: f64) -> SelfPlayResult<()> {
        if decision.agent != self.id {
            return Err(SelfPlayError::ForeignDecision {
                issued_by: decision.agent,
                rewarded_on: self.id,
            });
        }
        if self.mode == Mode::Evaluating {
            return Ok(());
        }

        debug_assert!(decision.arm < ARM_COUNT);
        self.table
            .arm_mut(decision.card, decision.arm)
            .credit(reward, decision.weight);
        Ok(())
    }

    /// Copy of this agent's policy driven by a different RNG.
    ///
    /// The fork gets its own identity, so decisions never cross between the
    /// two.
    pub fn fork<S: Rng>(&self, rng: S) -> Agent<S> {
        Agent {
            id: next_agent_id(),
            epsilon: self.epsilon,
            mode: self.mode,
            table: self.table.clone(),
            rng,
        }
    }

    /// Export agent state for checkpointing.
    pub fn export(&self) -> AgentState {
        AgentState {
            epsilon: self.epsilon,
            mode: self.mode,
            table: self.table.export(),
        }
    }

    /// Rebuild an agent from a checkpoint.
    pub fn import(state: AgentState, rng: R) -> SelfPlayResult<Self> {
        let table = PolicyTable::import(state.table)?;
        let mut agent = Self::with_table(state.epsilon, table, rng)?;
        agent.mode = state.mode;
        Ok(agent)
    }
}

impl<R: Rng> Player for Agent<R> {
    type Decision = Decision;

    fn act(&mut self, card: Card) -> (KuhnAction, Decision) {
        self.action(card)
    }
}

/// Serializable agent state for checkpointing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    /// Exploration rate.
    pub epsilon: f64,
    /// Mode at export time.
    pub mode: Mode,
    /// Learned table.
    pub table: TableExport,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    fn agent(epsilon: f64, seed: u64) -> Agent {
        Agent::new(epsilon, StdRng::seed_from_u64(seed)).unwrap()
    }

    fn snapshot(agent: &Agent) -> Vec<(u64, u64)> {
        Card::ALL
            .iter()
            .flat_map(|&card| agent.policy_table().arms(card).to_vec())
            .map(|arm| (arm.value.to_bits(), arm.weight.to_bits()))
            .collect()
    }

    #[test]
    fn test_rejects_bad_epsilon() {
        for epsilon in [-0.1, 1.1, f64::NAN] {
            assert!(matches!(
                Agent::new(epsilon, StdRng::seed_from_u64(0)),
                Err(SelfPlayError::InvalidEpsilon(_))
            ));
        }
        assert!(Agent::new(0.0, StdRng::seed_from_u64(0)).is_ok());
        assert!(Agent::new(1.0, StdRng::seed_from_u64(0)).is_ok());
    }

    #[test]
    fn test_greedy_pick_on_fresh_table() {
        // Fresh table: greedy arm 0 never bets
        let mut agent = agent(0.0, 1);
        for card in Card::ALL {
            for _ in 0..50 {
                let (action, decision) = agent.action(card);
                assert_eq!(action, KuhnAction::CheckOrFold);
                assert_eq!(decision.arm(), 0);
                assert_eq!(decision.card(), card);
                assert_relative_eq!(decision.weight(), 1.0 / 101.0);
            }
        }
    }

    #[test]
    fn test_exploring_pick_weight() {
        let mut agent = agent(1.0, 2);
        let mut arms = std::collections::BTreeSet::new();
        for _ in 0..2_000 {
            let (_, decision) = agent.action(Card::King);
            assert_relative_eq!(decision.weight(), 1.0 / 101.0);
            arms.insert(decision.arm());
        }
        // Uniform over 101 arms, so nearly all of them show up
        assert!(arms.len() > 95);
    }

    #[test]
    fn test_branch_weights_with_mixed_epsilon() {
        let mut agent = agent(0.3, 3);
        let explore = 0.3 / 101.0;
        let exploit = 0.7 / 101.0;
        let (mut explored, mut exploited) = (0, 0);

        for _ in 0..5_000 {
            let (_, decision) = agent.action(Card::Queen);
            if decision.weight() == explore {
                explored += 1;
            } else {
                assert_eq!(decision.weight(), exploit);
                assert_eq!(decision.arm(), 0);
                exploited += 1;
            }
        }
        assert!(explored > 1_200 && explored < 1_800, "explored {}", explored);
        assert_eq!(explored + exploited, 5_000);
    }

    #[test]
    fn test_action_follows_arm_probability() {
        let mut agent = agent(0.0, 4);
        // Make arm 100 (always bet) the greedy arm for King
        agent.table.arm_mut(Card::King, 100).value = 1.0;
        for _ in 0..100 {
            assert_eq!(agent.action(Card::King).0, KuhnAction::BetOrCall);
        }

        // Arm 50 bets about half the time
        agent.table.arm_mut(Card::Jack, 50).value = 1.0;
        let bets = (0..4_000)
            .filter(|_| agent.action(Card::Jack).0 == KuhnAction::BetOrCall)
            .count();
        assert!(bets > 1_800 && bets < 2_200, "bets {}", bets);
    }

    #[test]
    fn test_single_reward_sets_value() {
        let mut agent = agent(0.1, 5);
        let (_, decision) = agent.action(Card::Jack);
        let (card, arm, weight) = (decision.card(), decision.arm(), decision.weight());

        agent.reward(decision, -2.0).unwrap();
        let updated = agent.policy_table().arm(card, arm);
        assert_eq!(updated.value, -2.0);
        assert_eq!(updated.weight, weight);
    }

    #[test]
    fn test_weight_is_monotone_while_learning() {
        let mut agent = agent(0.5, 6);
        let mut rng = StdRng::seed_from_u64(60);
        let mut before = snapshot(&agent);

        for _ in 0..2_000 {
            let card = Card::ALL[rng.gen_range(0..3)];
            let (_, decision) = agent.action(card);
            let reward = f64::from(rng.gen_range(-2i32..=2));
            agent.reward(decision, reward).unwrap();

            let after = snapshot(&agent);
            for ((_, w0), (_, w1)) in before.iter().zip(after.iter()) {
                assert!(f64::from_bits(*w1) >= f64::from_bits(*w0));
            }
            before = after;
        }
    }

    #[test]
    fn test_evaluation_freezes_table() {
        let mut agent = agent(0.5, 7);
        for _ in 0..500 {
            let (_, decision) = agent.action(Card::Queen);
            agent.reward(decision, 1.0).unwrap();
        }

        agent.set_mode(Mode::Evaluating);
        let frozen = snapshot(&agent);
        let greedy = agent.policy_table().greedy(Card::Queen);

        for i in 0..1_000 {
            let card = Card::ALL[i % 3];
            let (_, decision) = agent.action(card);
            // Evaluation always plays the greedy arm
            assert_eq!(decision.arm(), agent.policy_table().greedy(card));
            agent.reward(decision, 2.0).unwrap();
        }
        assert_eq!(snapshot(&agent), frozen);
        assert_eq!(agent.policy_table().greedy(Card::Queen), greedy);

        agent.set_mode(Mode::Learning);
        let (_, decision) = agent.action(Card::Queen);
        agent.reward(decision, 2.0).unwrap();
        assert_ne!(snapshot(&agent), frozen);
    }

    #[test]
    fn test_foreign_decision_rejected() {
        let mut a = agent(0.1, 8);
        let mut b = agent(0.1, 9);

        let (_, decision) = a.action(Card::King);
        let before = snapshot(&b);
        let err = b.reward(decision, 1.0).unwrap_err();
        assert!(matches!(err, SelfPlayError::ForeignDecision { .. }));
        assert_eq!(snapshot(&b), before);
    }

    #[test]
    fn test_zero_mass_decision_is_ignored() {
        // epsilon = 1 while evaluating yields a greedy pick with no mass
        let mut agent = agent(1.0, 10);
        agent.set_mode(Mode::Evaluating);
        let (_, decision) = agent.action(Card::Jack);
        assert_eq!(decision.weight(), 0.0);

        agent.set_mode(Mode::Learning);
        agent.reward(decision, 1.0).unwrap();
        let arm = agent.policy_table().arm(Card::Jack, 0);
        assert_eq!((arm.value, arm.weight), (0.0, 0.0));
    }

    #[test]
    fn test_fork_and_checkpoint() {
        let mut agent = agent(0.2, 11);
        for _ in 0..300 {
            let (_, decision) = agent.action(Card::King);
            agent.reward(decision, 1.0).unwrap();
        }
        agent.set_mode(Mode::Evaluating);

        let fork = agent.fork(StdRng::seed_from_u64(12));
        assert_ne!(fork.id(), agent.id());
        assert_eq!(fork.policy_table(), agent.policy_table());
        assert_eq!(fork.mode(), Mode::Evaluating);

        let json = serde_json::to_string(&agent.export()).unwrap();
        let state: AgentState = serde_json::from_str(&json).unwrap();
        let restored = Agent::import(state, StdRng::seed_from_u64(13)).unwrap();
        assert_eq!(restored.epsilon(), 0.2);
        assert_eq!(restored.mode(), Mode::Evaluating);
        for card in Card::ALL {
            assert_eq!(restored.greedy_probability(card), agent.greedy_probability(card));
        }
    }
}
