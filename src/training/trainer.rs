//! Self-play driver.
//!
//! Plays hands strictly one after another. Each hand is dealt, played,
//! and credited to the agents that acted before the next one starts.

use std::fs;
use std::path::Path;
use std::time::Instant;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::bandit::{Agent, AgentState, Mode};
use crate::error::SelfPlayResult;
use crate::games::kuhn::{KuhnEngine, Outcome, Terminal};
use crate::training::config::{TrainingConfig, TrainingStats};
use crate::training::telemetry::{self, LearningCurve, ValueFunction};

/// Hands per rayon task in [`Trainer::evaluate_parallel`].
const EVAL_CHUNK: u64 = 10_000;

/// Seat of an agent at the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Seat {
    /// Acts first, checks or bets.
    First,
    /// Acts only after a bet, folds or calls.
    Second,
}

impl Seat {
    fn other(self) -> Seat {
        match self {
            Seat::First => Seat::Second,
            Seat::Second => Seat::First,
        }
    }
}

/// Payoffs and leaf counts of a batch of frozen-policy hands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Hands played.
    pub hands: u64,
    /// Sum of Player 1's payoffs.
    pub total_payoff1: i64,
    /// How many hands ended in each terminal.
    pub terminals: FxHashMap<Terminal, u64>,
}

impl EvaluationReport {
    fn record(&mut self, outcome: &Outcome) {
        self.hands += 1;
        self.total_payoff1 += i64::from(outcome.payoff1);
        *self.terminals.entry(outcome.terminal).or_default() += 1;
    }

    /// Combine two reports.
    pub fn merge(mut self, other: EvaluationReport) -> EvaluationReport {
        self.hands += other.hands;
        self.total_payoff1 += other.total_payoff1;
        for (terminal, count) in other.terminals {
            *self.terminals.entry(terminal).or_default() += count;
        }
        self
    }

    /// Player 1's mean payoff per hand.
    pub fn mean_payoff1(&self) -> f64 {
        if self.hands == 0 {
            0.0
        } else {
            self.total_payoff1 as f64 / self.hands as f64
        }
    }

    /// Player 2's mean payoff per hand.
    pub fn mean_payoff2(&self) -> f64 {
        -self.mean_payoff1()
    }

    /// Share of hands that ended in `terminal`.
    pub fn frequency(&self, terminal: Terminal) -> f64 {
        if self.hands == 0 {
            return 0.0;
        }
        self.terminals.get(&terminal).copied().unwrap_or(0) as f64 / self.hands as f64
    }
}

/// Two agents, a dealer, and the bookkeeping of a training run.
///
/// # Example
/// ```
/// use kuhn_selfplay::training::{Trainer, TrainingConfig};
///
/// let config = TrainingConfig::default().with_seed(1);
/// let mut trainer = Trainer::new(config).unwrap();
/// let stats = trainer.train(1_000).unwrap();
/// assert_eq!(stats.hands, 1_000);
/// ```
#[derive(Debug)]
pub struct Trainer {
    config: TrainingConfig,
    engine: KuhnEngine,
    agent1: Agent,
    agent2: Agent,
    hands_played: u64,
    learner: Seat,
    curve1: LearningCurve,
    curve2: LearningCurve,
    stats: TrainingStats,
}

impl Trainer {
    /// Create a trainer with fresh agents.
    pub fn new(config: TrainingConfig) -> SelfPlayResult<Self> {
        config.validate()?;
        let agent1 = Agent::from_config(&config.agent1())?;
        let agent2 = Agent::from_config(&config.agent2())?;
        let engine = KuhnEngine::new(config.dealer_rng());

        Ok(Self {
            config,
            engine,
            agent1,
            agent2,
            hands_played: 0,
            learner: Seat::First,
            curve1: LearningCurve::new("betting"),
            curve2: LearningCurve::new("calling"),
            stats: TrainingStats::new(),
        })
    }

    /// Play one hand and credit its payoff.
    ///
    /// Player 1 is always rewarded. Player 2 is rewarded only when Player 1
    /// bet, since that is the only time Player 2 acts.
    pub fn play_hand(&mut self) -> SelfPlayResult<Outcome> {
        let hand = self.engine.resolve_hand(&mut self.agent1, &mut self.agent2);
        let outcome = hand.outcome;

        self.agent1.reward(hand.first, f64::from(outcome.payoff1))?;
        if let Some(decision) = hand.second {
            self.agent2.reward(decision, f64::from(outcome.payoff2))?;
        }

        let game = self.hands_played;
        if game % self.config.log_interval == 0 {
            self.curve1.log(game, &self.agent1);
            self.curve2.log(game, &self.agent2);
        }
        if self.config.interleave && game % self.config.learning_interval == 0 {
            self.switch_learner();
        }

        self.hands_played += 1;
        self.stats.hands = self.hands_played;
        self.stats.total_payoff1 += i64::from(outcome.payoff1);
        if outcome.p2_acted {
            self.stats.p2_decisions += 1;
        }
        Ok(outcome)
    }

    fn switch_learner(&mut self) {
        self.learner = self.learner.other();
        let (learning, frozen) = match self.learner {
            Seat::First => (&mut self.agent1, &mut self.agent2),
            Seat::Second => (&mut self.agent2, &mut self.agent1),
        };
        learning.set_mode(Mode::Learning);
        frozen.set_mode(Mode::Evaluating);
        debug!("{:<32}{:?}", "switching learner", self.learner);
    }

    /// Train for a number of hands.
    pub fn train(&mut self, hands: u64) -> SelfPlayResult<&TrainingStats> {
        self.train_with_callback(hands, u64::MAX, |_| {})
    }

    /// Train with a callback for progress tracking.
    ///
    /// # Arguments
    /// * `hands` - Number of hands to play
    /// * `callback_interval` - How often to call the callback
    /// * `callback` - Function called every `callback_interval` hands
    pub fn train_with_callback<F>(
        &mut self,
        hands: u64,
        callback_interval: u64,
        mut callback: F,
    ) -> SelfPlayResult<&TrainingStats>
    where
        F: FnMut(&TrainingStats),
    {
        info!("{:<32}{:<16}{}", "training", hands, "hands");
        let start_time = Instant::now();
        let elapsed_before = self.stats.elapsed_seconds;
        let interval = callback_interval.max(1);

        for i in 0..hands {
            self.play_hand()?;

            if (i + 1) % interval == 0 {
                self.stats.elapsed_seconds = elapsed_before + start_time.elapsed().as_secs_f64();
                self.stats.update_rate();
                debug!(
                    "{:<32}{:<16}{:.4}",
                    "hands / mean payoff",
                    self.hands_played,
                    self.stats.mean_payoff1()
                );
                callback(&self.stats);
            }
        }

        self.stats.elapsed_seconds = elapsed_before + start_time.elapsed().as_secs_f64();
        self.stats.update_rate();
        info!(
            "{:<32}{:<16}{:.0} hands/s",
            "finished training", self.hands_played, self.stats.hands_per_second
        );
        Ok(&self.stats)
    }

    /// Play `hands` hands with both policies frozen.
    ///
    /// Agents are put in evaluation mode for the duration and their previous
    /// modes restored afterwards, so the tables are left untouched.
    pub fn evaluate(&mut self, hands: u64) -> EvaluationReport {
        let modes = (self.agent1.mode(), self.agent2.mode());
        self.agent1.set_mode(Mode::Evaluating);
        self.agent2.set_mode(Mode::Evaluating);

        let mut report = EvaluationReport::default();
        for _ in 0..hands {
            let hand = self.engine.resolve_hand(&mut self.agent1, &mut self.agent2);
            report.record(&hand.outcome);
        }

        self.agent1.set_mode(modes.0);
        self.agent2.set_mode(modes.1);
        report
    }

    /// Same as [`Trainer::evaluate`], spread across the rayon pool.
    ///
    /// Each chunk plays forked copies of the agents with RNGs derived from
    /// `seed` and the chunk index, so the report does not depend on the
    /// number of threads.
    pub fn evaluate_parallel(&self, hands: u64, seed: u64) -> EvaluationReport {
        let chunks = hands.div_ceil(EVAL_CHUNK);

        (0..chunks)
            .into_par_iter()
            .map(|chunk| {
                let base = seed.wrapping_add(chunk.wrapping_mul(3));
                let mut p1 = self.agent1.fork(StdRng::seed_from_u64(base));
                let mut p2 = self.agent2.fork(StdRng::seed_from_u64(base.wrapping_add(1)));
                let mut engine = KuhnEngine::new(StdRng::seed_from_u64(base.wrapping_add(2)));
                p1.set_mode(Mode::Evaluating);
                p2.set_mode(Mode::Evaluating);

                let count = EVAL_CHUNK.min(hands - chunk * EVAL_CHUNK);
                let mut report = EvaluationReport::default();
                for _ in 0..count {
                    report.record(&engine.resolve_hand(&mut p1, &mut p2).outcome);
                }
                report
            })
            .reduce(EvaluationReport::default, EvaluationReport::merge)
    }

    /// Hands played so far, across resumes.
    pub fn hands_played(&self) -> u64 {
        self.hands_played
    }

    /// Seat that learns under interleaving.
    pub fn learner(&self) -> Seat {
        self.learner
    }

    /// Player 1.
    pub fn agent1(&self) -> &Agent {
        &self.agent1
    }

    /// Player 2.
    pub fn agent2(&self) -> &Agent {
        &self.agent2
    }

    /// Get mutable access to an agent, e.g. to change its mode.
    pub fn agent_mut(&mut self, seat: Seat) -> &mut Agent {
        match seat {
            Seat::First => &mut self.agent1,
            Seat::Second => &mut self.agent2,
        }
    }

    /// Player 1's learning curve.
    pub fn curve1(&self) -> &LearningCurve {
        &self.curve1
    }

    /// Player 2's learning curve.
    pub fn curve2(&self) -> &LearningCurve {
        &self.curve2
    }

    /// Value functions of both players.
    pub fn value_functions(&self) -> [ValueFunction; 2] {
        [
            ValueFunction::from_table(1, &self.curve1.action_name, self.agent1.policy_table()),
            ValueFunction::from_table(2, &self.curve2.action_name, self.agent2.policy_table()),
        ]
    }

    /// Get statistics.
    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    /// Get configuration.
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Write learning curves and value functions into `dir`.
    pub fn save_telemetry<P: AsRef<Path>>(&self, dir: P) -> SelfPlayResult<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        self.curve1.save_json(dir.join("p1_policy.json"))?;
        self.curve2.save_json(dir.join("p2_policy.json"))?;
        for values in self.value_functions() {
            values.save_json(dir.join(format!("player{}_values.json", values.player)))?;
        }
        info!("{:<32}{}", "saved telemetry", dir.display());
        Ok(())
    }

    /// Print a summary of the run.
    pub fn print_summary(&self) {
        telemetry::print_policies(&self.agent1, &self.agent2);
        println!();
        println!("  Hands played:       {}", self.hands_played);
        println!("  P1 mean payoff:     {:+.4} (ref {:+.4})", self.stats.mean_payoff1(), telemetry::REFERENCE_VALUE);
        println!("  P2 decisions:       {}", self.stats.p2_decisions);
        println!("  Speed:              {:.0} hands/s", self.stats.hands_per_second);
    }

    /// Export trainer state for checkpointing.
    pub fn export_state(&self) -> TrainerState {
        TrainerState {
            config: self.config.clone(),
            hands_played: self.hands_played,
            learner: self.learner,
            agent1: self.agent1.export(),
            agent2: self.agent2.export(),
            curve1: self.curve1.clone(),
            curve2: self.curve2.clone(),
            stats: self.stats.clone(),
        }
    }

    /// Rebuild a trainer from a checkpoint.
    ///
    /// Seeded runs reseed every stream from the seed and the hand count, so a
    /// resumed run does not replay the cards it already saw.
    pub fn import_state(state: TrainerState) -> SelfPlayResult<Self> {
        let mut config = state.config;
        config.validate()?;
        let original_seed = config.seed;
        config.seed = original_seed.map(|seed| seed.wrapping_add(state.hands_played));

        let agent1 = Agent::import(state.agent1, config.agent1().rng())?;
        let agent2 = Agent::import(state.agent2, config.agent2().rng())?;
        let engine = KuhnEngine::new(config.dealer_rng());
        config.seed = original_seed;

        Ok(Self {
            config,
            engine,
            agent1,
            agent2,
            hands_played: state.hands_played,
            learner: state.learner,
            curve1: state.curve1,
            curve2: state.curve2,
            stats: state.stats,
        })
    }

    /// Save a checkpoint as pretty JSON.
    pub fn save_checkpoint<P: AsRef<Path>>(&self, path: P) -> SelfPlayResult<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&self.export_state())?;
        fs::write(path, json)?;
        info!("{:<32}{}", "saved checkpoint", path.display());
        Ok(())
    }

    /// Load a checkpoint written by [`Trainer::save_checkpoint`].
    pub fn load_checkpoint<P: AsRef<Path>>(path: P) -> SelfPlayResult<Self> {
        let path = path.as_ref();
        info!("{:<32}{}", "loading checkpoint", path.display());
        let content = fs::read_to_string(path)?;
        let state: TrainerState = serde_json::from_str(&content)?;
        Self::import_state(state)
    }
}

/// Serializable trainer state for checkpointing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerState {
    /// Run configuration.
    pub config: TrainingConfig,
    /// Hands played.
    pub hands_played: u64,
    /// Which seat learns under interleaving.
    pub learner: Seat,
    /// Player 1.
    pub agent1: AgentState,
    /// Player 2.
    pub agent2: AgentState,
    /// Player 1's learning curve.
    pub curve1: LearningCurve,
    /// Player 2's learning curve.
    pub curve2: LearningCurve,
    /// Statistics.
    pub stats: TrainingStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::kuhn::Card;

    fn trainer(seed: u64) -> Trainer {
        Trainer::new(TrainingConfig::default().with_seed(seed)).unwrap()
    }

    fn total_weight(agent: &Agent) -> f64 {
        Card::ALL
            .iter()
            .flat_map(|&card| agent.policy_table().arms(card))
            .map(|arm| arm.weight)
            .sum()
    }

    #[test]
    fn test_play_hand_zero_sum_and_stats() {
        let mut trainer = trainer(1);
        let mut total = 0i64;
        let mut p2_acted = 0u64;
        for _ in 0..2_000 {
            let outcome = trainer.play_hand().unwrap();
            assert_eq!(outcome.payoff1 + outcome.payoff2, 0);
            total += i64::from(outcome.payoff1);
            p2_acted += u64::from(outcome.p2_acted);
        }
        assert_eq!(trainer.hands_played(), 2_000);
        assert_eq!(trainer.stats().total_payoff1, total);
        assert_eq!(trainer.stats().p2_decisions, p2_acted);
    }

    #[test]
    fn test_learning_curve_cadence() {
        let mut trainer = Trainer::new(TrainingConfig::default().with_seed(2).with_log_interval(100)).unwrap();
        trainer.train(1_050).unwrap();
        // Samples at hands 0, 100, ..., 1000
        assert_eq!(trainer.curve1().len(), 11);
        assert_eq!(trainer.curve2().len(), 11);
        assert_eq!(trainer.curve1().episodes[10], 1_000);
        assert_eq!(trainer.curve2().action_name, "calling");
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let mut a = trainer(3);
        let mut b = trainer(3);
        a.train(3_000).unwrap();
        b.train(3_000).unwrap();
        assert_eq!(a.agent1().policy_table(), b.agent1().policy_table());
        assert_eq!(a.agent2().policy_table(), b.agent2().policy_table());
        assert_eq!(a.stats().total_payoff1, b.stats().total_payoff1);
    }

    #[test]
    fn test_player_two_jack_learns_to_fold() {
        // Calling with the Jack always loses 2, folding always loses 1, so
        // once every arm has been tried the always-fold arm is greedy.
        let mut trainer = trainer(4);
        trainer.train(100_000).unwrap();
        assert_eq!(trainer.agent2().greedy_probability(Card::Jack), 0.0);
        assert_eq!(trainer.agent2().policy_table().arm(Card::Jack, 0).value, -1.0);
    }

    #[test]
    fn test_interleave_freezes_one_agent() {
        let config = TrainingConfig::default().with_seed(5).with_interleave(1_000);
        let mut trainer = Trainer::new(config).unwrap();

        // Hand 0 switches to "second learns"
        trainer.play_hand().unwrap();
        assert_eq!(trainer.learner(), Seat::Second);
        assert_eq!(trainer.agent1().mode(), Mode::Evaluating);
        assert_eq!(trainer.agent2().mode(), Mode::Learning);

        let frozen = trainer.agent1().policy_table().clone();
        trainer.train(999).unwrap();
        assert_eq!(trainer.agent1().policy_table(), &frozen);

        // Hand 1000 switches back
        trainer.play_hand().unwrap();
        assert_eq!(trainer.learner(), Seat::First);
        assert_eq!(trainer.agent1().mode(), Mode::Learning);
        assert_eq!(trainer.agent2().mode(), Mode::Evaluating);

        let frozen = trainer.agent2().policy_table().clone();
        let weight = total_weight(trainer.agent1());
        trainer.train(999).unwrap();
        assert_eq!(trainer.agent2().policy_table(), &frozen);
        assert!(total_weight(trainer.agent1()) > weight);
    }

    #[test]
    fn test_evaluate_leaves_agents_untouched() {
        let mut trainer = trainer(6);
        trainer.train(5_000).unwrap();
        let tables = (trainer.agent1().policy_table().clone(), trainer.agent2().policy_table().clone());

        let report = trainer.evaluate(3_000);
        assert_eq!(report.hands, 3_000);
        assert_eq!(report.terminals.values().sum::<u64>(), 3_000);
        assert_eq!(report.mean_payoff1(), -report.mean_payoff2());
        assert_eq!(trainer.agent1().policy_table(), &tables.0);
        assert_eq!(trainer.agent2().policy_table(), &tables.1);
        assert_eq!(trainer.agent1().mode(), Mode::Learning);
        assert_eq!(trainer.agent2().mode(), Mode::Learning);
    }

    #[test]
    fn test_evaluate_parallel_is_deterministic() {
        let mut trainer = trainer(7);
        trainer.train(5_000).unwrap();

        let a = trainer.evaluate_parallel(25_000, 99);
        let b = trainer.evaluate_parallel(25_000, 99);
        assert_eq!(a.hands, 25_000);
        assert_eq!(a, b);

        let total: f64 = [Terminal::CheckShowdown, Terminal::Fold, Terminal::CallShowdown]
            .iter()
            .map(|&t| a.frequency(t))
            .sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_checkpoint_round_trip() {
        let mut trainer = trainer(8);
        trainer.train(2_000).unwrap();

        let path = std::env::temp_dir().join(format!("kuhn-selfplay-checkpoint-{}.json", std::process::id()));
        trainer.save_checkpoint(&path).unwrap();
        let mut restored = Trainer::load_checkpoint(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(restored.hands_played(), 2_000);
        assert_eq!(restored.curve1().episodes, trainer.curve1().episodes);
        assert_eq!(restored.config(), trainer.config());
        for card in Card::ALL {
            let original = trainer.agent1().policy_table().arms(card);
            let loaded = restored.agent1().policy_table().arms(card);
            for (a, b) in original.iter().zip(loaded) {
                assert!((a.value - b.value).abs() < 1e-12);
                assert!((a.weight - b.weight).abs() < 1e-12);
            }
        }

        restored.train(100).unwrap();
        assert_eq!(restored.hands_played(), 2_100);
    }
}
