//! Kuhn Poker hand resolution for self-play.
//!
//! ## Game Rules
//!
//! - 3 cards: Jack (0), Queen (1), King (2)
//! - 2 players, each antes 1 chip
//! - Each player receives 1 card, the third card is never seen
//! - Player 1 acts first: Check or Bet (1 chip)
//! - After a check the hand goes straight to showdown
//! - After a bet, Player 2 either folds or calls
//! - Higher card wins at showdown
//!
//! ## Game Tree
//!
//! ```text
//! P1 (first to act)
//! ├── Check → Showdown (±1)
//! └── Bet
//!     └── P2
//!         ├── Fold → P1 wins (+1)
//!         └── Call → Showdown (±2)
//! ```
//!
//! Player 1 is never given the chance to bet after checking, so Player 2
//! only ever decides whether to call a bet.

use std::fmt;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A card in the three-card Kuhn deck, ordered by rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Card {
    /// Lowest card.
    Jack,
    /// Middle card.
    Queen,
    /// Highest card.
    King,
}

impl Card {
    /// The full deck, lowest rank first.
    pub const ALL: [Card; 3] = [Card::Jack, Card::Queen, Card::King];

    /// Position of the card in the deck (0=Jack, 1=Queen, 2=King).
    pub fn index(self) -> usize {
        match self {
            Card::Jack => 0,
            Card::Queen => 1,
            Card::King => 2,
        }
    }

    /// Card at a deck position, if the position exists.
    pub fn from_index(index: usize) -> Option<Card> {
        Card::ALL.get(index).copied()
    }

    /// Get card name for display.
    pub fn name(self) -> &'static str {
        match self {
            Card::Jack => "Jack",
            Card::Queen => "Queen",
            Card::King => "King",
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = match self {
            Card::Jack => "J",
            Card::Queen => "Q",
            Card::King => "K",
        };
        write!(f, "{}", short)
    }
}

/// Actions in Kuhn Poker.
///
/// The meaning depends on the seat: Player 1 checks or bets, Player 2
/// folds or calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KuhnAction {
    /// Check when first to act, fold when facing a bet.
    CheckOrFold,
    /// Bet when first to act, call when facing a bet.
    BetOrCall,
}

impl KuhnAction {
    /// Numeric code of the action (0 or 1).
    pub fn code(self) -> u8 {
        match self {
            KuhnAction::CheckOrFold => 0,
            KuhnAction::BetOrCall => 1,
        }
    }
}

impl fmt::Display for KuhnAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KuhnAction::CheckOrFold => write!(f, "Check/Fold"),
            KuhnAction::BetOrCall => write!(f, "Bet/Call"),
        }
    }
}

/// The two private cards of one hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Deal {
    /// Player 1's card.
    pub first: Card,
    /// Player 2's card, always different from `first`.
    pub second: Card,
}

impl Deal {
    /// Build a deal from two distinct cards.
    pub fn new(first: Card, second: Card) -> Option<Deal> {
        (first != second).then_some(Deal { first, second })
    }
}

impl fmt::Display for Deal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P1:{} P2:{}", self.first, self.second)
    }
}

/// Leaf of the betting tree a hand finished in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terminal {
    /// Player 1 checked, cards compared for the antes.
    CheckShowdown,
    /// Player 1 bet and Player 2 folded.
    Fold,
    /// Player 1 bet and Player 2 called, cards compared for double stakes.
    CallShowdown,
}

/// Result of one resolved hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Chips won (or lost, if negative) by Player 1.
    pub payoff1: i32,
    /// Chips won by Player 2, always `-payoff1`.
    pub payoff2: i32,
    /// True iff Player 1 bet, which is the only time Player 2 acts.
    pub p2_acted: bool,
    /// Where the hand ended.
    pub terminal: Terminal,
}

impl Outcome {
    fn new(payoff1: i32, terminal: Terminal) -> Self {
        Self {
            payoff1,
            payoff2: -payoff1,
            p2_acted: terminal != Terminal::CheckShowdown,
            terminal,
        }
    }
}

/// Something that can choose an action for a card.
///
/// The engine only talks to players through this trait. `Decision` is
/// whatever the player needs handed back later to credit the hand's payoff.
pub trait Player {
    /// Record produced alongside each action.
    type Decision;

    /// Pick an action holding `card`.
    fn act(&mut self, card: Card) -> (KuhnAction, Self::Decision);
}

/// A fully played hand.
///
/// `second` is `Some` exactly when Player 2 acted, so only then is there a
/// decision of Player 2's to reward.
#[derive(Debug)]
pub struct Hand<D1, D2> {
    /// Cards that were dealt.
    pub deal: Deal,
    /// Payoffs and terminal.
    pub outcome: Outcome,
    /// Player 1's decision record.
    pub first: D1,
    /// Player 2's decision record, present only on the bet branch.
    pub second: Option<D2>,
}

/// Deals and resolves Kuhn hands.
///
/// The engine owns its random source so a seeded engine deals the same
/// sequence of cards every run.
#[derive(Debug, Clone)]
pub struct KuhnEngine<R: Rng = StdRng> {
    rng: R,
}

impl<R: Rng> KuhnEngine<R> {
    /// Create an engine drawing cards from `rng`.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Deal two distinct cards, uniform over all six ordered pairs.
    pub fn deal(&mut self) -> Deal {
        let mut deck = Card::ALL;
        deck.shuffle(&mut self.rng);
        Deal {
            first: deck[0],
            second: deck[1],
        }
    }

    /// Deal a fresh hand and play it out between `p1` and `p2`.
    pub fn resolve_hand<P1, P2>(&mut self, p1: &mut P1, p2: &mut P2) -> Hand<P1::Decision, P2::Decision>
    where
        P1: Player,
        P2: Player,
    {
        let deal = self.deal();
        Self::play_deal(deal, p1, p2)
    }

    /// Play a hand with a fixed deal.
    pub fn play_deal<P1, P2>(deal: Deal, p1: &mut P1, p2: &mut P2) -> Hand<P1::Decision, P2::Decision>
    where
        P1: Player,
        P2: Player,
    {
        let p1_wins = deal.first > deal.second;
        let (action1, first) = p1.act(deal.first);

        let (outcome, second) = match action1 {
            KuhnAction::CheckOrFold => {
                let payoff = if p1_wins { 1 } else { -1 };
                (Outcome::new(payoff, Terminal::CheckShowdown), None)
            }
            KuhnAction::BetOrCall => {
                let (action2, decision) = p2.act(deal.second);
                let outcome = match action2 {
                    KuhnAction::CheckOrFold => Outcome::new(1, Terminal::Fold),
                    KuhnAction::BetOrCall => {
                        let payoff = if p1_wins { 2 } else { -2 };
                        Outcome::new(payoff, Terminal::CallShowdown)
                    }
                };
                (outcome, Some(decision))
            }
        };

        Hand {
            deal,
            outcome,
            first,
            second,
        }
    }
}
