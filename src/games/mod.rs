//! Game implementations.
//!
//! ## Available Games
//!
//! - [`kuhn`]: Kuhn Poker with a single betting round, where Player 2 only
//!   ever answers a bet
//!
//! A game exposes its players through an action-selection trait and returns
//! each decision record alongside the outcome, so the caller decides which
//! players get credited.

pub mod kuhn;
