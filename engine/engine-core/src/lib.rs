//! Core traits and types for the stochastic-opponent game engine
//!
//! This crate provides the narrow interface the search consumes:
//! - `Game`: Typed rules-engine trait (legality, ply transition, terminal test, rollout)
//! - `Ply`: Reward/done pair returned by a transition
//! - `GameError`: Contract violations raised by a rules engine
//! - `game_utils`: Cell conventions and reward helpers shared by games

pub mod game_utils;
pub mod typed;

// Re-export main types for convenience
pub use typed::{Game, GameError, Ply};
