//! Typed Game trait consumed by the search engine
//!
//! A [`Game`] folds the opponent's reply into every transition: one call to
//! [`Game::apply_ply`] plays the searching agent's move and then, unless the
//! game is already decided, the opponent's stochastic response. The search
//! therefore sees a single-agent decision process against a random
//! environment instead of a two-player minimax tree.

use std::fmt::Debug;
use std::hash::Hash;

use rand_chacha::ChaCha20Rng;
use thiserror::Error;

/// Outcome of one ply (agent move plus opponent response).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ply {
    /// Reward from the searching agent's perspective: +1 win, -1 loss, 0 otherwise
    pub reward: f32,
    /// Whether the game ended during this ply
    pub done: bool,
}

impl Ply {
    pub fn ongoing() -> Self {
        Self {
            reward: 0.0,
            done: false,
        }
    }

    pub fn finished(reward: f32) -> Self {
        Self { reward, done: true }
    }
}

/// Rules engine interface used by MCTS.
///
/// # Type Parameters
///
/// * `State` - Mutable working copy of the board used during simulation
/// * `Action` - Small move identifier (a column index for drop games)
/// * `Snapshot` - Canonical fixed-size encoding of a state, used as a hash key
///
/// Every source of randomness is an explicit [`ChaCha20Rng`] so that a
/// seeded run is fully reproducible.
///
/// # Example
///
/// ```rust
/// # use engine_core::typed::*;
/// # use rand_chacha::ChaCha20Rng;
/// #[derive(Debug)]
/// struct Countdown;
///
/// impl Game for Countdown {
///     type State = u8;
///     type Action = u8;
///     type Snapshot = [u8; 1];
///
///     fn legal_moves(state: &u8) -> Vec<u8> {
///         if *state == 0 { Vec::new() } else { vec![1] }
///     }
///     fn apply_ply(&self, action: u8, state: &mut u8, _rng: &mut ChaCha20Rng) -> Result<Ply, GameError> {
///         if *state == 0 {
///             return Err(GameError::InvalidMove { action: action as u32, reason: "game over".into() });
///         }
///         *state -= action;
///         Ok(if *state == 0 { Ply::finished(1.0) } else { Ply::ongoing() })
///     }
///     fn is_terminal(state: &u8) -> bool { *state == 0 }
///     fn terminal_reward(_state: &u8) -> f32 { 1.0 }
///     fn encode(state: &u8) -> [u8; 1] { [*state] }
///     fn decode(snapshot: &[u8; 1]) -> Result<u8, GameError> { Ok(snapshot[0]) }
/// }
/// ```
pub trait Game: Debug {
    /// Working state type - cheap to clone
    type State: Clone + Debug;

    /// Action identifier
    type Action: Copy + Eq + Debug;

    /// Canonical encoding of a state
    type Snapshot: Copy + Eq + Hash + Debug;

    /// Legal actions at `state`, in ascending order.
    ///
    /// Non-empty unless the state is terminal.
    fn legal_moves(state: &Self::State) -> Vec<Self::Action>;

    /// Apply the agent's `action` and the opponent's response in place.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidMove`] if `action` is not legal at `state`. The
    /// state is left untouched in that case.
    fn apply_ply(
        &self,
        action: Self::Action,
        state: &mut Self::State,
        rng: &mut ChaCha20Rng,
    ) -> Result<Ply, GameError>;

    /// True iff the game is decided or no further moves exist.
    fn is_terminal(state: &Self::State) -> bool;

    /// Reward of a terminal state from the agent's perspective.
    ///
    /// Returns 0.0 for states that are not decided.
    fn terminal_reward(state: &Self::State) -> f32;

    /// Play uniformly random plies until the game ends and return the final reward.
    ///
    /// A state that is already terminal yields [`Game::terminal_reward`]
    /// without taking any transition.
    fn random_rollout(
        &self,
        state: &mut Self::State,
        rng: &mut ChaCha20Rng,
    ) -> Result<f32, GameError> {
        use rand::seq::SliceRandom;

        if Self::is_terminal(state) {
            return Ok(Self::terminal_reward(state));
        }

        loop {
            let legal = Self::legal_moves(state);
            let action = *legal.choose(rng).ok_or_else(|| {
                GameError::InvalidState("non-terminal state without legal moves".into())
            })?;
            let ply = self.apply_ply(action, state, rng)?;
            if ply.done {
                return Ok(ply.reward);
            }
        }
    }

    /// Encode a state into its canonical snapshot.
    fn encode(state: &Self::State) -> Self::Snapshot;

    /// Rebuild a working state from a snapshot.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidState`] if the snapshot is outside the value domain.
    fn decode(snapshot: &Self::Snapshot) -> Result<Self::State, GameError>;
}

/// Errors raised by a rules engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error("Invalid move {action}: {reason}")]
    InvalidMove { action: u32, reason: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),
}
