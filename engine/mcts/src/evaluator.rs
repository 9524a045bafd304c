//! Evaluator trait for leaf evaluation.
//!
//! The evaluator turns a newly reached leaf into a scalar reward from the
//! agent's perspective. The default is a uniformly random playout to the end
//! of the game.

use engine_core::{Game, GameError};
use rand_chacha::ChaCha20Rng;
use thiserror::Error;

/// Errors that can occur during evaluation.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("Rollout failed: {0}")]
    Rollout(#[from] GameError),

    #[error("Evaluation failed: {0}")]
    EvaluationFailed(String),
}

/// Trait for leaf evaluators.
///
/// `state` is a working copy owned by the search; implementations may advance
/// it freely.
pub trait Evaluator<G: Game> {
    /// Reward in `[-1, 1]` for the agent, starting from `state`.
    fn evaluate(
        &self,
        game: &G,
        state: &mut G::State,
        rng: &mut ChaCha20Rng,
    ) -> Result<f32, EvaluatorError>;
}

/// Random rollout evaluator that plays uniformly random plies to a terminal
/// state and returns the game outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolloutEvaluator;

impl RolloutEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl<G: Game> Evaluator<G> for RolloutEvaluator {
    fn evaluate(
        &self,
        game: &G,
        state: &mut G::State,
        rng: &mut ChaCha20Rng,
    ) -> Result<f32, EvaluatorError> {
        Ok(game.random_rollout(state, rng)?)
    }
}
