//! MCTS configuration parameters.

/// UCB1 exploration constant `c` for rewards in `[-1, 1]`.
pub const DEFAULT_EXPLORATION: f32 = std::f32::consts::SQRT_2;

/// Configuration for Monte Carlo Tree Search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MctsConfig {
    /// Number of select/rollout/backpropagate iterations per search.
    pub iterations: u32,

    /// Exploration constant `c` in `Q + c * sqrt(ln N / n)`.
    /// Higher values favour rarely tried actions.
    pub exploration_constant: f32,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            iterations: 64,
            exploration_constant: DEFAULT_EXPLORATION,
        }
    }
}

impl MctsConfig {
    /// Builder pattern: set iteration budget.
    pub fn with_iterations(mut self, n: u32) -> Self {
        self.iterations = n;
        self
    }

    /// Builder pattern: set exploration constant.
    pub fn with_exploration(mut self, c: f32) -> Self {
        self.exploration_constant = c;
        self
    }
}
