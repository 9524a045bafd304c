//! Monte Carlo Tree Search (MCTS) against a stochastic opponent.
//!
//! This crate provides a game-agnostic UCB1 search that works with any game
//! implementing the `engine-core` [`Game`](engine_core::Game) trait. The
//! opponent's reply is part of each ply, so the tree alternates between state
//! nodes and action nodes and one action may lead to several successor states.
//!
//! # Overview
//!
//! Each iteration consists of three phases:
//!
//! 1. **Selection**: Starting at the root, expand state nodes lazily and pick
//!    actions by UCB1 until the ply lands on a successor state not yet in the
//!    tree (or a terminal state)
//! 2. **Rollout**: Estimate the new leaf with random play to the end of the game
//! 3. **Backpropagation**: Add one visit and the reward to every node on the
//!    path back to the root
//!
//! # Usage
//!
//! ```rust
//! use games_connect4::{Connect4, State};
//! use mcts::{Mcts, MctsConfig};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha20Rng;
//!
//! let mut mcts = Mcts::new(Connect4::new(), State::opening(), MctsConfig::default()).unwrap();
//! let mut rng = ChaCha20Rng::seed_from_u64(42);
//!
//! let result = mcts.select_best_action(128, &mut rng).unwrap();
//! assert!(result.action() < 7);
//! assert!((-1.0..=1.0).contains(&result.root_value));
//! ```
//!
//! # Configuration
//!
//! The [`MctsConfig`] struct controls search behavior:
//!
//! - `iterations`: Iteration budget used by [`run_mcts`] (default: 64)
//! - `exploration_constant`: UCB1 constant `c` (default: `sqrt(2)`)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                          Mcts                            │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌────────────┐  ┌──────────────┐  ┌──────────────────┐  │
//! │  │ SearchTree │  │     Game     │  │    Evaluator     │  │
//! │  │  (arenas)  │  │ (ply + opp.) │  │    (rollout)     │  │
//! │  └─────┬──────┘  └──────┬───────┘  └────────┬─────────┘  │
//! │        ▼                ▼                   ▼            │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │        select/expand → rollout → backpropagate     │  │
//! │  └────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod evaluator;
pub mod node;
pub mod search;
pub mod tree;

// Re-export main types
pub use config::MctsConfig;
pub use evaluator::{Evaluator, EvaluatorError, RolloutEvaluator};
pub use node::{ActionId, ActionNode, StateId, StateNode};
pub use search::{run_mcts, Mcts, MctsSearch, SearchError, SearchResult};
pub use tree::{ActionStats, SearchTree, TreeStats};
