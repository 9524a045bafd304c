//! MCTS search implementation.
//!
//! Implements the core MCTS loop:
//! 1. Selection: descend the tree with UCB1, expanding state nodes lazily,
//!    until the ply produces a successor state not seen before
//! 2. Rollout: evaluate the new leaf with the evaluator
//! 3. Backpropagation: add one visit and the reward along the path
//!
//! After the budget is spent the root action with the highest mean value is
//! returned.

use std::fmt;

use engine_core::{Game, GameError};
use rand_chacha::ChaCha20Rng;
use thiserror::Error;
use tracing::{debug, trace};

use crate::config::MctsConfig;
use crate::evaluator::{Evaluator, EvaluatorError, RolloutEvaluator};
use crate::node::StateId;
use crate::tree::{ActionStats, SearchTree};

/// Errors that can occur during MCTS search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Game error: {0}")]
    Game(#[from] GameError),

    #[error("Evaluator error: {0}")]
    Evaluator(#[from] EvaluatorError),

    #[error("No legal moves available")]
    NoLegalMoves,

    #[error("Iteration budget must be at least 1")]
    InvalidBudget,

    #[error("State node {0:?} is already expanded")]
    AlreadyExpanded(StateId),
}

/// Result of an MCTS search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult<A> {
    /// Root action with the highest mean value
    pub best: ActionStats<A>,

    /// Statistics of every root action, in expansion order
    pub root_actions: Vec<ActionStats<A>>,

    /// Mean reward at the root
    pub root_value: f32,

    /// Number of iterations performed
    pub iterations: u32,

    /// Number of state nodes in the tree
    pub tree_size: usize,
}

impl<A: Copy> SearchResult<A> {
    /// Best action to take
    pub fn action(&self) -> A {
        self.best.action
    }
}

/// MCTS search state for a single call.
pub struct MctsSearch<'a, G: Game, E: Evaluator<G>> {
    tree: SearchTree<G::Action, G::Snapshot>,
    game: &'a G,
    evaluator: &'a E,
    config: MctsConfig,
}

impl<'a, G: Game, E: Evaluator<G>> MctsSearch<'a, G, E> {
    /// Create a new MCTS search rooted at `state`.
    pub fn new(game: &'a G, evaluator: &'a E, config: MctsConfig, state: &G::State) -> Self {
        let tree = SearchTree::new(G::encode(state), G::is_terminal(state));
        Self {
            tree,
            game,
            evaluator,
            config,
        }
    }

    /// Run the search for the configured number of iterations.
    pub fn run(&mut self, rng: &mut ChaCha20Rng) -> Result<SearchResult<G::Action>, SearchError> {
        if self.config.iterations == 0 {
            return Err(SearchError::InvalidBudget);
        }
        if self.tree.state(self.tree.root()).is_terminal {
            return Err(SearchError::NoLegalMoves);
        }

        for _ in 0..self.config.iterations {
            self.simulate(rng)?;
        }

        // Extract result
        let best = self.tree.best_action().ok_or(SearchError::NoLegalMoves)?;
        let root = self.tree.state(self.tree.root());
        let result = SearchResult {
            best: self.tree.action_stats(best),
            root_actions: self.tree.root_action_stats(),
            root_value: root.mean_value(),
            iterations: root.visit_count,
            tree_size: self.tree.len(),
        };

        debug!(
            action = ?result.best.action,
            value = result.best.mean_value,
            root_value = result.root_value,
            iterations = result.iterations,
            tree_size = result.tree_size,
            "MCTS search complete"
        );

        Ok(result)
    }

    /// Run a single iteration (select -> rollout -> backpropagate).
    fn simulate(&mut self, rng: &mut ChaCha20Rng) -> Result<(), SearchError> {
        let leaf_id = self.select(rng)?;
        let leaf = self.tree.state(leaf_id);

        // Rollouts run on a private copy; the stored snapshot never changes
        let mut working = G::decode(&leaf.snapshot)?;
        let reward = if leaf.is_terminal {
            G::terminal_reward(&working)
        } else {
            self.evaluator.evaluate(self.game, &mut working, rng)?
        };

        self.tree.backpropagate(leaf_id, reward);

        trace!(leaf = leaf_id.0, reward, "MCTS simulation complete");

        Ok(())
    }

    /// Descend from the root until a terminal state or a new successor state.
    ///
    /// At most one state node is created per call.
    fn select(&mut self, rng: &mut ChaCha20Rng) -> Result<StateId, SearchError> {
        let mut current = self.tree.root();

        loop {
            let node = self.tree.state(current);
            if node.is_terminal {
                return Ok(current);
            }

            let mut working = G::decode(&node.snapshot)?;
            if !node.is_expanded() {
                self.tree.expand(current, G::legal_moves(&working))?;
            }

            let action_id = self
                .tree
                .select_action(current, self.config.exploration_constant)
                .ok_or(SearchError::NoLegalMoves)?;
            let action = self.tree.action(action_id).action;

            let ply = self.game.apply_ply(action, &mut working, rng)?;
            let snapshot = G::encode(&working);

            match self.tree.action(action_id).child(&snapshot) {
                Some(child) => current = child,
                None => return Ok(self.tree.add_child(action_id, snapshot, ply.done)),
            }
        }
    }

    /// Get the search tree (for inspection/debugging).
    pub fn tree(&self) -> &SearchTree<G::Action, G::Snapshot> {
        &self.tree
    }

    /// Consume the search, keeping its tree.
    pub fn into_tree(self) -> SearchTree<G::Action, G::Snapshot> {
        self.tree
    }
}

/// Search engine bound to a game and a root state.
///
/// Every call to [`Mcts::select_best_action`] builds a fresh tree; the tree of
/// the latest call is kept only for inspection.
pub struct Mcts<G: Game, E: Evaluator<G> = RolloutEvaluator> {
    game: G,
    evaluator: E,
    root: G::State,
    config: MctsConfig,
    last_tree: Option<SearchTree<G::Action, G::Snapshot>>,
}

impl<G: Game> Mcts<G, RolloutEvaluator> {
    /// Create an engine that evaluates leaves with random rollouts.
    pub fn new(game: G, root: G::State, config: MctsConfig) -> Result<Self, SearchError> {
        Self::with_evaluator(game, RolloutEvaluator::new(), root, config)
    }
}

impl<G: Game, E: Evaluator<G>> Mcts<G, E> {
    /// Create an engine with a custom leaf evaluator.
    ///
    /// The root must survive an encode/decode round trip.
    pub fn with_evaluator(
        game: G,
        evaluator: E,
        root: G::State,
        config: MctsConfig,
    ) -> Result<Self, SearchError> {
        validate_root::<G>(&root)?;
        Ok(Self {
            game,
            evaluator,
            root,
            config,
            last_tree: None,
        })
    }

    /// Replace the root state used by the next search.
    pub fn set_root(&mut self, root: G::State) -> Result<(), SearchError> {
        validate_root::<G>(&root)?;
        self.root = root;
        Ok(())
    }

    /// Run `iteration_budget` iterations from the root and return the best
    /// root action by mean value.
    pub fn select_best_action(
        &mut self,
        iteration_budget: u32,
        rng: &mut ChaCha20Rng,
    ) -> Result<SearchResult<G::Action>, SearchError> {
        let config = self.config.with_iterations(iteration_budget);
        let mut search = MctsSearch::new(&self.game, &self.evaluator, config, &self.root);
        let result = search.run(rng);
        self.last_tree = Some(search.into_tree());
        result
    }

    /// Tree built by the most recent search, if any.
    pub fn last_tree(&self) -> Option<&SearchTree<G::Action, G::Snapshot>> {
        self.last_tree.as_ref()
    }

    /// Dump of the most recent tree, rendering each board with `Display`.
    pub fn dump_tree(&self) -> Option<String>
    where
        G::State: fmt::Display,
    {
        self.last_tree.as_ref().map(|tree| {
            tree.dump_with(|snapshot| match G::decode(snapshot) {
                Ok(state) => state.to_string(),
                Err(_) => format!("{:?}", snapshot),
            })
        })
    }
}

fn validate_root<G: Game>(root: &G::State) -> Result<(), SearchError> {
    G::decode(&G::encode(root))?;
    Ok(())
}

/// Convenience function to run a single MCTS search with random rollouts.
pub fn run_mcts<G: Game>(
    game: &G,
    state: &G::State,
    config: MctsConfig,
    rng: &mut ChaCha20Rng,
) -> Result<SearchResult<G::Action>, SearchError> {
    validate_root::<G>(state)?;
    let evaluator = RolloutEvaluator::new();
    let mut search = MctsSearch::new(game, &evaluator, config, state);
    search.run(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use games_connect4::{Connect4, State};
    use rand::SeedableRng;

    /// Returns the same reward for every non-terminal leaf.
    struct ConstantEvaluator(f32);

    impl Evaluator<Connect4> for ConstantEvaluator {
        fn evaluate(
            &self,
            _game: &Connect4,
            _state: &mut State,
            _rng: &mut ChaCha20Rng,
        ) -> Result<f32, EvaluatorError> {
            Ok(self.0)
        }
    }

    struct FailingEvaluator;

    impl Evaluator<Connect4> for FailingEvaluator {
        fn evaluate(
            &self,
            _game: &Connect4,
            _state: &mut State,
            _rng: &mut ChaCha20Rng,
        ) -> Result<f32, EvaluatorError> {
            Err(EvaluatorError::EvaluationFailed("boom".into()))
        }
    }

    /// Connect 4 that also offers an off-board column first.
    #[derive(Debug)]
    struct OffBoardColumn;

    impl Game for OffBoardColumn {
        type State = State;
        type Action = u8;
        type Snapshot = <Connect4 as Game>::Snapshot;

        fn legal_moves(state: &State) -> Vec<u8> {
            let mut moves = vec![9];
            moves.extend(Connect4::legal_moves(state));
            moves
        }

        fn apply_ply(
            &self,
            action: u8,
            state: &mut State,
            rng: &mut ChaCha20Rng,
        ) -> Result<engine_core::Ply, GameError> {
            Connect4::new().apply_ply(action, state, rng)
        }

        fn is_terminal(state: &State) -> bool {
            Connect4::is_terminal(state)
        }

        fn terminal_reward(state: &State) -> f32 {
            Connect4::terminal_reward(state)
        }

        fn encode(state: &State) -> Self::Snapshot {
            Connect4::encode(state)
        }

        fn decode(snapshot: &Self::Snapshot) -> Result<State, GameError> {
            Connect4::decode(snapshot)
        }
    }

    fn won_board() -> State {
        State::from_rows(&[
            [0i8, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0, 0],
            [1, 1, 1, 0, 0, 0, 0],
            [-1, -1, -1, -1, 1, 0, 0],
        ])
        .unwrap()
    }

    /// Agent wins immediately by dropping into column 0 (vertical four).
    fn vertical_threat() -> State {
        State::from_rows(&[
            [0i8, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0, 0],
            [1, 0, 0, 0, 0, 0, 0],
            [1, 0, 0, 0, 0, 0, -1],
            [1, 0, 0, 0, 0, -1, -1],
        ])
        .unwrap()
    }

    /// Every action node's visits equal the sum of its children's visits, and
    /// every expanded state's visits equal its actions' visits plus the one
    /// rollout that created it.
    fn assert_visit_invariants(tree: &SearchTree<u8, [u8; 42]>) {
        for i in 0..tree.action_count() {
            let action = tree.action(crate::node::ActionId(i as u32));
            let child_visits: u32 = action
                .child_order
                .iter()
                .map(|&c| tree.state(c).visit_count)
                .sum();
            assert_eq!(action.visit_count, child_visits);
        }

        for i in 0..tree.len() {
            let id = StateId(i as u32);
            let state = tree.state(id);
            if state.is_terminal {
                assert!(state.actions.is_empty());
                continue;
            }
            let action_visits: u32 = state
                .actions
                .iter()
                .map(|&a| tree.action(a).visit_count)
                .sum();
            let own = if state.is_root() { 0 } else { 1 };
            assert_eq!(state.visit_count, action_visits + own);
        }
    }

    #[test]
    fn test_opening_search_returns_legal_action() {
        let mut mcts =
            Mcts::new(Connect4::new(), State::opening(), MctsConfig::default()).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(42);

        let result = mcts.select_best_action(128, &mut rng).unwrap();

        assert!(result.action() < 7);
        assert!(State::opening().legal_moves().contains(&result.action()));
        assert!(result.root_value.is_finite());
        assert!((-1.0..=1.0).contains(&result.root_value));
        assert!((-1.0..=1.0).contains(&result.best.mean_value));
        assert_eq!(result.iterations, 128);
        assert_eq!(result.root_actions.len(), 7);
        assert!(result.tree_size <= 129);
    }

    #[test]
    fn test_search_is_deterministic() {
        let run = |seed| {
            let mut mcts =
                Mcts::new(Connect4::new(), State::opening(), MctsConfig::default()).unwrap();
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            mcts.select_best_action(200, &mut rng).unwrap()
        };

        assert_eq!(run(7), run(7));
    }

    #[test]
    fn test_root_visits_equal_budget() {
        let mut mcts =
            Mcts::new(Connect4::new(), State::opening(), MctsConfig::default()).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(3);

        for budget in [1, 5, 50, 300] {
            let result = mcts.select_best_action(budget, &mut rng).unwrap();
            let tree = mcts.last_tree().unwrap();

            assert_eq!(tree.state(tree.root()).visit_count, budget);
            assert_eq!(result.iterations, budget);
            let action_visits: u32 = result.root_actions.iter().map(|a| a.visit_count).sum();
            assert_eq!(action_visits, budget);
            assert_visit_invariants(tree);
        }
    }

    #[test]
    fn test_each_iteration_adds_one_visit_along_path() {
        let game = Connect4::new();
        let evaluator = RolloutEvaluator::new();
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let mut search = MctsSearch::new(
            &game,
            &evaluator,
            MctsConfig::default(),
            &State::opening(),
        );

        for i in 1..=60u32 {
            let states_before = search.tree().len();
            search.simulate(&mut rng).unwrap();
            let tree = search.tree();

            // At most one new state per iteration
            assert!(tree.len() <= states_before + 1);
            assert_eq!(tree.state(tree.root()).visit_count, i);
            assert_visit_invariants(tree);
        }
    }

    #[test]
    fn test_finds_immediate_win() {
        let mut mcts =
            Mcts::new(Connect4::new(), vertical_threat(), MctsConfig::default()).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(42);

        let result = mcts.select_best_action(200, &mut rng).unwrap();

        assert_eq!(result.action(), 0);
        assert!((result.best.mean_value - 1.0).abs() < 1e-6);

        // The winning child is terminal and never rolled out further
        let tree = mcts.last_tree().unwrap();
        let win = tree.state(tree.root()).actions[0];
        assert_eq!(tree.action(win).child_order.len(), 1);
        assert!(tree.state(tree.action(win).child_order[0]).is_terminal);
    }

    #[test]
    fn test_ties_resolve_to_lowest_column() {
        let mut mcts = Mcts::with_evaluator(
            Connect4::new(),
            ConstantEvaluator(0.0),
            State::opening(),
            MctsConfig::default(),
        )
        .unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(1);

        // Budget of seven visits every root column once
        let result = mcts.select_best_action(7, &mut rng).unwrap();

        assert!(result.root_actions.iter().all(|a| a.visit_count == 1));
        assert_eq!(result.action(), 0);
    }

    #[test]
    fn test_constant_reward_propagates_unchanged() {
        let mut mcts = Mcts::with_evaluator(
            Connect4::new(),
            ConstantEvaluator(0.5),
            State::opening(),
            MctsConfig::default(),
        )
        .unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(1);

        let result = mcts.select_best_action(7, &mut rng).unwrap();

        assert!((result.root_value - 0.5).abs() < 1e-6);
        assert!((result.best.value_sum - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_terminal_root_has_no_legal_moves() {
        let mut mcts = Mcts::new(Connect4::new(), won_board(), MctsConfig::default()).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(0);

        let err = mcts.select_best_action(10, &mut rng).unwrap_err();
        assert!(matches!(err, SearchError::NoLegalMoves));
    }

    #[test]
    fn test_zero_budget_is_rejected() {
        let mut mcts =
            Mcts::new(Connect4::new(), State::opening(), MctsConfig::default()).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(0);

        let err = mcts.select_best_action(0, &mut rng).unwrap_err();
        assert!(matches!(err, SearchError::InvalidBudget));
    }

    #[test]
    fn test_evaluator_errors_propagate() {
        let mut mcts = Mcts::with_evaluator(
            Connect4::new(),
            FailingEvaluator,
            State::opening(),
            MctsConfig::default(),
        )
        .unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(0);

        let err = mcts.select_best_action(3, &mut rng).unwrap_err();
        assert!(matches!(err, SearchError::Evaluator(_)));
    }

    #[test]
    fn test_invalid_move_propagates_unchanged() {
        let mut mcts =
            Mcts::new(OffBoardColumn, State::opening(), MctsConfig::default()).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(0);

        let err = mcts.select_best_action(5, &mut rng).unwrap_err();
        match err {
            SearchError::Game(GameError::InvalidMove { action, reason }) => {
                assert_eq!(action, 9);
                assert!(reason.contains("out of range"));
            }
            other => panic!("expected InvalidMove, got {:?}", other),
        }
    }

    #[test]
    fn test_set_root_rebuilds_tree() {
        let mut mcts =
            Mcts::new(Connect4::new(), State::opening(), MctsConfig::default()).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        mcts.select_best_action(40, &mut rng).unwrap();

        mcts.set_root(vertical_threat()).unwrap();
        let result = mcts.select_best_action(10, &mut rng).unwrap();

        let tree = mcts.last_tree().unwrap();
        assert_eq!(tree.state(tree.root()).snapshot, *vertical_threat().board());
        assert_eq!(tree.state(tree.root()).visit_count, 10);
        assert_eq!(result.iterations, 10);
    }

    #[test]
    fn test_run_mcts_matches_engine() {
        let game = Connect4::new();
        let config = MctsConfig::default().with_iterations(64);

        let mut rng = ChaCha20Rng::seed_from_u64(21);
        let direct = run_mcts(&game, &State::opening(), config, &mut rng).unwrap();

        let mut mcts = Mcts::new(game, State::opening(), config).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(21);
        let via_engine = mcts.select_best_action(64, &mut rng).unwrap();

        assert_eq!(direct, via_engine);
    }

    #[test]
    fn test_dump_tree_renders_boards() {
        let mut mcts =
            Mcts::new(Connect4::new(), State::opening(), MctsConfig::default()).unwrap();
        assert!(mcts.dump_tree().is_none());

        let mut rng = ChaCha20Rng::seed_from_u64(2);
        mcts.select_best_action(12, &mut rng).unwrap();

        let dump = mcts.dump_tree().unwrap();
        assert!(dump.starts_with("===== state 0 ====="));
        assert!(dump.contains("0123456"));
        assert!(dump.contains("visits=12"));
        assert_eq!(dump.matches("===== state").count(), mcts.last_tree().unwrap().len());
    }
}
