//! Arena - plays MCTS against the random opponent
//!
//! The arena evaluates its start position once with a large budget, then plays
//! full games from that position. Every agent move is chosen by a fresh search
//! rooted at the current board; the opponent's reply comes from the game's
//! `apply_ply`.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use engine_core::Game;
use games_connect4::{Action, Connect4, State};
use mcts::{Mcts, SearchResult};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::{debug, info};

use crate::config::Config;
use crate::stats::{ArenaStats, ArenaStatsSnapshot};

/// Two open edge columns, everything else filled.
const MIDGAME_ROWS: [[i8; 7]; 6] = [
    [0, 1, -1, -1, 1, -1, 0],
    [0, 1, 1, -1, -1, 1, 0],
    [0, -1, -1, -1, 1, -1, 0],
    [0, 1, 1, 1, -1, 1, 0],
    [0, 1, -1, -1, 1, -1, 0],
    [-1, 1, 1, 1, -1, -1, 1],
];

/// Where every game of a run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPosition {
    /// One opponent disc in the centre column
    Opening,
    /// Empty board plus one random opponent disc
    Random,
    /// Fixed late position with two open columns
    Midgame,
}

impl StartPosition {
    /// Build the board. `Random` draws from `rng`.
    pub fn build(self, game: &Connect4, rng: &mut ChaCha20Rng) -> Result<State> {
        let state = match self {
            StartPosition::Opening => game.initial_state(),
            StartPosition::Random => game.reset(rng),
            StartPosition::Midgame => {
                State::from_rows(&MIDGAME_ROWS).context("Invalid midgame position")?
            }
        };
        Ok(state)
    }
}

impl FromStr for StartPosition {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "opening" => Ok(StartPosition::Opening),
            "random" => Ok(StartPosition::Random),
            "midgame" => Ok(StartPosition::Midgame),
            other => Err(format!(
                "unknown start position '{}', expected one of opening, random, midgame",
                other
            )),
        }
    }
}

impl fmt::Display for StartPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StartPosition::Opening => "opening",
            StartPosition::Random => "random",
            StartPosition::Midgame => "midgame",
        };
        f.write_str(name)
    }
}

/// Outcome of one finished game.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameOutcome {
    /// Agent moves played
    pub moves: u32,
    /// Final reward for the agent
    pub reward: f32,
}

pub struct Arena {
    config: Config,
    game: Connect4,
    mcts: Mcts<Connect4>,
    rng: ChaCha20Rng,
    start: State,
    stats: ArenaStats,
}

impl Arena {
    pub fn new(config: Config) -> Result<Self> {
        let game = Connect4::new();
        let mut rng = ChaCha20Rng::seed_from_u64(config.seed);
        let start_position = config.start_position()?;
        let start = start_position.build(&game, &mut rng)?;

        if start.is_done() {
            anyhow::bail!("start position is already finished:\n{}", start);
        }

        let mcts = Mcts::new(game, start.clone(), config.mcts_config())
            .context("Failed to create MCTS engine")?;
        let stats = ArenaStats::new(&start_position.to_string(), config.seed, config.iterations);

        info!(
            start = %start_position,
            seed = config.seed,
            iterations = config.iterations,
            eval_iterations = config.eval_iterations,
            exploration = config.exploration,
            "Arena initialized"
        );

        Ok(Self {
            config,
            game,
            mcts,
            rng,
            start,
            stats,
        })
    }

    pub fn start(&self) -> &State {
        &self.start
    }

    pub fn stats(&self) -> &ArenaStats {
        &self.stats
    }

    /// Search the start position with the evaluation budget.
    pub fn evaluate_start(&mut self) -> Result<SearchResult<Action>> {
        self.mcts.set_root(self.start.clone())?;
        let result = self
            .mcts
            .select_best_action(self.config.eval_iterations, &mut self.rng)
            .context("Start-position search failed")?;

        self.stats
            .record_start_evaluation(result.action(), result.best.mean_value);

        info!(
            action = result.action(),
            value = format!("{:.4}", result.best.mean_value),
            root_value = format!("{:.4}", result.root_value),
            tree_size = result.tree_size,
            "Start position evaluated"
        );

        Ok(result)
    }

    /// Dump of the tree built by the latest search.
    pub fn dump_tree(&self) -> Option<String> {
        self.mcts.dump_tree()
    }

    /// Play one game from the start position to the end.
    pub fn play_game(&mut self, game_index: u32) -> Result<GameOutcome> {
        let mut state = self.start.clone();
        let mut moves = 0u32;

        loop {
            self.mcts.set_root(state.clone())?;
            let result = self
                .mcts
                .select_best_action(self.config.iterations, &mut self.rng)
                .with_context(|| format!("Search failed in game {}", game_index))?;

            let ply = self
                .game
                .apply_ply(result.action(), &mut state, &mut self.rng)?;
            moves += 1;

            debug!(
                game = game_index,
                ply = moves,
                action = result.action(),
                value = result.best.mean_value,
                done = ply.done,
                "Move played"
            );

            if ply.done {
                self.stats.record_game(moves, ply.reward);
                return Ok(GameOutcome {
                    moves,
                    reward: ply.reward,
                });
            }
        }
    }

    /// Play every configured game from the start position.
    pub fn play_games(&mut self) -> Result<ArenaStatsSnapshot> {
        for game_index in 0..self.config.games {
            let outcome = self.play_game(game_index)?;
            debug!(
                game = game_index,
                moves = outcome.moves,
                reward = outcome.reward,
                "Game finished"
            );

            if (game_index + 1) % 10 == 0 {
                let snapshot = self.stats.snapshot();
                info!(
                    games = snapshot.games_played,
                    wins = snapshot.wins,
                    losses = snapshot.losses,
                    draws = snapshot.draws,
                    "Progress"
                );
            }
        }

        let snapshot = self.stats.snapshot();
        info!(
            games = snapshot.games_played,
            wins = snapshot.wins,
            losses = snapshot.losses,
            draws = snapshot.draws,
            average_reward = format!("{:.4}", snapshot.average_reward),
            "Arena run complete"
        );

        Ok(snapshot)
    }
}
