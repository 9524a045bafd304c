//! Configuration for the arena binary
//!
//! Defaults come from config.toml (with `C4MCTS_*` environment overrides).
//! CLI arguments take highest priority.

use anyhow::{anyhow, Result};
use clap::Parser;
use engine_config::{load_config, CentralConfig};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::arena::StartPosition;

// Load central config once at startup
static CENTRAL_CONFIG: Lazy<CentralConfig> = Lazy::new(load_config);

fn default_games() -> u32 {
    CENTRAL_CONFIG.arena.games
}

fn default_iterations() -> u32 {
    CENTRAL_CONFIG.mcts.iterations
}

fn default_eval_iterations() -> u32 {
    CENTRAL_CONFIG.arena.eval_iterations
}

fn default_seed() -> u64 {
    CENTRAL_CONFIG.common.seed
}

fn default_start() -> String {
    CENTRAL_CONFIG.arena.start.clone()
}

fn default_exploration() -> f64 {
    CENTRAL_CONFIG.mcts.exploration_constant
}

fn default_log_level() -> String {
    CENTRAL_CONFIG.common.log_level.clone()
}

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(name = "arena")]
#[command(about = "Connect 4 MCTS arena against a random opponent")]
#[command(
    long_about = "Evaluates a start position once with a large iteration budget, then plays
full games from it against a uniformly random opponent, choosing every move
with a fresh MCTS search.

Defaults are loaded from config.toml with environment variable overrides.
CLI arguments take highest priority."
)]
pub struct Config {
    /// Number of games to play after the start evaluation
    #[arg(long, default_value_t = default_games())]
    pub games: u32,

    /// MCTS iterations per move
    #[arg(long, default_value_t = default_iterations())]
    pub iterations: u32,

    /// MCTS iterations for the start-position evaluation
    #[arg(long, default_value_t = default_eval_iterations())]
    pub eval_iterations: u32,

    /// Seed for the RNG shared by search, opponent and rollouts
    #[arg(long, default_value_t = default_seed())]
    pub seed: u64,

    /// Start position (opening, random, midgame)
    #[arg(long, default_value_t = default_start())]
    pub start: String,

    /// UCB1 exploration constant
    #[arg(long, default_value_t = default_exploration())]
    pub exploration: f64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value_t = default_log_level())]
    pub log_level: String,

    /// Write a JSON summary of the run to this path
    #[arg(long)]
    pub stats_path: Option<String>,

    /// Print the full search tree of the start evaluation
    #[arg(long)]
    pub dump_tree: bool,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(anyhow!("iterations must be greater than 0"));
        }

        if self.eval_iterations == 0 {
            return Err(anyhow!("eval_iterations must be greater than 0"));
        }

        if !self.exploration.is_finite() || self.exploration < 0.0 {
            return Err(anyhow!(
                "exploration must be a finite non-negative number, got {}",
                self.exploration
            ));
        }

        self.start_position()?;

        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(anyhow!(
                "invalid log level '{}', expected one of trace, debug, info, warn, error",
                self.log_level
            ));
        }

        Ok(())
    }

    /// Parsed `--start` value.
    pub fn start_position(&self) -> Result<StartPosition> {
        self.start.parse().map_err(|e: String| anyhow!(e))
    }

    /// Search settings for the library.
    pub fn mcts_config(&self) -> mcts::MctsConfig {
        mcts::MctsConfig::default()
            .with_iterations(self.iterations)
            .with_exploration(self.exploration as f32)
    }
}
