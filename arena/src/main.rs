//! Arena - MCTS self-play driver against a random Connect 4 opponent
//!
//! A short-lived process that:
//! 1. Evaluates the start position once with a large iteration budget
//! 2. Plays N full games from that position, one fresh search per move
//! 3. Reports wins, losses, draws and the average reward
//! 4. Optionally writes a JSON summary and dumps the evaluation tree

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

mod arena;
mod config;
mod stats;

use crate::arena::Arena;
use crate::config::Config;

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}

fn run(config: Config) -> Result<()> {
    let stats_path = config.stats_path.clone();
    let dump_tree = config.dump_tree;

    let mut arena = Arena::new(config)?;

    let evaluation = arena.evaluate_start()?;
    println!(
        "best action for start state: {}, expected val: {:.4}",
        evaluation.action(),
        evaluation.best.mean_value
    );
    println!("{}", arena.start());

    if dump_tree {
        if let Some(dump) = arena.dump_tree() {
            println!("{}", dump);
        }
    }

    let snapshot = arena.play_games()?;
    println!("actual value: {:.4}", snapshot.average_reward);
    println!(
        "wins {}, losses: {}, draws: {}",
        snapshot.wins, snapshot.losses, snapshot.draws
    );

    if let Some(path) = stats_path {
        arena.stats().write_stats(Path::new(&path))?;
        info!(path = %path, "Stats written");
    }

    Ok(())
}

fn main() -> Result<()> {
    let config = Config::parse();
    config.validate()?;

    init_tracing(&config.log_level)?;
    info!(log_level = %config.log_level, "Tracing initialized");

    match run(config) {
        Ok(()) => {
            info!("Arena completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Arena failed: {:#}", e);
            Err(e)
        }
    }
}
