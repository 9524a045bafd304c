//! Arena statistics tracking and persistence.
//!
//! Tallies game outcomes from the agent's point of view and the start-position
//! evaluation. A snapshot can be written as JSON for later comparison.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

/// Aggregated statistics for one arena run.
#[derive(Debug)]
pub struct ArenaStats {
    start: String,
    seed: u64,
    iterations: u32,
    /// Games that ended with reward > 0
    wins: u32,
    /// Games that ended with reward < 0
    losses: u32,
    /// Games that ended with reward == 0
    draws: u32,
    /// Sum of final rewards for the average
    total_reward: f64,
    /// Sum of agent moves over all games
    total_moves: u64,
    /// Start evaluation: chosen column and its mean value
    start_action: Option<u8>,
    start_value: Option<f32>,
    start_time: Instant,
}

/// Serializable stats for JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaStatsSnapshot {
    pub start: String,
    pub seed: u64,
    pub iterations: u32,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub average_reward: f64,
    pub avg_game_length: f64,
    pub start_action: Option<u8>,
    pub start_value: Option<f32>,
    pub runtime_seconds: f64,
    pub timestamp: u64,
}

impl ArenaStats {
    pub fn new(start: &str, seed: u64, iterations: u32) -> Self {
        Self {
            start: start.to_string(),
            seed,
            iterations,
            wins: 0,
            losses: 0,
            draws: 0,
            total_reward: 0.0,
            total_moves: 0,
            start_action: None,
            start_value: None,
            start_time: Instant::now(),
        }
    }

    /// Record the result of the start-position evaluation.
    pub fn record_start_evaluation(&mut self, action: u8, value: f32) {
        self.start_action = Some(action);
        self.start_value = Some(value);
    }

    /// Record a finished game.
    pub fn record_game(&mut self, moves: u32, final_reward: f32) {
        self.total_moves += moves as u64;
        self.total_reward += final_reward as f64;

        if final_reward > 0.0 {
            self.wins += 1;
        } else if final_reward < 0.0 {
            self.losses += 1;
        } else {
            self.draws += 1;
        }
    }

    pub fn games_played(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    /// Get a snapshot of current stats.
    pub fn snapshot(&self) -> ArenaStatsSnapshot {
        let games = self.games_played();
        let (average_reward, avg_game_length) = if games > 0 {
            (
                self.total_reward / games as f64,
                self.total_moves as f64 / games as f64,
            )
        } else {
            (0.0, 0.0)
        };

        ArenaStatsSnapshot {
            start: self.start.clone(),
            seed: self.seed,
            iterations: self.iterations,
            games_played: games,
            wins: self.wins,
            losses: self.losses,
            draws: self.draws,
            average_reward,
            avg_game_length,
            start_action: self.start_action,
            start_value: self.start_value,
            runtime_seconds: self.start_time.elapsed().as_secs_f64(),
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }

    /// Write a snapshot to `path` as pretty JSON (write-then-rename).
    pub fn write_stats(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.snapshot())
            .context("Failed to serialize arena stats")?;

        let temp_path = path.with_extension("json.tmp");
        let mut file = fs::File::create(&temp_path)
            .with_context(|| format!("Failed to create {}", temp_path.display()))?;
        file.write_all(json.as_bytes())
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;

        if let Err(e) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e).with_context(|| format!("Failed to rename stats to {}", path.display()));
        }

        debug!("Wrote arena stats to {}", path.display());
        Ok(())
    }
}
