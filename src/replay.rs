// Replay module for analyzing historical game states and debugging decision-making
//
// This module provides functionality to:
// 1. Parse JSONL debug logs
// 2. Re-run the decision engine on historical states
// 3. Compare logged vs replayed moves and strategies
// 4. Generate analysis reports

use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use crate::config::Config;
use crate::debug_logger::LogEntry;
use crate::engine::{Decision, DecisionEngine};
use crate::grid::BoardState;
use crate::types::{Direction, Game, Ruleset};

/// Result of replaying a single turn
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub turn: i32,
    pub original_move: Direction,
    pub replayed_move: Direction,
    pub matches: bool,
    pub original_strategy: String,
    pub replayed_strategy: String,
    pub original_score: Option<f64>,
    pub replayed_score: f64,
    pub computation_time_ms: u128,
}

/// Statistics for a complete replay session
#[derive(Debug, Default)]
pub struct ReplayStats {
    pub total_turns: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub match_rate: f64,
    pub strategy_changes: usize,
}

/// Replay engine for analyzing debug logs
pub struct ReplayEngine {
    engine: DecisionEngine,
    verbose: bool,
}

impl ReplayEngine {
    /// Creates a new replay engine with the given configuration
    pub fn new(config: Config, verbose: bool) -> Self {
        ReplayEngine {
            engine: DecisionEngine::new(config),
            verbose,
        }
    }

    /// Loads all log entries from a JSONL file
    pub fn load_log_file<P: AsRef<Path>>(&self, log_path: P) -> Result<Vec<LogEntry>, String> {
        let file =
            File::open(log_path.as_ref()).map_err(|e| format!("Failed to open log file: {}", e))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: LogEntry = serde_json::from_str(&line)
                .map_err(|e| format!("Failed to parse JSON on line {}: {}", line_num + 1, e))?;

            entries.push(entry);
        }

        info!("Loaded {} log entries", entries.len());
        Ok(entries)
    }

    /// Rebuilds the snapshot for a logged turn and runs the engine on it
    pub fn replay_turn(&self, entry: &LogEntry) -> Result<(Decision, u128), String> {
        // Entries written before you_id was logged: assume the first snake is ours
        let found = if entry.you_id.is_empty() {
            entry.board.snakes.first()
        } else {
            entry.board.snakes.iter().find(|s| s.id == entry.you_id)
        };
        let you = found.ok_or_else(|| {
            format!(
                "Snake with id '{}' not found in board state for turn {}",
                entry.you_id, entry.turn
            )
        })?;

        let game = Game {
            id: entry.game_id.clone(),
            ruleset: Ruleset {
                name: entry.game_mode.clone(),
                ..Default::default()
            },
            ..Default::default()
        };
        let state = BoardState::from_request(&game, entry.turn, &entry.board, you);

        let start_time = Instant::now();
        let decision = self.engine.decide(&state, start_time, None);
        Ok((decision, start_time.elapsed().as_millis()))
    }

    /// Replays a single log entry and compares the result
    pub fn replay_entry(&self, entry: &LogEntry) -> Result<ReplayResult, String> {
        if self.verbose {
            info!("Replaying turn {}...", entry.turn);
        }

        let original_move = Direction::parse(&entry.chosen_move)?;
        let (decision, computation_time) = self.replay_turn(entry)?;
        let matches = original_move == decision.direction;

        let result = ReplayResult {
            turn: entry.turn,
            original_move,
            replayed_move: decision.direction,
            matches,
            original_strategy: entry.strategy.clone(),
            replayed_strategy: decision.strategy.as_str().to_string(),
            original_score: entry.score,
            replayed_score: decision.score,
            computation_time_ms: computation_time,
        };

        if self.verbose {
            if matches {
                info!(
                    "Turn {}: ✓ MATCH - {} ({}, score: {:.1}, time: {}ms)",
                    entry.turn,
                    result.replayed_move.as_str(),
                    result.replayed_strategy,
                    result.replayed_score,
                    computation_time
                );
            } else {
                warn!(
                    "Turn {}: ✗ MISMATCH - Original: {} ({}), Replayed: {} ({}, score: {:.1}, time: {}ms)",
                    entry.turn,
                    original_move.as_str(),
                    entry.strategy,
                    result.replayed_move.as_str(),
                    result.replayed_strategy,
                    result.replayed_score,
                    computation_time
                );
            }
        }

        Ok(result)
    }

    /// Replays all entries in a log file
    pub fn replay_all(&self, entries: &[LogEntry]) -> Vec<ReplayResult> {
        entries
            .iter()
            .filter_map(|entry| match self.replay_entry(entry) {
                Ok(result) => Some(result),
                Err(e) => {
                    warn!("Failed to replay turn {}: {}", entry.turn, e);
                    None
                }
            })
            .collect()
    }

    /// Replays specific turns from a log file
    pub fn replay_turns(
        &self,
        entries: &[LogEntry],
        turn_numbers: &[i32],
    ) -> Result<Vec<ReplayResult>, String> {
        let mut results = Vec::new();

        for turn_num in turn_numbers {
            let entry = entries
                .iter()
                .find(|e| e.turn == *turn_num)
                .ok_or_else(|| format!("Turn {} not found in log file", turn_num))?;

            match self.replay_entry(entry) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("Failed to replay turn {}: {}", turn_num, e);
                }
            }
        }

        Ok(results)
    }

    /// Generates statistics from replay results
    pub fn generate_stats(&self, results: &[ReplayResult]) -> ReplayStats {
        let total_turns = results.len();
        let matches = results.iter().filter(|r| r.matches).count();
        let mismatches = total_turns - matches;
        let match_rate = if total_turns > 0 {
            (matches as f64 / total_turns as f64) * 100.0
        } else {
            0.0
        };
        let strategy_changes = results
            .iter()
            .filter(|r| !r.original_strategy.is_empty() && r.original_strategy != r.replayed_strategy)
            .count();

        ReplayStats {
            total_turns,
            matches,
            mismatches,
            match_rate,
            strategy_changes,
        }
    }

    /// Prints a detailed report of replay results
    pub fn print_report(&self, results: &[ReplayResult]) {
        let stats = self.generate_stats(results);

        println!("\n═══════════════════════════════════════════════════════════");
        println!("                    REPLAY REPORT");
        println!("═══════════════════════════════════════════════════════════");
        println!("Total Turns:       {}", stats.total_turns);
        println!("Matches:           {} ({:.1}%)", stats.matches, stats.match_rate);
        println!("Mismatches:        {}", stats.mismatches);
        println!("Strategy Changes:  {}", stats.strategy_changes);
        println!("═══════════════════════════════════════════════════════════\n");

        if !results.is_empty() {
            let avg_time: f64 = results.iter().map(|r| r.computation_time_ms as f64).sum::<f64>()
                / results.len() as f64;
            println!("Average Computation Time:   {:.1}ms\n", avg_time);
        }

        let mismatches: Vec<_> = results.iter().filter(|r| !r.matches).collect();
        if !mismatches.is_empty() {
            println!("═══════════════════════════════════════════════════════════");
            println!("                  DETAILED MISMATCHES");
            println!("═══════════════════════════════════════════════════════════");

            for result in mismatches {
                println!(
                    "Turn {}: {} → {} ({} → {}, score: {}, time: {}ms)",
                    result.turn,
                    result.original_move.as_str(),
                    result.replayed_move.as_str(),
                    if result.original_strategy.is_empty() { "?" } else { result.original_strategy.as_str() },
                    result.replayed_strategy,
                    format_score(result.replayed_score),
                    result.computation_time_ms
                );
            }
            println!();
        }
    }

    /// Validates that specific expected moves were made
    pub fn validate_expected_moves(
        &self,
        entries: &[LogEntry],
        expected_moves: &[(i32, Vec<Direction>)], // (turn, acceptable_moves)
    ) -> Result<(), String> {
        for (turn, acceptable) in expected_moves {
            let entry = entries
                .iter()
                .find(|e| e.turn == *turn)
                .ok_or_else(|| format!("Turn {} not found in log", turn))?;

            let actual_move = Direction::parse(&entry.chosen_move)?;

            if !acceptable.contains(&actual_move) {
                return Err(format!(
                    "Turn {}: Expected one of {:?}, but got {}",
                    turn,
                    acceptable.iter().map(|d| d.as_str()).collect::<Vec<_>>(),
                    actual_move.as_str()
                ));
            }
        }

        Ok(())
    }
}

fn format_score(score: f64) -> String {
    if score.is_finite() {
        format!("{:.1}", score)
    } else {
        "n/a".to_string()
    }
}
