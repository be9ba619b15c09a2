// Debug logging module for asynchronous game state logging
//
// This module provides fire-and-forget async logging to avoid blocking
// the main request/response cycle. Each turn's state is written to a JSONL file
// that the replay tool can read back.

use log::error;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::engine::Decision;
use crate::types::{Board, Direction, Game};

/// A single line of the debug log
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub turn: i32,
    #[serde(default)]
    pub game_id: String,
    #[serde(default)]
    pub game_mode: String,
    #[serde(default)]
    pub you_id: String,
    pub chosen_move: String,
    #[serde(default)]
    pub strategy: String,
    /// Absent when the move came from the emergency fallback or a deadline abort
    #[serde(default)]
    pub score: Option<f64>,
    pub board: Board,
    pub timestamp: String,
}

impl LogEntry {
    /// `decision` is `None` when the engine did not finish and `chosen` came from the poller
    pub fn new(
        game: &Game,
        turn: i32,
        board: &Board,
        you_id: &str,
        chosen: Direction,
        decision: Option<&Decision>,
    ) -> Self {
        LogEntry {
            turn,
            game_id: game.id.clone(),
            game_mode: game.ruleset.name.clone(),
            you_id: you_id.to_string(),
            chosen_move: chosen.as_str().to_string(),
            strategy: decision.map_or(String::new(), |d| d.strategy.as_str().to_string()),
            score: decision.map(|d| d.score).filter(|s| s.is_finite()),
            board: board.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Shared debug logger state
/// Uses Arc<Mutex<File>> to allow concurrent async writes from multiple tasks
#[derive(Clone)]
pub struct DebugLogger {
    file: Arc<Mutex<Option<File>>>,
    enabled: bool,
}

impl DebugLogger {
    /// Creates a new debug logger
    /// If enabled is true, initializes the log file (truncating if it exists)
    pub async fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return Self::disabled();
        }

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
            .await
        {
            Ok(file) => {
                log::info!("Debug logging enabled: {}", log_file_path);
                DebugLogger {
                    file: Arc::new(Mutex::new(Some(file))),
                    enabled: true,
                }
            }
            Err(e) => {
                error!("Failed to create debug log file '{}': {}", log_file_path, e);
                Self::disabled()
            }
        }
    }

    /// Creates a disabled debug logger (no-op)
    pub fn disabled() -> Self {
        DebugLogger {
            file: Arc::new(Mutex::new(None)),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Logs a move decision asynchronously (fire-and-forget)
    /// This spawns a tokio task that writes to the file without blocking
    pub fn log_move(&self, entry: LogEntry) {
        if !self.enabled {
            return;
        }

        let file_handle = self.file.clone();
        tokio::spawn(async move {
            Self::write_entry(file_handle, entry).await;
        });
    }

    /// Performs the actual file write
    async fn write_entry(file_handle: Arc<Mutex<Option<File>>>, entry: LogEntry) {
        let mut file_guard = file_handle.lock().await;

        if let Some(file) = file_guard.as_mut() {
            match serde_json::to_string(&entry) {
                Ok(json_line) => {
                    let line_with_newline = format!("{}\n", json_line);
                    if let Err(e) = file.write_all(line_with_newline.as_bytes()).await {
                        error!("Failed to write debug log entry: {}", e);
                    } else if let Err(e) = file.flush().await {
                        error!("Failed to flush debug log: {}", e);
                    }
                }
                Err(e) => {
                    error!("Failed to serialize debug log entry: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Coord;

    fn entry(turn: i32) -> LogEntry {
        LogEntry {
            turn,
            game_id: "game-1".to_string(),
            game_mode: "standard".to_string(),
            you_id: "me".to_string(),
            chosen_move: "left".to_string(),
            strategy: "safe_growth".to_string(),
            score: Some(1234.5),
            board: Board {
                height: 11,
                width: 11,
                food: vec![Coord::new(3, 3)],
                snakes: vec![],
                hazards: vec![],
            },
            timestamp: "2025-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn test_entries_are_written_as_json_lines() {
        let path = std::env::temp_dir().join(format!("debug_logger_test_{}.jsonl", std::process::id()));
        let path_str = path.to_string_lossy().to_string();

        let logger = DebugLogger::new(true, &path_str).await;
        assert!(logger.is_enabled());
        DebugLogger::write_entry(logger.file.clone(), entry(1)).await;
        DebugLogger::write_entry(logger.file.clone(), entry(2)).await;

        let contents = tokio::fs::read_to_string(&path).await.expect("log should exist");
        let parsed: Vec<LogEntry> = contents
            .lines()
            .map(|line| serde_json::from_str(line).expect("each line is a JSON entry"))
            .collect();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].turn, 2);
        assert_eq!(parsed[0].score, Some(1234.5));

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[test]
    fn test_older_entries_without_metadata_parse() {
        let raw = r#"{"turn":3,"chosen_move":"up","board":{"height":7,"width":7},"timestamp":"t"}"#;
        let parsed: LogEntry = serde_json::from_str(raw).expect("minimal entry should parse");
        assert!(parsed.you_id.is_empty());
        assert!(parsed.score.is_none());
    }

    #[test]
    fn test_disabled_logger_ignores_moves() {
        let logger = DebugLogger::disabled();
        assert!(!logger.is_enabled());
        // Returns before reaching tokio::spawn, so no runtime is needed
        logger.log_move(entry(0));
    }
}
