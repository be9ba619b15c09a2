// Per-game session registry
//
// The server may run several games at once, so anything remembered between turns is
// keyed by game id. Sessions are created on /start, updated on every /move and
// summarised and dropped on /end.

use log::info;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Instant;

use crate::strategy::Strategy;

pub type GameId = String;

/// What we remember about one game
#[derive(Debug, Clone)]
pub struct GameSession {
    pub started_at: Instant,
    pub turns: u32,
    pub last_turn: i32,
    pub strategy_counts: HashMap<Strategy, u32>,
    pub emergency_moves: u32,
    pub deadline_aborts: u32,
}

impl GameSession {
    fn new() -> Self {
        GameSession {
            started_at: Instant::now(),
            turns: 0,
            last_turn: 0,
            strategy_counts: HashMap::new(),
            emergency_moves: 0,
            deadline_aborts: 0,
        }
    }

    /// The strategy used on most turns, ties broken by name for stable output
    pub fn dominant_strategy(&self) -> Option<Strategy> {
        self.strategy_counts
            .iter()
            .max_by(|(a, ca), (b, cb)| ca.cmp(cb).then_with(|| b.as_str().cmp(a.as_str())))
            .map(|(strategy, _)| *strategy)
    }
}

/// Outcome of one turn, as recorded in the session
#[derive(Debug, Clone, Copy)]
pub struct TurnRecord {
    pub turn: i32,
    /// Unknown when the engine did not finish within the budget
    pub strategy: Option<Strategy>,
    pub emergency: bool,
    pub timed_out: bool,
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<GameId, GameSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        SessionRegistry {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a game; restarting an id resets its session
    pub fn start(&self, game_id: &str) {
        self.sessions.lock().insert(game_id.to_string(), GameSession::new());
        info!("Session opened for game {}", game_id);
    }

    /// Records a turn, creating the session if /start was missed
    pub fn record(&self, game_id: &str, record: TurnRecord) {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .entry(game_id.to_string())
            .or_insert_with(GameSession::new);

        session.turns += 1;
        session.last_turn = record.turn;
        if let Some(strategy) = record.strategy {
            *session.strategy_counts.entry(strategy).or_insert(0) += 1;
        }
        if record.emergency {
            session.emergency_moves += 1;
        }
        if record.timed_out {
            session.deadline_aborts += 1;
        }
    }

    /// Removes a game and returns what was recorded for it
    pub fn end(&self, game_id: &str) -> Option<GameSession> {
        let session = self.sessions.lock().remove(game_id);
        match &session {
            Some(s) => info!(
                "Session closed for game {}: {} turns (last turn {}), dominant strategy {}, {} emergency moves, {} deadline aborts, {:.1}s",
                game_id,
                s.turns,
                s.last_turn,
                s.dominant_strategy().map_or("none", |st| st.as_str()),
                s.emergency_moves,
                s.deadline_aborts,
                s.started_at.elapsed().as_secs_f64()
            ),
            None => info!("Session closed for unknown game {}", game_id),
        }
        session
    }

    pub fn get(&self, game_id: &str) -> Option<GameSession> {
        self.sessions.lock().get(game_id).cloned()
    }

    pub fn active_games(&self) -> usize {
        self.sessions.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(turn: i32, strategy: Strategy) -> TurnRecord {
        TurnRecord {
            turn,
            strategy: Some(strategy),
            emergency: false,
            timed_out: false,
        }
    }

    #[test]
    fn test_sessions_are_isolated_by_game_id() {
        let registry = SessionRegistry::new();
        registry.start("a");
        registry.start("b");
        registry.record("a", turn(0, Strategy::SafeGrowth));
        registry.record("a", turn(1, Strategy::SafeGrowth));
        registry.record("b", turn(0, Strategy::AggressiveExpansion));

        assert_eq!(registry.get("a").map(|s| s.turns), Some(2));
        assert_eq!(registry.get("b").map(|s| s.turns), Some(1));
        assert_eq!(registry.active_games(), 2);
    }

    #[test]
    fn test_record_without_start_creates_session() {
        let registry = SessionRegistry::new();
        registry.record(
            "late",
            TurnRecord {
                turn: 7,
                strategy: None,
                emergency: true,
                timed_out: true,
            },
        );
        let session = registry.get("late").expect("session should exist");
        assert_eq!(session.last_turn, 7);
        assert_eq!(session.emergency_moves, 1);
        assert_eq!(session.deadline_aborts, 1);
        assert_eq!(session.dominant_strategy(), None);
    }

    #[test]
    fn test_end_removes_and_summarises() {
        let registry = SessionRegistry::new();
        registry.start("g");
        registry.record("g", turn(0, Strategy::SafeGrowth));
        registry.record("g", turn(1, Strategy::TerritoryControl));
        registry.record("g", turn(2, Strategy::TerritoryControl));

        let session = registry.end("g").expect("session should exist");
        assert_eq!(session.dominant_strategy(), Some(Strategy::TerritoryControl));
        assert!(registry.get("g").is_none());
        assert!(registry.end("g").is_none());
    }
}
