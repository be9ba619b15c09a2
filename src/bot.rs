// Battlesnake bot: endpoint logic behind the HTTP handlers
//
// The decision engine is synchronous and CPU-bound, so /move runs it on a blocking
// task and polls the shared state until it finishes or the response budget runs out.
// Whatever the engine last published is answered, so a slow turn still gets a move.

use log::{error, info, warn};
use serde_json::{json, Value};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::debug_logger::{DebugLogger, LogEntry};
use crate::engine::{emergency_move, Decision, DecisionEngine, SharedSearchState};
use crate::grid::BoardState;
use crate::session::{SessionRegistry, TurnRecord};
use crate::simple_profiler;
use crate::types::{Battlesnake, Board, Direction, Game};

/// Battlesnake Bot with OOP-style API
/// Holds the engine and per-game state and exposes methods corresponding to API endpoints
pub struct Bot {
    engine: Arc<DecisionEngine>,
    sessions: SessionRegistry,
    logger: DebugLogger,
}

impl Bot {
    /// Creates a bot without debug logging
    pub fn new(config: Config) -> Self {
        Self::with_logger(config, DebugLogger::disabled())
    }

    pub fn with_logger(config: Config, logger: DebugLogger) -> Self {
        Bot {
            engine: Arc::new(DecisionEngine::new(config)),
            sessions: SessionRegistry::new(),
            logger,
        }
    }

    pub fn config(&self) -> &Config {
        self.engine.config()
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Returns bot metadata
    /// Corresponds to GET / endpoint
    pub fn info(&self) -> Value {
        info!("INFO");

        json!({
            "apiversion": "1",
            "author": "tournament-snake",
            "color": "#00DEAD",
            "head": "default",
            "tail": "default",
        })
    }

    /// Called when a game starts
    /// Corresponds to POST /start endpoint
    pub fn start(&self, game: &Game, _turn: &i32, board: &Board, _you: &Battlesnake) {
        info!(
            "GAME START {} ({}x{}, {} snakes, mode {})",
            game.id,
            board.width,
            board.height,
            board.snakes.len(),
            if game.ruleset.name.is_empty() { "standard" } else { game.ruleset.name.as_str() }
        );
        self.sessions.start(&game.id);
    }

    /// Called when a game ends
    /// Corresponds to POST /end endpoint
    pub fn end(&self, game: &Game, turn: &i32, _board: &Board, you: &Battlesnake) {
        info!("GAME OVER {} at turn {} (length {})", game.id, turn, you.length);
        self.sessions.end(&game.id);
    }

    /// Computes and returns the next move
    /// Corresponds to POST /move endpoint
    ///
    /// 1. Spawns the decision engine on a blocking task
    /// 2. Polls the shared state until the engine finishes or the budget is spent
    /// 3. Answers with the best move published so far
    ///
    /// A panic inside the engine is caught and answered with the emergency move.
    pub async fn get_move(
        &self,
        game: &Game,
        turn: &i32,
        board: &Board,
        you: &Battlesnake,
    ) -> Value {
        let start_time = Instant::now();
        let turn = *turn;

        let state = BoardState::from_request(game, turn, board, you);
        let fallback = emergency_move(&state);

        let shared = Arc::new(SharedSearchState::new(fallback));
        let shared_clone = shared.clone();
        let engine = self.engine.clone();

        let handle = tokio::task::spawn_blocking(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                engine.decide(&state, start_time, Some(&shared_clone))
            }));
            simple_profiler::merge_thread_local();

            match outcome {
                Ok(decision) => Some(decision),
                Err(_) => {
                    error!(
                        "Turn {}: decision engine panicked, answering {}",
                        turn,
                        fallback.as_str()
                    );
                    shared_clone.finish(fallback, f64::NEG_INFINITY);
                    None
                }
            }
        });

        // Polling loop: check for results or timeout
        let effective_budget = self.config().timing.effective_budget_ms();
        let polling_interval = Duration::from_millis(self.config().timing.polling_interval_ms);

        loop {
            if shared.is_complete() {
                break;
            }
            let elapsed = start_time.elapsed().as_millis() as u64;
            if elapsed >= effective_budget {
                break;
            }
            tokio::time::sleep(polling_interval).await;
        }

        let decision: Option<Decision> = if shared.is_complete() {
            match handle.await {
                Ok(decision) => decision,
                Err(e) => {
                    error!("Turn {}: decision task failed: {}", turn, e);
                    None
                }
            }
        } else {
            warn!(
                "Turn {}: response budget of {}ms exhausted, answering best move so far",
                turn, effective_budget
            );
            None
        };

        let chosen_move = decision.as_ref().map_or_else(|| shared.best_move(), |d| d.direction);
        // Without a decision, nothing scored means the fallback is what we answered
        let emergency = decision
            .as_ref()
            .map_or(shared.best_score() == f64::NEG_INFINITY, |d| d.emergency);
        self.record_turn(game, turn, board, you, chosen_move, emergency, decision.as_ref());

        match &decision {
            Some(d) => info!(
                "Turn {}: Chose {} (strategy: {}, phase: {}, score: {:.1}, time: {}ms)",
                turn,
                chosen_move.as_str(),
                d.strategy,
                d.phase.as_str(),
                d.score,
                start_time.elapsed().as_millis()
            ),
            None => info!(
                "Turn {}: Chose {} (fallback, time: {}ms)",
                turn,
                chosen_move.as_str(),
                start_time.elapsed().as_millis()
            ),
        }

        json!({ "move": chosen_move.as_str() })
    }

    #[allow(clippy::too_many_arguments)]
    fn record_turn(
        &self,
        game: &Game,
        turn: i32,
        board: &Board,
        you: &Battlesnake,
        chosen: Direction,
        emergency: bool,
        decision: Option<&Decision>,
    ) {
        self.sessions.record(
            &game.id,
            TurnRecord {
                turn,
                strategy: decision.map(|d| d.strategy),
                emergency,
                timed_out: decision.map_or(true, |d| d.timed_out),
            },
        );

        if self.logger.is_enabled() {
            self.logger
                .log_move(LogEntry::new(game, turn, board, &you.id, chosen, decision));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Coord, Ruleset};

    fn snake(id: &str, body: &[(i32, i32)]) -> Battlesnake {
        let body: Vec<Coord> = body.iter().map(|&(x, y)| Coord::new(x, y)).collect();
        Battlesnake {
            id: id.to_string(),
            health: 100,
            head: body[0],
            length: body.len() as i32,
            body,
            ..Default::default()
        }
    }

    fn game(id: &str) -> Game {
        Game {
            id: id.to_string(),
            ruleset: Ruleset {
                name: "standard".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_info_reports_api_version() {
        let bot = Bot::new(Config::default_hardcoded());
        let info = bot.info();
        assert_eq!(info["apiversion"], "1");
        assert!(info["color"].is_string());
    }

    #[tokio::test]
    async fn test_move_is_recorded_in_session() {
        let bot = Bot::new(Config::default_hardcoded());
        let me = snake("me", &[(0, 0), (1, 0), (2, 0)]);
        let board = Board {
            width: 11,
            height: 11,
            food: vec![],
            snakes: vec![me.clone()],
            hazards: vec![],
        };
        let g = game("session-game");

        bot.start(&g, &0, &board, &me);
        let response = bot.get_move(&g, &3, &board, &me).await;
        assert_eq!(response["move"], "up");

        let session = bot.sessions().get("session-game").expect("session should exist");
        assert_eq!(session.turns, 1);
        assert_eq!(session.last_turn, 3);

        bot.end(&g, &3, &board, &me);
        assert_eq!(bot.sessions().active_games(), 0);
    }
}
