// Decision orchestration
//
// Turns a BoardState into a single Direction: analyse the turn, pick a strategy,
// score the legal candidates until the scoring deadline, then filter and select.
// Everything here is synchronous; the async wrapper in bot.rs drives it from a
// blocking task and reads progress through SharedSearchState.

use log::{debug, warn};
use rand::prelude::IndexedRandom;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, Instant};

use crate::config::{Config, TieBreak};
use crate::flood_fill::reachable_count;
use crate::grid::BoardState;
use crate::pathfinding::SearchLimits;
use crate::prediction::predict_enemy_moves;
use crate::profile;
use crate::scoring::{MoveScorer, ScoreBreakdown};
use crate::simple_profiler;
use crate::strategy::{analyze_context, select_strategy, CompetitivePosition, GamePhase, Strategy};
use crate::types::{Coord, Direction};

/// Lock-free shared state for communication between the async poller and the engine
#[derive(Debug)]
pub struct SharedSearchState {
    /// Best move found so far (encoded as direction index)
    best_move: AtomicU8,
    /// Best score so far, stored as f64 bits
    best_score: AtomicU64,
    /// Flag indicating the decision is final
    search_complete: AtomicBool,
}

impl SharedSearchState {
    /// Starts out holding `fallback` so the poller always has something to answer with
    pub fn new(fallback: Direction) -> Self {
        SharedSearchState {
            best_move: AtomicU8::new(fallback.index()),
            best_score: AtomicU64::new(f64::NEG_INFINITY.to_bits()),
            search_complete: AtomicBool::new(false),
        }
    }

    /// Publishes a candidate if it beats the current best
    pub fn offer(&self, direction: Direction, score: f64) {
        if score > self.best_score() {
            self.best_score.store(score.to_bits(), Ordering::Release);
            self.best_move.store(direction.index(), Ordering::Release);
        }
    }

    /// Publishes the final decision unconditionally and marks the search complete
    pub fn finish(&self, direction: Direction, score: f64) {
        self.best_score.store(score.to_bits(), Ordering::Release);
        self.best_move.store(direction.index(), Ordering::Release);
        self.search_complete.store(true, Ordering::Release);
    }

    pub fn best_move(&self) -> Direction {
        Direction::from_index(self.best_move.load(Ordering::Acquire))
    }

    pub fn best_score(&self) -> f64 {
        f64::from_bits(self.best_score.load(Ordering::Acquire))
    }

    pub fn is_complete(&self) -> bool {
        self.search_complete.load(Ordering::Acquire)
    }
}

/// A scored legal move
#[derive(Debug, Clone)]
pub struct Candidate {
    pub direction: Direction,
    pub position: Coord,
    pub breakdown: ScoreBreakdown,
    /// Free cells reachable after the move
    pub space: usize,
    pub escape_routes: usize,
}

impl Candidate {
    pub fn score(&self) -> f64 {
        self.breakdown.total
    }
}

/// Outcome of one turn's decision
#[derive(Debug, Clone)]
pub struct Decision {
    pub direction: Direction,
    pub score: f64,
    pub strategy: Strategy,
    pub phase: GamePhase,
    pub position: CompetitivePosition,
    /// Scored candidates, best first
    pub candidates: Vec<Candidate>,
    /// True when no legal move existed and the emergency fallback answered
    pub emergency: bool,
    /// True when the scoring deadline cut the candidate loop short
    pub timed_out: bool,
}

/// Moves whose destination is inside the board and not occupied, in preference order
pub fn legal_moves(state: &BoardState) -> Vec<Direction> {
    Direction::all()
        .into_iter()
        .filter(|dir| state.is_free(dir.apply(&state.head)))
        .collect()
}

/// Last-resort move when nothing is legal
///
/// Probes in preference order for an open cell, then a cell only held by a snake
/// tail that will move, then any in-bounds cell. Defaults to up.
pub fn emergency_move(state: &BoardState) -> Direction {
    let dirs = Direction::all();
    let head = state.head;

    dirs.iter()
        .find(|d| state.is_free(d.apply(&head)))
        .or_else(|| {
            dirs.iter().find(|d| {
                let next = d.apply(&head);
                !state.is_wall(next) && state.is_vacating_tail(next)
            })
        })
        .or_else(|| dirs.iter().find(|d| !state.is_wall(d.apply(&head))))
        .copied()
        .unwrap_or(Direction::Up)
}

pub struct DecisionEngine {
    config: Config,
}

impl DecisionEngine {
    pub fn new(config: Config) -> Self {
        DecisionEngine { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Chooses a move for the given snapshot
    ///
    /// `started` is when the request arrived; scoring stops once the scoring share of
    /// the time budget has elapsed. Progress is published to `shared` when given.
    pub fn decide(
        &self,
        state: &BoardState,
        started: Instant,
        shared: Option<&SharedSearchState>,
    ) -> Decision {
        let config = &self.config;
        let deadline = started + Duration::from_millis(config.timing.scoring_budget_ms());

        let context = analyze_context(state, config);
        let strategy = select_strategy(state, &context, config);
        debug!(
            "Turn {}: phase={} position={} strategy={} space_share={:.2} food_competition={}",
            state.turn,
            context.phase.as_str(),
            context.position.as_str(),
            strategy,
            context.territory.space_advantage,
            context.food_competition
        );

        let moves = profile!("candidate_gen", { legal_moves(state) });
        if moves.is_empty() {
            let direction = emergency_move(state);
            warn!(
                "Turn {}: no legal moves, emergency fallback {}",
                state.turn,
                direction.as_str()
            );
            return self.finish(
                shared,
                Decision {
                    direction,
                    score: config.safety.blocked_score as f64 * config.weights.safety,
                    strategy,
                    phase: context.phase,
                    position: context.position,
                    candidates: Vec::new(),
                    emergency: true,
                    timed_out: false,
                },
            );
        }

        let predictions = predict_enemy_moves(state, &config.prediction);
        let limits = SearchLimits {
            deadline,
            max_iterations: config.timing.astar_max_iterations,
            check_interval: config.timing.deadline_check_interval,
        };
        let scorer = MoveScorer::new(state, config, &context, strategy, &predictions, limits);

        let mut candidates = Vec::with_capacity(moves.len());
        let mut timed_out = false;
        for direction in moves {
            if Instant::now() >= deadline {
                timed_out = true;
                break;
            }

            let position = direction.apply(&state.head);
            let breakdown = scorer.score(direction);
            debug!("Turn {}: {} {:?}", state.turn, direction.as_str(), breakdown);

            if let Some(shared) = shared {
                shared.offer(direction, breakdown.total);
            }
            candidates.push(Candidate {
                direction,
                position,
                breakdown,
                space: reachable_count(position, state, None),
                escape_routes: state.escape_routes(position),
            });
        }

        if timed_out {
            simple_profiler::record_deadline_abort();
            warn!(
                "Turn {}: scoring deadline reached after {} candidates",
                state.turn,
                candidates.len()
            );
        }

        if candidates.is_empty() {
            let direction = emergency_move(state);
            return self.finish(
                shared,
                Decision {
                    direction,
                    score: f64::NEG_INFINITY,
                    strategy,
                    phase: context.phase,
                    position: context.position,
                    candidates,
                    emergency: false,
                    timed_out,
                },
            );
        }

        // Stable: equal scores keep preference order
        candidates.sort_by(|a, b| b.score().total_cmp(&a.score()));

        let chosen = self.select(state, &candidates);
        self.finish(
            shared,
            Decision {
                direction: chosen.direction,
                score: chosen.score(),
                strategy,
                phase: context.phase,
                position: context.position,
                candidates: candidates.clone(),
                emergency: false,
                timed_out,
            },
        )
    }

    /// Applies the safety filters and the tie-break to sorted candidates
    ///
    /// Cells next to an equal or longer enemy head are dropped outright, whatever
    /// they scored, unless every candidate is one. The score floor and the trap
    /// check then run on what is left.
    fn select<'c>(&self, state: &BoardState, candidates: &'c [Candidate]) -> &'c Candidate {
        let sel = &self.config.selection;
        let min_space = state.length.max(0) as usize + sel.trap_margin;

        let unopposed: Vec<&Candidate> = candidates
            .iter()
            .filter(|c| !borders_stronger_head(state, c.position))
            .collect();
        let base: Vec<&Candidate> = if unopposed.is_empty() {
            debug!(
                "Turn {}: every candidate borders a head we would lose to",
                state.turn
            );
            candidates.iter().collect()
        } else {
            unopposed
        };

        let validated: Vec<&Candidate> = base
            .iter()
            .copied()
            .filter(|c| {
                c.score() > sel.score_floor
                    && c.space >= min_space
                    && c.escape_routes >= sel.min_escape_routes
            })
            .collect();

        let pool: Vec<&Candidate> = if validated.is_empty() {
            debug!(
                "Turn {}: every candidate failed validation, ignoring the trap filter",
                state.turn
            );
            base
        } else {
            validated
        };

        let top = pool[0];
        match sel.tie_break {
            TieBreak::Deterministic => top,
            TieBreak::Random => {
                let tied: Vec<&Candidate> = pool
                    .iter()
                    .copied()
                    .filter(|c| c.score() == top.score())
                    .collect();
                tied.choose(&mut rand::rng()).copied().unwrap_or(top)
            }
        }
    }

    fn finish(&self, shared: Option<&SharedSearchState>, decision: Decision) -> Decision {
        if let Some(shared) = shared {
            shared.finish(decision.direction, decision.score);
        }
        decision
    }
}

/// True iff an enemy at least as long as us has its head next to `pos`
fn borders_stronger_head(state: &BoardState, pos: Coord) -> bool {
    state
        .enemies()
        .any(|e| e.length >= state.length && pos.manhattan(e.head()) == 1)
}

/// Single-call entry point: snapshot in, direction out
pub fn decide_move(state: &BoardState, config: &Config) -> Direction {
    DecisionEngine::new(config.clone())
        .decide(state, Instant::now(), None)
        .direction
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::test_support::BoardBuilder;

    fn config() -> Config {
        Config::default_hardcoded()
    }

    #[test]
    fn test_legal_moves_skip_walls_and_bodies() {
        let state = BoardBuilder::new(11, 11)
            .us(&[(0, 0), (1, 0), (2, 0)])
            .build();
        assert_eq!(legal_moves(&state), vec![Direction::Up]);
    }

    #[test]
    fn test_emergency_prefers_open_then_tail_then_any() {
        // Fully enclosed head: right is our neck, up is an enemy tail, left and down are walls
        let state = BoardBuilder::new(5, 5)
            .us(&[(0, 0), (1, 0), (1, 1), (2, 1), (2, 0), (2, 0)])
            .enemy("them", &[(0, 3), (0, 2), (0, 1)])
            .build();
        assert!(legal_moves(&state).is_empty());
        assert_eq!(emergency_move(&state), Direction::Up);

        // Same box but the enemy tail is stacked, so no tail will move
        let stacked = BoardBuilder::new(5, 5)
            .us(&[(0, 0), (1, 0), (1, 1), (2, 1), (2, 0), (2, 0)])
            .enemy("them", &[(0, 3), (0, 2), (0, 1), (0, 1)])
            .build();
        // Up and right are both in bounds; up comes first
        assert_eq!(emergency_move(&stacked), Direction::Up);
    }

    #[test]
    fn test_emergency_takes_the_vacating_tail_over_a_body() {
        // Head at (1,0): up (1,1) is our body, left (0,0) is an enemy tail, right (2,0) is body
        let state = BoardBuilder::new(5, 5)
            .us(&[(1, 0), (2, 0), (2, 1), (1, 1), (1, 2), (1, 2)])
            .enemy("them", &[(0, 2), (0, 1), (0, 0)])
            .build();
        assert!(legal_moves(&state).is_empty());
        assert_eq!(emergency_move(&state), Direction::Left);
    }

    #[test]
    fn test_shared_state_tracks_best_offer() {
        let shared = SharedSearchState::new(Direction::Left);
        assert_eq!(shared.best_move(), Direction::Left);
        assert!(!shared.is_complete());

        shared.offer(Direction::Up, 10.0);
        shared.offer(Direction::Down, 5.0);
        assert_eq!(shared.best_move(), Direction::Up);
        assert_eq!(shared.best_score(), 10.0);

        shared.finish(Direction::Right, 3.0);
        assert_eq!(shared.best_move(), Direction::Right);
        assert!(shared.is_complete());
    }

    #[test]
    fn test_decide_avoids_longer_enemy_head() {
        let state = BoardBuilder::new(11, 11)
            .turn(40)
            .us(&[(5, 5), (5, 4), (5, 3)])
            .enemy("big", &[(7, 5), (8, 5), (9, 5), (9, 6), (9, 7)])
            .build();
        let engine = DecisionEngine::new(config());
        let decision = engine.decide(&state, Instant::now(), None);
        assert_ne!(decision.direction, Direction::Right);
        assert!(!decision.emergency);
        assert_eq!(decision.candidates.len(), 3);
    }

    #[test]
    fn test_food_does_not_lure_next_to_longer_head() {
        // Hungry, with food lined up past the cell next to the bigger head
        let state = BoardBuilder::new(11, 11)
            .turn(40)
            .health(20)
            .us(&[(5, 5), (5, 4), (5, 3)])
            .enemy("big", &[(7, 5), (8, 5), (9, 5), (9, 6), (9, 7)])
            .food(&[(6, 4), (6, 3), (6, 2)])
            .build();
        let decision = DecisionEngine::new(config()).decide(&state, Instant::now(), None);
        assert_eq!(decision.candidates.len(), 3);
        assert_ne!(decision.direction, Direction::Right);

        let packed = BoardBuilder::new(11, 11)
            .turn(40)
            .health(20)
            .us(&[(5, 5), (5, 4), (5, 3)])
            .enemy("big", &[(7, 5), (8, 5), (9, 5), (9, 6), (9, 7)])
            .food(&[(6, 4), (7, 4), (6, 3), (7, 3)])
            .build();
        let decision = DecisionEngine::new(config()).decide(&packed, Instant::now(), None);
        assert_ne!(decision.direction, Direction::Right);
    }

    #[test]
    fn test_equal_length_head_is_avoided_too() {
        let state = BoardBuilder::new(11, 11)
            .turn(40)
            .us(&[(5, 5), (5, 4), (5, 3)])
            .enemy("twin", &[(5, 7), (6, 7), (7, 7)])
            .food(&[(5, 6)])
            .build();
        let decision = DecisionEngine::new(config()).decide(&state, Instant::now(), None);
        assert_ne!(decision.direction, Direction::Up);
    }

    #[test]
    fn test_head_risk_allowed_when_every_move_has_it() {
        // Both legal cells, (0,2) and (1,1), touch the longer head at (1,2)
        let state = BoardBuilder::new(11, 11)
            .turn(40)
            .us(&[(0, 1), (0, 0), (1, 0)])
            .enemy("big", &[(1, 2), (2, 2), (3, 2), (4, 2)])
            .build();
        let decision = DecisionEngine::new(config()).decide(&state, Instant::now(), None);
        assert!(!decision.emergency);
        assert!(matches!(decision.direction, Direction::Up | Direction::Right));
        assert_eq!(decision.candidates.len(), 2);
    }

    #[test]
    fn test_candidates_are_sorted_best_first() {
        let state = BoardBuilder::new(11, 11)
            .turn(40)
            .us(&[(3, 3), (3, 2), (3, 1)])
            .enemy("them", &[(8, 8), (8, 7), (8, 6)])
            .food(&[(1, 3)])
            .build();
        let decision = DecisionEngine::new(config()).decide(&state, Instant::now(), None);
        for pair in decision.candidates.windows(2) {
            assert!(pair[0].score() >= pair[1].score());
        }
        assert_eq!(decision.direction, decision.candidates[0].direction);
    }

    #[test]
    fn test_expired_budget_falls_back_to_first_legal_move() {
        let state = BoardBuilder::new(11, 11)
            .us(&[(0, 0), (1, 0), (2, 0)])
            .build();
        let started = Instant::now() - Duration::from_secs(10);
        let decision = DecisionEngine::new(config()).decide(&state, started, None);
        assert!(decision.timed_out);
        assert!(decision.candidates.is_empty());
        assert_eq!(decision.direction, Direction::Up);
    }

    #[test]
    fn test_trap_filter_rejects_dead_ends() {
        // Up leads into a one-cell pocket at (0,1); right follows our tail into open board
        let state = BoardBuilder::new(11, 11)
            .turn(40)
            .us(&[(0, 0), (1, 0)])
            .enemy("wall", &[(0, 2), (1, 2), (1, 1)])
            .build();
        let decision = DecisionEngine::new(config()).decide(&state, Instant::now(), None);
        assert_eq!(decision.direction, Direction::Right);
    }

    #[test]
    fn test_random_tie_break_stays_among_top_scores() {
        let mut cfg = config();
        cfg.selection.tie_break = TieBreak::Random;
        // Symmetric position: left and right mirror each other
        let state = BoardBuilder::new(11, 11)
            .turn(40)
            .us(&[(5, 5), (5, 4), (5, 3)])
            .build();
        let engine = DecisionEngine::new(cfg);
        for _ in 0..20 {
            let decision = engine.decide(&state, Instant::now(), None);
            assert_eq!(decision.score, decision.candidates[0].score());
        }
    }

    #[test]
    fn test_decide_move_is_idempotent() {
        let state = BoardBuilder::new(11, 11)
            .turn(12)
            .health(55)
            .us(&[(4, 6), (4, 5), (4, 4), (3, 4)])
            .enemy("a", &[(8, 2), (8, 3), (8, 4)])
            .enemy("b", &[(1, 9), (2, 9), (3, 9), (4, 9), (5, 9)])
            .food(&[(6, 6), (0, 0), (9, 9)])
            .build();
        let cfg = config();
        let first = decide_move(&state, &cfg);
        for _ in 0..5 {
            assert_eq!(decide_move(&state, &cfg), first);
        }
    }
}
