// Move scoring
//
// Every candidate move is scored on six weighted factors plus an unweighted
// strategy bonus. Factor scores are kept separately in a ScoreBreakdown so that
// decision logs can show why a move won.

use serde::Serialize;
use std::cell::OnceCell;

use crate::config::Config;
use crate::flood_fill::{head_reachable_count, reachable_count};
use crate::grid::BoardState;
use crate::pathfinding::{
    direction_toward, estimated_distance, first_step, search, PathSearch, SearchLimits,
};
use crate::prediction::Predictions;
use crate::simple_profiler::ProfileGuard;
use crate::strategy::{GamePhase, Strategy, StrategyContext};
use crate::types::{Coord, Direction};

/// Raw factor scores for one candidate; `total` is the weighted sum plus the bonus
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScoreBreakdown {
    pub safety: f64,
    pub space_control: f64,
    pub food_access: f64,
    pub enemy_interaction: f64,
    pub strategic_position: f64,
    pub endgame: f64,
    pub strategy_bonus: f64,
    pub total: f64,
}

/// Scores candidate moves for a single turn
pub struct MoveScorer<'a> {
    state: &'a BoardState,
    config: &'a Config,
    context: &'a StrategyContext,
    strategy: Strategy,
    predictions: &'a Predictions,
    limits: SearchLimits,
    /// Move toward food, searched once per turn on first use
    food_step: OnceCell<Option<Direction>>,
}

impl<'a> MoveScorer<'a> {
    pub fn new(
        state: &'a BoardState,
        config: &'a Config,
        context: &'a StrategyContext,
        strategy: Strategy,
        predictions: &'a Predictions,
        limits: SearchLimits,
    ) -> Self {
        MoveScorer {
            state,
            config,
            context,
            strategy,
            predictions,
            limits,
            food_step: OnceCell::new(),
        }
    }

    /// Scores moving our head one step in `direction`
    pub fn score(&self, direction: Direction) -> ScoreBreakdown {
        let _guard = ProfileGuard::new("scoring");

        let pos = direction.apply(&self.state.head);
        let mut breakdown = ScoreBreakdown {
            safety: self.safety(pos),
            space_control: self.space_control(pos),
            food_access: self.food_access(pos),
            enemy_interaction: self.enemy_interaction(pos),
            strategic_position: self.strategic_position(pos),
            endgame: self.endgame(pos),
            strategy_bonus: self.strategy_bonus(direction, pos),
            total: 0.0,
        };

        let w = &self.config.weights;
        breakdown.total = breakdown.safety * w.safety
            + breakdown.space_control * w.space_control
            + breakdown.enemy_interaction * w.enemy_interaction
            + breakdown.food_access * w.food_access
            + breakdown.strategic_position * w.strategic_position
            + breakdown.endgame * w.endgame
            + breakdown.strategy_bonus;

        breakdown
    }

    fn safety(&self, pos: Coord) -> f64 {
        let cfg = &self.config.safety;
        let state = self.state;
        if !state.is_free(pos) {
            return cfg.blocked_score as f64;
        }

        let mut score = cfg.base_score as f64;

        for enemy in state.enemies() {
            let distance = pos.manhattan(enemy.head());
            if distance <= 1 {
                if enemy.length >= state.length {
                    score -= cfg.head_to_head_loss_penalty as f64;
                } else {
                    score += cfg.head_to_head_win_bonus as f64;
                }
            } else if distance == 2 {
                if enemy.length > state.length {
                    score -= cfg.near_longer_penalty as f64;
                } else if enemy.length < state.length {
                    score += cfg.near_shorter_bonus as f64;
                }
            }
        }

        // Hazards hurt more the hungrier we are
        let urgency = 1.0 + (100 - state.health.clamp(0, 100)) as f64 / 100.0;
        if state.is_hazard(pos) {
            score -= cfg.hazard_penalty * urgency;
        } else if pos.neighbors().iter().any(|&n| state.is_hazard(n)) {
            score -= cfg.hazard_adjacent_penalty * urgency;
        }

        let wall_distance = state.wall_distance(pos);
        if let Some(&penalty) = cfg.edge_penalties.get(wall_distance as usize) {
            score -= penalty as f64;
        }

        score
    }

    fn space_control(&self, pos: Coord) -> f64 {
        let cfg = &self.config.space;
        let state = self.state;
        if !state.is_free(pos) {
            return cfg.blocked_score as f64;
        }

        let space = reachable_count(pos, state, None);
        let min_required = state.length.max(0) as usize * cfg.min_space_length_multiplier;
        let mut score = (space as i32 * cfg.per_cell) as f64;

        if space < min_required {
            score -= cfg.shortage_penalty as f64;
        } else if space > min_required * 2 {
            score += cfg.ample_bonus as f64;
        }

        let enemy_max = state
            .enemies()
            .map(|e| head_reachable_count(e.head(), state, Some(space + cfg.enemy_cap_margin)))
            .max()
            .unwrap_or(0);

        if space > enemy_max + cfg.dominance_margin {
            score += cfg.dominance_bonus as f64;
        } else if space + cfg.dominance_margin < enemy_max {
            score -= cfg.disadvantage_penalty as f64;
        }

        score
    }

    fn urgency(&self) -> i32 {
        let cfg = &self.config.food;
        cfg.urgency_tiers
            .iter()
            .find(|(max_health, _)| self.state.health <= *max_health)
            .map(|&(_, urgency)| urgency)
            .unwrap_or(cfg.urgency_floor)
    }

    fn food_access(&self, pos: Coord) -> f64 {
        let cfg = &self.config.food;
        let state = self.state;
        if state.food.is_empty() {
            return 0.0;
        }

        let urgency = self.urgency();
        let reach = state.health / 2;

        let accessible: Vec<(Coord, i32)> = state
            .food
            .iter()
            .filter_map(|&food| {
                estimated_distance(pos, food, state, &self.limits)
                    .map(|len| (food, len as i32))
                    .filter(|&(_, len)| len < reach)
            })
            .collect();

        if accessible.is_empty() {
            return if state.health < cfg.starving_health {
                -(cfg.starving_penalty as f64)
            } else {
                0.0
            };
        }

        let mut total = 0;
        for (food, path) in accessible {
            let mut value = (cfg.base_value - path * cfg.per_step_cost).max(cfg.min_value);

            let enemy_distance = state.enemies().map(|e| e.head().manhattan(food)).min();
            match enemy_distance {
                None => value += cfg.closer_bonus,
                Some(e) if path < e => value += cfg.closer_bonus,
                Some(e) if path > e + cfg.contested_margin => value -= cfg.contested_penalty,
                Some(_) => {}
            }

            match self.strategy {
                Strategy::AggressiveExpansion => {
                    if pos.manhattan(food) <= cfg.aggressive_near_distance {
                        value += cfg.aggressive_near_bonus;
                    }
                }
                Strategy::SafeGrowth => {
                    if enemy_distance.map_or(false, |e| e <= cfg.safe_growth_enemy_distance) {
                        value -= cfg.safe_growth_penalty;
                    }
                }
                Strategy::EmergencyFoodSeeking => {
                    value += urgency * cfg.emergency_urgency_multiplier;
                }
                _ => {}
            }

            // Food in a dead end is worth less
            match state.escape_routes(food) {
                0 | 1 => value -= cfg.trap_closed_penalty,
                2 => value -= cfg.trap_narrow_penalty,
                _ => {}
            }

            total += value * urgency;
        }

        total as f64
    }

    fn enemy_interaction(&self, pos: Coord) -> f64 {
        let cfg = &self.config.enemy;
        let state = self.state;
        let ours = state.length;
        let mut score = 0;

        for enemy in state.enemies() {
            let distance = pos.manhattan(enemy.head());
            if distance == 1 {
                score += if enemy.length < ours {
                    cfg.adjacent_win_bonus
                } else if enemy.length == ours {
                    -cfg.adjacent_tie_penalty
                } else {
                    -cfg.adjacent_loss_penalty
                };
            } else if distance == 2 {
                score += if enemy.length > ours {
                    -cfg.near_longer_penalty
                } else {
                    cfg.near_pressure_bonus
                };
            } else if (cfg.positioning_min_distance..=cfg.positioning_max_distance).contains(&distance)
                && enemy.length < ours
            {
                score += cfg.positioning_bonus;
            }

            // Next to a tail that moves away this turn: that cell opens up next turn
            if enemy.body.len() > cfg.tail_adjacency_min_body {
                let tail = enemy.tail();
                if state.is_vacating_tail(tail) && pos.manhattan(tail) == 1 {
                    score += cfg.tail_adjacency_bonus;
                }
            }

            if self.predictions.get(&enemy.id) == Some(&pos) {
                score += if enemy.length >= ours {
                    -cfg.predicted_contest_penalty
                } else {
                    cfg.predicted_contest_bonus
                };
            }
        }

        score as f64
    }

    fn strategic_position(&self, pos: Coord) -> f64 {
        let cfg = &self.config.strategic;
        let state = self.state;
        let center_distance = pos.manhattan(state.center());
        let max_distance = (state.width + state.height) / 2;

        let mut score = match self.strategy {
            Strategy::TerritoryControl | Strategy::EndgameDominance => {
                (max_distance - center_distance) * cfg.territory_center_weight
            }
            Strategy::AggressiveExpansion => (max_distance - center_distance) * cfg.expansion_center_weight,
            Strategy::SafeGrowth | Strategy::EndgameSurvival => center_distance * cfg.periphery_weight,
            _ => 0,
        };

        if state.is_corner(pos) {
            score -= cfg.corner_penalty;
        }

        score as f64
    }

    fn endgame(&self, pos: Coord) -> f64 {
        if self.context.phase != GamePhase::End {
            return 0.0;
        }

        let cfg = &self.config.endgame;
        let state = self.state;
        let share = self.context.territory.space_advantage;
        let mut score = 0;

        if share > cfg.advantage_share {
            score += cfg.advantage_bonus;
        } else if share < cfg.disadvantage_share {
            score -= cfg.disadvantage_penalty;
        }

        let close_enemies = state
            .enemies()
            .filter(|e| pos.manhattan(e.head()) < cfg.contact_distance)
            .count() as i32;
        score -= close_enemies * cfg.contact_penalty;

        if state.health > cfg.efficient_food_health {
            if let Some(food) = state.nearest_food(pos) {
                if pos.manhattan(food) <= cfg.efficient_food_distance {
                    score += cfg.efficient_food_bonus;
                }
            }
        }

        score as f64
    }

    /// First move of the A* path to the closest reachable food
    ///
    /// When a search runs out of budget the straight-line direction stands in.
    fn food_step(&self) -> Option<Direction> {
        *self.food_step.get_or_init(|| {
            let head = self.state.head;
            let mut food = self.state.food.clone();
            food.sort_by_key(|f| head.manhattan(*f));

            food.into_iter().find_map(|goal| match search(head, goal, self.state, &self.limits) {
                PathSearch::Found(path) => first_step(&path),
                PathSearch::Exhausted => direction_toward(head, goal),
                PathSearch::NoPath => None,
            })
        })
    }

    fn strategy_bonus(&self, direction: Direction, pos: Coord) -> f64 {
        let cfg = &self.config.strategy_bonus;
        let state = self.state;
        let head = state.head;

        let closing_on_shorter = || {
            state
                .enemies()
                .filter(|e| e.length < state.length)
                .filter(|e| pos.manhattan(e.head()) < head.manhattan(e.head()))
                .count() as i32
        };
        let toward_food = || self.food_step() == Some(direction);
        let space_bonus = || {
            (reachable_count(pos, state, Some(cfg.space_fill_cap)) as i32).min(cfg.space_bonus_cap)
        };

        let bonus = match self.strategy {
            Strategy::AggressiveExpansion => closing_on_shorter() * cfg.pursuit_bonus,
            Strategy::TacticalPressure => closing_on_shorter() * cfg.tactical_pursuit_bonus,
            Strategy::SafeGrowth => state
                .enemies()
                .filter(|e| e.length >= state.length)
                .map(|e| (pos.manhattan(e.head()) * cfg.safe_distance_per_cell).min(cfg.safe_distance_cap))
                .sum(),
            Strategy::TerritoryControl => {
                let c = pos.manhattan(state.center());
                if c <= cfg.center_radius {
                    (cfg.center_radius - c) * cfg.center_per_cell
                } else {
                    0
                }
            }
            Strategy::EmergencyFoodSeeking if toward_food() => cfg.emergency_food_bonus,
            Strategy::ComebackStrategy if toward_food() => cfg.comeback_food_bonus,
            Strategy::SpaceControlPriority => space_bonus(),
            Strategy::VictoryConsolidation => {
                let mut bonus = space_bonus();
                for enemy in state.enemies() {
                    let distance = pos.manhattan(enemy.head());
                    if distance < cfg.consolidation_close_distance {
                        bonus -= cfg.consolidation_close_penalty;
                    } else if distance > cfg.consolidation_far_distance {
                        bonus += cfg.consolidation_far_bonus;
                    }
                }
                bonus
            }
            Strategy::EndgameSurvival => state.escape_routes(pos) as i32 * cfg.survival_escape_bonus,
            _ => 0,
        };

        bonus as f64
    }
}
