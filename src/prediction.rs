// Opponent move prediction
//
// Each enemy is assumed to take the free neighbour that a simple survival-minded
// snake would: more room, food when hungry, the board center, distance from us.

use std::collections::HashMap;

use crate::config::PredictionConfig;
use crate::flood_fill::reachable_count;
use crate::grid::{BoardState, SnakeView};
use crate::simple_profiler::ProfileGuard;
use crate::types::Coord;

/// Predicted next head cell per enemy id
pub type Predictions = HashMap<String, Coord>;

/// Predicts the next head position of every enemy that has at least one free move
pub fn predict_enemy_moves(state: &BoardState, config: &PredictionConfig) -> Predictions {
    if !config.enabled {
        return Predictions::new();
    }
    let _guard = ProfileGuard::new("prediction");

    state
        .enemies()
        .filter_map(|enemy| predict_one(enemy, state, config).map(|pos| (enemy.id.clone(), pos)))
        .collect()
}

fn predict_one(enemy: &SnakeView, state: &BoardState, config: &PredictionConfig) -> Option<Coord> {
    let mut best: Option<(Coord, f64)> = None;

    for candidate in enemy.head().neighbors() {
        if !state.is_free(candidate) {
            continue;
        }
        let score = score_enemy_move(enemy, candidate, state, config);
        // First listed wins ties
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((candidate, score));
        }
    }

    best.map(|(pos, _)| pos)
}

fn score_enemy_move(
    enemy: &SnakeView,
    pos: Coord,
    state: &BoardState,
    config: &PredictionConfig,
) -> f64 {
    let cap = (enemy.length.max(1) as usize) * config.space_cap_length_multiplier;
    let space = reachable_count(pos, state, Some(cap));
    let mut score = space as f64 * config.space_weight;

    if enemy.health < config.food_seek_health {
        if let Some(food) = state.nearest_food(pos) {
            score += (config.food_horizon - pos.manhattan(food)) as f64 * config.food_weight;
        }
    }

    let to_center = pos.manhattan(state.center());
    score += (config.center_horizon - to_center) as f64 * config.center_weight;

    let to_us = pos.manhattan(state.head);
    if to_us > 0 {
        score += to_us as f64 * config.avoid_us_weight;
    }

    if state.turn < config.early_edge_turns && state.wall_distance(pos) == 0 {
        score -= config.early_edge_penalty;
    }

    score
}
