// Configuration module for reading Snake.toml
// This module provides OOP-style configuration management for the tournament engine

use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub timing: TimingConfig,
    pub phases: PhaseConfig,
    pub positioning: PositioningConfig,
    pub overrides: OverridesConfig,
    pub weights: WeightsConfig,
    pub safety: SafetyConfig,
    pub space: SpaceConfig,
    pub food: FoodConfig,
    pub enemy: EnemyConfig,
    pub strategic: StrategicConfig,
    pub endgame: EndgameConfig,
    pub strategy_bonus: StrategyBonusConfig,
    pub prediction: PredictionConfig,
    pub selection: SelectionConfig,
    pub debug: DebugConfig,
}

/// Timing and search-budget constants
#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    pub response_time_budget_ms: u64,
    pub network_overhead_ms: u64,
    pub polling_interval_ms: u64,
    /// Fraction of the effective budget after which candidate scoring stops
    pub scoring_budget_fraction: f64,
    pub astar_max_iterations: usize,
    pub deadline_check_interval: usize,
}

impl TimingConfig {
    /// Computes the effective computation budget
    pub fn effective_budget_ms(&self) -> u64 {
        self.response_time_budget_ms.saturating_sub(self.network_overhead_ms)
    }

    /// Portion of the effective budget available to candidate scoring
    pub fn scoring_budget_ms(&self) -> u64 {
        (self.effective_budget_ms() as f64 * self.scoring_budget_fraction) as u64
    }
}

/// Game phase boundaries
#[derive(Debug, Deserialize, Clone)]
pub struct PhaseConfig {
    pub early_game_turns: i32,
    /// End game starts once turn >= fraction * width * height
    pub end_game_area_fraction: f64,
}

/// Competitive position thresholds (length margins)
#[derive(Debug, Deserialize, Clone)]
pub struct PositioningConfig {
    pub dominating_margin: i32,
    pub leading_margin: f64,
    pub competitive_margin: f64,
}

/// Conditions that replace the table-selected strategy
#[derive(Debug, Deserialize, Clone)]
pub struct OverridesConfig {
    pub emergency_health: i32,
    pub scarce_food_density: f64,
    pub space_share_floor: f64,
    pub consolidation_turn: i32,
}

/// Per-factor weights applied to the raw factor scores
#[derive(Debug, Deserialize, Clone)]
pub struct WeightsConfig {
    pub safety: f64,
    pub space_control: f64,
    pub enemy_interaction: f64,
    pub food_access: f64,
    pub strategic_position: f64,
    pub endgame: f64,
}

/// Safety factor constants
#[derive(Debug, Deserialize, Clone)]
pub struct SafetyConfig {
    pub base_score: i32,
    pub blocked_score: i32,
    pub head_to_head_loss_penalty: i32,
    pub head_to_head_win_bonus: i32,
    pub near_longer_penalty: i32,
    pub near_shorter_bonus: i32,
    pub hazard_penalty: f64,
    pub hazard_adjacent_penalty: f64,
    /// Penalty by wall distance: index 0 is a cell on the edge
    pub edge_penalties: Vec<i32>,
}

/// Space control factor constants
#[derive(Debug, Deserialize, Clone)]
pub struct SpaceConfig {
    pub blocked_score: i32,
    pub per_cell: i32,
    pub min_space_length_multiplier: usize,
    pub shortage_penalty: i32,
    pub ample_bonus: i32,
    pub enemy_cap_margin: usize,
    pub dominance_margin: usize,
    pub dominance_bonus: i32,
    pub disadvantage_penalty: i32,
}

/// Food access factor constants
#[derive(Debug, Deserialize, Clone)]
pub struct FoodConfig {
    /// (max health inclusive, urgency multiplier), ascending by health
    pub urgency_tiers: Vec<(i32, i32)>,
    pub urgency_floor: i32,
    pub base_value: i32,
    pub per_step_cost: i32,
    pub min_value: i32,
    pub closer_bonus: i32,
    pub contested_margin: i32,
    pub contested_penalty: i32,
    pub starving_health: i32,
    pub starving_penalty: i32,
    pub aggressive_near_distance: i32,
    pub aggressive_near_bonus: i32,
    pub safe_growth_enemy_distance: i32,
    pub safe_growth_penalty: i32,
    pub emergency_urgency_multiplier: i32,
    pub trap_closed_penalty: i32,
    pub trap_narrow_penalty: i32,
}

/// Enemy interaction factor constants
#[derive(Debug, Deserialize, Clone)]
pub struct EnemyConfig {
    pub adjacent_win_bonus: i32,
    pub adjacent_tie_penalty: i32,
    pub adjacent_loss_penalty: i32,
    pub near_longer_penalty: i32,
    pub near_pressure_bonus: i32,
    pub positioning_min_distance: i32,
    pub positioning_max_distance: i32,
    pub positioning_bonus: i32,
    pub tail_adjacency_min_body: usize,
    pub tail_adjacency_bonus: i32,
    pub predicted_contest_penalty: i32,
    pub predicted_contest_bonus: i32,
}

/// Strategic positioning constants
#[derive(Debug, Deserialize, Clone)]
pub struct StrategicConfig {
    pub territory_center_weight: i32,
    pub expansion_center_weight: i32,
    pub periphery_weight: i32,
    pub corner_penalty: i32,
}

/// Endgame factor constants
#[derive(Debug, Deserialize, Clone)]
pub struct EndgameConfig {
    pub advantage_share: f64,
    pub disadvantage_share: f64,
    pub advantage_bonus: i32,
    pub disadvantage_penalty: i32,
    pub contact_distance: i32,
    pub contact_penalty: i32,
    pub efficient_food_health: i32,
    pub efficient_food_distance: i32,
    pub efficient_food_bonus: i32,
}

/// Strategy-specific bonus constants
#[derive(Debug, Deserialize, Clone)]
pub struct StrategyBonusConfig {
    pub pursuit_bonus: i32,
    pub tactical_pursuit_bonus: i32,
    pub safe_distance_per_cell: i32,
    pub safe_distance_cap: i32,
    pub center_radius: i32,
    pub center_per_cell: i32,
    pub emergency_food_bonus: i32,
    pub comeback_food_bonus: i32,
    pub space_fill_cap: usize,
    pub space_bonus_cap: i32,
    pub consolidation_close_distance: i32,
    pub consolidation_close_penalty: i32,
    pub consolidation_far_distance: i32,
    pub consolidation_far_bonus: i32,
    pub survival_escape_bonus: i32,
}

/// Opponent move prediction constants
#[derive(Debug, Deserialize, Clone)]
pub struct PredictionConfig {
    pub enabled: bool,
    pub space_cap_length_multiplier: usize,
    pub space_weight: f64,
    pub food_seek_health: i32,
    pub food_horizon: i32,
    pub food_weight: f64,
    pub center_horizon: i32,
    pub center_weight: f64,
    pub avoid_us_weight: f64,
    pub early_edge_turns: i32,
    pub early_edge_penalty: f64,
}

/// How ties between equally scored candidates are resolved
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    /// Fixed preference order: up, right, down, left
    Deterministic,
    /// Uniform choice among the tied top candidates
    Random,
}

/// Final move validation and selection constants
#[derive(Debug, Deserialize, Clone)]
pub struct SelectionConfig {
    pub score_floor: f64,
    pub trap_margin: usize,
    pub min_escape_routes: usize,
    pub tie_break: TieBreak,
}

/// Debug configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Snake.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        Self::from_toml_str(&contents)
    }

    /// Parses configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Loads default configuration from Snake.toml in the project root
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Snake.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Snake.toml
    pub fn default_hardcoded() -> Self {
        Config {
            timing: TimingConfig {
                response_time_budget_ms: 400,
                network_overhead_ms: 50,
                polling_interval_ms: 5,
                scoring_budget_fraction: 0.8,
                astar_max_iterations: 2000,
                deadline_check_interval: 10,
            },
            phases: PhaseConfig {
                early_game_turns: 30,
                end_game_area_fraction: 0.6,
            },
            positioning: PositioningConfig {
                dominating_margin: 2,
                leading_margin: 1.0,
                competitive_margin: 1.0,
            },
            overrides: OverridesConfig {
                emergency_health: 25,
                scarce_food_density: 0.05,
                space_share_floor: 0.2,
                consolidation_turn: 200,
            },
            weights: WeightsConfig {
                safety: 10.0,
                space_control: 8.0,
                enemy_interaction: 7.0,
                food_access: 6.0,
                strategic_position: 5.0,
                endgame: 4.0,
            },
            safety: SafetyConfig {
                base_score: 100,
                blocked_score: -1000,
                head_to_head_loss_penalty: 600,
                head_to_head_win_bonus: 75,
                near_longer_penalty: 250,
                near_shorter_bonus: 25,
                hazard_penalty: 400.0,
                hazard_adjacent_penalty: 100.0,
                edge_penalties: vec![100, 50, 20],
            },
            space: SpaceConfig {
                blocked_score: -500,
                per_cell: 3,
                min_space_length_multiplier: 2,
                shortage_penalty: 200,
                ample_bonus: 100,
                enemy_cap_margin: 50,
                dominance_margin: 20,
                dominance_bonus: 150,
                disadvantage_penalty: 100,
            },
            food: FoodConfig {
                urgency_tiers: vec![(20, 10), (40, 7), (60, 4), (80, 2)],
                urgency_floor: 1,
                base_value: 100,
                per_step_cost: 5,
                min_value: 10,
                closer_bonus: 50,
                contested_margin: 2,
                contested_penalty: 30,
                starving_health: 50,
                starving_penalty: 50,
                aggressive_near_distance: 3,
                aggressive_near_bonus: 20,
                safe_growth_enemy_distance: 2,
                safe_growth_penalty: 20,
                emergency_urgency_multiplier: 10,
                trap_closed_penalty: 25,
                trap_narrow_penalty: 10,
            },
            enemy: EnemyConfig {
                adjacent_win_bonus: 200,
                adjacent_tie_penalty: 100,
                adjacent_loss_penalty: 400,
                near_longer_penalty: 100,
                near_pressure_bonus: 30,
                positioning_min_distance: 3,
                positioning_max_distance: 5,
                positioning_bonus: 20,
                tail_adjacency_min_body: 3,
                tail_adjacency_bonus: 40,
                predicted_contest_penalty: 150,
                predicted_contest_bonus: 50,
            },
            strategic: StrategicConfig {
                territory_center_weight: 3,
                expansion_center_weight: 2,
                periphery_weight: 1,
                corner_penalty: 200,
            },
            endgame: EndgameConfig {
                advantage_share: 0.5,
                disadvantage_share: 0.3,
                advantage_bonus: 100,
                disadvantage_penalty: 100,
                contact_distance: 5,
                contact_penalty: 30,
                efficient_food_health: 80,
                efficient_food_distance: 3,
                efficient_food_bonus: 50,
            },
            strategy_bonus: StrategyBonusConfig {
                pursuit_bonus: 40,
                tactical_pursuit_bonus: 60,
                safe_distance_per_cell: 10,
                safe_distance_cap: 100,
                center_radius: 10,
                center_per_cell: 5,
                emergency_food_bonus: 200,
                comeback_food_bonus: 60,
                space_fill_cap: 50,
                space_bonus_cap: 150,
                consolidation_close_distance: 4,
                consolidation_close_penalty: 30,
                consolidation_far_distance: 8,
                consolidation_far_bonus: 20,
                survival_escape_bonus: 10,
            },
            prediction: PredictionConfig {
                enabled: true,
                space_cap_length_multiplier: 2,
                space_weight: 2.0,
                food_seek_health: 85,
                food_horizon: 20,
                food_weight: 3.0,
                center_horizon: 10,
                center_weight: 1.0,
                avoid_us_weight: 1.5,
                early_edge_turns: 20,
                early_edge_penalty: 5.0,
            },
            selection: SelectionConfig {
                score_floor: -500.0,
                trap_margin: 3,
                min_escape_routes: 1,
                tie_break: TieBreak::Deterministic,
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "battlesnake_debug.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            log::warn!(
                "Could not load Snake.toml ({}), using hardcoded defaults",
                e
            );
            Self::default_hardcoded()
        })
    }
}
