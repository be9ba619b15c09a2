// Game context analysis and strategy selection
//
// Classifies the turn by game phase and our competitive standing, then maps the pair
// to a strategy through a fixed table. A few situational overrides take precedence.

use std::fmt;

use crate::config::Config;
use crate::flood_fill::head_reachable_count;
use crate::grid::BoardState;
use crate::simple_profiler::ProfileGuard;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamePhase {
    Early,
    Mid,
    End,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Early => "early_game",
            GamePhase::Mid => "mid_game",
            GamePhase::End => "end_game",
        }
    }
}

/// Our length relative to the surviving enemies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompetitivePosition {
    Dominating,
    Leading,
    Competitive,
    Trailing,
}

impl CompetitivePosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompetitivePosition::Dominating => "dominating",
            CompetitivePosition::Leading => "leading",
            CompetitivePosition::Competitive => "competitive",
            CompetitivePosition::Trailing => "trailing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    AggressiveExpansion,
    SafeGrowth,
    TerritoryControl,
    TacticalPressure,
    OpportunisticSurvival,
    ComebackStrategy,
    EndgameDominance,
    EndgameSurvival,
    EmergencyFoodSeeking,
    SpaceControlPriority,
    VictoryConsolidation,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::AggressiveExpansion => "aggressive_expansion",
            Strategy::SafeGrowth => "safe_growth",
            Strategy::TerritoryControl => "territory_control",
            Strategy::TacticalPressure => "tactical_pressure",
            Strategy::OpportunisticSurvival => "opportunistic_survival",
            Strategy::ComebackStrategy => "comeback_strategy",
            Strategy::EndgameDominance => "endgame_dominance",
            Strategy::EndgameSurvival => "endgame_survival",
            Strategy::EmergencyFoodSeeking => "emergency_food_seeking",
            Strategy::SpaceControlPriority => "space_control_priority",
            Strategy::VictoryConsolidation => "victory_consolidation",
        }
    }

    /// The base strategy for a phase and position, before overrides
    pub fn for_phase(phase: GamePhase, position: CompetitivePosition) -> Strategy {
        use CompetitivePosition::*;
        match (phase, position) {
            (GamePhase::Early, Dominating | Leading) => Strategy::AggressiveExpansion,
            (GamePhase::Early, Competitive | Trailing) => Strategy::SafeGrowth,
            (GamePhase::Mid, Dominating) => Strategy::TerritoryControl,
            (GamePhase::Mid, Leading) => Strategy::TacticalPressure,
            (GamePhase::Mid, Competitive) => Strategy::OpportunisticSurvival,
            (GamePhase::Mid, Trailing) => Strategy::ComebackStrategy,
            (GamePhase::End, Dominating | Leading) => Strategy::EndgameDominance,
            (GamePhase::End, Competitive | Trailing) => Strategy::EndgameSurvival,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reachable space from each head at the start of the turn
#[derive(Debug, Clone, PartialEq)]
pub struct TerritoryAnalysis {
    pub our_space: usize,
    pub enemy_spaces: Vec<usize>,
    pub total_space: usize,
    /// Our share of the total; 0.5 when nobody can move anywhere
    pub space_advantage: f64,
}

impl TerritoryAnalysis {
    /// Enemy fills stop at `our_space + cap_margin` cells
    pub fn analyze(state: &BoardState, cap_margin: usize) -> TerritoryAnalysis {
        let our_space = head_reachable_count(state.head, state, None);
        let enemy_cap = our_space + cap_margin;
        let enemy_spaces: Vec<usize> = state
            .enemies()
            .map(|e| head_reachable_count(e.head(), state, Some(enemy_cap)))
            .collect();

        let total_space = our_space + enemy_spaces.iter().sum::<usize>();
        let space_advantage = if total_space > 0 {
            our_space as f64 / total_space as f64
        } else {
            0.5
        };

        TerritoryAnalysis {
            our_space,
            enemy_spaces,
            total_space,
            space_advantage,
        }
    }
}

/// Everything strategy selection and scoring need to know about the turn as a whole
#[derive(Debug, Clone)]
pub struct StrategyContext {
    pub phase: GamePhase,
    pub position: CompetitivePosition,
    pub territory: TerritoryAnalysis,
    pub food_density: f64,
    pub food_competition: i32,
    pub turn: i32,
    pub our_length: i32,
    pub max_enemy_length: i32,
}

pub fn game_phase(state: &BoardState, config: &Config) -> GamePhase {
    let end_turn = state.area() as f64 * config.phases.end_game_area_fraction;
    if state.turn < config.phases.early_game_turns {
        GamePhase::Early
    } else if (state.turn as f64) < end_turn {
        GamePhase::Mid
    } else {
        GamePhase::End
    }
}

pub fn competitive_position(state: &BoardState, config: &Config) -> CompetitivePosition {
    let lengths: Vec<i32> = state.enemies().map(|e| e.length).collect();
    let max = lengths.iter().copied().max().unwrap_or(0);
    let mean = if lengths.is_empty() {
        0.0
    } else {
        lengths.iter().sum::<i32>() as f64 / lengths.len() as f64
    };

    let ours = state.length;
    let margins = &config.positioning;
    if ours > max + margins.dominating_margin {
        CompetitivePosition::Dominating
    } else if ours as f64 > mean + margins.leading_margin {
        CompetitivePosition::Leading
    } else if ours as f64 >= mean - margins.competitive_margin {
        CompetitivePosition::Competitive
    } else {
        CompetitivePosition::Trailing
    }
}

/// Foods we reach first count +1, foods an enemy reaches well before us count -2
pub fn food_competition(state: &BoardState) -> i32 {
    state
        .food
        .iter()
        .map(|&food| {
            let ours = state.head.manhattan(food);
            match state.enemies().map(|e| e.head().manhattan(food)).min() {
                None => 1,
                Some(theirs) if ours <= theirs => 1,
                Some(theirs) if theirs < ours - 2 => -2,
                Some(_) => 0,
            }
        })
        .sum()
}

pub fn analyze_context(state: &BoardState, config: &Config) -> StrategyContext {
    let _guard = ProfileGuard::new("strategy");

    let area = state.area().max(1);
    StrategyContext {
        phase: game_phase(state, config),
        position: competitive_position(state, config),
        territory: TerritoryAnalysis::analyze(state, config.space.enemy_cap_margin),
        food_density: state.food.len() as f64 / area as f64,
        food_competition: food_competition(state),
        turn: state.turn,
        our_length: state.length,
        max_enemy_length: state.enemies().map(|e| e.length).max().unwrap_or(0),
    }
}

/// Picks the strategy for this turn
///
/// Overrides are checked in order and the first match wins.
pub fn select_strategy(state: &BoardState, context: &StrategyContext, config: &Config) -> Strategy {
    let overrides = &config.overrides;

    if state.health < overrides.emergency_health && context.food_density < overrides.scarce_food_density {
        Strategy::EmergencyFoodSeeking
    } else if context.territory.space_advantage < overrides.space_share_floor {
        Strategy::SpaceControlPriority
    } else if context.turn > overrides.consolidation_turn
        && context.position == CompetitivePosition::Dominating
    {
        Strategy::VictoryConsolidation
    } else {
        Strategy::for_phase(context.phase, context.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::test_support::BoardBuilder;

    fn config() -> Config {
        Config::default_hardcoded()
    }

    #[test]
    fn test_phase_boundaries() {
        let cfg = config();
        // 11x11: end game from turn 72.6, i.e. turn 73
        let at = |turn| game_phase(&BoardBuilder::new(11, 11).turn(turn).build(), &cfg);
        assert_eq!(at(0), GamePhase::Early);
        assert_eq!(at(29), GamePhase::Early);
        assert_eq!(at(30), GamePhase::Mid);
        assert_eq!(at(72), GamePhase::Mid);
        assert_eq!(at(73), GamePhase::End);
    }

    #[test]
    fn test_competitive_positions() {
        let cfg = config();
        let us6 = [(5, 5), (5, 4), (5, 3), (5, 2), (5, 1), (5, 0)];

        let dominating = BoardBuilder::new(11, 11)
            .us(&us6)
            .enemy("a", &[(0, 10), (0, 9), (0, 8)])
            .build();
        assert_eq!(competitive_position(&dominating, &cfg), CompetitivePosition::Dominating);

        // max 5 blocks dominating; mean 4 < 6 - 1
        let leading = BoardBuilder::new(11, 11)
            .us(&us6)
            .enemy("a", &[(0, 10), (0, 9), (0, 8)])
            .enemy("b", &[(10, 10), (10, 9), (10, 8), (10, 7), (10, 6)])
            .build();
        assert_eq!(competitive_position(&leading, &cfg), CompetitivePosition::Leading);

        let competitive = BoardBuilder::new(11, 11)
            .us(&[(5, 5), (5, 4), (5, 3)])
            .enemy("a", &[(0, 10), (0, 9), (0, 8), (0, 7)])
            .build();
        assert_eq!(competitive_position(&competitive, &cfg), CompetitivePosition::Competitive);

        let trailing = BoardBuilder::new(11, 11)
            .us(&[(5, 5), (5, 4)])
            .enemy("a", &[(0, 10), (0, 9), (0, 8), (0, 7), (0, 6)])
            .build();
        assert_eq!(competitive_position(&trailing, &cfg), CompetitivePosition::Trailing);
    }

    #[test]
    fn test_no_enemies_is_dominating() {
        let state = BoardBuilder::new(11, 11).us(&[(5, 5), (5, 4), (5, 3)]).build();
        assert_eq!(competitive_position(&state, &config()), CompetitivePosition::Dominating);
    }

    #[test]
    fn test_strategy_table() {
        use CompetitivePosition::*;
        assert_eq!(Strategy::for_phase(GamePhase::Early, Leading), Strategy::AggressiveExpansion);
        assert_eq!(Strategy::for_phase(GamePhase::Early, Trailing), Strategy::SafeGrowth);
        assert_eq!(Strategy::for_phase(GamePhase::Mid, Dominating), Strategy::TerritoryControl);
        assert_eq!(Strategy::for_phase(GamePhase::Mid, Leading), Strategy::TacticalPressure);
        assert_eq!(Strategy::for_phase(GamePhase::Mid, Competitive), Strategy::OpportunisticSurvival);
        assert_eq!(Strategy::for_phase(GamePhase::Mid, Trailing), Strategy::ComebackStrategy);
        assert_eq!(Strategy::for_phase(GamePhase::End, Leading), Strategy::EndgameDominance);
        assert_eq!(Strategy::for_phase(GamePhase::End, Competitive), Strategy::EndgameSurvival);
    }

    #[test]
    fn test_territory_share_without_moves_is_half() {
        let state = BoardBuilder::new(1, 1).us(&[(0, 0)]).build();
        let territory = TerritoryAnalysis::analyze(&state, 50);
        assert_eq!(territory.total_space, 0);
        assert_eq!(territory.space_advantage, 0.5);
    }

    #[test]
    fn test_emergency_override_wins_first() {
        let cfg = config();
        // Starving, no food on the board, and boxed into a tiny pocket as well
        let state = BoardBuilder::new(11, 11)
            .turn(250)
            .health(10)
            .us(&[(0, 0), (1, 0), (2, 0), (3, 0), (4, 0), (5, 0), (6, 0), (7, 0)])
            .build();
        let context = analyze_context(&state, &cfg);
        assert_eq!(select_strategy(&state, &context, &cfg), Strategy::EmergencyFoodSeeking);
    }

    #[test]
    fn test_space_override_when_boxed_in() {
        let cfg = config();
        // The enemy body seals our head into the corner with two open cells
        let state = BoardBuilder::new(11, 11)
            .turn(40)
            .us(&[(0, 0), (1, 0)])
            .enemy("them", &[(0, 2), (1, 2), (1, 1), (2, 1), (2, 0), (3, 0)])
            .food(&[(9, 9)])
            .build();
        let context = analyze_context(&state, &cfg);
        assert!(context.territory.space_advantage < 0.2);
        assert_eq!(select_strategy(&state, &context, &cfg), Strategy::SpaceControlPriority);
    }

    #[test]
    fn test_victory_consolidation_late_and_dominating() {
        let cfg = config();
        let state = BoardBuilder::new(19, 19)
            .turn(201)
            .us(&[(9, 9), (9, 8), (9, 7), (9, 6), (9, 5), (9, 4)])
            .enemy("a", &[(0, 18), (0, 17)])
            .food(&[(3, 3), (15, 15)])
            .build();
        let context = analyze_context(&state, &cfg);
        assert_eq!(context.phase, GamePhase::Mid);
        assert_eq!(select_strategy(&state, &context, &cfg), Strategy::VictoryConsolidation);
    }

    #[test]
    fn test_food_competition_counts() {
        let state = BoardBuilder::new(11, 11)
            .us(&[(5, 5)])
            .enemy("a", &[(0, 0), (0, 1)])
            // (5,6) is ours (+1), (1,0) is clearly theirs (-2), (0,5) is a tie (+1)
            .food(&[(5, 6), (1, 0), (0, 5)])
            .build();
        assert_eq!(food_competition(&state), 0);
    }
}
