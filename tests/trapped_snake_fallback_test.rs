// Integration test for trapped snake fallback behavior
//
// When every neighbour of the head is blocked the bot still has to answer, and
// the answer should stay on the board rather than defaulting to "up". These go
// through Bot::get_move so the blocking task and the poller are exercised too.

use tournament_snake::bot::Bot;
use tournament_snake::config::Config;
use tournament_snake::types::{Battlesnake, Board, Coord, Game, Ruleset};

fn snake(id: &str, body: &[(i32, i32)]) -> Battlesnake {
    let body: Vec<Coord> = body.iter().map(|&(x, y)| Coord::new(x, y)).collect();
    Battlesnake {
        id: id.to_string(),
        name: id.to_string(),
        health: 50,
        head: body[0],
        length: body.len() as i32,
        body,
        latency: "0".to_string(),
        shout: None,
    }
}

fn game() -> Game {
    Game {
        id: "test-game".to_string(),
        ruleset: Ruleset {
            name: "standard".to_string(),
            ..Default::default()
        },
        timeout: 500,
        source: "test".to_string(),
    }
}

async fn chosen_move(snakes: Vec<Battlesnake>) -> String {
    let bot = Bot::new(Config::default_hardcoded());
    let board = Board {
        height: 11,
        width: 11,
        food: vec![],
        hazards: vec![],
        snakes,
    };
    let you = board.snakes[0].clone();

    let response = bot.get_move(&game(), &12, &board, &you).await;
    response["move"]
        .as_str()
        .expect("response should carry a move")
        .to_string()
}

/// Head in the top-left corner, boxed in by our neck and an enemy body
/// Up and left are off the board, so the fallback must pick an occupied in-bounds cell
#[tokio::test]
async fn test_fully_trapped_in_corner_stays_in_bounds() {
    let ours = snake("our-snake", &[(0, 10), (0, 9), (0, 8)]);
    let enemy = snake("opponent", &[(2, 9), (1, 9), (1, 10), (2, 10), (3, 10)]);

    let chosen = chosen_move(vec![ours, enemy]).await;
    // First in-bounds direction in preference order
    assert_eq!(chosen, "right");
}

/// Blocked on every side but one neighbour is an enemy tail that moves away this turn
#[tokio::test]
async fn test_trapped_prefers_vacating_tail() {
    let ours = snake("our-snake", &[(5, 10), (5, 9), (5, 8)]);
    // Right neighbour (6,10) is this snake's head, left neighbour (4,10) is its tail
    let enemy = snake(
        "opponent",
        &[(6, 10), (6, 9), (6, 8), (6, 7), (5, 7), (4, 7), (4, 8), (4, 9), (4, 10)],
    );

    let chosen = chosen_move(vec![ours, enemy]).await;
    assert_eq!(chosen, "left");
}

/// Snake at the top wall, boxed in by its own body and an enemy head
#[tokio::test]
async fn test_top_wall_does_not_default_to_up() {
    let ours = snake("our-snake", &[(5, 10), (5, 9), (4, 9), (4, 10), (3, 10)]);
    let enemy = snake("opponent", &[(6, 10), (6, 9), (6, 8)]);

    let chosen = chosen_move(vec![ours, enemy]).await;
    assert_ne!(chosen, "up", "Bot should not choose 'up' when at top wall (y=10)");
    assert_eq!(chosen, "right");
}

/// Snake at the bottom wall should not choose "down"
#[tokio::test]
async fn test_bottom_wall_avoids_down() {
    let ours = snake(
        "our-snake",
        &[(5, 0), (5, 1), (4, 1), (4, 0), (3, 0), (2, 0), (1, 0), (0, 0)],
    );

    let chosen = chosen_move(vec![ours]).await;
    assert_eq!(chosen, "right");
}

/// Snake at the left wall should not choose "left"
#[tokio::test]
async fn test_left_wall_avoids_left() {
    let ours = snake(
        "our-snake",
        &[(0, 5), (1, 5), (1, 4), (0, 4), (0, 3), (0, 2), (0, 1)],
    );

    let chosen = chosen_move(vec![ours]).await;
    assert_eq!(chosen, "up");
}

/// Snake at the right wall should not choose "right"
#[tokio::test]
async fn test_right_wall_avoids_right() {
    let ours = snake(
        "our-snake",
        &[(10, 5), (9, 5), (9, 6), (10, 6), (10, 7), (10, 8)],
    );

    let chosen = chosen_move(vec![ours]).await;
    assert_eq!(chosen, "down");
}
