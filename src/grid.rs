// Grid & occupancy model
//
// A per-turn, immutable snapshot of the board built from the API types.
// All cell predicates used by flood fill, A*, scoring and move validation live here.

use std::collections::HashSet;

use crate::types::{Battlesnake, Board, Coord, Game};

/// A live snake as seen by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnakeView {
    pub id: String,
    pub body: Vec<Coord>,
    pub health: i32,
    pub length: i32,
}

impl SnakeView {
    pub fn head(&self) -> Coord {
        self.body[0]
    }

    pub fn tail(&self) -> Coord {
        self.body[self.body.len() - 1]
    }

    /// A stacked tail means the snake ate last turn and will not vacate its tail cell
    pub fn tail_is_stacked(&self) -> bool {
        let n = self.body.len();
        n >= 2 && self.body[n - 1] == self.body[n - 2]
    }

    fn from_api(snake: &Battlesnake) -> Option<SnakeView> {
        if snake.health <= 0 || snake.body.is_empty() {
            return None;
        }

        let length = if snake.length > 0 {
            snake.length
        } else {
            snake.body.len() as i32
        };

        Some(SnakeView {
            id: snake.id.clone(),
            body: snake.body.clone(),
            health: snake.health,
            length,
        })
    }
}

/// Per-turn board snapshot
#[derive(Debug, Clone)]
pub struct BoardState {
    pub width: i32,
    pub height: i32,
    pub turn: i32,
    pub our_id: String,
    pub head: Coord,
    pub body: Vec<Coord>,
    pub length: i32,
    pub health: i32,
    /// All live snakes, ours included
    pub snakes: Vec<SnakeView>,
    pub food: Vec<Coord>,
    pub hazards: HashSet<Coord>,
    pub game_mode: String,
    food_set: HashSet<Coord>,
    occupied: HashSet<Coord>,
    /// Tails that will move this turn, used by the emergency fallback
    vacating_tails: HashSet<Coord>,
}

impl BoardState {
    /// Builds a snapshot from the request payload
    ///
    /// Missing or inconsistent data degrades to empty collections: a snake with no body
    /// is dropped, and if our own body is missing the head defaults to (0,0) with no
    /// occupancy so the caller still gets a structurally valid answer.
    pub fn from_request(game: &Game, turn: i32, board: &Board, you: &Battlesnake) -> BoardState {
        let mut snakes: Vec<SnakeView> = board.snakes.iter().filter_map(SnakeView::from_api).collect();

        // The board normally contains `you`, but tolerate payloads that omit it
        if !snakes.iter().any(|s| s.id == you.id) {
            if let Some(ours) = SnakeView::from_api(you) {
                snakes.push(ours);
            }
        }

        let body = if you.body.is_empty() {
            vec![you.head]
        } else {
            you.body.clone()
        };
        let length = if you.length > 0 { you.length } else { body.len() as i32 };

        BoardState::new(
            board.width,
            board.height,
            turn,
            you.id.clone(),
            body,
            length,
            you.health,
            snakes,
            board.food.clone(),
            board.hazards.iter().copied().collect(),
            game.ruleset.name.clone(),
        )
    }

    /// Builds a snapshot from already-validated parts
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        width: i32,
        height: i32,
        turn: i32,
        our_id: String,
        body: Vec<Coord>,
        length: i32,
        health: i32,
        snakes: Vec<SnakeView>,
        food: Vec<Coord>,
        hazards: HashSet<Coord>,
        game_mode: String,
    ) -> BoardState {
        let head = body.first().copied().unwrap_or_default();
        let snakes: Vec<SnakeView> = snakes.into_iter().filter(|s| !s.body.is_empty()).collect();
        let food_set: HashSet<Coord> = food.iter().copied().collect();

        let mut occupied = HashSet::new();
        let mut vacating_tails = HashSet::new();
        for snake in &snakes {
            let is_us = snake.id == our_id;
            // Our tail moves away this turn unless we are growing
            let keeps_tail = !is_us || food_set.contains(&snake.head()) || snake.tail_is_stacked();
            // The head is never released, even for a single-segment body
            let segments = if keeps_tail {
                snake.body.len()
            } else {
                (snake.body.len() - 1).max(1)
            };
            occupied.extend(snake.body[..segments].iter().copied());

            if !snake.tail_is_stacked() {
                vacating_tails.insert(snake.tail());
            }
        }

        BoardState {
            width,
            height,
            turn,
            our_id,
            head,
            body,
            length,
            health,
            snakes,
            food,
            hazards,
            game_mode,
            food_set,
            occupied,
            vacating_tails,
        }
    }

    /// True iff the cell lies outside the board
    pub fn is_wall(&self, pos: Coord) -> bool {
        pos.x < 0 || pos.y < 0 || pos.x >= self.width || pos.y >= self.height
    }

    /// True iff any snake body segment covers the cell (our tail excluded when it will move)
    pub fn is_occupied(&self, pos: Coord) -> bool {
        self.occupied.contains(&pos)
    }

    pub fn is_hazard(&self, pos: Coord) -> bool {
        self.hazards.contains(&pos)
    }

    pub fn is_food(&self, pos: Coord) -> bool {
        self.food_set.contains(&pos)
    }

    /// Neither a wall nor occupied
    pub fn is_free(&self, pos: Coord) -> bool {
        !self.is_wall(pos) && !self.is_occupied(pos)
    }

    /// True iff the cell is a tail that will be vacated at the end of this turn
    pub fn is_vacating_tail(&self, pos: Coord) -> bool {
        self.vacating_tails.contains(&pos)
    }

    /// Number of free orthogonal neighbours of a cell
    pub fn escape_routes(&self, pos: Coord) -> usize {
        pos.neighbors().iter().filter(|&&n| self.is_free(n)).count()
    }

    /// Distance to the closest edge; 0 means the cell is on the edge
    pub fn wall_distance(&self, pos: Coord) -> i32 {
        pos.x
            .min(pos.y)
            .min(self.width - 1 - pos.x)
            .min(self.height - 1 - pos.y)
    }

    pub fn is_corner(&self, pos: Coord) -> bool {
        (pos.x == 0 || pos.x == self.width - 1) && (pos.y == 0 || pos.y == self.height - 1)
    }

    /// Integer center of the board
    pub fn center(&self) -> Coord {
        Coord::new(self.width / 2, self.height / 2)
    }

    pub fn area(&self) -> i32 {
        self.width * self.height
    }

    /// All live snakes except ours
    pub fn enemies(&self) -> impl Iterator<Item = &SnakeView> + '_ {
        self.snakes.iter().filter(move |s| s.id != self.our_id)
    }

    /// Closest food to a cell by Manhattan distance, first listed wins ties
    pub fn nearest_food(&self, pos: Coord) -> Option<Coord> {
        self.food.iter().copied().min_by_key(|f| pos.manhattan(*f))
    }
}
