// A* pathfinding over free cells
//
// The open set is a min-heap on f = g + manhattan(node, goal). Equal f values are
// expanded in insertion order via a monotonically increasing sequence number, so
// results are reproducible for a given board.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::time::Instant;

use crate::grid::BoardState;
use crate::simple_profiler::ProfileGuard;
use crate::types::{Coord, Direction};

/// Search limits for a single A* query
#[derive(Debug, Clone, Copy)]
pub struct SearchLimits {
    pub deadline: Instant,
    pub max_iterations: usize,
    /// The wall clock is only consulted every this many iterations
    pub check_interval: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    f: i32,
    g: i32,
    seq: u64,
    pos: Coord,
}

// BinaryHeap is a max-heap; invert so the lowest (f, seq) pops first
impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// How an A* query ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSearch {
    /// Full path including both endpoints
    Found(Vec<Coord>),
    /// The open set ran dry: the goal cannot be reached
    NoPath,
    /// The iteration cap or the deadline stopped the search first
    Exhausted,
}

impl PathSearch {
    pub fn into_path(self) -> Option<Vec<Coord>> {
        match self {
            PathSearch::Found(path) => Some(path),
            PathSearch::NoPath | PathSearch::Exhausted => None,
        }
    }
}

/// Runs A* from `start` to `goal` through free cells
///
/// The start cell is exempt from the free check (it is usually our own head).
pub fn search(start: Coord, goal: Coord, state: &BoardState, limits: &SearchLimits) -> PathSearch {
    let _guard = ProfileGuard::new("astar");

    if start == goal {
        return PathSearch::Found(vec![start]);
    }
    if state.is_wall(start) || !state.is_free(goal) {
        return PathSearch::NoPath;
    }

    let check_interval = limits.check_interval.max(1);
    let mut open = BinaryHeap::new();
    let mut came_from: HashMap<Coord, Coord> = HashMap::new();
    let mut best_g: HashMap<Coord, i32> = HashMap::new();
    let mut closed: HashSet<Coord> = HashSet::new();
    let mut seq: u64 = 0;

    best_g.insert(start, 0);
    open.push(OpenNode {
        f: start.manhattan(goal),
        g: 0,
        seq,
        pos: start,
    });

    let mut iterations = 0usize;
    while let Some(node) = open.pop() {
        iterations += 1;
        if iterations > limits.max_iterations {
            return PathSearch::Exhausted;
        }
        if iterations % check_interval == 0 && Instant::now() >= limits.deadline {
            return PathSearch::Exhausted;
        }

        if node.pos == goal {
            return PathSearch::Found(rebuild_path(&came_from, start, goal));
        }
        if !closed.insert(node.pos) {
            continue;
        }

        for next in node.pos.neighbors() {
            if closed.contains(&next) || !state.is_free(next) {
                continue;
            }
            let g = node.g + 1;
            if best_g.get(&next).map_or(false, |&known| known <= g) {
                continue;
            }
            best_g.insert(next, g);
            came_from.insert(next, node.pos);
            seq += 1;
            open.push(OpenNode {
                f: g + next.manhattan(goal),
                g,
                seq,
                pos: next,
            });
        }
    }

    PathSearch::NoPath
}

/// Shortest path including both endpoints, or `None` when none was found for any reason
pub fn shortest_path(
    start: Coord,
    goal: Coord,
    state: &BoardState,
    limits: &SearchLimits,
) -> Option<Vec<Coord>> {
    search(start, goal, state, limits).into_path()
}

fn rebuild_path(came_from: &HashMap<Coord, Coord>, start: Coord, goal: Coord) -> Vec<Coord> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        match came_from.get(&current) {
            Some(&prev) => {
                path.push(prev);
                current = prev;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

/// Path length, or the straight-line distance when the search ran out of budget
///
/// `None` only when the goal is known to be unreachable.
pub fn estimated_distance(
    start: Coord,
    goal: Coord,
    state: &BoardState,
    limits: &SearchLimits,
) -> Option<usize> {
    match search(start, goal, state, limits) {
        PathSearch::Found(path) => Some(path.len() - 1),
        PathSearch::Exhausted => Some(start.manhattan(goal) as usize),
        PathSearch::NoPath => None,
    }
}

/// Direction of the first move along a path
pub fn first_step(path: &[Coord]) -> Option<Direction> {
    match path {
        [from, to, ..] => Direction::between(*from, *to),
        _ => None,
    }
}

/// Straight-line fallback: the direction that reduces the larger axis gap first
///
/// Returns `None` when `from == to`.
pub fn direction_toward(from: Coord, to: Coord) -> Option<Direction> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx == 0 && dy == 0 {
        return None;
    }

    if dy.abs() >= dx.abs() {
        Some(if dy > 0 { Direction::Up } else { Direction::Down })
    } else {
        Some(if dx > 0 { Direction::Right } else { Direction::Left })
    }
}
