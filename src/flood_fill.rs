// Flood-fill reachability estimation
//
// Breadth-first count of free cells reachable from a starting point. The count is the
// engine's measure of "room": how many cells a snake could still visit after a move.

use std::collections::{HashSet, VecDeque};

use crate::grid::BoardState;
use crate::simple_profiler::ProfileGuard;
use crate::types::Coord;

/// Counts free cells reachable from `start`, stopping once `cap` cells have been counted
///
/// Returns 0 when `start` itself is a wall or occupied. `None` means unbounded.
pub fn reachable_count(start: Coord, state: &BoardState, cap: Option<usize>) -> usize {
    if !state.is_free(start) {
        return 0;
    }
    flood(&[start], state, cap)
}

/// Counts free cells reachable from a snake head
///
/// Heads are occupied by definition, so the fill is seeded from the head's free
/// neighbours and the head itself is not counted.
pub fn head_reachable_count(head: Coord, state: &BoardState, cap: Option<usize>) -> usize {
    let seeds: Vec<Coord> = head
        .neighbors()
        .iter()
        .copied()
        .filter(|&n| state.is_free(n))
        .collect();
    flood(&seeds, state, cap)
}

/// Seeds must already be free cells
fn flood(seeds: &[Coord], state: &BoardState, cap: Option<usize>) -> usize {
    let _guard = ProfileGuard::new("flood_fill");

    let mut visited: HashSet<Coord> = HashSet::with_capacity(state.area().max(0) as usize);
    let mut queue: VecDeque<Coord> = VecDeque::new();
    for &seed in seeds {
        if visited.insert(seed) {
            queue.push_back(seed);
        }
    }

    let limit = cap.unwrap_or(usize::MAX);
    let mut counted = 0;

    while let Some(current) = queue.pop_front() {
        if counted >= limit {
            break;
        }
        counted += 1;

        for next in current.neighbors() {
            if state.is_free(next) && visited.insert(next) {
                queue.push_back(next);
            }
        }
    }

    counted
}
