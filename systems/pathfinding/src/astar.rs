//! Four-directional grid A* with scaled integer costs.

use gridforge_core::{GridPosition, GridView, Route};
use pathfinding::prelude::astar;

/// Cost of a single orthogonal step.
pub const STEP_COST: u32 = 1000;

/// Plans a route from `start` to `goal` across walkable cells.
///
/// The start and goal cells are always traversable so routes may begin on a
/// spawner and end on the core. The returned route omits `start`.
#[must_use]
pub fn find_route(grid: &GridView<'_>, start: GridPosition, goal: GridPosition) -> Option<Route> {
    find_route_with(start, goal, |cell| {
        if cell == start || cell == goal || grid.is_walkable(cell) {
            Some(STEP_COST)
        } else {
            None
        }
    })
}

/// Plans a route using a caller-supplied cost for entering each cell.
///
/// `cost` returns `None` for cells that must never be entered. Costs below
/// [`STEP_COST`] make the Euclidean heuristic inadmissible. The callback must
/// reject cells outside the area of interest, otherwise the search never
/// terminates on unreachable goals.
pub fn find_route_with<F>(start: GridPosition, goal: GridPosition, cost: F) -> Option<Route>
where
    F: Fn(GridPosition) -> Option<u32>,
{
    if start == goal {
        return Some(Route::new(Vec::new()));
    }

    let (path, _) = astar(
        &start,
        |cell| {
            cell.neighbors()
                .into_iter()
                .filter_map(|next| cost(next).map(|step| (next, step)))
                .collect::<Vec<_>>()
        },
        |cell| heuristic(*cell, goal),
        |cell| *cell == goal,
    )?;

    Some(Route::new(path.into_iter().skip(1).collect()))
}

fn heuristic(from: GridPosition, to: GridPosition) -> u32 {
    let scaled = (from.euclidean_distance(to) * STEP_COST as f32).floor();
    if scaled >= u32::MAX as f32 {
        u32::MAX
    } else {
        scaled as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_never_exceeds_manhattan_cost() {
        for (x, y) in [(0, 0), (3, 4), (9, 9), (-5, 2)] {
            let from = GridPosition::new(x, y);
            let manhattan = from.manhattan_distance(GridPosition::ORIGIN);
            assert!(heuristic(from, GridPosition::ORIGIN) <= manhattan * STEP_COST);
        }
        assert_eq!(heuristic(GridPosition::new(3, 4), GridPosition::ORIGIN), 5000);
    }

    #[test]
    fn identical_endpoints_yield_an_empty_route() {
        let route = find_route_with(GridPosition::new(2, 2), GridPosition::new(2, 2), |_| None)
            .expect("trivial route");
        assert!(route.is_empty());
    }

    #[test]
    fn custom_costs_steer_the_search() {
        let start = GridPosition::new(0, 0);
        let goal = GridPosition::new(2, 0);
        let route = find_route_with(start, goal, |cell| {
            let inside = (0..=2).contains(&cell.x()) && (-1..=1).contains(&cell.y());
            match (inside, cell) {
                (false, _) => None,
                (true, cell) if cell == GridPosition::new(1, 0) => None,
                (true, _) => Some(STEP_COST),
            }
        })
        .expect("detour exists");

        assert_eq!(route.len(), 4);
        assert_eq!(route.destination(), Some(goal));
        assert!(route.position_of(GridPosition::new(1, 0)).is_none());
    }
}
