#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Breadth-first path finding across the walkable cells of a park grid.
//!
//! Roads, entrances and queue cells are traversable; everything else blocks.
//! Searches are unweighted, so the returned paths are optimal in cell count.

use std::collections::VecDeque;

use theme_park_core::{CellCoord, Grid};

const NO_PREVIOUS: usize = usize::MAX;

/// Reusable breadth-first search scratch space.
///
/// The visited table is stamped with a generation counter so successive
/// searches over the same grid avoid clearing the buffers.
#[derive(Debug, Default)]
pub struct PathFinder {
    stamps: Vec<u32>,
    previous: Vec<usize>,
    frontier: VecDeque<usize>,
    generation: u32,
}

impl PathFinder {
    /// Creates a path finder with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds a shortest walkable path from `start` to `goal`.
    ///
    /// The returned cells exclude `start` and end with `goal`. The path is
    /// empty when both cells coincide, when the goal is not walkable, or
    /// when no route exists.
    pub fn find_path(&mut self, grid: &Grid, start: CellCoord, goal: CellCoord) -> Vec<CellCoord> {
        if start == goal || !grid.is_walkable(goal) {
            return Vec::new();
        }
        let (Some(start_index), Some(goal_index)) = (grid.index(start), grid.index(goal)) else {
            return Vec::new();
        };

        self.prepare(grid.len());
        let generation = self.generation;
        self.stamps[start_index] = generation;
        self.previous[start_index] = NO_PREVIOUS;
        self.frontier.push_back(start_index);

        let mut reached = false;
        while let Some(current_index) = self.frontier.pop_front() {
            if current_index == goal_index {
                reached = true;
                break;
            }
            let Some(current) = grid.coord(current_index) else {
                continue;
            };

            for neighbor in grid.neighbors(current) {
                if !grid.is_walkable(neighbor) {
                    continue;
                }
                let Some(neighbor_index) = grid.index(neighbor) else {
                    continue;
                };
                if self.stamps[neighbor_index] == generation {
                    continue;
                }
                self.stamps[neighbor_index] = generation;
                self.previous[neighbor_index] = current_index;
                self.frontier.push_back(neighbor_index);
            }
        }
        self.frontier.clear();

        if !reached {
            return Vec::new();
        }

        let mut path = Vec::new();
        let mut cursor = goal_index;
        while cursor != start_index {
            let Some(cell) = grid.coord(cursor) else {
                return Vec::new();
            };
            path.push(cell);
            cursor = self.previous[cursor];
            if cursor == NO_PREVIOUS {
                return Vec::new();
            }
        }
        path.reverse();
        path
    }

    fn prepare(&mut self, cell_count: usize) {
        if self.stamps.len() != cell_count {
            self.stamps = vec![0; cell_count];
            self.previous = vec![NO_PREVIOUS; cell_count];
            self.generation = 0;
        }
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.stamps.fill(0);
            self.generation = 1;
        }
        self.frontier.clear();
    }
}

/// Finds a shortest walkable path using freshly allocated scratch space.
#[must_use]
pub fn find_path(grid: &Grid, start: CellCoord, goal: CellCoord) -> Vec<CellCoord> {
    PathFinder::new().find_path(grid, start, goal)
}

/// Searches outward from `origin` in rings of growing Manhattan distance.
///
/// Returns the first cell within `radius` that satisfies the predicate.
/// Cells on the same ring are visited in a fixed order.
pub fn nearest_matching<F>(
    grid: &Grid,
    origin: CellCoord,
    radius: u32,
    mut predicate: F,
) -> Option<CellCoord>
where
    F: FnMut(CellCoord) -> bool,
{
    for distance in 0..=radius {
        let found = ring(origin, distance)
            .into_iter()
            .filter(|cell| grid.contains(*cell))
            .find(|cell| predicate(*cell));
        if found.is_some() {
            return found;
        }
    }
    None
}

fn ring(origin: CellCoord, distance: u32) -> Vec<CellCoord> {
    if distance == 0 {
        return vec![origin];
    }
    let reach = i64::from(distance);
    let mut cells = Vec::with_capacity(4 * distance as usize);
    for step in 0..reach {
        let quadrants = [
            (step, -(reach - step)),
            (reach - step, step),
            (-step, reach - step),
            (-(reach - step), -step),
        ];
        cells.extend(
            quadrants
                .into_iter()
                .filter_map(|(dc, dr)| origin.offset(dc, dr)),
        );
    }
    cells
}
