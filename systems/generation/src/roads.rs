//! Road network construction: spanning-tree paths, gap connectors and
//! diagonal pinch-point repair.

use theme_park_core::{CellCoord, CellKind, Grid};

/// Expands an axis-aligned path from `from` to `to`.
///
/// While both axes differ the walk alternates between a row step and a
/// column step; once one axis matches it heads straight for the goal. The
/// returned cells exclude `from` and include `to`.
#[must_use]
pub fn expand_orthogonal_path(from: CellCoord, to: CellCoord) -> Vec<CellCoord> {
    let mut path = Vec::with_capacity(from.manhattan_distance(to) as usize);
    let (mut column, mut row) = (from.column(), from.row());

    while (column, row) != (to.column(), to.row()) {
        let row_differs = row != to.row();
        let column_differs = column != to.column();
        if row_differs && (!column_differs || path.len() % 2 == 0) {
            row = step_toward(row, to.row());
        } else {
            column = step_toward(column, to.column());
        }
        path.push(CellCoord::new(column, row));
    }

    path
}

fn step_toward(value: u32, target: u32) -> u32 {
    if value < target {
        value + 1
    } else {
        value - 1
    }
}

/// Stamps a square road footprint of `width` cells around every path cell.
///
/// Only empty cells are converted; walls, entrances and anything already
/// placed are left untouched. Returns the number of cells converted.
pub fn stamp_road(grid: &mut Grid, path: &[CellCoord], width: u32) -> usize {
    let before = i64::from(width / 2);
    let after = i64::from(width - width / 2);
    let mut converted = 0;

    for &cell in path {
        for dr in -before..after {
            for dc in -before..after {
                let Some(target) = cell.offset(dc, dr) else {
                    continue;
                };
                if grid.is_kind(target, CellKind::Empty) && grid.set(target, CellKind::Road) {
                    converted += 1;
                }
            }
        }
    }

    converted
}

/// Disjoint-set forest with path halving, used to track road connectivity.
#[derive(Clone, Debug)]
pub struct DisjointSet {
    parents: Vec<usize>,
}

impl DisjointSet {
    /// Creates `len` singleton sets.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            parents: (0..len).collect(),
        }
    }

    /// Representative of the set containing `element`.
    pub fn find(&mut self, mut element: usize) -> usize {
        while self.parents[element] != element {
            let grandparent = self.parents[self.parents[element]];
            self.parents[element] = grandparent;
            element = grandparent;
        }
        element
    }

    /// Merges the sets containing `a` and `b`; returns `false` if already joined.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return false;
        }
        self.parents[root_a] = root_b;
        true
    }
}

/// Joins every point with a minimum-spanning-tree of orthogonal roads.
///
/// All point pairs are sorted by Manhattan distance (ties broken by index)
/// and joined whenever they still belong to different components. Both
/// endpoints are part of the stamped footprint. Returns the number of edges
/// carved.
pub fn connect_points(grid: &mut Grid, points: &[CellCoord], road_width: u32) -> usize {
    let mut edges = Vec::with_capacity(points.len() * points.len().saturating_sub(1) / 2);
    for (i, a) in points.iter().enumerate() {
        for (j, b) in points.iter().enumerate().skip(i + 1) {
            edges.push((a.manhattan_distance(*b), i, j));
        }
    }
    edges.sort_unstable();

    let mut components = DisjointSet::new(points.len());
    let mut carved = 0;
    for (_, i, j) in edges {
        if components.union(i, j) {
            let mut path = vec![points[i]];
            path.extend(expand_orthogonal_path(points[i], points[j]));
            let _ = stamp_road(grid, &path, road_width);
            carved += 1;
        }
    }

    carved
}

/// Labels connected components of road and entrance cells.
fn label_road_components(grid: &Grid) -> (Vec<Option<usize>>, usize) {
    let mut labels = vec![None; grid.len()];
    let mut next_label = 0;
    let mut stack = Vec::new();

    for (cell, contents) in grid.iter() {
        if !is_network(contents.kind) {
            continue;
        }
        let Some(index) = grid.index(cell) else {
            continue;
        };
        if labels[index].is_some() {
            continue;
        }

        labels[index] = Some(next_label);
        stack.push(cell);
        while let Some(current) = stack.pop() {
            for neighbor in grid.neighbors(current) {
                let Some(neighbor_index) = grid.index(neighbor) else {
                    continue;
                };
                if labels[neighbor_index].is_none()
                    && grid.kind(neighbor).is_some_and(is_network)
                {
                    labels[neighbor_index] = Some(next_label);
                    stack.push(neighbor);
                }
            }
        }
        next_label += 1;
    }

    (labels, next_label)
}

fn is_network(kind: CellKind) -> bool {
    matches!(kind, CellKind::Road | CellKind::Entrance)
}

/// Connects road cells of different components lying within `threshold`.
///
/// A pair is joined only if every intermediate cell of its orthogonal
/// connector is empty. Returns the number of connectors carved; roads are
/// never removed.
pub fn connect_road_components(grid: &mut Grid, threshold: u32) -> usize {
    let (labels, count) = label_road_components(grid);
    if count < 2 {
        return 0;
    }

    let mut components = DisjointSet::new(count);
    let roads = grid.cells_of_kind(CellKind::Road);
    let reach = i64::from(threshold);
    let mut carved = 0;

    for &from in &roads {
        let Some(from_label) = grid.index(from).and_then(|index| labels[index]) else {
            continue;
        };
        for dr in -reach..=reach {
            let span = reach - dr.abs();
            for dc in -span..=span {
                let Some(to) = from.offset(dc, dr) else {
                    continue;
                };
                if to <= from || !grid.is_kind(to, CellKind::Road) {
                    continue;
                }
                let Some(to_label) = grid.index(to).and_then(|index| labels[index]) else {
                    continue;
                };
                if components.find(from_label) == components.find(to_label) {
                    continue;
                }

                let path = expand_orthogonal_path(from, to);
                let Some((_, connector)) = path.split_last() else {
                    continue;
                };
                if connector.is_empty()
                    || !connector
                        .iter()
                        .all(|cell| grid.is_kind(*cell, CellKind::Empty))
                {
                    continue;
                }
                for &cell in connector {
                    let _ = grid.set(cell, CellKind::Road);
                }
                let _ = components.union(from_label, to_label);
                carved += 1;
            }
        }
    }

    carved
}

/// Bridges road cells that touch only at a corner.
///
/// Whenever two diagonally adjacent network cells have both shared
/// orthogonal neighbours empty, one of those empty cells becomes road so the
/// pinch point can be walked. Cells touching a queue are never converted so
/// queues stay closed funnels; the other candidate is used instead. Returns
/// the number of cells filled during this sweep.
pub fn fill_diagonal_gaps(grid: &mut Grid) -> usize {
    let mut filled = 0;

    for row in 0..grid.height().saturating_sub(1) {
        for column in 0..grid.width().saturating_sub(1) {
            let top_left = CellCoord::new(column, row);
            let top_right = CellCoord::new(column + 1, row);
            let bottom_left = CellCoord::new(column, row + 1);
            let bottom_right = CellCoord::new(column + 1, row + 1);

            let network = |cell: CellCoord| grid.kind(cell).is_some_and(is_network);
            let empty = |cell: CellCoord| grid.is_kind(cell, CellKind::Empty);

            let candidates = if network(top_left)
                && network(bottom_right)
                && empty(top_right)
                && empty(bottom_left)
            {
                [top_right, bottom_left]
            } else if network(top_right)
                && network(bottom_left)
                && empty(top_left)
                && empty(bottom_right)
            {
                [top_left, bottom_right]
            } else {
                continue;
            };

            let bridge = candidates
                .into_iter()
                .find(|cell| !grid.touches(*cell, CellKind::Queue));
            if let Some(cell) = bridge {
                if grid.set(cell, CellKind::Road) {
                    filled += 1;
                }
            }
        }
    }

    filled
}
