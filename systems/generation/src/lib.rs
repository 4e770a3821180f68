#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural park generator.
//!
//! The generator carves a walled grid, places entrances along the inner edge
//! of the wall, joins entrances and random interior nodes with a spanning
//! tree of orthogonal roads, patches the remaining road gaps, places
//! attractions with their queue lines and finally repairs diagonal pinch
//! points. Every random decision is drawn from the injected generator so a
//! seeded source reproduces the same park.

mod attractions;
mod roads;

use rand::Rng;
use theme_park_core::{CellCoord, CellKind, Direction, GenerationConfig, Grid};
use tracing::{debug, info, warn};

pub use attractions::{place_attractions, Placement, PlacementRules};
pub use roads::{
    connect_points, connect_road_components, expand_orthogonal_path, fill_diagonal_gaps,
    stamp_road, DisjointSet,
};

/// Entrance cell together with the direction pointing into the park.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entrance {
    /// Cell holding the entrance.
    pub cell: CellCoord,
    /// Direction from the entrance toward the park interior.
    pub inward: Direction,
}

/// Generates a complete park layout from the provided configuration.
///
/// The configuration is expected to have passed
/// [`GenerationConfig::validate`]; degenerate values produce a sparse but
/// well-formed grid rather than a panic.
pub fn generate<R>(config: &GenerationConfig, rng: &mut R) -> Grid
where
    R: Rng + ?Sized,
{
    let mut grid = Grid::new(config.width, config.height);
    carve_border(&mut grid, config.margin);

    let entrances = place_entrances(&mut grid, config.entry_count, config.margin, rng);
    for entrance in &entrances {
        let approach: Vec<CellCoord> = (1..=config.entrance_approach)
            .filter_map(|steps| entrance.cell.step(entrance.inward, steps))
            .collect();
        let _ = stamp_road(&mut grid, &approach, config.road_width);
    }

    let nodes = interior_nodes(&grid, config.internal_node_count, config.margin, rng);
    let mut points: Vec<CellCoord> = entrances.iter().map(|entrance| entrance.cell).collect();
    points.extend(nodes);
    let edges = connect_points(&mut grid, &points, config.road_width);
    debug!(points = points.len(), edges, "road spanning tree carved");

    for &threshold in &config.connection_passes {
        let carved = connect_road_components(&mut grid, threshold);
        debug!(threshold, carved, "road gap pass");
    }

    let placements = place_attractions(
        &mut grid,
        PlacementRules {
            count: config.attraction_count,
            queue_length: config.queue_length,
            min_distance: config.min_attraction_distance,
            attempts: config.placement_attempts,
            margin: config.margin,
        },
        rng,
    );

    let mut filled = 0;
    loop {
        let sweep = fill_diagonal_gaps(&mut grid);
        if sweep == 0 {
            break;
        }
        filled += sweep;
    }

    let placed = placements.len() as u32;
    if placed < config.attraction_count {
        warn!(
            requested = config.attraction_count,
            placed, "attraction budget exhausted before every attraction was placed"
        );
    }
    info!(
        width = config.width,
        height = config.height,
        entrances = entrances.len(),
        roads = grid.cells_of_kind(CellKind::Road).len(),
        attractions = placed,
        diagonal_fills = filled,
        "park generated"
    );

    grid
}

/// Turns the outer `margin` rings of the grid into walls.
pub fn carve_border(grid: &mut Grid, margin: u32) {
    let width = grid.width();
    let height = grid.height();
    for row in 0..height {
        for column in 0..width {
            let inside = column >= margin
                && row >= margin
                && column.saturating_add(margin) < width
                && row.saturating_add(margin) < height;
            if !inside {
                let _ = grid.set(CellCoord::new(column, row), CellKind::Wall);
            }
        }
    }
}

/// Places `count` entrances on randomly chosen sides of the interior edge.
///
/// Entrances sit on the first ring inside the wall; the coordinate along the
/// side is uniform over the interior span.
pub fn place_entrances<R>(grid: &mut Grid, count: u32, margin: u32, rng: &mut R) -> Vec<Entrance>
where
    R: Rng + ?Sized,
{
    let width = grid.width();
    let height = grid.height();
    let span = margin.saturating_mul(2);
    if width <= span || height <= span {
        return Vec::new();
    }
    let last_column = width - margin - 1;
    let last_row = height - margin - 1;

    let mut entrances = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let entrance = match rng.gen_range(0..4) {
            0 => Entrance {
                cell: CellCoord::new(margin, rng.gen_range(margin..=last_row)),
                inward: Direction::East,
            },
            1 => Entrance {
                cell: CellCoord::new(last_column, rng.gen_range(margin..=last_row)),
                inward: Direction::West,
            },
            2 => Entrance {
                cell: CellCoord::new(rng.gen_range(margin..=last_column), margin),
                inward: Direction::South,
            },
            _ => Entrance {
                cell: CellCoord::new(rng.gen_range(margin..=last_column), last_row),
                inward: Direction::North,
            },
        };
        let _ = grid.set(entrance.cell, CellKind::Entrance);
        entrances.push(entrance);
    }

    entrances
}

/// Draws `count` random interior points for the road network.
///
/// Points keep two cells of clearance from the wall when the grid is large
/// enough, otherwise they span the whole interior.
pub fn interior_nodes<R>(grid: &Grid, count: u32, margin: u32, rng: &mut R) -> Vec<CellCoord>
where
    R: Rng + ?Sized,
{
    let (Some(columns), Some(rows)) = (
        node_span(grid.width(), margin),
        node_span(grid.height(), margin),
    ) else {
        return Vec::new();
    };

    (0..count)
        .map(|_| {
            CellCoord::new(
                rng.gen_range(columns.0..=columns.1),
                rng.gen_range(rows.0..=rows.1),
            )
        })
        .collect()
}

fn node_span(extent: u32, margin: u32) -> Option<(u32, u32)> {
    let padded = margin.checked_add(2).zip(
        margin
            .checked_add(3)
            .and_then(|reach| extent.checked_sub(reach)),
    );
    if let Some((low, high)) = padded {
        if low <= high {
            return Some((low, high));
        }
    }
    let high = extent.checked_sub(margin.checked_add(1)?)?;
    (margin <= high).then_some((margin, high))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn border_is_walled_to_margin_depth() {
        let mut grid = Grid::new(8, 7);
        carve_border(&mut grid, 2);
        assert_eq!(
            grid.to_ascii(),
            "XXXXXXXX\nXXXXXXXX\nXX    XX\nXX    XX\nXX    XX\nXXXXXXXX\nXXXXXXXX\n"
        );
    }

    #[test]
    fn entrances_sit_on_the_interior_edge() {
        let mut grid = Grid::new(20, 12);
        carve_border(&mut grid, 3);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let entrances = place_entrances(&mut grid, 12, 3, &mut rng);
        assert_eq!(entrances.len(), 12);
        for entrance in entrances {
            let cell = entrance.cell;
            assert_eq!(grid.kind(cell), Some(CellKind::Entrance));
            let on_edge = cell.column() == 3
                || cell.column() == 16
                || cell.row() == 3
                || cell.row() == 8;
            assert!(on_edge, "{cell:?} is not on the interior edge");
            let inward = cell.step(entrance.inward, 1).expect("inside grid");
            assert_ne!(grid.kind(inward), Some(CellKind::Wall));
        }
    }

    #[test]
    fn nodes_keep_clearance_from_walls() {
        let grid = Grid::new(30, 20);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for node in interior_nodes(&grid, 200, 3, &mut rng) {
            assert!((5..=24).contains(&node.column()));
            assert!((5..=14).contains(&node.row()));
        }
    }

    #[test]
    fn tiny_interiors_fall_back_to_full_span() {
        assert_eq!(node_span(9, 3), Some((3, 5)));
        assert_eq!(node_span(12, 3), Some((5, 6)));
        assert_eq!(node_span(6, 3), None);
        assert_eq!(node_span(10, u32::MAX), None);
        assert_eq!(node_span(u32::MAX, u32::MAX - 2), None);
    }

    #[test]
    fn oversized_margin_yields_a_solid_wall() {
        let config = GenerationConfig {
            width: 12,
            height: 10,
            margin: u32::MAX,
            ..GenerationConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let grid = generate(&config, &mut rng);

        assert_eq!(grid.width(), 12);
        assert_eq!(grid.to_ascii().lines().count(), 10);
        assert!(grid.to_ascii().lines().all(|row| row == "XXXXXXXXXXXX"));
    }
}
