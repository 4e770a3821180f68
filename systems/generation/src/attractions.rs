//! Placement of attractions together with the queue line leading to them.

use rand::{seq::SliceRandom, Rng};
use theme_park_core::{AttractionId, CellCoord, CellKind, Direction, Grid};

/// Search limits applied while placing attractions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementRules {
    /// Number of attractions requested.
    pub count: u32,
    /// Queue cells in front of every attraction.
    pub queue_length: u32,
    /// Minimum straight-line distance between attractions.
    pub min_distance: f32,
    /// Random starting points tried before giving up.
    pub attempts: u32,
    /// Border band excluded from random starting points.
    pub margin: u32,
}

/// Attraction cell and its queue, ordered from the queue entrance inward.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Cell occupied by the ride.
    pub attraction: CellCoord,
    /// Queue cells; the first touches a road, the last touches the ride.
    pub queue: Vec<CellCoord>,
}

/// Places up to `rules.count` attractions with straight queues.
///
/// Each attempt picks a random start cell and tries the four directions in
/// random order, walking `queue_length + 1` empty cells. The first cell must
/// touch a road, the remaining queue cells must touch neither road nor
/// entrance, and the final cell becomes the attraction provided it keeps
/// `min_distance` from every attraction placed so far. No cell of the walk may touch an existing queue
/// or attraction. Fewer attractions than requested are returned once the
/// attempt budget is spent.
///
/// Placed cells are tagged with a provisional owner equal to the placement
/// index.
pub fn place_attractions<R>(grid: &mut Grid, rules: PlacementRules, rng: &mut R) -> Vec<Placement>
where
    R: Rng + ?Sized,
{
    let mut placements: Vec<Placement> = Vec::new();
    let width = grid.width();
    let height = grid.height();
    let span = rules.margin.saturating_mul(2);
    if width <= span || height <= span {
        return placements;
    }

    let mut attempts = 0;
    while (placements.len() as u32) < rules.count && attempts < rules.attempts {
        attempts += 1;
        let start = CellCoord::new(
            rng.gen_range(rules.margin..width - rules.margin),
            rng.gen_range(rules.margin..height - rules.margin),
        );
        let mut directions = Direction::ALL;
        directions.shuffle(rng);

        let placed = directions.into_iter().find_map(|direction| {
            walk_queue(&*grid, start, direction, &rules, &placements)
        });
        if let Some(placement) = placed {
            let owner = AttractionId::new(placements.len() as u32);
            for &cell in &placement.queue {
                let _ = grid.set_owned(cell, CellKind::Queue, owner);
            }
            let _ = grid.set_owned(placement.attraction, CellKind::Attraction, owner);
            placements.push(placement);
        }
    }

    placements
}

fn walk_queue(
    grid: &Grid,
    start: CellCoord,
    direction: Direction,
    rules: &PlacementRules,
    placed: &[Placement],
) -> Option<Placement> {
    let mut queue = Vec::with_capacity(rules.queue_length as usize);

    for offset in 0..=rules.queue_length {
        let cell = start.step(direction, offset)?;
        if !grid.is_kind(cell, CellKind::Empty)
            || grid.touches(cell, CellKind::Queue)
            || grid.touches(cell, CellKind::Attraction)
        {
            return None;
        }

        let touches_road = grid.touches(cell, CellKind::Road);
        if offset == 0 && !touches_road {
            return None;
        }
        if offset == rules.queue_length {
            let crowded = placed.iter().any(|other| {
                other.attraction.euclidean_distance(cell) < rules.min_distance
            });
            if crowded {
                return None;
            }
            return Some(Placement {
                attraction: cell,
                queue,
            });
        }
        if offset > 0 && (touches_road || grid.touches(cell, CellKind::Entrance)) {
            return None;
        }
        queue.push(cell);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rules(count: u32, queue_length: u32) -> PlacementRules {
        PlacementRules {
            count,
            queue_length,
            min_distance: 2.0,
            attempts: 1_000,
            margin: 1,
        }
    }

    #[test]
    fn tight_corridor_fits_exactly_two_attractions() {
        let mut grid = Grid::parse_ascii(
            "\
XXXXXXXXX
X  ...  X
XXXXXXXXX
",
        )
        .expect("valid map");
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let placements = place_attractions(&mut grid, rules(5, 1), &mut rng);

        assert_eq!(placements.len(), 2);
        assert_eq!(grid.cells_of_kind(CellKind::Attraction).len(), 2);
        assert_eq!(grid.to_ascii(), "XXXXXXXXX\nXA#...#AX\nXXXXXXXXX\n");
    }

    #[test]
    fn queue_is_a_closed_funnel() {
        let mut grid = Grid::parse_ascii(
            "\
XXXXXXXXXX
X........X
X        X
X        X
X        X
X        X
XXXXXXXXXX
",
        )
        .expect("valid map");
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        let placements = place_attractions(&mut grid, rules(1, 3), &mut rng);

        assert_eq!(placements.len(), 1);
        let placement = &placements[0];
        assert_eq!(placement.queue.len(), 3);
        assert!(grid.touches(placement.queue[0], CellKind::Road));
        for cell in &placement.queue[1..] {
            assert!(!grid.touches(*cell, CellKind::Road));
        }
        let last = placement.queue[2];
        assert_eq!(last.manhattan_distance(placement.attraction), 1);
        assert_eq!(grid.owner(placement.attraction), Some(AttractionId::new(0)));
    }

    #[test]
    fn exhausted_budget_yields_nothing() {
        let mut grid = Grid::parse_ascii("XXXXX\nX   X\nXXXXX\n").expect("valid map");
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(place_attractions(&mut grid, rules(3, 1), &mut rng).is_empty());
    }
}
