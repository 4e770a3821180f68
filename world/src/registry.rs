//! Attraction registry: identifiers, queue ownership and live statistics.

use std::collections::{BTreeMap, VecDeque};

use rand::Rng;
use theme_park_core::{
    Attraction, AttractionId, AttractionRanges, CellCoord, CellKind, Genre, Grid, Visitor,
    VisitorState,
};
use tracing::warn;

/// Registers every attraction cell of the grid.
///
/// Attractions are numbered in raster order and the owners of their queue
/// cells are rewritten to match. Queue cells without an owner are claimed by
/// flooding outward from each attraction; cells nobody claims stay orphaned.
pub(crate) fn build_registry<R>(
    grid: &mut Grid,
    ranges: &AttractionRanges,
    rng: &mut R,
) -> Vec<Attraction>
where
    R: Rng + ?Sized,
{
    let cells = grid.cells_of_kind(CellKind::Attraction);
    let ids: Vec<AttractionId> = (0..cells.len())
        .map(|index| AttractionId::new(index as u32))
        .collect();

    let mut renumbered: BTreeMap<AttractionId, AttractionId> = BTreeMap::new();
    for (cell, id) in cells.iter().zip(&ids) {
        if let Some(provisional) = grid.owner(*cell) {
            let _ = renumbered.insert(provisional, *id);
        }
    }

    let queue_cells = grid.cells_of_kind(CellKind::Queue);
    let owners: Vec<Option<AttractionId>> = queue_cells
        .iter()
        .map(|cell| {
            grid.owner(*cell)
                .and_then(|provisional| renumbered.get(&provisional).copied())
        })
        .collect();
    for (cell, owner) in queue_cells.iter().zip(owners) {
        let _ = grid.set_owner(*cell, owner);
    }
    for (cell, id) in cells.iter().zip(&ids) {
        let _ = grid.set_owner(*cell, Some(*id));
    }
    for (cell, id) in cells.iter().zip(&ids) {
        claim_untagged_queue(grid, *cell, *id);
    }

    let orphaned = queue_cells
        .iter()
        .filter(|cell| grid.owner(**cell).is_none())
        .count();
    if orphaned > 0 {
        warn!(orphaned, "queue cells without an attraction are ignored");
    }

    cells
        .iter()
        .zip(ids)
        .map(|(cell, id)| roll_attraction(id, *cell, ranges, rng))
        .collect()
}

fn claim_untagged_queue(grid: &mut Grid, attraction_cell: CellCoord, id: AttractionId) {
    let mut frontier = VecDeque::from([attraction_cell]);
    while let Some(cell) = frontier.pop_front() {
        for next in grid.neighbors(cell) {
            if grid.is_kind(next, CellKind::Queue) && grid.owner(next).is_none() {
                let _ = grid.set_owner(next, Some(id));
                frontier.push_back(next);
            }
        }
    }
}

fn roll_attraction<R>(
    id: AttractionId,
    cell: CellCoord,
    ranges: &AttractionRanges,
    rng: &mut R,
) -> Attraction
where
    R: Rng + ?Sized,
{
    Attraction {
        id,
        cell,
        ride_duration: rng.gen_range(ranges.ride_duration_min..ranges.ride_duration_max),
        tags: vec![Genre::ALL[rng.gen_range(0..Genre::ALL.len())]],
        capacity: rng.gen_range(ranges.capacity_min..=ranges.capacity_max),
        popularity: rng.gen_range(0.0..ranges.popularity_max),
        riders: 0,
        queuers: 0,
        occupancy_rate: 0.0,
        average_remaining_ride: 0.0,
    }
}

/// Recomputes the live statistics of every attraction from the visitors.
pub(crate) fn refresh_statistics(attractions: &mut [Attraction], visitors: &[Visitor]) {
    for attraction in attractions.iter_mut() {
        let mut riders = 0_u32;
        let mut queuers = 0_u32;
        let mut remaining = 0_u64;
        for visitor in visitors {
            if visitor.target != Some(attraction.id) {
                continue;
            }
            match visitor.state {
                VisitorState::Riding => {
                    riders += 1;
                    remaining += u64::from(
                        attraction
                            .ride_duration
                            .saturating_sub(visitor.current_wait),
                    );
                }
                VisitorState::InQueue => queuers += 1,
                VisitorState::Moving | VisitorState::Leaving => {}
            }
        }

        attraction.riders = riders;
        attraction.queuers = queuers;
        attraction.occupancy_rate = if attraction.capacity == 0 {
            0.0
        } else {
            riders as f32 / attraction.capacity as f32
        };
        attraction.average_remaining_ride = if riders == 0 {
            0.0
        } else {
            remaining as f32 / riders as f32
        };
    }
}
