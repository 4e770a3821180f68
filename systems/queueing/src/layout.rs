//! Queue geometry: the ordered slots of every attraction's queue line.

use theme_park_core::{Attraction, AttractionId, CellCoord, CellKind, Grid};

/// Ordered queue slots belonging to one attraction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueLine {
    attraction: AttractionId,
    attraction_cell: CellCoord,
    slots: Vec<CellCoord>,
}

impl QueueLine {
    /// Attraction served by the line.
    #[must_use]
    pub fn attraction(&self) -> AttractionId {
        self.attraction
    }

    /// Slot cells from the queue entrance (index 0) to the boarding point.
    #[must_use]
    pub fn slots(&self) -> &[CellCoord] {
        &self.slots
    }

    /// Index of the slot closest to the attraction.
    #[must_use]
    pub fn boarding_slot(&self) -> Option<usize> {
        self.slots.len().checked_sub(1)
    }
}

/// Queue geometry derived from the grid and the attraction registry.
///
/// The layout holds no occupancy; it changes only when the map or the
/// per-slot capacity changes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueueLayout {
    lines: Vec<QueueLine>,
    per_cell_capacity: u32,
}

impl QueueLayout {
    /// Derives the queue lines of every attraction.
    ///
    /// Slots are the queue cells owned by the attraction sorted by
    /// decreasing Manhattan distance to it, ties broken in raster order.
    #[must_use]
    pub fn rebuild(attractions: &[Attraction], grid: &Grid, per_cell_capacity: u32) -> Self {
        let mut lines: Vec<QueueLine> = attractions
            .iter()
            .map(|attraction| QueueLine {
                attraction: attraction.id,
                attraction_cell: attraction.cell,
                slots: Vec::new(),
            })
            .collect();
        lines.sort_by_key(|line| line.attraction);

        for (cell, contents) in grid.iter() {
            if contents.kind != CellKind::Queue {
                continue;
            }
            let Some(owner) = contents.owner else {
                continue;
            };
            if let Ok(index) = lines.binary_search_by_key(&owner, |line| line.attraction) {
                lines[index].slots.push(cell);
            }
        }

        for line in &mut lines {
            let target = line.attraction_cell;
            line.slots
                .sort_by_key(|cell| std::cmp::Reverse(cell.manhattan_distance(target)));
        }

        Self {
            lines,
            per_cell_capacity: per_cell_capacity.max(1),
        }
    }

    /// Maximum visitors sharing one slot.
    #[must_use]
    pub fn per_cell_capacity(&self) -> u32 {
        self.per_cell_capacity
    }

    /// Every queue line in attraction order.
    #[must_use]
    pub fn lines(&self) -> &[QueueLine] {
        &self.lines
    }

    /// Position of the attraction's line within [`QueueLayout::lines`].
    #[must_use]
    pub fn line_index(&self, attraction: AttractionId) -> Option<usize> {
        self.lines
            .binary_search_by_key(&attraction, |line| line.attraction)
            .ok()
    }

    /// Queue line of the attraction.
    #[must_use]
    pub fn line(&self, attraction: AttractionId) -> Option<&QueueLine> {
        self.line_index(attraction)
            .and_then(|index| self.lines.get(index))
    }

    /// Number of slots in the attraction's queue; zero when unknown.
    #[must_use]
    pub fn slot_count(&self, attraction: AttractionId) -> usize {
        self.line(attraction).map_or(0, |line| line.slots.len())
    }

    /// Cell of a slot.
    #[must_use]
    pub fn slot_cell(&self, attraction: AttractionId, slot: usize) -> Option<CellCoord> {
        self.line(attraction)
            .and_then(|line| line.slots.get(slot))
            .copied()
    }

    /// Cell of the first slot, where new visitors join the queue.
    #[must_use]
    pub fn entrance_cell(&self, attraction: AttractionId) -> Option<CellCoord> {
        self.slot_cell(attraction, 0)
    }

    /// Index of the slot closest to the attraction.
    #[must_use]
    pub fn boarding_slot(&self, attraction: AttractionId) -> Option<usize> {
        self.line(attraction).and_then(QueueLine::boarding_slot)
    }
}
