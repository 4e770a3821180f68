#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the theme park simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative park, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the park executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values describing what
//! changed. Systems operate on the plain data records declared here
//! ([`Grid`], [`Attraction`], [`Visitor`]) and never hold hidden state of
//! their own between ticks.

mod config;
mod grid;

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

pub use config::{
    AdmissionPolicy, AttractionRanges, ConfigError, GenerationConfig, SimulationConfig,
    SpawnPlacement, SpeedRange, StallEscalation, MIN_TICKS_PER_SECOND,
};
pub use grid::{Cell, CellKind, Grid, GridParseError, NeighborIter};

/// Satisfaction value flagging a visitor that has left and must be purged.
pub const REMOVAL_SENTINEL: f32 = -1.0;

/// Upper bound of the satisfaction scale.
pub const MAX_SATISFACTION: f32 = 100.0;

/// Commands that express all permissible park mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Procedurally generates a new park, discarding every visitor.
    GeneratePark {
        /// Parameters driving the generator.
        config: GenerationConfig,
    },
    /// Replaces the park layout with a prepared grid, discarding every visitor.
    LoadPark {
        /// Grid describing the new layout.
        grid: Grid,
    },
    /// Replaces the parameters that drive visitor behaviour.
    ConfigureSimulation {
        /// Parameters applied from the next tick onward.
        config: SimulationConfig,
    },
    /// Places a new visitor on the provided cell.
    SpawnVisitor {
        /// Cell the visitor starts on.
        cell: CellCoord,
    },
    /// Advances the simulation by one discrete tick.
    Tick,
}

/// Events broadcast by the park after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Announces that a generated park replaced the previous layout.
    ParkGenerated {
        /// Number of attractions the generator was asked for.
        requested: u32,
        /// Number of attractions the generator actually placed.
        placed: u32,
    },
    /// Announces that a prepared grid replaced the previous layout.
    ParkLoaded {
        /// Number of attractions found on the grid.
        attractions: u32,
    },
    /// Confirms that new simulation parameters took effect.
    SimulationConfigured,
    /// Reports that a configuration command was rejected without side effects.
    ConfigurationRejected {
        /// Specific reason the configuration was refused.
        reason: ConfigError,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Index of the tick that just started.
        tick: u64,
    },
    /// Confirms that a visitor entered the park.
    VisitorSpawned {
        /// Identifier assigned to the visitor.
        visitor: VisitorId,
        /// Cell the visitor occupies after spawning.
        cell: CellCoord,
    },
    /// Reports that a visitor picked a new attraction to head for.
    TargetSelected {
        /// Visitor that chose a target.
        visitor: VisitorId,
        /// Attraction the visitor is heading for.
        attraction: AttractionId,
    },
    /// Reports that a visitor joined an attraction's queue.
    VisitorEnqueued {
        /// Visitor that joined the queue.
        visitor: VisitorId,
        /// Attraction owning the queue.
        attraction: AttractionId,
        /// Slot assigned to the visitor, counted from the queue entrance.
        slot: usize,
    },
    /// Reports that a visitor was admitted onto a ride.
    VisitorBoarded {
        /// Visitor that boarded.
        visitor: VisitorId,
        /// Attraction the visitor is riding.
        attraction: AttractionId,
    },
    /// Reports that a visitor finished a ride.
    RideCompleted {
        /// Visitor that finished riding.
        visitor: VisitorId,
        /// Attraction that was ridden.
        attraction: AttractionId,
    },
    /// Reports that a visitor decided to leave the park.
    VisitorLeaving {
        /// Visitor heading for the exit.
        visitor: VisitorId,
    },
    /// Reports that stall recovery moved a visitor to a new cell.
    VisitorTeleported {
        /// Visitor that was moved.
        visitor: VisitorId,
        /// Cell the visitor was moved to.
        cell: CellCoord,
    },
    /// Confirms that a visitor left the park and was removed.
    VisitorExited {
        /// Visitor that was removed.
        visitor: VisitorId,
    },
}

/// Cardinal movement directions on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// All four directions in a fixed order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// Column and row delta of a single step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i64, i64) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }
}

/// Unique identifier assigned to an attraction.
///
/// Identifiers are handed out in raster-scan order of the attraction cells
/// each time a layout is registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttractionId(u32);

impl AttractionId {
    /// Creates a new attraction identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a visitor; never reused within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VisitorId(u64);

impl VisitorId {
    /// Creates a new visitor identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Computes the straight-line distance between two cell coordinates.
    #[must_use]
    pub fn euclidean_distance(self, other: CellCoord) -> f32 {
        let dc = self.column().abs_diff(other.column()) as f32;
        let dr = self.row().abs_diff(other.row()) as f32;
        (dc * dc + dr * dr).sqrt()
    }

    /// Offsets the cell by a signed delta, returning `None` below zero.
    #[must_use]
    pub fn offset(self, dc: i64, dr: i64) -> Option<CellCoord> {
        let column = u32::try_from(i64::from(self.column) + dc).ok()?;
        let row = u32::try_from(i64::from(self.row) + dr).ok()?;
        Some(CellCoord::new(column, row))
    }

    /// Moves `steps` cells in the provided direction.
    #[must_use]
    pub fn step(self, direction: Direction, steps: u32) -> Option<CellCoord> {
        let (dc, dr) = direction.delta();
        let steps = i64::from(steps);
        self.offset(dc * steps, dr * steps)
    }
}

/// Genre tags attached to attractions and preferred by visitors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Genre {
    /// Roller coasters.
    RollerCoaster,
    /// Rides suited to the whole family.
    Family,
    /// Thrill rides.
    Thrill,
    /// Rides aimed at young children.
    Kids,
    /// Haunted houses and other horror rides.
    Horror,
    /// Shows and parades.
    Show,
}

impl Genre {
    /// Every genre in declaration order.
    pub const ALL: [Genre; 6] = [
        Genre::RollerCoaster,
        Genre::Family,
        Genre::Thrill,
        Genre::Kids,
        Genre::Horror,
        Genre::Show,
    ];
}

/// Static and per-tick statistics describing one attraction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attraction {
    /// Identifier assigned when the layout was registered.
    pub id: AttractionId,
    /// Grid cell occupied by the ride itself.
    pub cell: CellCoord,
    /// Number of ticks a visitor spends riding.
    pub ride_duration: u32,
    /// Genre tags; never empty.
    pub tags: Vec<Genre>,
    /// Maximum number of simultaneous riders.
    pub capacity: u32,
    /// Popularity score in `[0, 10)`.
    pub popularity: f32,
    /// Visitors currently riding.
    pub riders: u32,
    /// Visitors currently queuing.
    pub queuers: u32,
    /// Riders divided by capacity.
    pub occupancy_rate: f32,
    /// Mean ticks left for the current riders, zero when nobody rides.
    pub average_remaining_ride: f32,
}

impl Attraction {
    /// Reports whether the attraction carries the provided genre tag.
    #[must_use]
    pub fn has_tag(&self, genre: Genre) -> bool {
        self.tags.contains(&genre)
    }
}

/// Looks up an attraction by identifier in a slice sorted by id.
#[must_use]
pub fn find_attraction(attractions: &[Attraction], id: AttractionId) -> Option<&Attraction> {
    attractions
        .binary_search_by_key(&id, |attraction| attraction.id)
        .ok()
        .and_then(|index| attractions.get(index))
}

/// Lifecycle states of a visitor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisitorState {
    /// Walking through the park, possibly toward a target attraction.
    Moving,
    /// Waiting in an attraction's queue.
    InQueue,
    /// Riding an attraction.
    Riding,
    /// Walking toward an entrance to leave the park.
    Leaving,
}

/// Demographic attributes rolled when a visitor is created.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisitorProfile {
    /// Age in years.
    pub age: u8,
    /// Whether the visitor is part of a family group.
    pub is_family: bool,
    /// Genre the visitor prefers.
    pub preferred_genre: Genre,
    /// Cells advanced per tick before flooring; at least one.
    pub speed: f32,
}

/// Autonomous park visitor.
#[derive(Clone, Debug, PartialEq)]
pub struct Visitor {
    /// Identifier assigned at spawn.
    pub id: VisitorId,
    /// Grid cell currently occupied.
    pub cell: CellCoord,
    /// Age in years.
    pub age: u8,
    /// Whether the visitor is part of a family group.
    pub is_family: bool,
    /// Genre the visitor prefers.
    pub preferred_genre: Genre,
    /// Cells advanced per tick before flooring.
    pub speed: f32,
    /// Satisfaction in `[0, 100]`, or [`REMOVAL_SENTINEL`] once departed.
    pub satisfaction: f32,
    /// Current lifecycle state.
    pub state: VisitorState,
    /// Attraction the visitor is heading for, queuing at or riding.
    pub target: Option<AttractionId>,
    /// Cells still to traverse, excluding the current cell.
    pub path: VecDeque<CellCoord>,
    /// Queue slot index while queuing.
    pub queue_slot: Option<usize>,
    /// Ticks spent in the current queue or on the current ride.
    pub current_wait: u32,
    /// Ticks spent waiting, riding or in transit toward a target.
    pub total_wait: u32,
    /// Ticks spent travelling toward the current target.
    pub time_in_transit: u32,
    /// Consecutive ticks without a usable target or path.
    pub stalled_ticks: u32,
    /// Number of rides completed.
    pub attractions_visited: u32,
    /// Recently completed attractions, oldest first.
    pub history: Vec<AttractionId>,
    /// Remaining boarding countdown while at the head of a queue.
    pub boarding_remaining: Option<u32>,
}

impl Visitor {
    /// Creates a moving visitor with the provided demographics.
    #[must_use]
    pub fn new(
        id: VisitorId,
        cell: CellCoord,
        profile: VisitorProfile,
        initial_satisfaction: f32,
    ) -> Self {
        Self {
            id,
            cell,
            age: profile.age,
            is_family: profile.is_family,
            preferred_genre: profile.preferred_genre,
            speed: profile.speed.max(1.0),
            satisfaction: initial_satisfaction.clamp(0.0, MAX_SATISFACTION),
            state: VisitorState::Moving,
            target: None,
            path: VecDeque::new(),
            queue_slot: None,
            current_wait: 0,
            total_wait: 0,
            time_in_transit: 0,
            stalled_ticks: 0,
            attractions_visited: 0,
            history: Vec::new(),
            boarding_remaining: None,
        }
    }

    /// Whole cells the visitor may advance in one tick.
    #[must_use]
    pub fn steps_per_tick(&self) -> usize {
        (self.speed.floor() as usize).max(1)
    }

    /// Flags the visitor for removal at the end of the current tick.
    pub fn mark_departed(&mut self) {
        self.satisfaction = REMOVAL_SENTINEL;
    }

    /// Reports whether the visitor has been flagged for removal.
    #[must_use]
    pub fn is_departed(&self) -> bool {
        self.satisfaction < 0.0
    }

    /// Drops the current target together with any pending path.
    pub fn clear_target(&mut self) {
        self.target = None;
        self.path.clear();
        self.time_in_transit = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::{
        find_attraction, Attraction, AttractionId, CellCoord, Direction, Genre, Visitor,
        VisitorId, VisitorProfile, VisitorState,
    };
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    fn attraction(id: u32) -> Attraction {
        Attraction {
            id: AttractionId::new(id),
            cell: CellCoord::new(id, id),
            ride_duration: 12,
            tags: vec![Genre::Horror],
            capacity: 2,
            popularity: 4.5,
            riders: 0,
            queuers: 0,
            occupancy_rate: 0.0,
            average_remaining_ride: 0.0,
        }
    }

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn euclidean_distance_matches_expectation() {
        let origin = CellCoord::new(0, 0);
        assert!((origin.euclidean_distance(CellCoord::new(3, 4)) - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn step_refuses_to_leave_the_first_quadrant() {
        let origin = CellCoord::new(0, 2);
        assert_eq!(origin.step(Direction::West, 1), None);
        assert_eq!(origin.step(Direction::North, 2), Some(CellCoord::new(0, 0)));
        assert_eq!(origin.step(Direction::East, 3), Some(CellCoord::new(3, 2)));
    }

    #[test]
    fn find_attraction_uses_identifier_order() {
        let attractions = vec![attraction(0), attraction(1), attraction(2)];
        let found = find_attraction(&attractions, AttractionId::new(2)).expect("attraction");
        assert_eq!(found.cell, CellCoord::new(2, 2));
        assert!(find_attraction(&attractions, AttractionId::new(7)).is_none());
    }

    #[test]
    fn attraction_round_trips_through_bincode() {
        assert_round_trip(&attraction(3));
    }

    #[test]
    fn new_visitor_starts_moving_with_clamped_values() {
        let profile = VisitorProfile {
            age: 30,
            is_family: false,
            preferred_genre: Genre::Show,
            speed: 0.4,
        };
        let visitor = Visitor::new(VisitorId::new(9), CellCoord::new(2, 2), profile, 140.0);

        assert_eq!(visitor.state, VisitorState::Moving);
        assert_eq!(visitor.steps_per_tick(), 1);
        assert!((visitor.satisfaction - 100.0).abs() < f32::EPSILON);
        assert!(visitor.queue_slot.is_none());
        assert!(!visitor.is_departed());
    }

    #[test]
    fn departed_visitor_reports_sentinel() {
        let profile = VisitorProfile {
            age: 12,
            is_family: true,
            preferred_genre: Genre::Kids,
            speed: 2.7,
        };
        let mut visitor = Visitor::new(VisitorId::new(1), CellCoord::new(0, 0), profile, 50.0);
        assert_eq!(visitor.steps_per_tick(), 2);

        visitor.mark_departed();
        assert!(visitor.is_departed());
    }
}
