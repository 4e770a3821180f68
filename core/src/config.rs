//! Tunable parameters for park generation and visitor simulation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Slowest accepted tick cadence: one tick every 1000 seconds.
pub const MIN_TICKS_PER_SECOND: f32 = 0.001;

/// Reasons a configuration may be rejected before it reaches the park.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum ConfigError {
    /// The grid has no interior left once the border wall is carved.
    #[error("grid of {width}x{height} leaves no interior inside a margin of {margin}")]
    GridTooSmall {
        /// Requested grid width.
        width: u32,
        /// Requested grid height.
        height: u32,
        /// Requested border thickness.
        margin: u32,
    },
    /// Roads must be at least one cell wide.
    #[error("road width must be at least one cell")]
    ZeroRoadWidth,
    /// Queues must contain at least one cell.
    #[error("queue length must be at least one cell")]
    ZeroQueueLength,
    /// Every queue cell must hold at least one visitor.
    #[error("visitors per queue cell must be at least one")]
    ZeroQueueCapacity,
    /// A probability fell outside `[0, 1]`.
    #[error("{field} must lie within [0, 1]")]
    InvalidProbability {
        /// Name of the offending field.
        field: &'static str,
    },
    /// A speed range was empty or below one cell per tick.
    #[error("{field} must satisfy 1 <= min <= max")]
    InvalidSpeedRange {
        /// Name of the offending field.
        field: &'static str,
    },
    /// The departure thresholds were inverted or outside the satisfaction scale.
    #[error("departure thresholds must satisfy 0 <= min <= max <= 100")]
    InvalidThresholds,
    /// A numeric range was empty.
    #[error("{field} range is empty")]
    EmptyRange {
        /// Name of the offending field.
        field: &'static str,
    },
    /// The tick cadence fell below [`MIN_TICKS_PER_SECOND`].
    #[error("ticks per second must be at least {MIN_TICKS_PER_SECOND}")]
    TickRateTooLow,
}

/// Parameters consumed by the procedural park generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Grid width in cells.
    pub width: u32,
    /// Grid height in cells.
    pub height: u32,
    /// Number of entrances placed along the interior edge.
    pub entry_count: u32,
    /// Number of random interior points joined by the road network.
    pub internal_node_count: u32,
    /// Width of the road footprint stamped along every road path.
    pub road_width: u32,
    /// Number of queue cells in front of every attraction.
    pub queue_length: u32,
    /// Number of attractions requested; fewer may be placed.
    pub attraction_count: u32,
    /// Thickness of the border wall.
    pub margin: u32,
    /// Minimum straight-line distance between two attractions.
    pub min_attraction_distance: f32,
    /// Attempt budget for attraction placement.
    pub placement_attempts: u32,
    /// Distance thresholds of the successive road gap-connection passes.
    pub connection_passes: Vec<u32>,
    /// Length of the road stub carved inward from every entrance.
    pub entrance_approach: u32,
    /// Ranges used to roll each attraction's static statistics.
    pub attractions: AttractionRanges,
    /// Reseeds the park's random source before generating when set.
    pub seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 55,
            entry_count: 3,
            internal_node_count: 439,
            road_width: 2,
            queue_length: 5,
            attraction_count: 20,
            margin: 3,
            min_attraction_distance: 6.0,
            placement_attempts: 1_000,
            connection_passes: vec![8, 8, 12],
            entrance_approach: 2,
            attractions: AttractionRanges::default(),
            seed: None,
        }
    }
}

impl GenerationConfig {
    /// Checks that every parameter lies within its documented range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let span = self.margin.saturating_mul(2);
        if self.width <= span || self.height <= span {
            return Err(ConfigError::GridTooSmall {
                width: self.width,
                height: self.height,
                margin: self.margin,
            });
        }
        if self.road_width == 0 {
            return Err(ConfigError::ZeroRoadWidth);
        }
        if self.queue_length == 0 {
            return Err(ConfigError::ZeroQueueLength);
        }
        self.attractions.validate()
    }
}

/// Ranges used to roll the static statistics of each attraction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttractionRanges {
    /// Shortest ride duration in ticks (inclusive).
    pub ride_duration_min: u32,
    /// Longest ride duration in ticks (exclusive).
    pub ride_duration_max: u32,
    /// Smallest rider capacity (inclusive).
    pub capacity_min: u32,
    /// Largest rider capacity (inclusive).
    pub capacity_max: u32,
    /// Popularity upper bound (exclusive); the lower bound is zero.
    pub popularity_max: f32,
}

impl Default for AttractionRanges {
    fn default() -> Self {
        Self {
            ride_duration_min: 10,
            ride_duration_max: 25,
            capacity_min: 1,
            capacity_max: 1,
            popularity_max: 10.0,
        }
    }
}

impl AttractionRanges {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.ride_duration_min == 0 || self.ride_duration_min >= self.ride_duration_max {
            return Err(ConfigError::EmptyRange {
                field: "ride_duration",
            });
        }
        if self.capacity_min == 0 || self.capacity_min > self.capacity_max {
            return Err(ConfigError::EmptyRange { field: "capacity" });
        }
        if !(self.popularity_max > 0.0) {
            return Err(ConfigError::EmptyRange {
                field: "popularity",
            });
        }
        Ok(())
    }
}

/// Half-open range of visitor speeds, in cells per tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeedRange {
    /// Slowest speed (inclusive).
    pub min: f32,
    /// Fastest speed (exclusive unless equal to `min`).
    pub max: f32,
}

impl SpeedRange {
    /// Creates a new speed range.
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if self.min >= 1.0 && self.min <= self.max {
            Ok(())
        } else {
            Err(ConfigError::InvalidSpeedRange { field })
        }
    }
}

/// Rules governing how visitors are admitted from a queue onto a ride.
///
/// Every policy admits at most one visitor per attraction per tick and never
/// exceeds the attraction's capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdmissionPolicy {
    /// The longest-waiting visitor in the boarding slot boards as soon as
    /// there is room.
    Immediate,
    /// The head of the queue must wait `ticks` at the boarding slot first.
    BoardingDelay {
        /// Ticks spent at the boarding slot before boarding.
        ticks: u32,
    },
    /// As [`AdmissionPolicy::Immediate`], but a visitor whose current wait
    /// reached `max_wait` may board from any slot, ahead of its turn.
    MaxWaitOverride {
        /// Wait after which a visitor jumps the line.
        max_wait: u32,
    },
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self::BoardingDelay { ticks: 15 }
    }
}

/// Where freshly spawned visitors are placed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnPlacement {
    /// On a random entrance.
    Entrance,
    /// On a random road cell anywhere in the park.
    #[default]
    RandomRoad,
}

/// Thresholds of the recovery policy that keeps stalled visitors moving.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StallEscalation {
    /// History length beyond which revisits trim the history.
    pub revisit_history_bound: usize,
    /// Entries kept when the history is trimmed.
    pub revisit_keep: usize,
    /// Ticks without any target after which any attraction may be picked.
    pub force_pick_after: u32,
    /// Ticks with a target but no path after which the visitor is teleported.
    pub teleport_after: u32,
    /// Radius searched for a road when a ride ends.
    pub reposition_radius: u32,
}

impl Default for StallEscalation {
    fn default() -> Self {
        Self {
            revisit_history_bound: 3,
            revisit_keep: 2,
            force_pick_after: 5,
            teleport_after: 30,
            reposition_radius: 10,
        }
    }
}

/// Parameters consumed by the visitor simulation on every tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Probability that one visitor spawns on a given tick.
    pub spawn_probability: f32,
    /// Where new visitors appear.
    pub spawn_placement: SpawnPlacement,
    /// Probability that a new visitor belongs to a family.
    pub family_probability: f32,
    /// Speed range of family visitors.
    pub family_speed: SpeedRange,
    /// Speed range of everyone else.
    pub solo_speed: SpeedRange,
    /// Recompute satisfaction every tick; otherwise pin it to the initial value.
    pub satisfaction_enabled: bool,
    /// Satisfaction of a fresh visitor.
    pub initial_satisfaction: f32,
    /// Gain per completed ride.
    pub gain_per_attraction: f32,
    /// Loss per tick of accumulated waiting.
    pub loss_per_wait_time: f32,
    /// Loss per tick of the current queue or ride.
    pub loss_per_current_wait: f32,
    /// Fraction of `loss_per_wait_time` charged per tick in transit.
    pub transit_penalty_factor: f32,
    /// Flat bonus granted to family visitors.
    pub family_bonus: f32,
    /// Visitors at or below this satisfaction leave.
    pub departure_threshold_min: f32,
    /// Visitors at or above this satisfaction leave.
    pub departure_threshold_max: f32,
    /// Visitors that fit in a single queue cell.
    pub visitors_per_queue_cell: u32,
    /// Queue admission rules.
    pub admission: AdmissionPolicy,
    /// Stall recovery thresholds.
    pub escalation: StallEscalation,
    /// Tick cadence of real-time drivers.
    pub ticks_per_second: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            spawn_probability: 0.5,
            spawn_placement: SpawnPlacement::default(),
            family_probability: 0.4,
            family_speed: SpeedRange::new(1.0, 2.0),
            solo_speed: SpeedRange::new(2.0, 4.0),
            satisfaction_enabled: true,
            initial_satisfaction: 50.0,
            gain_per_attraction: 15.0,
            loss_per_wait_time: 0.5,
            loss_per_current_wait: 0.3,
            transit_penalty_factor: 0.3,
            family_bonus: 10.0,
            departure_threshold_min: 10.0,
            departure_threshold_max: 90.0,
            visitors_per_queue_cell: 2,
            admission: AdmissionPolicy::default(),
            escalation: StallEscalation::default(),
            ticks_per_second: 50.0,
        }
    }
}

impl SimulationConfig {
    /// Checks that every parameter lies within its documented range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_probability("spawn_probability", self.spawn_probability)?;
        check_probability("family_probability", self.family_probability)?;
        self.family_speed.validate("family_speed")?;
        self.solo_speed.validate("solo_speed")?;
        let min = self.departure_threshold_min;
        let max = self.departure_threshold_max;
        if !(0.0..=100.0).contains(&min) || !(0.0..=100.0).contains(&max) || min > max {
            return Err(ConfigError::InvalidThresholds);
        }
        if self.visitors_per_queue_cell == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        if self.ticks_per_second.is_nan() || self.ticks_per_second < MIN_TICKS_PER_SECOND {
            return Err(ConfigError::TickRateTooLow);
        }
        Ok(())
    }

    /// Wall-clock interval between ticks for real-time drivers.
    ///
    /// Rates too slow to represent saturate at [`Duration::MAX`].
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::try_from_secs_f32(1.0 / self.ticks_per_second).unwrap_or(Duration::MAX)
    }

    /// Reports whether a satisfaction value crosses either departure threshold.
    #[must_use]
    pub fn crosses_departure_threshold(&self, satisfaction: f32) -> bool {
        satisfaction <= self.departure_threshold_min || satisfaction >= self.departure_threshold_max
    }
}

fn check_probability(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { field })
    }
}
