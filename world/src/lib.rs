#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative park state management for the theme park simulation.
//!
//! The [`Park`] owns the grid, the attraction registry, the derived queue
//! layout and the visitor list. Every mutation goes through [`apply`], which
//! validates the command, runs the relevant systems and reports what changed
//! as [`Event`] values. Read access goes through the [`query`] module.

mod registry;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use theme_park_core::{
    Attraction, CellCoord, CellKind, Command, ConfigError, Event, GenerationConfig, Grid,
    SimulationConfig, Visitor, VisitorId,
};
use theme_park_system_generation::generate;
use theme_park_system_queueing::{reseat, QueueLayout};
use theme_park_system_visitors::{ParkView, VisitorSimulation};
use tracing::{debug, info, warn};

/// Represents the authoritative theme park state.
#[derive(Debug)]
pub struct Park {
    grid: Grid,
    generation: GenerationConfig,
    simulation: SimulationConfig,
    attractions: Vec<Attraction>,
    queues: QueueLayout,
    entrances: Vec<CellCoord>,
    roads: Vec<CellCoord>,
    visitors: Vec<Visitor>,
    behaviour: VisitorSimulation,
    rng: ChaCha8Rng,
    next_visitor_id: u64,
    tick_index: u64,
}

impl Park {
    /// Creates an empty park whose random source starts from `seed`.
    ///
    /// The park has no layout until a [`Command::GeneratePark`] or
    /// [`Command::LoadPark`] is applied.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            grid: Grid::new(0, 0),
            generation: GenerationConfig::default(),
            simulation: SimulationConfig::default(),
            attractions: Vec::new(),
            queues: QueueLayout::default(),
            entrances: Vec::new(),
            roads: Vec::new(),
            visitors: Vec::new(),
            behaviour: VisitorSimulation::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            next_visitor_id: 0,
            tick_index: 0,
        }
    }

    /// Replaces the layout and resets everything derived from it.
    fn install(&mut self, mut grid: Grid) {
        self.attractions =
            registry::build_registry(&mut grid, &self.generation.attractions, &mut self.rng);
        self.queues = QueueLayout::rebuild(
            &self.attractions,
            &grid,
            self.simulation.visitors_per_queue_cell,
        );
        self.entrances = grid.cells_of_kind(CellKind::Entrance);
        self.roads = grid.cells_of_kind(CellKind::Road);
        self.grid = grid;
        self.visitors.clear();
        self.next_visitor_id = 0;
        self.tick_index = 0;
    }

    fn allocate_visitor_id(&mut self) -> VisitorId {
        let id = VisitorId::new(self.next_visitor_id);
        self.next_visitor_id += 1;
        id
    }

    fn spawn_visitor(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        if !self.grid.is_walkable(cell) {
            debug!(column = cell.column(), row = cell.row(), "spawn cell is not walkable");
            return;
        }

        let id = self.allocate_visitor_id();
        let view = ParkView {
            grid: &self.grid,
            attractions: &self.attractions,
            queues: &self.queues,
            entrances: &self.entrances,
            roads: &self.roads,
        };
        let _ = self.behaviour.spawn_at(
            &view,
            &self.simulation,
            cell,
            id,
            &mut self.rng,
            &mut self.visitors,
            out_events,
        );
        registry::refresh_statistics(&mut self.attractions, &self.visitors);
    }

    fn tick(&mut self, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced {
            tick: self.tick_index,
        });

        let view = ParkView {
            grid: &self.grid,
            attractions: &self.attractions,
            queues: &self.queues,
            entrances: &self.entrances,
            roads: &self.roads,
        };
        let candidate = VisitorId::new(self.next_visitor_id);
        if self
            .behaviour
            .spawn(
                &view,
                &self.simulation,
                candidate,
                &mut self.rng,
                &mut self.visitors,
                out_events,
            )
            .is_some()
        {
            self.next_visitor_id += 1;
        }
        self.behaviour.advance(
            &view,
            &self.simulation,
            &mut self.rng,
            &mut self.visitors,
            out_events,
        );

        registry::refresh_statistics(&mut self.attractions, &self.visitors);
    }
}

/// Applies the provided command to the park, mutating state deterministically.
///
/// Configuration carried by a command is validated first; an invalid
/// configuration leaves the park untouched and emits
/// [`Event::ConfigurationRejected`].
pub fn apply(park: &mut Park, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::GeneratePark { config } => {
            if let Err(reason) = config.validate() {
                reject(reason, out_events);
                return;
            }
            if let Some(seed) = config.seed {
                park.rng = ChaCha8Rng::seed_from_u64(seed);
            }

            let grid = generate(&config, &mut park.rng);
            let requested = config.attraction_count;
            park.generation = config;
            park.install(grid);

            let placed = park.attractions.len() as u32;
            info!(
                width = park.grid.width(),
                height = park.grid.height(),
                requested,
                placed,
                entrances = park.entrances.len(),
                "park generated"
            );
            out_events.push(Event::ParkGenerated { requested, placed });
        }
        Command::LoadPark { grid } => {
            park.install(grid);
            let attractions = park.attractions.len() as u32;
            info!(
                width = park.grid.width(),
                height = park.grid.height(),
                attractions,
                "park loaded"
            );
            out_events.push(Event::ParkLoaded { attractions });
        }
        Command::ConfigureSimulation { config } => {
            if let Err(reason) = config.validate() {
                reject(reason, out_events);
                return;
            }

            let rebuild =
                config.visitors_per_queue_cell != park.simulation.visitors_per_queue_cell;
            park.simulation = config;
            if rebuild {
                park.queues = QueueLayout::rebuild(
                    &park.attractions,
                    &park.grid,
                    park.simulation.visitors_per_queue_cell,
                );
                let released = reseat(&park.queues, &mut park.visitors);
                if !released.is_empty() {
                    warn!(
                        released = released.len(),
                        capacity = park.simulation.visitors_per_queue_cell,
                        "queue capacity lowered, visitors sent back to the park"
                    );
                }
                registry::refresh_statistics(&mut park.attractions, &park.visitors);
            }
            out_events.push(Event::SimulationConfigured);
        }
        Command::SpawnVisitor { cell } => park.spawn_visitor(cell, out_events),
        Command::Tick => park.tick(out_events),
    }
}

fn reject(reason: ConfigError, out_events: &mut Vec<Event>) {
    debug!(%reason, "configuration rejected");
    out_events.push(Event::ConfigurationRejected { reason });
}

/// Query functions that provide read-only access to the park state.
pub mod query {
    use std::time::Duration;

    use super::Park;
    use theme_park_core::{
        find_attraction, Attraction, AttractionId, CellCoord, CellKind, GenerationConfig, Grid,
        SimulationConfig, Visitor, VisitorId, VisitorState,
    };
    use theme_park_system_queueing::QueueLedger;

    /// Provides read-only access to the park layout.
    #[must_use]
    pub fn grid(park: &Park) -> &Grid {
        &park.grid
    }

    /// Kind of the cell at the provided coordinate, if it lies inside the park.
    #[must_use]
    pub fn cell_kind(park: &Park, cell: CellCoord) -> Option<CellKind> {
        park.grid.kind(cell)
    }

    /// Attraction owning the queue or attraction cell at the coordinate.
    #[must_use]
    pub fn cell_owner(park: &Park, cell: CellCoord) -> Option<AttractionId> {
        park.grid.owner(cell)
    }

    /// Every registered attraction, sorted by identifier.
    #[must_use]
    pub fn attractions(park: &Park) -> &[Attraction] {
        &park.attractions
    }

    /// Looks up a single attraction.
    #[must_use]
    pub fn attraction(park: &Park, id: AttractionId) -> Option<&Attraction> {
        find_attraction(&park.attractions, id)
    }

    /// Every visitor currently in the park, in spawn order.
    #[must_use]
    pub fn visitors(park: &Park) -> &[Visitor] {
        &park.visitors
    }

    /// Looks up a single visitor.
    #[must_use]
    pub fn visitor(park: &Park, id: VisitorId) -> Option<&Visitor> {
        park.visitors.iter().find(|visitor| visitor.id == id)
    }

    /// Queue slots of an attraction, from the queue entrance to the boarding point.
    #[must_use]
    pub fn queue_cells(park: &Park, id: AttractionId) -> &[CellCoord] {
        park.queues
            .line(id)
            .map(|line| line.slots())
            .unwrap_or(&[])
    }

    /// Visitors standing on each queue slot of an attraction, entrance first.
    #[must_use]
    pub fn slot_occupancy(park: &Park, id: AttractionId) -> Vec<u32> {
        let ledger = QueueLedger::from_visitors(&park.queues, &park.visitors);
        (0..park.queues.slot_count(id))
            .map(|slot| ledger.occupancy(&park.queues, id, slot))
            .collect()
    }

    /// Number of visitors currently waiting in an attraction's queue.
    #[must_use]
    pub fn queue_length(park: &Park, id: AttractionId) -> usize {
        park.visitors
            .iter()
            .filter(|visitor| visitor.state == VisitorState::InQueue && visitor.target == Some(id))
            .count()
    }

    /// Entrance cells in raster order.
    #[must_use]
    pub fn entrances(park: &Park) -> &[CellCoord] {
        &park.entrances
    }

    /// Number of ticks processed since the layout was installed.
    #[must_use]
    pub fn tick_index(park: &Park) -> u64 {
        park.tick_index
    }

    /// Parameters that drive visitor behaviour.
    #[must_use]
    pub fn simulation_config(park: &Park) -> &SimulationConfig {
        &park.simulation
    }

    /// Parameters the current layout was generated with.
    #[must_use]
    pub fn generation_config(park: &Park) -> &GenerationConfig {
        &park.generation
    }

    /// Wall-clock interval between two ticks at the configured cadence.
    #[must_use]
    pub fn tick_interval(park: &Park) -> Duration {
        park.simulation.tick_interval()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use theme_park_core::{AdmissionPolicy, AttractionId, VisitorState};

    const CORRIDOR: &str = "XXXXXXXXXX\nXE...###AX\nXXXXXXXXXX\n";

    fn loaded_park(map: &str) -> (Park, Vec<Event>) {
        let mut park = Park::new(7);
        let mut events = Vec::new();
        apply(
            &mut park,
            Command::LoadPark {
                grid: Grid::parse_ascii(map).expect("valid map"),
            },
            &mut events,
        );
        (park, events)
    }

    #[test]
    fn generate_park_reports_placed_attractions() {
        let mut park = Park::new(1);
        let mut events = Vec::new();
        let config = GenerationConfig {
            width: 40,
            height: 30,
            internal_node_count: 30,
            attraction_count: 6,
            seed: Some(11),
            ..GenerationConfig::default()
        };

        apply(&mut park, Command::GeneratePark { config }, &mut events);

        let placed = query::attractions(&park).len() as u32;
        assert_eq!(
            events,
            vec![Event::ParkGenerated {
                requested: 6,
                placed
            }]
        );
        assert_eq!(query::grid(&park).width(), 40);
        for attraction in query::attractions(&park) {
            assert_eq!(
                query::cell_owner(&park, attraction.cell),
                Some(attraction.id)
            );
            assert!(!query::queue_cells(&park, attraction.id).is_empty());
        }
    }

    #[test]
    fn invalid_generation_config_leaves_park_untouched() {
        let (mut park, _) = loaded_park(CORRIDOR);
        let before = query::grid(&park).clone();
        let mut events = Vec::new();
        let config = GenerationConfig {
            width: 4,
            ..GenerationConfig::default()
        };

        apply(&mut park, Command::GeneratePark { config }, &mut events);

        assert!(matches!(
            events.as_slice(),
            [Event::ConfigurationRejected {
                reason: ConfigError::GridTooSmall { .. }
            }]
        ));
        assert_eq!(query::grid(&park), &before);
        assert_eq!(query::attractions(&park).len(), 1);
    }

    #[test]
    fn load_park_registers_hand_written_queues() {
        let (park, events) = loaded_park(CORRIDOR);
        assert_eq!(events, vec![Event::ParkLoaded { attractions: 1 }]);

        let id = AttractionId::new(0);
        assert_eq!(
            query::queue_cells(&park, id),
            &[
                CellCoord::new(5, 1),
                CellCoord::new(6, 1),
                CellCoord::new(7, 1)
            ]
        );
        assert_eq!(query::entrances(&park), &[CellCoord::new(1, 1)]);
    }

    #[test]
    fn invalid_simulation_config_is_rejected() {
        let (mut park, _) = loaded_park(CORRIDOR);
        let mut events = Vec::new();
        let config = SimulationConfig {
            departure_threshold_min: 95.0,
            ..SimulationConfig::default()
        };

        apply(&mut park, Command::ConfigureSimulation { config }, &mut events);

        assert_eq!(
            events,
            vec![Event::ConfigurationRejected {
                reason: ConfigError::InvalidThresholds
            }]
        );
        assert_eq!(query::simulation_config(&park), &SimulationConfig::default());
    }

    #[test]
    fn lowering_queue_capacity_reseats_waiting_visitors() {
        let (mut park, _) = loaded_park(CORRIDOR);
        let mut events = Vec::new();
        let crowded = SimulationConfig {
            spawn_probability: 0.0,
            satisfaction_enabled: false,
            visitors_per_queue_cell: 3,
            admission: AdmissionPolicy::BoardingDelay { ticks: 1_000 },
            ..SimulationConfig::default()
        };
        apply(
            &mut park,
            Command::ConfigureSimulation {
                config: crowded.clone(),
            },
            &mut events,
        );
        for _ in 0..9 {
            apply(
                &mut park,
                Command::SpawnVisitor {
                    cell: CellCoord::new(4, 1),
                },
                &mut events,
            );
        }
        for _ in 0..20 {
            apply(&mut park, Command::Tick, &mut events);
        }
        let id = AttractionId::new(0);
        assert_eq!(query::slot_occupancy(&park, id), vec![3, 3, 3]);

        events.clear();
        apply(
            &mut park,
            Command::ConfigureSimulation {
                config: SimulationConfig {
                    visitors_per_queue_cell: 1,
                    ..crowded
                },
            },
            &mut events,
        );

        assert_eq!(events, vec![Event::SimulationConfigured]);
        assert_eq!(query::slot_occupancy(&park, id), vec![1, 1, 1]);
        assert_eq!(query::queue_length(&park, id), 3);
        assert_eq!(query::attraction(&park, id).map(|a| a.queuers), Some(3));
        let returned = query::visitors(&park)
            .iter()
            .filter(|visitor| visitor.state == VisitorState::Moving && visitor.target.is_none())
            .count();
        assert_eq!(returned, 6);

        apply(&mut park, Command::Tick, &mut events);
        for slot in query::slot_occupancy(&park, id) {
            assert!(slot <= 1, "slot holds {slot} visitors");
        }
    }

    #[test]
    fn spawn_visitor_requires_a_walkable_cell() {
        let (mut park, _) = loaded_park(CORRIDOR);
        let mut events = Vec::new();

        apply(
            &mut park,
            Command::SpawnVisitor {
                cell: CellCoord::new(0, 0),
            },
            &mut events,
        );
        assert!(events.is_empty());

        apply(
            &mut park,
            Command::SpawnVisitor {
                cell: CellCoord::new(2, 1),
            },
            &mut events,
        );
        assert_eq!(
            events.first(),
            Some(&Event::VisitorSpawned {
                visitor: VisitorId::new(0),
                cell: CellCoord::new(2, 1),
            })
        );
        assert_eq!(query::visitors(&park).len(), 1);
    }

    #[test]
    fn ticks_advance_the_clock_and_move_visitors() {
        let (mut park, _) = loaded_park(CORRIDOR);
        let mut events = Vec::new();
        apply(
            &mut park,
            Command::ConfigureSimulation {
                config: SimulationConfig {
                    spawn_probability: 0.0,
                    satisfaction_enabled: false,
                    ..SimulationConfig::default()
                },
            },
            &mut events,
        );
        apply(
            &mut park,
            Command::SpawnVisitor {
                cell: CellCoord::new(1, 1),
            },
            &mut events,
        );

        events.clear();
        for _ in 0..5 {
            apply(&mut park, Command::Tick, &mut events);
        }

        assert_eq!(query::tick_index(&park), 5);
        assert_eq!(events.first(), Some(&Event::TimeAdvanced { tick: 1 }));
        let visitor = query::visitor(&park, VisitorId::new(0)).expect("visitor present");
        assert_eq!(visitor.state, VisitorState::InQueue);
        assert_eq!(query::queue_length(&park, AttractionId::new(0)), 1);
        assert_eq!(
            query::attraction(&park, AttractionId::new(0)).map(|a| a.queuers),
            Some(1)
        );
    }
}
