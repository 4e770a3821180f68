#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Visitor behaviour for the theme park simulation.
//!
//! The system owns no visitors. Every tick the park hands it the visitor
//! list together with a read-only [`ParkView`]; the system spawns new
//! visitors, walks each one through its lifecycle state machine, emits the
//! resulting events and finally purges everyone who left the park.

mod demographics;
mod escalation;
mod satisfaction;
mod targeting;

use rand::{seq::SliceRandom, Rng};
use theme_park_core::{
    find_attraction, Attraction, AttractionId, CellCoord, CellKind, Event, Grid,
    SimulationConfig, SpawnPlacement, StallEscalation, Visitor, VisitorId, VisitorState,
};
use theme_park_system_pathfinding::{nearest_matching, PathFinder};
use theme_park_system_queueing::{AdmissionDecision, QueueLayout, QueueLedger};
use tracing::{debug, warn};

pub use demographics::{roll_profile, MAX_AGE, MIN_AGE};
pub use escalation::{candidate_pool, should_teleport};
pub use satisfaction::satisfaction;
pub use targeting::{pick, rank, score, TargetLoad, PICK_WEIGHTS};

/// Read-only snapshot of the park consumed by the visitor system.
#[derive(Clone, Copy, Debug)]
pub struct ParkView<'a> {
    /// Park layout.
    pub grid: &'a Grid,
    /// Attractions sorted by identifier.
    pub attractions: &'a [Attraction],
    /// Queue geometry derived from the grid.
    pub queues: &'a QueueLayout,
    /// Entrance cells in raster order.
    pub entrances: &'a [CellCoord],
    /// Road cells in raster order.
    pub roads: &'a [CellCoord],
}

/// Drives visitor spawning and the per-tick visitor state machine.
#[derive(Debug, Default)]
pub struct VisitorSimulation {
    path_finder: PathFinder,
}

impl VisitorSimulation {
    /// Creates a new visitor system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rolls the spawn chance and admits one visitor when it succeeds.
    ///
    /// Returns the identifier of the new visitor, or `None` when nobody
    /// arrived this tick or the park has no cell to spawn on.
    pub fn spawn<R>(
        &mut self,
        view: &ParkView<'_>,
        config: &SimulationConfig,
        id: VisitorId,
        rng: &mut R,
        visitors: &mut Vec<Visitor>,
        out: &mut Vec<Event>,
    ) -> Option<VisitorId>
    where
        R: Rng + ?Sized,
    {
        if !rng.gen_bool(f64::from(config.spawn_probability)) {
            return None;
        }

        let cell = match config.spawn_placement {
            SpawnPlacement::Entrance => view.entrances.choose(rng),
            SpawnPlacement::RandomRoad => view
                .roads
                .choose(rng)
                .or_else(|| view.entrances.choose(rng)),
        }
        .copied()?;

        Some(self.spawn_at(view, config, cell, id, rng, visitors, out))
    }

    /// Admits a visitor on the provided cell with freshly rolled demographics.
    ///
    /// The visitor immediately picks a first target when one is available.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn_at<R>(
        &mut self,
        view: &ParkView<'_>,
        config: &SimulationConfig,
        cell: CellCoord,
        id: VisitorId,
        rng: &mut R,
        visitors: &mut Vec<Visitor>,
        out: &mut Vec<Event>,
    ) -> VisitorId
    where
        R: Rng + ?Sized,
    {
        let profile = roll_profile(config, rng);
        let mut visitor = Visitor::new(id, cell, profile, config.initial_satisfaction);
        out.push(Event::VisitorSpawned { visitor: id, cell });
        debug!(visitor = id.get(), column = cell.column(), row = cell.row(), "visitor spawned");

        let load = TargetLoad::from_visitors(visitors);
        if let Some(target) = choose_target(view, &config.escalation, &load, &mut visitor, rng) {
            visitor.target = Some(target);
            out.push(Event::TargetSelected {
                visitor: id,
                attraction: target,
            });
        }

        visitors.push(visitor);
        id
    }

    /// Advances every visitor by one tick and purges departed visitors.
    ///
    /// Visitors are processed in list order. Queue occupancy and target load
    /// are rebuilt from the list before the first visitor moves and are kept
    /// current while the tick runs.
    pub fn advance<R>(
        &mut self,
        view: &ParkView<'_>,
        config: &SimulationConfig,
        rng: &mut R,
        visitors: &mut Vec<Visitor>,
        out: &mut Vec<Event>,
    ) where
        R: Rng + ?Sized,
    {
        let mut ledger = QueueLedger::from_visitors(view.queues, visitors);
        let mut load = TargetLoad::from_visitors(visitors);

        for index in 0..visitors.len() {
            match visitors[index].state {
                VisitorState::Moving => self.step_moving(
                    view,
                    config,
                    rng,
                    &mut ledger,
                    &mut load,
                    &mut visitors[index],
                    out,
                ),
                VisitorState::InQueue => step_queuing(view, config, &mut ledger, visitors, index, out),
                VisitorState::Riding => {
                    step_riding(view, config, &mut ledger, &mut visitors[index], out);
                }
                VisitorState::Leaving => self.step_leaving(view, config, &mut visitors[index]),
            }

            let visitor = &mut visitors[index];
            if !visitor.is_departed() {
                visitor.satisfaction = if config.satisfaction_enabled {
                    satisfaction(visitor, view.attractions, config)
                } else {
                    config.initial_satisfaction
                };
            }
        }

        if config.satisfaction_enabled {
            for visitor in visitors.iter_mut() {
                if visitor.state == VisitorState::Moving
                    && !visitor.is_departed()
                    && config.crosses_departure_threshold(visitor.satisfaction)
                {
                    start_leaving(visitor, out);
                }
            }
        }

        visitors.retain(|visitor| {
            if visitor.is_departed() {
                debug!(visitor = visitor.id.get(), "visitor exited");
                out.push(Event::VisitorExited {
                    visitor: visitor.id,
                });
                false
            } else {
                true
            }
        });
    }

    #[allow(clippy::too_many_arguments)]
    fn step_moving<R>(
        &mut self,
        view: &ParkView<'_>,
        config: &SimulationConfig,
        rng: &mut R,
        ledger: &mut QueueLedger,
        load: &mut TargetLoad,
        visitor: &mut Visitor,
        out: &mut Vec<Event>,
    ) where
        R: Rng + ?Sized,
    {
        let policy = &config.escalation;

        if visitor.target.is_some() {
            visitor.time_in_transit += 1;
            visitor.total_wait += 1;
            if visitor.path.is_empty() {
                let _ = self.request_path(view, ledger, visitor);
            }
        } else if let Some(target) = choose_target(view, policy, load, visitor, rng) {
            visitor.target = Some(target);
            visitor.time_in_transit = 0;
            load.add(target);
            out.push(Event::TargetSelected {
                visitor: visitor.id,
                attraction: target,
            });
            debug!(visitor = visitor.id.get(), attraction = target.get(), "target selected");

            if !self.request_path(view, ledger, visitor) {
                load.remove(target);
                visitor.clear_target();
            }
        }

        if has_route(view, visitor) {
            visitor.stalled_ticks = 0;
        } else {
            visitor.stalled_ticks += 1;
            if should_teleport(visitor, policy) {
                if let Some(&cell) = view.entrances.choose(rng) {
                    teleport(visitor, cell, out);
                }
            }
        }

        walk(visitor);

        let Some(target) = visitor.target else {
            return;
        };
        if !visitor.path.is_empty() || !stands_in_queue_of(view, visitor.cell, target) {
            return;
        }

        load.remove(target);
        match ledger.enqueue(view.queues, visitor, target) {
            Some(slot) => {
                out.push(Event::VisitorEnqueued {
                    visitor: visitor.id,
                    attraction: target,
                    slot,
                });
                debug!(visitor = visitor.id.get(), attraction = target.get(), slot, "visitor enqueued");
            }
            None => {
                debug!(visitor = visitor.id.get(), attraction = target.get(), "queue full");
                visitor.clear_target();
            }
        }
    }

    fn step_leaving(&mut self, view: &ParkView<'_>, config: &SimulationConfig, visitor: &mut Visitor) {
        if visitor.path.is_empty() {
            if view.grid.is_kind(visitor.cell, CellKind::Entrance) {
                visitor.mark_departed();
                return;
            }

            match self.exit_path(view, visitor.cell) {
                Some(path) => {
                    visitor.path = path.into();
                    visitor.stalled_ticks = 0;
                }
                None => {
                    visitor.stalled_ticks += 1;
                    if should_teleport(visitor, &config.escalation) {
                        let nearest = view
                            .entrances
                            .iter()
                            .copied()
                            .min_by_key(|entrance| (entrance.manhattan_distance(visitor.cell), *entrance));
                        if let Some(entrance) = nearest {
                            warn!(visitor = visitor.id.get(), "leaving visitor stuck, moved to exit");
                            visitor.cell = entrance;
                            visitor.mark_departed();
                        }
                        return;
                    }
                }
            }
        }

        walk(visitor);
        if visitor.path.is_empty() && view.grid.is_kind(visitor.cell, CellKind::Entrance) {
            visitor.mark_departed();
        }
    }

    /// Plans a route to the first free slot of the visitor's target queue.
    ///
    /// Falls back to the queue entrance when every slot is taken. Returns
    /// whether the visitor now has a route or already stands in the queue.
    fn request_path(&mut self, view: &ParkView<'_>, ledger: &QueueLedger, visitor: &mut Visitor) -> bool {
        let Some(target) = visitor.target else {
            return false;
        };
        if stands_in_queue_of(view, visitor.cell, target) {
            visitor.path.clear();
            return true;
        }

        let goal = ledger
            .next_available_slot(view.queues, target)
            .and_then(|slot| view.queues.slot_cell(target, slot))
            .or_else(|| view.queues.entrance_cell(target));
        let Some(goal) = goal else {
            return false;
        };

        let path = self.path_finder.find_path(view.grid, visitor.cell, goal);
        if path.is_empty() {
            return false;
        }
        visitor.path = path.into();
        true
    }

    /// Shortest route to an entrance, trying entrances nearest first.
    fn exit_path(&mut self, view: &ParkView<'_>, from: CellCoord) -> Option<Vec<CellCoord>> {
        let mut entrances = view.entrances.to_vec();
        entrances.sort_by_key(|entrance| (entrance.manhattan_distance(from), *entrance));
        entrances
            .into_iter()
            .map(|entrance| self.path_finder.find_path(view.grid, from, entrance))
            .find(|path| !path.is_empty())
    }
}

fn step_queuing(
    view: &ParkView<'_>,
    config: &SimulationConfig,
    ledger: &mut QueueLedger,
    visitors: &mut [Visitor],
    index: usize,
    out: &mut Vec<Event>,
) {
    let visitor = &mut visitors[index];
    visitor.current_wait += 1;
    visitor.total_wait += 1;

    let attraction = visitor
        .target
        .and_then(|target| find_attraction(view.attractions, target))
        .filter(|attraction| view.queues.line(attraction.id).is_some());
    let Some(attraction) = attraction else {
        warn!(visitor = visitor.id.get(), "queue vanished, visitor released");
        visitor.state = VisitorState::Moving;
        visitor.queue_slot = None;
        visitor.boarding_remaining = None;
        visitor.clear_target();
        return;
    };

    let _ = ledger.advance(view.queues, visitor);
    match ledger.admission(view.queues, attraction, config.admission, visitors, index) {
        AdmissionDecision::Board => {
            let visitor = &mut visitors[index];
            ledger.board(view.queues, attraction, visitor);
            out.push(Event::VisitorBoarded {
                visitor: visitor.id,
                attraction: attraction.id,
            });
            debug!(visitor = visitor.id.get(), attraction = attraction.id.get(), "visitor boarded");
            ledger.repack(view.queues, attraction.id, visitors);
        }
        AdmissionDecision::Countdown { remaining } => {
            visitors[index].boarding_remaining = Some(remaining);
        }
        AdmissionDecision::Wait => {}
    }
}

fn step_riding(
    view: &ParkView<'_>,
    config: &SimulationConfig,
    ledger: &mut QueueLedger,
    visitor: &mut Visitor,
    out: &mut Vec<Event>,
) {
    visitor.current_wait += 1;
    visitor.total_wait += 1;

    let Some(attraction) = visitor
        .target
        .and_then(|target| find_attraction(view.attractions, target))
    else {
        visitor.state = VisitorState::Moving;
        visitor.current_wait = 0;
        visitor.clear_target();
        return;
    };
    if visitor.current_wait < attraction.ride_duration {
        return;
    }

    visitor.history.push(attraction.id);
    visitor.attractions_visited += 1;
    ledger.release_rider(view.queues, attraction.id);
    out.push(Event::RideCompleted {
        visitor: visitor.id,
        attraction: attraction.id,
    });
    debug!(visitor = visitor.id.get(), attraction = attraction.id.get(), "ride completed");

    visitor.clear_target();
    visitor.current_wait = 0;
    visitor.state = VisitorState::Moving;
    if config.satisfaction_enabled {
        visitor.satisfaction = satisfaction(visitor, view.attractions, config);
        if config.crosses_departure_threshold(visitor.satisfaction) {
            start_leaving(visitor, out);
        }
    }

    let grid = view.grid;
    let exit = nearest_matching(grid, attraction.cell, config.escalation.reposition_radius, |cell| {
        matches!(grid.kind(cell), Some(CellKind::Road | CellKind::Entrance))
    });
    match exit {
        Some(cell) => visitor.cell = cell,
        None => warn!(
            visitor = visitor.id.get(),
            attraction = attraction.id.get(),
            "no road near attraction exit"
        ),
    }
}

fn choose_target<R>(
    view: &ParkView<'_>,
    policy: &StallEscalation,
    load: &TargetLoad,
    visitor: &mut Visitor,
    rng: &mut R,
) -> Option<AttractionId>
where
    R: Rng + ?Sized,
{
    let pool = candidate_pool(view.attractions, visitor, policy, |id| {
        view.queues.slot_count(id) > 0
    });
    let ranked = rank(view.attractions, &pool, visitor, load);
    pick(&ranked, rng)
}

fn start_leaving(visitor: &mut Visitor, out: &mut Vec<Event>) {
    visitor.state = VisitorState::Leaving;
    visitor.clear_target();
    visitor.stalled_ticks = 0;
    out.push(Event::VisitorLeaving {
        visitor: visitor.id,
    });
    debug!(visitor = visitor.id.get(), satisfaction = visitor.satisfaction, "visitor leaving");
}

fn teleport(visitor: &mut Visitor, cell: CellCoord, out: &mut Vec<Event>) {
    warn!(
        visitor = visitor.id.get(),
        stalled = visitor.stalled_ticks,
        column = cell.column(),
        row = cell.row(),
        "stalled visitor teleported"
    );
    visitor.cell = cell;
    visitor.path.clear();
    visitor.stalled_ticks = 0;
    out.push(Event::VisitorTeleported {
        visitor: visitor.id,
        cell,
    });
}

fn walk(visitor: &mut Visitor) {
    for _ in 0..visitor.steps_per_tick() {
        let Some(next) = visitor.path.pop_front() else {
            break;
        };
        visitor.cell = next;
    }
}

fn has_route(view: &ParkView<'_>, visitor: &Visitor) -> bool {
    match visitor.target {
        Some(target) => !visitor.path.is_empty() || stands_in_queue_of(view, visitor.cell, target),
        None => false,
    }
}

fn stands_in_queue_of(view: &ParkView<'_>, cell: CellCoord, attraction: AttractionId) -> bool {
    view.grid.is_kind(cell, CellKind::Queue) && view.grid.owner(cell) == Some(attraction)
}
