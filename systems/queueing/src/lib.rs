#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Queue management for park attractions.
//!
//! [`QueueLayout`] is pure derived geometry: the ordered slots of every
//! attraction's queue. [`QueueLedger`] is rebuilt from the authoritative
//! visitor list at the start of every tick and tracks slot occupancy, riders
//! and the one-admission-per-tick cadence while the tick runs. No occupancy
//! survives between ticks, so the ledger can never drift from the visitors.

mod layout;

use theme_park_core::{
    AdmissionPolicy, Attraction, AttractionId, Visitor, VisitorId, VisitorState,
};

pub use layout::{QueueLayout, QueueLine};

/// Outcome of an admission check for one queuing visitor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// The visitor may board now.
    Board,
    /// The visitor heads the queue but must keep counting down.
    Countdown {
        /// Ticks left after this one.
        remaining: u32,
    },
    /// The visitor stays where it is this tick.
    Wait,
}

/// Tick-local bookkeeping of queue occupancy and riders.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueueLedger {
    occupancy: Vec<Vec<u32>>,
    riders: Vec<u32>,
    admitted: Vec<bool>,
}

impl QueueLedger {
    /// Recomputes occupancy and riders from the current visitor set.
    ///
    /// Visitors whose slot lies outside their attraction's queue are ignored.
    #[must_use]
    pub fn from_visitors(layout: &QueueLayout, visitors: &[Visitor]) -> Self {
        let mut ledger = Self {
            occupancy: layout
                .lines()
                .iter()
                .map(|line| vec![0; line.slots().len()])
                .collect(),
            riders: vec![0; layout.lines().len()],
            admitted: vec![false; layout.lines().len()],
        };

        for visitor in visitors {
            let Some(line) = visitor.target.and_then(|id| layout.line_index(id)) else {
                continue;
            };
            match visitor.state {
                VisitorState::InQueue => {
                    if let Some(count) = visitor
                        .queue_slot
                        .and_then(|slot| ledger.occupancy[line].get_mut(slot))
                    {
                        *count += 1;
                    }
                }
                VisitorState::Riding => ledger.riders[line] += 1,
                VisitorState::Moving | VisitorState::Leaving => {}
            }
        }

        ledger
    }

    /// Visitors currently standing on a slot.
    #[must_use]
    pub fn occupancy(&self, layout: &QueueLayout, attraction: AttractionId, slot: usize) -> u32 {
        layout
            .line_index(attraction)
            .and_then(|line| self.occupancy.get(line))
            .and_then(|slots| slots.get(slot))
            .copied()
            .unwrap_or(0)
    }

    /// Visitors queuing for the attraction.
    #[must_use]
    pub fn queuers(&self, layout: &QueueLayout, attraction: AttractionId) -> u32 {
        layout
            .line_index(attraction)
            .and_then(|line| self.occupancy.get(line))
            .map_or(0, |slots| slots.iter().sum())
    }

    /// Visitors riding the attraction.
    #[must_use]
    pub fn riders(&self, layout: &QueueLayout, attraction: AttractionId) -> u32 {
        layout
            .line_index(attraction)
            .and_then(|line| self.riders.get(line))
            .copied()
            .unwrap_or(0)
    }

    /// First slot, scanning from the queue entrance, with room left.
    #[must_use]
    pub fn next_available_slot(&self, layout: &QueueLayout, attraction: AttractionId) -> Option<usize> {
        let line = layout.line_index(attraction)?;
        self.occupancy
            .get(line)?
            .iter()
            .position(|count| *count < layout.per_cell_capacity())
    }

    /// Places the visitor on the first free slot of the attraction's queue.
    ///
    /// Returns the assigned slot, or `None` when the queue is full. On
    /// success the visitor targets the attraction, switches to
    /// [`VisitorState::InQueue`] and stands on the slot cell.
    pub fn enqueue(
        &mut self,
        layout: &QueueLayout,
        visitor: &mut Visitor,
        attraction: AttractionId,
    ) -> Option<usize> {
        let line = layout.line_index(attraction)?;
        let slot = self.next_available_slot(layout, attraction)?;
        let cell = layout.slot_cell(attraction, slot)?;

        self.occupancy[line][slot] += 1;
        visitor.target = Some(attraction);
        visitor.state = VisitorState::InQueue;
        visitor.queue_slot = Some(slot);
        visitor.cell = cell;
        visitor.path.clear();
        visitor.current_wait = 0;
        visitor.time_in_transit = 0;
        visitor.stalled_ticks = 0;
        visitor.boarding_remaining = None;
        Some(slot)
    }

    /// Moves a queuing visitor one slot toward the boarding point if it has room.
    pub fn advance(&mut self, layout: &QueueLayout, visitor: &mut Visitor) -> bool {
        let (Some(attraction), Some(slot)) = (visitor.target, visitor.queue_slot) else {
            return false;
        };
        let Some(line) = layout.line_index(attraction) else {
            return false;
        };
        let next = slot + 1;
        let Some(cell) = layout.slot_cell(attraction, next) else {
            return false;
        };
        if self.occupancy[line][next] >= layout.per_cell_capacity() {
            return false;
        }

        self.occupancy[line][slot] = self.occupancy[line][slot].saturating_sub(1);
        self.occupancy[line][next] += 1;
        visitor.queue_slot = Some(next);
        visitor.cell = cell;
        true
    }

    /// Decides whether the visitor at `index` may board this tick.
    ///
    /// At most one visitor boards each attraction per tick and riders never
    /// exceed capacity. Only the head of the queue, the occupant of the
    /// boarding slot with the longest current wait (ties to the lower id),
    /// boards in turn; [`AdmissionPolicy::MaxWaitOverride`] also lets an
    /// overdue visitor board from any slot.
    #[must_use]
    pub fn admission(
        &self,
        layout: &QueueLayout,
        attraction: &Attraction,
        policy: AdmissionPolicy,
        visitors: &[Visitor],
        index: usize,
    ) -> AdmissionDecision {
        let Some(visitor) = visitors.get(index) else {
            return AdmissionDecision::Wait;
        };
        let Some(line) = layout.line_index(attraction.id) else {
            return AdmissionDecision::Wait;
        };
        if visitor.state != VisitorState::InQueue || visitor.target != Some(attraction.id) {
            return AdmissionDecision::Wait;
        }

        let has_room = !self.admitted[line] && self.riders[line] < attraction.capacity;
        let is_head = is_head_of_queue(layout, attraction.id, visitors, visitor);

        match policy {
            AdmissionPolicy::Immediate if is_head && has_room => AdmissionDecision::Board,
            AdmissionPolicy::BoardingDelay { ticks } if is_head => {
                match visitor.boarding_remaining.unwrap_or(ticks) {
                    0 if has_room => AdmissionDecision::Board,
                    0 => AdmissionDecision::Wait,
                    remaining => AdmissionDecision::Countdown {
                        remaining: remaining - 1,
                    },
                }
            }
            AdmissionPolicy::MaxWaitOverride { max_wait }
                if has_room && (is_head || visitor.current_wait >= max_wait) =>
            {
                AdmissionDecision::Board
            }
            _ => AdmissionDecision::Wait,
        }
    }

    /// Moves an admitted visitor from the queue onto the ride.
    pub fn board(&mut self, layout: &QueueLayout, attraction: &Attraction, visitor: &mut Visitor) {
        let Some(line) = layout.line_index(attraction.id) else {
            return;
        };
        if let Some(count) = visitor
            .queue_slot
            .and_then(|slot| self.occupancy[line].get_mut(slot))
        {
            *count = count.saturating_sub(1);
        }
        self.riders[line] += 1;
        self.admitted[line] = true;

        visitor.state = VisitorState::Riding;
        visitor.queue_slot = None;
        visitor.cell = attraction.cell;
        visitor.current_wait = 0;
        visitor.boarding_remaining = None;
    }

    /// Records that a rider left the attraction.
    pub fn release_rider(&mut self, layout: &QueueLayout, attraction: AttractionId) {
        if let Some(riders) = layout
            .line_index(attraction)
            .and_then(|line| self.riders.get_mut(line))
        {
            *riders = riders.saturating_sub(1);
        }
    }

    /// Lets everyone behind a vacated slot step forward once.
    ///
    /// Visitors are advanced from the boarding point backward so the gap
    /// travels toward the queue entrance.
    pub fn repack(&mut self, layout: &QueueLayout, attraction: AttractionId, visitors: &mut [Visitor]) {
        let mut queued: Vec<usize> = visitors
            .iter()
            .enumerate()
            .filter(|(_, visitor)| {
                visitor.state == VisitorState::InQueue && visitor.target == Some(attraction)
            })
            .map(|(index, _)| index)
            .collect();
        queued.sort_by_key(|&index| {
            let visitor = &visitors[index];
            (
                std::cmp::Reverse(visitor.queue_slot),
                std::cmp::Reverse(visitor.current_wait),
                visitor.id,
            )
        });

        for index in queued {
            let _ = self.advance(layout, &mut visitors[index]);
        }
    }
}

/// Seats every queuing visitor on a slot of the current layout.
///
/// Each queue is refilled from the boarding point backward in queue order
/// (further ahead first, then longer current wait, then lower id) with at
/// most [`QueueLayout::per_cell_capacity`] visitors per slot. Visitors that
/// no longer fit return to [`VisitorState::Moving`] without a target; their
/// identifiers are returned in the order they were released.
pub fn reseat(layout: &QueueLayout, visitors: &mut [Visitor]) -> Vec<VisitorId> {
    let mut released = Vec::new();

    for line in layout.lines() {
        let attraction = line.attraction();
        let mut queued: Vec<usize> = visitors
            .iter()
            .enumerate()
            .filter(|(_, visitor)| {
                visitor.state == VisitorState::InQueue && visitor.target == Some(attraction)
            })
            .map(|(index, _)| index)
            .collect();
        queued.sort_by_key(|&index| {
            let visitor = &visitors[index];
            (
                std::cmp::Reverse(visitor.queue_slot),
                std::cmp::Reverse(visitor.current_wait),
                visitor.id,
            )
        });

        let capacity = layout.per_cell_capacity() as usize;
        let slots = line.slots();
        for (position, index) in queued.into_iter().enumerate() {
            let visitor = &mut visitors[index];
            let seat = slots
                .len()
                .checked_sub(1 + position / capacity)
                .and_then(|slot| slots.get(slot).map(|cell| (slot, *cell)));
            match seat {
                Some((slot, cell)) => {
                    if visitor.queue_slot != Some(slot) {
                        visitor.boarding_remaining = None;
                    }
                    visitor.queue_slot = Some(slot);
                    visitor.cell = cell;
                }
                None => {
                    visitor.state = VisitorState::Moving;
                    visitor.queue_slot = None;
                    visitor.boarding_remaining = None;
                    visitor.current_wait = 0;
                    visitor.clear_target();
                    released.push(visitor.id);
                }
            }
        }
    }

    released
}

fn is_head_of_queue(
    layout: &QueueLayout,
    attraction: AttractionId,
    visitors: &[Visitor],
    visitor: &Visitor,
) -> bool {
    let Some(boarding) = layout.boarding_slot(attraction) else {
        return false;
    };
    if visitor.queue_slot != Some(boarding) {
        return false;
    }

    let rank = |candidate: &Visitor| (std::cmp::Reverse(candidate.current_wait), candidate.id);
    visitors
        .iter()
        .filter(|other| {
            other.state == VisitorState::InQueue
                && other.target == Some(attraction)
                && other.queue_slot == Some(boarding)
        })
        .min_by_key(|other| rank(other))
        .is_some_and(|head| head.id == visitor.id)
}
