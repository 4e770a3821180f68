//! Stall recovery policy.
//!
//! A moving visitor that ends a tick without a usable path accumulates
//! `stalled_ticks`. Recovery escalates with that counter:
//!
//! 1. unvisited attractions are preferred;
//! 2. once everything was visited, anything but the last ride may be
//!    revisited and the history is trimmed past `revisit_history_bound`;
//! 3. after `force_pick_after` stalled ticks any attraction may be picked
//!    and the history is cleared;
//! 4. after `teleport_after` stalled ticks the visitor is moved to an
//!    entrance, keeping its target.

use theme_park_core::{Attraction, AttractionId, StallEscalation, Visitor};

/// Attractions a visitor without a target may choose from.
///
/// Only attractions accepted by `is_open` are considered. The visitor's
/// history is trimmed or cleared as the escalation requires.
pub fn candidate_pool<F>(
    attractions: &[Attraction],
    visitor: &mut Visitor,
    policy: &StallEscalation,
    mut is_open: F,
) -> Vec<AttractionId>
where
    F: FnMut(AttractionId) -> bool,
{
    let open: Vec<AttractionId> = attractions
        .iter()
        .map(|attraction| attraction.id)
        .filter(|id| is_open(*id))
        .collect();

    let unvisited: Vec<AttractionId> = open
        .iter()
        .copied()
        .filter(|id| !visitor.history.contains(id))
        .collect();
    if !unvisited.is_empty() {
        return unvisited;
    }

    let last = visitor.history.last().copied();
    let revisits: Vec<AttractionId> = open
        .iter()
        .copied()
        .filter(|id| Some(*id) != last)
        .collect();
    if visitor.history.len() > policy.revisit_history_bound {
        let excess = visitor.history.len().saturating_sub(policy.revisit_keep);
        let _ = visitor.history.drain(..excess);
    }
    if !revisits.is_empty() {
        return revisits;
    }

    if visitor.stalled_ticks > policy.force_pick_after {
        visitor.history.clear();
        return open;
    }

    Vec::new()
}

/// Reports whether a stalled visitor should be teleported to an entrance.
#[must_use]
pub fn should_teleport(visitor: &Visitor, policy: &StallEscalation) -> bool {
    visitor.stalled_ticks > policy.teleport_after
}
