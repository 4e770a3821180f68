//! Visitor satisfaction scoring.

use theme_park_core::{
    find_attraction, Attraction, SimulationConfig, Visitor, VisitorState, MAX_SATISFACTION,
};

/// Recomputes a visitor's satisfaction from its history and counters.
///
/// Starting from the initial value, waiting and time in transit toward a
/// pending target cost satisfaction, while every completed ride, the
/// popularity of every attraction in the visit history and family
/// membership add to it. Time spent in the current queue or ride costs an
/// extra amount. The result is clamped to `[0, 100]`.
#[must_use]
pub fn satisfaction(visitor: &Visitor, attractions: &[Attraction], config: &SimulationConfig) -> f32 {
    let mut score = config.initial_satisfaction;

    score -= visitor.total_wait as f32 * config.loss_per_wait_time;
    if visitor.target.is_some() && visitor.state == VisitorState::Moving {
        score -= visitor.time_in_transit as f32
            * config.loss_per_wait_time
            * config.transit_penalty_factor;
    }

    score += visitor.attractions_visited as f32 * config.gain_per_attraction;
    score += visitor
        .history
        .iter()
        .filter_map(|id| find_attraction(attractions, *id))
        .map(|attraction| attraction.popularity * 2.0)
        .sum::<f32>();

    if matches!(visitor.state, VisitorState::InQueue | VisitorState::Riding) {
        score -= visitor.current_wait as f32 * config.loss_per_current_wait;
    }
    if visitor.is_family {
        score += config.family_bonus;
    }

    score.clamp(0.0, MAX_SATISFACTION)
}
