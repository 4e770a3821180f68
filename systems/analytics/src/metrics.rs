use theme_park_core::{Visitor, VisitorState};

/// Visitors present in the park grouped by activity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VisitorCounts {
    /// Visitors currently on a ride.
    pub riding: u32,
    /// Visitors waiting in a queue.
    pub in_queue: u32,
    /// Visitors walking, including those heading for an exit.
    pub moving: u32,
}

impl VisitorCounts {
    /// Total number of visitors present.
    #[must_use]
    pub const fn present(&self) -> u32 {
        self.riding + self.in_queue + self.moving
    }
}

/// Groups the visitors still in the park by activity.
///
/// Visitors already flagged for removal are not counted.
#[must_use]
pub fn count_visitors(visitors: &[Visitor]) -> VisitorCounts {
    let mut counts = VisitorCounts::default();
    for visitor in visitors.iter().filter(|visitor| !visitor.is_departed()) {
        match visitor.state {
            VisitorState::Riding => counts.riding += 1,
            VisitorState::InQueue => counts.in_queue += 1,
            VisitorState::Moving | VisitorState::Leaving => counts.moving += 1,
        }
    }
    counts
}

/// Mean satisfaction of the visitors present, or `None` when the park is empty.
#[must_use]
pub fn average_satisfaction(visitors: &[Visitor]) -> Option<f32> {
    let (sum, count) = visitors
        .iter()
        .filter(|visitor| !visitor.is_departed())
        .fold((0.0_f64, 0_u32), |(sum, count), visitor| {
            (sum + f64::from(visitor.satisfaction), count + 1)
        });
    if count == 0 {
        None
    } else {
        Some((sum / f64::from(count)) as f32)
    }
}
