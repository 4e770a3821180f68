#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Park statistics derived from events and visitor snapshots.
//!
//! The system never touches park state. Adapters feed it the events of
//! every applied command together with the visitor list, and it keeps
//! running totals plus one [`StatsSample`] per observed tick.

mod metrics;

use theme_park_core::{Event, SimulationConfig, Visitor};

pub use metrics::{average_satisfaction, count_visitors, VisitorCounts};

/// Park-wide statistics at one point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ParkStats {
    /// Visitors that entered since the layout was installed.
    pub entered: u64,
    /// Visitors that left since the layout was installed.
    pub exited: u64,
    /// Visitors present grouped by activity.
    pub counts: VisitorCounts,
    /// Mean satisfaction of the visitors present; zero for an empty park.
    pub average_satisfaction: f32,
}

/// Statistics recorded at the end of one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatsSample {
    /// Tick the sample belongs to.
    pub tick: u64,
    /// Statistics after the tick completed.
    pub stats: ParkStats,
    /// Lower departure threshold in effect.
    pub departure_threshold_min: f32,
    /// Upper departure threshold in effect.
    pub departure_threshold_max: f32,
}

/// Accumulates park statistics and a per-tick history.
#[derive(Debug, Default)]
pub struct Analytics {
    entered: u64,
    exited: u64,
    history: Vec<StatsSample>,
    history_limit: Option<usize>,
}

impl Analytics {
    /// Creates an analytics system with an unbounded history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an analytics system keeping only the most recent `limit` samples.
    #[must_use]
    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            history_limit: Some(limit.max(1)),
            ..Self::default()
        }
    }

    /// Consumes the events of one applied command.
    ///
    /// A new layout resets every total and the history. When the events
    /// contain a tick, a sample is recorded from the visitor snapshot taken
    /// after the command completed and returned.
    pub fn handle(
        &mut self,
        events: &[Event],
        visitors: &[Visitor],
        config: &SimulationConfig,
    ) -> Option<&StatsSample> {
        let mut tick = None;
        for event in events {
            match event {
                Event::ParkGenerated { .. } | Event::ParkLoaded { .. } => self.reset(),
                Event::VisitorSpawned { .. } => self.entered += 1,
                Event::VisitorExited { .. } => self.exited += 1,
                Event::TimeAdvanced { tick: index } => tick = Some(*index),
                _ => {}
            }
        }

        let tick = tick?;
        let sample = StatsSample {
            tick,
            stats: self.stats(visitors),
            departure_threshold_min: config.departure_threshold_min,
            departure_threshold_max: config.departure_threshold_max,
        };
        if let Some(limit) = self.history_limit {
            if self.history.len() >= limit {
                let excess = self.history.len() + 1 - limit;
                let _ = self.history.drain(..excess);
            }
        }
        self.history.push(sample);
        self.history.last()
    }

    /// Current statistics for the provided visitor snapshot.
    #[must_use]
    pub fn stats(&self, visitors: &[Visitor]) -> ParkStats {
        ParkStats {
            entered: self.entered,
            exited: self.exited,
            counts: count_visitors(visitors),
            average_satisfaction: average_satisfaction(visitors).unwrap_or(0.0),
        }
    }

    /// Recorded samples, oldest first.
    #[must_use]
    pub fn history(&self) -> &[StatsSample] {
        &self.history
    }

    /// Most recent sample, if any tick was observed.
    #[must_use]
    pub fn latest(&self) -> Option<&StatsSample> {
        self.history.last()
    }

    fn reset(&mut self) {
        self.entered = 0;
        self.exited = 0;
        self.history.clear();
    }
}
