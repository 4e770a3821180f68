//! Weighted attraction selection.

use std::collections::BTreeMap;

use rand::Rng;
use theme_park_core::{find_attraction, Attraction, AttractionId, Visitor, VisitorState};

/// Selection weights of the best five candidates, best first.
pub const PICK_WEIGHTS: [f64; 5] = [0.30, 0.25, 0.20, 0.15, 0.10];

/// Number of visitors currently heading for each attraction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TargetLoad {
    counts: BTreeMap<AttractionId, u32>,
}

impl TargetLoad {
    /// Counts moving visitors by target.
    #[must_use]
    pub fn from_visitors(visitors: &[Visitor]) -> Self {
        let mut load = Self::default();
        for visitor in visitors {
            if visitor.state == VisitorState::Moving {
                if let Some(target) = visitor.target {
                    load.add(target);
                }
            }
        }
        load
    }

    /// Visitors heading for the attraction.
    #[must_use]
    pub fn get(&self, attraction: AttractionId) -> u32 {
        self.counts.get(&attraction).copied().unwrap_or(0)
    }

    /// Records one more visitor heading for the attraction.
    pub fn add(&mut self, attraction: AttractionId) {
        *self.counts.entry(attraction).or_insert(0) += 1;
    }

    /// Records that a visitor stopped heading for the attraction.
    pub fn remove(&mut self, attraction: AttractionId) {
        if let Some(count) = self.counts.get_mut(&attraction) {
            *count = count.saturating_sub(1);
        }
    }
}

/// Scores an attraction for a visitor; higher is better.
///
/// Lightly targeted and nearby attractions score higher, and a genre match
/// doubles the result.
#[must_use]
pub fn score(attraction: &Attraction, visitor: &Visitor, targeting: u32) -> f64 {
    let load_score = (1.0 / (f64::from(targeting) + 1.0)).max(0.1);
    let distance = f64::from(attraction.cell.manhattan_distance(visitor.cell));
    let distance_score = (100.0 / (distance + 1.0)).max(0.1);
    let preference = if attraction.has_tag(visitor.preferred_genre) {
        2.0
    } else {
        1.0
    };
    (load_score * 3.0 + distance_score) * preference
}

/// Ranks candidates by decreasing score, ties broken by identifier.
#[must_use]
pub fn rank(
    attractions: &[Attraction],
    candidates: &[AttractionId],
    visitor: &Visitor,
    load: &TargetLoad,
) -> Vec<(AttractionId, f64)> {
    let mut ranked: Vec<(AttractionId, f64)> = candidates
        .iter()
        .filter_map(|id| find_attraction(attractions, *id))
        .map(|attraction| (attraction.id, score(attraction, visitor, load.get(attraction.id))))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked
}

/// Draws one of the five best candidates using [`PICK_WEIGHTS`].
///
/// When the draw runs past the available weights the best candidate wins.
pub fn pick<R>(ranked: &[(AttractionId, f64)], rng: &mut R) -> Option<AttractionId>
where
    R: Rng + ?Sized,
{
    let best = ranked.first()?.0;
    let mut draw: f64 = rng.gen();
    for ((id, _), weight) in ranked.iter().zip(PICK_WEIGHTS) {
        if draw < weight {
            return Some(*id);
        }
        draw -= weight;
    }
    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use theme_park_core::{CellCoord, Genre, VisitorId, VisitorProfile};

    fn attraction(id: u32, cell: CellCoord, genre: Genre) -> Attraction {
        Attraction {
            id: AttractionId::new(id),
            cell,
            ride_duration: 10,
            tags: vec![genre],
            capacity: 1,
            popularity: 1.0,
            riders: 0,
            queuers: 0,
            occupancy_rate: 0.0,
            average_remaining_ride: 0.0,
        }
    }

    fn visitor() -> Visitor {
        let profile = VisitorProfile {
            age: 25,
            is_family: false,
            preferred_genre: Genre::Horror,
            speed: 3.0,
        };
        Visitor::new(VisitorId::new(7), CellCoord::new(0, 0), profile, 50.0)
    }

    #[test]
    fn score_follows_load_distance_and_preference() {
        let subject = visitor();
        let near = attraction(0, CellCoord::new(4, 0), Genre::Horror);
        // (1 * 3 + 100 / 5) * 2
        assert!((score(&near, &subject, 0) - 46.0).abs() < 1e-9);
        // (0.5 * 3 + 20) * 2
        assert!((score(&near, &subject, 1) - 43.0).abs() < 1e-9);
        let plain = attraction(1, CellCoord::new(4, 0), Genre::Show);
        assert!((score(&plain, &subject, 0) - 23.0).abs() < 1e-9);
    }

    #[test]
    fn ranking_prefers_close_matching_attractions() {
        let subject = visitor();
        let attractions = vec![
            attraction(0, CellCoord::new(40, 0), Genre::Horror),
            attraction(1, CellCoord::new(3, 0), Genre::Show),
            attraction(2, CellCoord::new(3, 0), Genre::Horror),
        ];
        let candidates: Vec<AttractionId> = attractions.iter().map(|a| a.id).collect();
        let ranked = rank(&attractions, &candidates, &subject, &TargetLoad::default());
        let order: Vec<u32> = ranked.iter().map(|(id, _)| id.get()).collect();
        assert_eq!(order, vec![2, 1, 0]);
    }

    #[test]
    fn load_tracks_moving_visitors_only() {
        let mut heading = visitor();
        heading.target = Some(AttractionId::new(1));
        let mut queuing = visitor();
        queuing.target = Some(AttractionId::new(1));
        queuing.state = VisitorState::InQueue;
        let mut load = TargetLoad::from_visitors(&[heading, queuing]);
        assert_eq!(load.get(AttractionId::new(1)), 1);
        load.remove(AttractionId::new(1));
        load.remove(AttractionId::new(1));
        assert_eq!(load.get(AttractionId::new(1)), 0);
    }

    #[test]
    fn pick_only_returns_top_five() {
        let ranked: Vec<(AttractionId, f64)> = (0..8)
            .map(|id| (AttractionId::new(id), f64::from(10 - id)))
            .collect();
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        for _ in 0..200 {
            let picked = pick(&ranked, &mut rng).expect("non-empty");
            assert!(picked.get() < 5);
        }
        assert_eq!(pick(&[], &mut rng), None);
    }
}
