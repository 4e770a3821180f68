//! Random visitor attributes.

use rand::Rng;
use theme_park_core::{Genre, SimulationConfig, SpeedRange, VisitorProfile};

/// Youngest visitor age (inclusive).
pub const MIN_AGE: u8 = 10;
/// Oldest visitor age (exclusive).
pub const MAX_AGE: u8 = 60;

/// Rolls the demographics of a new visitor.
pub fn roll_profile<R>(config: &SimulationConfig, rng: &mut R) -> VisitorProfile
where
    R: Rng + ?Sized,
{
    let is_family = rng.gen_bool(f64::from(config.family_probability));
    let speed_range = if is_family {
        config.family_speed
    } else {
        config.solo_speed
    };

    VisitorProfile {
        age: rng.gen_range(MIN_AGE..MAX_AGE),
        is_family,
        preferred_genre: Genre::ALL[rng.gen_range(0..Genre::ALL.len())],
        speed: roll_speed(speed_range, rng),
    }
}

fn roll_speed<R>(range: SpeedRange, rng: &mut R) -> f32
where
    R: Rng + ?Sized,
{
    if range.max > range.min {
        rng.gen_range(range.min..range.max)
    } else {
        range.min
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn profiles_respect_configured_ranges() {
        let config = SimulationConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(23);
        for _ in 0..500 {
            let profile = roll_profile(&config, &mut rng);
            assert!((MIN_AGE..MAX_AGE).contains(&profile.age));
            if profile.is_family {
                assert!((1.0..2.0).contains(&profile.speed));
            } else {
                assert!((2.0..4.0).contains(&profile.speed));
            }
        }
    }

    #[test]
    fn degenerate_speed_range_is_fixed() {
        let config = SimulationConfig {
            family_probability: 0.0,
            solo_speed: SpeedRange::new(3.0, 3.0),
            ..SimulationConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let profile = roll_profile(&config, &mut rng);
        assert!(!profile.is_family);
        assert!((profile.speed - 3.0).abs() < f32::EPSILON);
    }
}
