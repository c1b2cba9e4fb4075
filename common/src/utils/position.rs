use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Meters covered by one degree of latitude, close enough for short trips.
const METERS_PER_DEGREE: f64 = 111_320.0;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Equirectangular approximation, in meters.
    pub fn distance_to(&self, p: &Position) -> f64 {
        let mean_lat = ((self.latitude + p.latitude) / 2.0).to_radians();
        let dx = (p.longitude - self.longitude) * mean_lat.cos();
        let dy = p.latitude - self.latitude;

        (dx * dx + dy * dy).sqrt() * METERS_PER_DEGREE
    }

    /// Moves towards `p` by at most `max_step_m` meters. Returns true once `p` is reached.
    pub fn go_to(&mut self, p: &Position, max_step_m: f64) -> bool {
        let distance = self.distance_to(p);

        if distance <= max_step_m || distance == 0.0 {
            *self = *p;
            return true;
        }

        let fraction = max_step_m / distance;
        self.latitude += (p.latitude - self.latitude) * fraction;
        self.longitude += (p.longitude - self.longitude) * fraction;

        false
    }

    /// GPS jitter of up to `max_noise_m` meters on each axis.
    pub fn simulate(&mut self, max_noise_m: f64) {
        if max_noise_m <= 0.0 {
            return;
        }

        let mut rng = rand::thread_rng();
        let noise = max_noise_m / METERS_PER_DEGREE;

        self.latitude = (self.latitude + rng.gen_range(-noise..=noise)).clamp(-90.0, 90.0);
        self.longitude = (self.longitude + rng.gen_range(-noise..=noise)).clamp(-180.0, 180.0);
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn go_to_reaches_destination_in_bounded_steps() {
        let mut current = Position::new(41.0087, 29.0173);
        let destination = Position::new(41.0100, 29.0200);

        let mut steps = 0;
        while !current.go_to(&destination, 50.0) {
            steps += 1;
            assert!(steps < 100, "never arrived");
        }

        assert_eq!(current, destination);
        assert!(steps > 1);
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let a = Position::new(38.5, -120.2);
        let b = Position::new(40.7, -120.95);

        assert_eq!(a.distance_to(&a), 0.0);
        assert!((a.distance_to(&b) - b.distance_to(&a)).abs() < 1e-6);
    }

    #[test]
    fn simulate_stays_within_noise() {
        let origin = Position::new(41.0, 29.0);
        let mut p = origin;
        p.simulate(10.0);

        assert!(origin.distance_to(&p) <= 15.0);
    }
}
