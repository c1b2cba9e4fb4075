use std::time::Duration;

pub const POSITION_NOTIFICATION_INTERVAL: Duration = Duration::from_secs(1);
pub const TAKE_TRIP_PROBABILTY: f64 = 0.7;
/// Roughly 54 km/h
pub const DRIVER_SPEED_MPS: f64 = 15.0;
pub const GPS_NOISE_M: f64 = 3.0;
