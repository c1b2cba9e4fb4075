use log::LevelFilter;

pub const HOST: &str = "0.0.0.0";

pub const RELAY_PORT: u16 = 3000;
pub const LOG_LEVEL: LevelFilter = LevelFilter::Debug;

/// Longest line a peer may send, newline included.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Google Directions endpoint used to resolve a passenger's route.
pub const DIRECTIONS_URL: &str = "https://maps.googleapis.com/maps/api/directions/json";
pub const DIRECTIONS_API_KEY_ENV: &str = "DIRECTIONS_API_KEY";
