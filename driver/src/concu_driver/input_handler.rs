use std::time::Duration;

use common::utils::{
    input_handler::{find, parse_id, parse_pairs, parse_position, relay_addr},
    position::Position,
};

use super::consts::{DRIVER_SPEED_MPS, GPS_NOISE_M, POSITION_NOTIFICATION_INTERVAL, TAKE_TRIP_PROBABILTY};

#[derive(Debug, Clone, PartialEq)]
pub struct DriverArgs {
    pub id: u32,
    pub origin: Position,
    pub relay: String,
}

/// Driving behaviour. Tests shrink the intervals and force acceptance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverSettings {
    pub take_trip_probability: f64,
    pub notification_interval: Duration,
    pub speed_mps: f64,
    pub gps_noise_m: f64,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            take_trip_probability: TAKE_TRIP_PROBABILTY,
            notification_interval: POSITION_NOTIFICATION_INTERVAL,
            speed_mps: DRIVER_SPEED_MPS,
            gps_noise_m: GPS_NOISE_M,
        }
    }
}

/// `id=<n> origin=(lat,lng) [relay=host:port]`
pub fn validate_args(args: &[String]) -> Result<DriverArgs, String> {
    let pairs = parse_pairs(args)?;

    let id = parse_id(find(&pairs, "id").ok_or("Missing id=<n>")?)?;
    let origin = parse_position(find(&pairs, "origin").ok_or("Missing origin=(lat,lng)")?)?;

    Ok(DriverArgs {
        id,
        origin,
        relay: relay_addr(find(&pairs, "relay")),
    })
}

#[cfg(test)]
mod tests {
    use common::utils::consts::{HOST, RELAY_PORT};

    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn reads_id_and_origin() {
        let parsed = validate_args(&args(&["id=4", "origin=(41.0,29.0)"])).unwrap();

        assert_eq!(parsed.id, 4);
        assert_eq!(parsed.origin, Position::new(41.0, 29.0));
        assert_eq!(parsed.relay, format!("{}:{}", HOST, RELAY_PORT));
    }

    #[test]
    fn relay_can_be_overridden() {
        let parsed =
            validate_args(&args(&["origin=(1,2)", "id=4", "relay=127.0.0.1:9000"])).unwrap();

        assert_eq!(parsed.relay, "127.0.0.1:9000");
    }

    #[test]
    fn origin_is_required() {
        assert!(validate_args(&args(&["id=4"])).is_err());
        assert!(validate_args(&args(&["id=x", "origin=(1,2)"])).is_err());
    }
}
