use common::utils::input_handler::{find, parse_id, parse_pairs, parse_position, relay_addr};

use crate::concu_passenger::utils::TripData;

/// `id=<n> origin=(lat,lng) dest=<place_id> [route=<polyline>] [relay=host:port]`
pub fn validate_args(args: &[String]) -> Result<TripData, String> {
    let pairs = parse_pairs(args)?;

    let id = parse_id(find(&pairs, "id").ok_or("Missing id=<n>")?)?;
    let origin = parse_position(find(&pairs, "origin").ok_or("Missing origin=(lat,lng)")?)?;

    let destination = match find(&pairs, "dest") {
        Some(d) if !d.is_empty() => d.to_string(),
        _ => return Err("Missing dest=<place_id>".into()),
    };

    Ok(TripData {
        id,
        origin,
        destination,
        route: find(&pairs, "route").map(str::to_string),
        relay: relay_addr(find(&pairs, "relay")),
    })
}
