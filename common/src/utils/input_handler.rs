use regex::Regex;

use super::{
    consts::{HOST, RELAY_PORT},
    position::Position,
};

const NUMBER: &str = r"-?\d+(?:\.\d+)?";

/// Splits `key=value` arguments. Values may not contain spaces.
pub fn parse_pairs(args: &[String]) -> Result<Vec<(String, String)>, String> {
    args.iter()
        .map(|arg| {
            arg.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| format!("Invalid argument '{}', expected key=value", arg))
        })
        .collect()
}

pub fn find<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

pub fn parse_id(value: &str) -> Result<u32, String> {
    value
        .parse::<u32>()
        .map_err(|_| format!("Invalid id '{}'", value))
}

/// Parses `(lat,lng)` in degrees.
pub fn parse_position(value: &str) -> Result<Position, String> {
    let pattern = Regex::new(&format!(r"^\(({}),({})\)$", NUMBER, NUMBER))
        .map_err(|e| e.to_string())?;

    let captures = pattern
        .captures(value)
        .ok_or_else(|| format!("Invalid position '{}', expected (lat,lng)", value))?;

    let latitude: f64 = captures[1]
        .parse()
        .map_err(|_| format!("Invalid latitude in '{}'", value))?;
    let longitude: f64 = captures[2]
        .parse()
        .map_err(|_| format!("Invalid longitude in '{}'", value))?;

    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(format!("Position '{}' is out of range", value));
    }

    Ok(Position::new(latitude, longitude))
}

/// Relay address from `relay=host:port`, or the default one.
pub fn relay_addr(value: Option<&str>) -> String {
    match value {
        Some(addr) => addr.to_string(),
        None => format!("{}:{}", HOST, RELAY_PORT),
    }
}
