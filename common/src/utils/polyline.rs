//! Encoded polyline format: each coordinate is scaled by 1e5, delta-encoded
//! against the previous one, zig-zagged and written in 5-bit chunks offset by 63.

use super::{error::PolylineError, position::Position};

const PRECISION: f64 = 1e5;
const CHUNK_BITS: u32 = 5;
const CONTINUATION: i64 = 0x20;
const CHUNK_MASK: i64 = 0x1f;
const OFFSET: u8 = 63;
const MAX_SHIFT: u32 = 60;
const MAX_LATITUDE: i64 = 90 * 100_000;
const MAX_LONGITUDE: i64 = 180 * 100_000;

pub fn decode(encoded: &str) -> Result<Vec<Position>, PolylineError> {
    let bytes = encoded.as_bytes();
    let mut index = 0;
    let mut latitude: i64 = 0;
    let mut longitude: i64 = 0;
    let mut points = Vec::new();

    while index < bytes.len() {
        let lat_start = index;
        latitude = latitude
            .checked_add(next_value(bytes, &mut index)?)
            .ok_or(PolylineError::Overflow(lat_start))?;

        if index >= bytes.len() {
            return Err(PolylineError::MissingLongitude(lat_start));
        }

        let lng_start = index;
        longitude = longitude
            .checked_add(next_value(bytes, &mut index)?)
            .ok_or(PolylineError::Overflow(lng_start))?;

        if !(-MAX_LATITUDE..=MAX_LATITUDE).contains(&latitude)
            || !(-MAX_LONGITUDE..=MAX_LONGITUDE).contains(&longitude)
        {
            return Err(PolylineError::OutOfRange(lat_start));
        }

        points.push(Position::new(
            latitude as f64 / PRECISION,
            longitude as f64 / PRECISION,
        ));
    }

    Ok(points)
}

pub fn encode(points: &[Position]) -> String {
    let mut out = String::new();
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for p in points {
        let lat = (p.latitude * PRECISION).round() as i64;
        let lng = (p.longitude * PRECISION).round() as i64;

        push_value(&mut out, lat - prev_lat);
        push_value(&mut out, lng - prev_lng);

        prev_lat = lat;
        prev_lng = lng;
    }

    out
}

fn next_value(bytes: &[u8], index: &mut usize) -> Result<i64, PolylineError> {
    let start = *index;
    let mut result: i64 = 0;
    let mut shift: u32 = 0;

    loop {
        let byte = *bytes.get(*index).ok_or(PolylineError::Truncated(start))?;

        if !(OFFSET..=b'~').contains(&byte) {
            return Err(PolylineError::InvalidCharacter {
                character: byte as char,
                index: *index,
            });
        }

        if shift > MAX_SHIFT {
            return Err(PolylineError::Overflow(start));
        }

        let chunk = (byte - OFFSET) as i64;
        result |= (chunk & CHUNK_MASK) << shift;
        shift += CHUNK_BITS;
        *index += 1;

        if chunk < CONTINUATION {
            break;
        }
    }

    Ok(if result & 1 == 1 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

fn push_value(out: &mut String, value: i64) {
    let mut v = value << 1;
    if value < 0 {
        v = !v;
    }

    while v >= CONTINUATION {
        out.push((((CONTINUATION | (v & CHUNK_MASK)) as u8) + OFFSET) as char);
        v >>= CHUNK_BITS;
    }

    out.push(((v as u8) + OFFSET) as char);
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    fn reference_points() -> Vec<Position> {
        vec![
            Position::new(38.5, -120.2),
            Position::new(40.7, -120.95),
            Position::new(43.252, -126.453),
        ]
    }

    fn assert_close(actual: &[Position], expected: &[Position]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a.latitude - e.latitude).abs() < 1e-9, "{} != {}", a, e);
            assert!((a.longitude - e.longitude).abs() < 1e-9, "{} != {}", a, e);
        }
    }

    #[test]
    fn decodes_reference_polyline() {
        let points = decode(REFERENCE).unwrap();
        assert_close(&points, &reference_points());
    }

    #[test]
    fn encodes_reference_points() {
        assert_eq!(encode(&reference_points()), REFERENCE);
    }

    #[test]
    fn empty_string_is_an_empty_route() {
        assert_eq!(decode("").unwrap(), vec![]);
        assert_eq!(encode(&[]), "");
    }

    #[test]
    fn rejects_characters_below_offset() {
        let err = decode("_p~iF ps|U").unwrap_err();
        assert_eq!(
            err,
            PolylineError::InvalidCharacter {
                character: ' ',
                index: 5
            }
        );
    }

    #[test]
    fn rejects_truncated_chunk() {
        // "~ps|" keeps the continuation bit set on its last character
        assert_eq!(decode("_p~iF~ps|").unwrap_err(), PolylineError::Truncated(5));
    }

    #[test]
    fn rejects_latitude_without_longitude() {
        assert_eq!(
            decode("_p~iF").unwrap_err(),
            PolylineError::MissingLongitude(0)
        );
    }

    #[test]
    fn rejects_overflowing_value() {
        let encoded = "~".repeat(20);
        assert_eq!(decode(&encoded).unwrap_err(), PolylineError::Overflow(0));
    }

    #[test]
    fn huge_deltas_are_rejected_before_summing() {
        // Each latitude delta is close to 2^62, three of them do not fit an i64
        let big = format!("}}{}F", "~".repeat(11));
        let encoded = format!("{b}?{b}?{b}?", b = big);

        assert_eq!(decode(&encoded).unwrap_err(), PolylineError::OutOfRange(0));
    }

    #[test]
    fn rejects_coordinates_off_the_globe() {
        let encoded = encode(&[Position::new(38.5, -120.2), Position::new(91.0, 0.0)]);
        let second = encode(&[Position::new(38.5, -120.2)]).len();

        assert_eq!(
            decode(&encoded).unwrap_err(),
            PolylineError::OutOfRange(second)
        );
    }

    #[test]
    fn accepts_the_edges_of_the_globe() {
        let points = vec![Position::new(-90.0, 180.0), Position::new(90.0, -180.0)];

        assert_close(&decode(&encode(&points)).unwrap(), &points);
    }

    #[test]
    fn negative_deltas_survive_encoding() {
        let points = vec![
            Position::new(-33.86785, 151.20732),
            Position::new(-33.87, 151.2),
            Position::new(0.0, 0.0),
        ];

        assert_close(&decode(&encode(&points)).unwrap(), &points);
    }
}
