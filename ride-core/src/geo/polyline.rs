//! Encoded polyline codec.
//!
//! Map and directions backends ship paths as "encoded polylines": each
//! point is stored as the delta from the previous point, in units of
//! 1e-5 degrees, written as a zig-zag signed integer split into 5-bit
//! chunks. Every chunk except the last has the continuation bit (`0x20`)
//! set, and each chunk is offset by 63 to land in printable ASCII.
//!
//! Latitude and longitude deltas alternate: `lat0 lng0 dlat1 dlng1 ...`.

use super::{Coordinate, InvalidCoordinate};

/// Scale between degrees and the integer units stored in a polyline.
const PRECISION: f64 = 1e5;

/// Offset added to every chunk to make it printable.
const CHUNK_OFFSET: u8 = 63;

/// Continuation bit of a chunk.
const CONTINUATION: i64 = 0x20;

/// Payload bits of a chunk.
const CHUNK_MASK: i64 = 0x1f;

/// Values longer than this many bits are rejected as corrupt.
const MAX_SHIFT: u32 = 60;

/// Errors from decoding an encoded polyline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolylineError {
    /// Byte outside the encoding alphabet (`'?'..='~'`)
    #[error("invalid polyline character {byte:#04x} at position {position}")]
    InvalidCharacter { byte: u8, position: usize },

    /// Input ended in the middle of a value
    #[error("polyline truncated at position {position}")]
    Truncated { position: usize },

    /// A single value ran past the supported width
    #[error("polyline value overflows at position {position}")]
    Overflow { position: usize },

    /// Decoded point is not a valid coordinate
    #[error("polyline point out of range: {0}")]
    OutOfRange(#[from] InvalidCoordinate),
}

/// Decode an encoded polyline into its points.
///
/// An empty string decodes to an empty vector.
///
/// # Examples
///
/// ```
/// use ride_core::geo::polyline;
///
/// let points = polyline::decode("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
/// assert_eq!(points.len(), 3);
/// assert_eq!(points[0].latitude(), 38.5);
/// assert_eq!(points[0].longitude(), -120.2);
/// ```
pub fn decode(encoded: &str) -> Result<Vec<Coordinate>, PolylineError> {
    let bytes = encoded.as_bytes();
    let mut position = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;
    let mut points = Vec::new();

    while position < bytes.len() {
        lat += decode_value(bytes, &mut position)?;
        lng += decode_value(bytes, &mut position)?;
        points.push(Coordinate::new(
            lat as f64 / PRECISION,
            lng as f64 / PRECISION,
        )?);
    }

    Ok(points)
}

/// Read one zig-zag encoded value starting at `position`.
fn decode_value(bytes: &[u8], position: &mut usize) -> Result<i64, PolylineError> {
    let mut result: i64 = 0;
    let mut shift: u32 = 0;

    loop {
        let byte = *bytes
            .get(*position)
            .ok_or(PolylineError::Truncated { position: *position })?;
        if !(CHUNK_OFFSET..=b'~').contains(&byte) {
            return Err(PolylineError::InvalidCharacter {
                byte,
                position: *position,
            });
        }
        if shift > MAX_SHIFT {
            return Err(PolylineError::Overflow {
                position: *position,
            });
        }
        *position += 1;

        let chunk = i64::from(byte - CHUNK_OFFSET);
        result |= (chunk & CHUNK_MASK) << shift;
        shift += 5;

        if chunk < CONTINUATION {
            break;
        }
    }

    Ok(if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

/// Encode points as a polyline.
///
/// Components are rounded to five decimal places, so
/// `decode(encode(points))` reproduces points that were already rounded.
pub fn encode(points: &[Coordinate]) -> String {
    let mut out = String::with_capacity(points.len() * 8);
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for point in points {
        let lat = (point.latitude() * PRECISION).round() as i64;
        let lng = (point.longitude() * PRECISION).round() as i64;
        encode_value(lat - prev_lat, &mut out);
        encode_value(lng - prev_lng, &mut out);
        prev_lat = lat;
        prev_lng = lng;
    }

    out
}

fn encode_value(delta: i64, out: &mut String) {
    let mut value = if delta < 0 { !(delta << 1) } else { delta << 1 };

    while value >= CONTINUATION {
        out.push(char::from((CONTINUATION | (value & CHUNK_MASK)) as u8 + CHUNK_OFFSET));
        value >>= 5;
    }
    out.push(char::from(value as u8 + CHUNK_OFFSET));
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Points already rounded to five decimal places.
    fn rounded_point() -> impl Strategy<Value = Coordinate> {
        (-9_000_000i64..=9_000_000, -18_000_000i64..=18_000_000).prop_map(|(lat, lng)| {
            Coordinate::new(lat as f64 / PRECISION, lng as f64 / PRECISION).unwrap()
        })
    }

    proptest! {
        /// decode(encode(path)) == path for rounded paths
        #[test]
        fn roundtrip(path in prop::collection::vec(rounded_point(), 0..32)) {
            let decoded = decode(&encode(&path)).unwrap();
            prop_assert_eq!(decoded, path);
        }

        /// Encoded output only uses the polyline alphabet
        #[test]
        fn printable_output(path in prop::collection::vec(rounded_point(), 0..32)) {
            let encoded = encode(&path);
            prop_assert!(encoded.bytes().all(|b| (b'?'..=b'~').contains(&b)));
        }

        /// Arbitrary text never panics the decoder
        #[test]
        fn decode_never_panics(s in "\\PC{0,64}") {
            let _ = decode(&s);
        }
    }
}
