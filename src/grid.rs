//! Maidenhead grid locator codec.
//!
//! Fields are 20x10 degrees (letters A-R), squares 2x1 degrees (digits),
//! subsquares 5x2.5 minutes (letters A-X), extended squares 30x15 seconds
//! (digits). Each level consumes the remainder of the previous one;
//! decoding lands on the center of the finest resolved cell.

use thiserror::Error;

use crate::geo::{great_circle, GeoError, GeodeticPosition};

#[derive(Debug, Error)]
pub enum GridError {
    #[error("precision must be 2, 4, 6 or 8, got {0}")]
    InvalidPrecision(usize),
    #[error("grid locator must be 2, 4, 6 or 8 characters, got {0:?}")]
    InvalidLength(String),
    #[error("invalid character {ch:?} at position {index} of grid locator")]
    InvalidCharacter { index: usize, ch: char },
    #[error(transparent)]
    Geo(#[from] GeoError),
}

pub fn encode(position: &GeodeticPosition, precision: usize) -> Result<String, GridError> {
    if !matches!(precision, 2 | 4 | 6 | 8) {
        return Err(GridError::InvalidPrecision(precision));
    }

    // Shift to non-negative ranges; keep the north pole and the antimeridian
    // inside the last cell instead of one past it.
    let lon = (position.longitude_deg + 180.0).clamp(0.0, 360.0 - 1e-9);
    let lat = (position.latitude_deg + 90.0).clamp(0.0, 180.0 - 1e-9);

    let mut grid = String::with_capacity(precision);
    grid.push((b'A' + (lon / 20.0) as u8) as char);
    grid.push((b'A' + (lat / 10.0) as u8) as char);

    if precision >= 4 {
        grid.push((b'0' + ((lon % 20.0) / 2.0) as u8) as char);
        grid.push((b'0' + (lat % 10.0) as u8) as char);
    }
    if precision >= 6 {
        grid.push((b'A' + ((lon % 2.0) / 2.0 * 24.0) as u8) as char);
        grid.push((b'A' + ((lat % 1.0) * 24.0) as u8) as char);
    }
    if precision == 8 {
        grid.push((b'0' + ((lon % 2.0 / 2.0 * 24.0) % 1.0 * 10.0) as u8) as char);
        grid.push((b'0' + ((lat % 1.0 * 24.0) % 1.0 * 10.0) as u8) as char);
    }

    Ok(grid)
}

/// Decode a locator to the center of its cell.
pub fn decode(grid: &str) -> Result<GeodeticPosition, GridError> {
    let normalized = grid.trim().to_ascii_uppercase();
    let chars: Vec<char> = normalized.chars().collect();
    if !matches!(chars.len(), 2 | 4 | 6 | 8) {
        return Err(GridError::InvalidLength(grid.to_string()));
    }

    let field_lon = letter_index(&chars, 0, 'R')?;
    let field_lat = letter_index(&chars, 1, 'R')?;
    let mut lon = field_lon * 20.0 - 180.0;
    let mut lat = field_lat * 10.0 - 90.0;

    if chars.len() >= 4 {
        lon += digit(&chars, 2)? * 2.0;
        lat += digit(&chars, 3)?;
    }
    if chars.len() >= 6 {
        lon += letter_index(&chars, 4, 'X')? / 12.0;
        lat += letter_index(&chars, 5, 'X')? / 24.0;
    }
    if chars.len() == 8 {
        lon += digit(&chars, 6)? / 120.0;
        lat += digit(&chars, 7)? / 240.0;
    }

    // Half the finest cell, in degrees.
    let (half_lon, half_lat) = match chars.len() {
        2 => (10.0, 5.0),
        4 => (1.0, 0.5),
        6 => (1.0 / 24.0, 1.0 / 48.0),
        _ => (1.0 / 240.0, 1.0 / 480.0),
    };

    Ok(GeodeticPosition::new(lat + half_lat, lon + half_lon, 0.0)?)
}

pub fn validate(grid: &str) -> bool {
    decode(grid).is_ok()
}

/// Distance (km) and bearing (degrees) between the centers of two grid
/// cells.
pub fn grid_distance(from: &str, to: &str) -> Result<(f64, f64), GridError> {
    let a = decode(from)?;
    let b = decode(to)?;
    Ok(great_circle(&a, &b))
}

fn letter_index(chars: &[char], index: usize, max: char) -> Result<f64, GridError> {
    let ch = chars[index];
    if !ch.is_ascii_uppercase() || ch > max {
        return Err(GridError::InvalidCharacter { index, ch });
    }
    Ok((ch as u8 - b'A') as f64)
}

fn digit(chars: &[char], index: usize) -> Result<f64, GridError> {
    let ch = chars[index];
    match ch.to_digit(10) {
        Some(d) => Ok(d as f64),
        None => Err(GridError::InvalidCharacter { index, ch }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(lat: f64, lon: f64) -> GeodeticPosition {
        GeodeticPosition::new(lat, lon, 0.0).unwrap()
    }

    #[test]
    fn encodes_the_fn30_example() {
        assert_eq!(encode(&pos(40.75, -73.0), 4).unwrap(), "FN30");
    }

    #[test]
    fn decodes_to_the_cell_center() {
        let center = decode("FN30").unwrap();
        assert!((center.latitude_deg - 40.5).abs() < 1e-9);
        assert!((center.longitude_deg - -73.0).abs() < 1e-9);
    }

    #[test]
    fn known_locators() {
        assert_eq!(encode(&pos(51.478, -0.0015), 6).unwrap(), "IO91XL");
        assert_eq!(encode(&pos(-34.91, -56.21), 6).unwrap(), "GF15VC");
    }

    #[test]
    fn round_trip_stays_within_half_a_cell() {
        let cases = [
            pos(40.75, -73.0),
            pos(-33.87, 151.21),
            pos(0.0, 0.0),
            pos(62.01, 129.73),
            pos(-0.1, -0.1),
        ];
        for precision in [2usize, 4, 6, 8] {
            let (half_lon, half_lat) = match precision {
                2 => (10.0, 5.0),
                4 => (1.0, 0.5),
                6 => (1.0 / 24.0, 1.0 / 48.0),
                _ => (1.0 / 240.0, 1.0 / 480.0),
            };
            for original in cases {
                let grid = encode(&original, precision).unwrap();
                assert_eq!(grid.len(), precision);
                let back = decode(&grid).unwrap();
                assert!(
                    (back.latitude_deg - original.latitude_deg).abs() <= half_lat + 1e-9,
                    "{grid}: lat {} vs {}",
                    back.latitude_deg,
                    original.latitude_deg
                );
                assert!(
                    (back.longitude_deg - original.longitude_deg).abs() <= half_lon + 1e-9,
                    "{grid}: lon {} vs {}",
                    back.longitude_deg,
                    original.longitude_deg
                );
            }
        }
    }

    #[test]
    fn poles_and_antimeridian_encode_without_overflow() {
        assert_eq!(encode(&pos(90.0, 180.0), 2).unwrap(), "RR");
        assert_eq!(encode(&pos(-90.0, -180.0), 2).unwrap(), "AA");
        assert!(encode(&pos(89.999, 179.999), 8).is_ok());
    }

    #[test]
    fn validation_rules() {
        assert!(validate("FN30"));
        assert!(validate("AA"));
        assert!(validate("fn30"));
        assert!(validate("FN30as25"));
        assert!(!validate("A1"));
        assert!(!validate("ZZ99")); // Z is past R in the field letters
        assert!(!validate("FS30")); // S is past R in the latitude field
        assert!(!validate("FN3"));
        assert!(!validate("FN3X"));
        assert!(!validate(""));
        assert!(!validate("FN30AS25XX"));
    }

    #[test]
    fn rejects_bad_precision() {
        assert!(matches!(
            encode(&pos(0.0, 0.0), 5),
            Err(GridError::InvalidPrecision(5))
        ));
    }

    #[test]
    fn distance_between_identical_cells_is_zero() {
        let (d, brg) = grid_distance("FN30", "FN30").unwrap();
        assert_eq!(d, 0.0);
        assert_eq!(brg, 0.0);
    }

    #[test]
    fn transatlantic_distance_is_plausible() {
        // FN30 (NY area) to IO91 (London area) is a bit under 5600 km.
        let (d, brg) = grid_distance("FN30", "IO91").unwrap();
        assert!(d > 5300.0 && d < 5800.0, "distance {d}");
        assert!((30.0..80.0).contains(&brg), "bearing {brg}");
    }
}
