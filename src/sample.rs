use crate::error::IsochroneError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A (longitude, latitude) pair in degrees.
///
/// Equality and ordering use `f64::total_cmp` on longitude then latitude, so
/// coordinates can be kept in ordered sets and always iterate the same way.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coordinate {
    pub lng: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lng: f64, lat: f64) -> Self {
        Coordinate { lng, lat }
    }

    /// Squared planar distance in degree units.
    pub fn distance_squared(&self, other: &Coordinate) -> f64 {
        let dx = self.lng - other.lng;
        let dy = self.lat - other.lat;
        dx * dx + dy * dy
    }

    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }

    pub fn to_array(self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Coordinate {}

impl PartialOrd for Coordinate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Coordinate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.lng
            .total_cmp(&other.lng)
            .then_with(|| self.lat.total_cmp(&other.lat))
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lng, self.lat)
    }
}

impl From<Coordinate> for geo::Coord<f64> {
    fn from(value: Coordinate) -> Self {
        geo::Coord {
            x: value.lng,
            y: value.lat,
        }
    }
}

impl From<geo::Coord<f64>> for Coordinate {
    fn from(value: geo::Coord<f64>) -> Self {
        Coordinate::new(value.x, value.y)
    }
}

/// One destination with the time it takes to reach it from the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub coordinate: Coordinate,
    pub travel_time_seconds: f64,
}

impl Sample {
    pub fn new(lng: f64, lat: f64, travel_time_seconds: f64) -> Self {
        Sample {
            coordinate: Coordinate::new(lng, lat),
            travel_time_seconds,
        }
    }
}

/// Rejects samples the provider should never have handed over.
pub fn validate_samples(samples: &[Sample]) -> Result<(), IsochroneError> {
    for (index, sample) in samples.iter().enumerate() {
        if !sample.coordinate.is_finite() {
            return Err(IsochroneError::UpstreamData(format!(
                "sample {} has a non-finite coordinate {}",
                index, sample.coordinate
            )));
        }
        if !sample.travel_time_seconds.is_finite() || sample.travel_time_seconds < 0.0 {
            return Err(IsochroneError::UpstreamData(format!(
                "sample {} has invalid travel time {}",
                index, sample.travel_time_seconds
            )));
        }
    }
    Ok(())
}

// Reads samples from a CSV with a `lng,lat,travel_time_seconds` header
pub fn read_samples_csv<R: std::io::Read>(reader: R) -> Result<Vec<Sample>, IsochroneError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut samples = Vec::new();
    for row in csv_reader.deserialize::<SampleRow>() {
        let row = row.map_err(|err| IsochroneError::UpstreamData(err.to_string()))?;
        samples.push(Sample::new(row.lng, row.lat, row.travel_time_seconds));
    }
    validate_samples(&samples)?;
    Ok(samples)
}

#[derive(Debug, Deserialize)]
struct SampleRow {
    lng: f64,
    lat: f64,
    travel_time_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_ordering_is_lng_then_lat() {
        let a = Coordinate::new(0.0, 1.0);
        let b = Coordinate::new(0.0, 2.0);
        let c = Coordinate::new(1.0, 0.0);
        let mut coords = vec![c, b, a];
        coords.sort();
        assert_eq!(coords, vec![a, b, c]);
    }

    #[test]
    fn test_validate_rejects_negative_travel_time() {
        let samples = vec![Sample::new(0.0, 0.0, 60.0), Sample::new(0.0, 0.0, -1.0)];
        let err = validate_samples(&samples).unwrap_err();
        assert!(matches!(err, IsochroneError::UpstreamData(_)));
    }

    #[test]
    fn test_validate_rejects_nan_coordinate() {
        let samples = vec![Sample::new(f64::NAN, 51.5, 60.0)];
        assert!(validate_samples(&samples).is_err());
    }

    #[test]
    fn test_read_samples_csv() {
        let data = "lng,lat,travel_time_seconds\n-0.12,51.5,300\n-0.11,51.5,600.5\n";
        let samples = read_samples_csv(data.as_bytes()).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1], Sample::new(-0.11, 51.5, 600.5));
    }

    #[test]
    fn test_read_samples_csv_malformed_row() {
        let data = "lng,lat,travel_time_seconds\n-0.12,abc,300\n";
        assert!(matches!(
            read_samples_csv(data.as_bytes()),
            Err(IsochroneError::UpstreamData(_))
        ));
    }
}
