use crate::binning::BandIndex;
use crate::sample::Coordinate;

/// Fatal errors raised by the isochrone pipeline and its file-facing surface.
///
/// Hull failures for a single island are not part of this type; they are
/// recoverable and travel as [`crate::hull::HullError`] inside the result.
#[derive(thiserror::Error, Debug)]
pub enum IsochroneError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("point {point} in band {band} was left without an island")]
    ClusteringInvariantViolation { band: BandIndex, point: Coordinate },
    #[error("malformed travel time data: {0}")]
    UpstreamData(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}
