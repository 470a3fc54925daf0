use crate::boundary::{BoundaryPolygon, MIN_HULL_POINTS};
use crate::error::IsochroneError;
use crate::sample::Coordinate;
use geo::{ConcaveHull, ConvexHull, KNearestConcaveHull, MultiPoint, Point, Polygon};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;

/// Why a boundary could not be produced for an island.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum HullError {
    #[error("hull needs at least 3 distinct points, found {found}")]
    InsufficientPoints { found: usize },
    #[error("hull collapsed to {vertices} distinct vertices with no area")]
    Degenerate { vertices: usize },
    #[error("hull solver panicked: {0}")]
    SolverPanicked(String),
}

/// Computes the outline of a point set.
///
/// Implementations require at least three distinct points and may fail on
/// collinear input. Vertex winding is unspecified.
pub trait HullSolver: Send + Sync {
    fn compute(&self, points: &[Coordinate]) -> Result<BoundaryPolygon, HullError>;
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum HullType {
    FastConcave { concavity: f64 },
    Concave { k: u32 },
    Convex,
}

impl Default for HullType {
    fn default() -> Self {
        HullType::FastConcave { concavity: 2.0 }
    }
}

impl FromStr for HullType {
    type Err = IsochroneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Convex" => Ok(HullType::Convex),
            "FastConcave" => Ok(HullType::default()),
            "Concave" => Ok(HullType::Concave { k: 3 }),
            _ => Err(IsochroneError::Configuration(format!(
                "invalid hull type {}, expected Convex, FastConcave or Concave",
                s
            ))),
        }
    }
}

/// [`HullSolver`] backed by the hull algorithms of the `geo` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoHullSolver {
    pub hull_type: HullType,
}

impl GeoHullSolver {
    pub fn new(hull_type: HullType) -> Self {
        GeoHullSolver { hull_type }
    }
}

impl HullSolver for GeoHullSolver {
    fn compute(&self, points: &[Coordinate]) -> Result<BoundaryPolygon, HullError> {
        let distinct: BTreeSet<Coordinate> = points.iter().copied().collect();
        if distinct.len() < MIN_HULL_POINTS {
            return Err(HullError::InsufficientPoints {
                found: distinct.len(),
            });
        }

        let points: MultiPoint<f64> = distinct
            .into_iter()
            .map(|coordinate| Point::from(geo::Coord::from(coordinate)))
            .collect::<Vec<_>>()
            .into();

        let hull_type = self.hull_type;
        let polygon: Polygon<f64> =
            panic::catch_unwind(AssertUnwindSafe(|| match hull_type {
                HullType::FastConcave { concavity } => points.concave_hull(concavity),
                HullType::Concave { k } => points.k_nearest_concave_hull(k),
                HullType::Convex => points.convex_hull(),
            }))
            .map_err(|payload| HullError::SolverPanicked(panic_message(payload.as_ref())))?;

        BoundaryPolygon::from_polygon(&polygon)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
