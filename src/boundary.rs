use crate::binning::BandIndex;
use crate::cluster::IslandLabel;
use crate::hull::{HullError, HullSolver};
use crate::sample::Coordinate;
use geo::{Area, Polygon};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::BTreeSet;

/// Smallest number of distinct points a hull can be computed from.
pub const MIN_HULL_POINTS: usize = 3;

/// Upper bound of the random offset, in degrees, given to padding points
/// around a degenerate island. 1e-7 degrees is well under a meter.
pub const JITTER_MAGNITUDE: f64 = 1e-7;

/// Outline of one island, closed implicitly: the first vertex is not
/// repeated at the end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryPolygon {
    vertices: Vec<Coordinate>,
}

impl BoundaryPolygon {
    /// Takes the exterior ring of a solver polygon.
    ///
    /// Fails with [`HullError::Degenerate`] when the ring has fewer than
    /// three distinct vertices or encloses no area.
    pub fn from_polygon(polygon: &Polygon<f64>) -> Result<Self, HullError> {
        let mut vertices: Vec<Coordinate> = polygon
            .exterior()
            .0
            .iter()
            .map(|coord| Coordinate::from(*coord))
            .collect();
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }

        let distinct = vertices.iter().collect::<BTreeSet<_>>().len();
        if distinct < MIN_HULL_POINTS || polygon.unsigned_area() == 0.0 {
            return Err(HullError::Degenerate { vertices: distinct });
        }
        Ok(BoundaryPolygon { vertices })
    }

    pub fn vertices(&self) -> &[Coordinate] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertices with the first one repeated at the end, as map formats expect.
    pub fn closed_ring(&self) -> Vec<Coordinate> {
        let mut ring = self.vertices.clone();
        if let Some(first) = self.vertices.first() {
            ring.push(*first);
        }
        ring
    }
}

/// Seed for one island, mixed from the run seed, band and island label with
/// the splitmix64 finalizer.
pub fn derive_seed(base_seed: u64, band: BandIndex, label: IslandLabel) -> u64 {
    let mut z = base_seed ^ ((u64::from(band.0) << 32) | u64::from(label.0 as u32));
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Appends jittered copies of the first point until the island holds
/// [`MIN_HULL_POINTS`] distinct points.
pub fn pad_degenerate(points: &[Coordinate], seed: u64) -> Vec<Coordinate> {
    let mut padded = points.to_vec();
    let Some(anchor) = points.first().copied() else {
        return padded;
    };
    let distinct = points.iter().collect::<BTreeSet<_>>().len();
    let missing = MIN_HULL_POINTS.saturating_sub(distinct);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for _ in 0..missing {
        padded.push(Coordinate::new(
            anchor.lng + rng.random::<f64>() * JITTER_MAGNITUDE,
            anchor.lat + rng.random::<f64>() * JITTER_MAGNITUDE,
        ));
    }
    padded
}

/// Produces the boundary of one island.
///
/// Islands with fewer than three distinct points are padded by
/// [`pad_degenerate`] first, so their boundary is a tiny marker around the
/// real point rather than a meaningful area.
pub fn synthesize(
    points: &[Coordinate],
    seed: u64,
    solver: &dyn HullSolver,
) -> Result<BoundaryPolygon, HullError> {
    if points.is_empty() {
        return Err(HullError::InsufficientPoints { found: 0 });
    }
    let padded = pad_degenerate(points, seed);
    solver.compute(&padded)
}
