use crate::error::IsochroneError;
use crate::sample::Coordinate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LAT_STEP: f64 = 0.002;
pub const DEFAULT_LNG_STEP: f64 = 0.003;

/// Bounding box for a lattice covering a whole region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

/// How the destination lattice is laid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum LatticeConfig {
    /// `n × n` points around the origin, `step` degrees apart.
    Local {
        origin_lat: f64,
        origin_lng: f64,
        n: usize,
        #[serde(default = "default_lat_step")]
        lat_step: f64,
        #[serde(default = "default_lng_step")]
        lng_step: f64,
    },
    /// `n × n` points spread evenly over a bounding box.
    Global {
        min_lat: f64,
        max_lat: f64,
        min_lng: f64,
        max_lng: f64,
        n: usize,
    },
}

fn default_lat_step() -> f64 {
    DEFAULT_LAT_STEP
}

fn default_lng_step() -> f64 {
    DEFAULT_LNG_STEP
}

impl LatticeConfig {
    pub fn build(&self) -> Result<Lattice, IsochroneError> {
        match self {
            LatticeConfig::Local {
                origin_lat,
                origin_lng,
                n,
                lat_step,
                lng_step,
            } => Lattice::local(Coordinate::new(*origin_lng, *origin_lat), *n, *lat_step, *lng_step),
            LatticeConfig::Global {
                min_lat,
                max_lat,
                min_lng,
                max_lng,
                n,
            } => {
                let bounds = Bounds {
                    min_lat: *min_lat,
                    max_lat: *max_lat,
                    min_lng: *min_lng,
                    max_lng: *max_lng,
                };
                Lattice::global(&bounds, *n)
            }
        }
    }
}

/// Regular grid of destinations to request travel times for.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    lngs: Vec<f64>,
    lats: Vec<f64>,
}

impl Lattice {
    /// Grid centered on `origin` spanning `(n / 2) * step` to either side.
    pub fn local(
        origin: Coordinate,
        n: usize,
        lat_step: f64,
        lng_step: f64,
    ) -> Result<Self, IsochroneError> {
        check_size(n)?;
        if !origin.is_finite() {
            return Err(IsochroneError::Configuration(format!(
                "lattice origin {} is not a valid coordinate",
                origin
            )));
        }
        if !(lat_step > 0.0 && lng_step > 0.0) {
            return Err(IsochroneError::Configuration(format!(
                "lattice steps must be positive, found lat {} lng {}",
                lat_step, lng_step
            )));
        }
        let half = (n / 2) as f64;
        Ok(Lattice {
            lngs: linspace(origin.lng - half * lng_step, origin.lng + half * lng_step, n),
            lats: linspace(origin.lat - half * lat_step, origin.lat + half * lat_step, n),
        })
    }

    pub fn global(bounds: &Bounds, n: usize) -> Result<Self, IsochroneError> {
        check_size(n)?;
        let ordered = bounds.min_lat < bounds.max_lat && bounds.min_lng < bounds.max_lng;
        let finite = [bounds.min_lat, bounds.max_lat, bounds.min_lng, bounds.max_lng]
            .iter()
            .all(|value| value.is_finite());
        if !(ordered && finite) {
            return Err(IsochroneError::Configuration(format!(
                "global lattice bounds must satisfy min < max, found {:?}",
                bounds
            )));
        }
        Ok(Lattice {
            lngs: linspace(bounds.min_lng, bounds.max_lng, n),
            lats: linspace(bounds.min_lat, bounds.max_lat, n),
        })
    }

    /// Every grid point, longitude-major.
    pub fn points(&self) -> Vec<Coordinate> {
        self.lngs
            .iter()
            .flat_map(|&lng| self.lats.iter().map(move |&lat| Coordinate::new(lng, lat)))
            .collect()
    }

    /// Distance between neighboring points as (longitude, latitude) steps.
    pub fn spacing(&self) -> (f64, f64) {
        (self.lngs[1] - self.lngs[0], self.lats[1] - self.lats[0])
    }

    /// Diagonal of one grid cell, the clustering radius that links only
    /// touching cells.
    pub fn epsilon(&self) -> f64 {
        let (lng_step, lat_step) = self.spacing();
        lng_step.hypot(lat_step)
    }

    pub fn len(&self) -> usize {
        self.lngs.len() * self.lats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn check_size(n: usize) -> Result<(), IsochroneError> {
    if n < 2 {
        return Err(IsochroneError::Configuration(format!(
            "lattice needs at least 2 points per side, found {}",
            n
        )));
    }
    Ok(())
}

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    let step = (end - start) / (n - 1) as f64;
    (0..n)
        .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
        .collect()
}
