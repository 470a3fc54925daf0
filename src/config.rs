use crate::cluster::default_epsilon;
use crate::error::IsochroneError;
use crate::grid::{LatticeConfig, DEFAULT_LNG_STEP};
use crate::hull::HullType;
use crate::schedule::CutoffSchedule;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Transit,
    Walking,
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TravelMode::Transit => write!(f, "transit"),
            TravelMode::Walking => write!(f, "walking"),
        }
    }
}

/// Everything the pipeline needs to know before it runs.
///
/// ```toml
/// cutoff_mins = [10, 20, 30, 60]
/// grid_spacing = 0.003
/// seed = 42
/// travel_mode = "walking"
///
/// [hull]
/// type = "fast_concave"
/// concavity = 2.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub cutoff_mins: Vec<u32>,
    /// Spacing of the sampling lattice in degrees.
    #[serde(default = "default_grid_spacing")]
    pub grid_spacing: f64,
    /// Overrides the clustering radius derived from the lattice.
    #[serde(default)]
    pub epsilon: Option<f64>,
    #[serde(default)]
    pub hull: HullType,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub max_bands: Option<usize>,
    #[serde(default)]
    pub travel_mode: TravelMode,
    #[serde(default)]
    pub lattice: Option<LatticeConfig>,
}

fn default_grid_spacing() -> f64 {
    DEFAULT_LNG_STEP
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl PipelineConfig {
    pub fn new(cutoff_mins: Vec<u32>, grid_spacing: f64) -> Self {
        PipelineConfig {
            cutoff_mins,
            grid_spacing,
            epsilon: None,
            hull: HullType::default(),
            seed: DEFAULT_SEED,
            max_bands: None,
            travel_mode: TravelMode::default(),
            lattice: None,
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, IsochroneError> {
        let config: PipelineConfig = toml::from_str(contents)
            .map_err(|err| IsochroneError::Configuration(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, IsochroneError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn schedule(&self) -> Result<CutoffSchedule, IsochroneError> {
        CutoffSchedule::new(self.cutoff_mins.clone())
    }

    /// Clustering radius: the explicit `epsilon`, else the cell diagonal of
    /// the configured lattice, else the diagonal of a square `grid_spacing`
    /// cell.
    pub fn epsilon(&self) -> Result<f64, IsochroneError> {
        if let Some(epsilon) = self.epsilon {
            return Ok(epsilon);
        }
        match &self.lattice {
            Some(lattice) => Ok(lattice.build()?.epsilon()),
            None => Ok(default_epsilon(self.grid_spacing)),
        }
    }

    /// Name describing the data set, e.g. `walking_localmap_N10`.
    pub fn data_name(&self) -> String {
        match &self.lattice {
            Some(LatticeConfig::Local { n, .. }) => {
                format!("{}_localmap_N{}", self.travel_mode, n)
            }
            Some(LatticeConfig::Global { n, .. }) => {
                format!("{}_globalmap_N{}", self.travel_mode, n)
            }
            None => format!("{}_samples", self.travel_mode),
        }
    }

    pub fn validate(&self) -> Result<(), IsochroneError> {
        self.schedule()?;
        if !(self.grid_spacing.is_finite() && self.grid_spacing > 0.0) {
            return Err(IsochroneError::Configuration(format!(
                "grid spacing must be positive, found {}",
                self.grid_spacing
            )));
        }
        if let Some(epsilon) = self.epsilon {
            if !(epsilon.is_finite() && epsilon > 0.0) {
                return Err(IsochroneError::Configuration(format!(
                    "epsilon must be positive, found {}",
                    epsilon
                )));
            }
        }
        match self.hull {
            HullType::FastConcave { concavity } if !(concavity.is_finite() && concavity > 0.0) => {
                return Err(IsochroneError::Configuration(format!(
                    "concavity must be positive, found {}",
                    concavity
                )));
            }
            HullType::Concave { k } if k < 3 => {
                return Err(IsochroneError::Configuration(format!(
                    "k nearest concave hull needs k >= 3, found {}",
                    k
                )));
            }
            _ => {}
        }
        if let Some(lattice) = &self.lattice {
            lattice.build()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = PipelineConfig::from_toml_str("cutoff_mins = [10, 20, 30]").unwrap();
        assert_eq!(config.schedule().unwrap().as_slice(), &[0, 10, 20, 30]);
        assert_eq!(config.seed, DEFAULT_SEED);
        assert_eq!(config.hull, HullType::FastConcave { concavity: 2.0 });
        assert_eq!(config.travel_mode, TravelMode::Transit);
        assert_relative_eq!(config.epsilon().unwrap(), default_epsilon(0.003));
    }

    #[test]
    fn test_rejects_unordered_cutoffs() {
        let err = PipelineConfig::from_toml_str("cutoff_mins = [30, 10]").unwrap_err();
        assert!(matches!(err, IsochroneError::Configuration(_)));
    }

    #[test]
    fn test_rejects_unknown_travel_mode() {
        let err = PipelineConfig::from_toml_str("cutoff_mins = [10]\ntravel_mode = \"flying\"")
            .unwrap_err();
        assert!(matches!(err, IsochroneError::Configuration(_)));
    }

    #[test]
    fn test_rejects_non_positive_spacing() {
        let err =
            PipelineConfig::from_toml_str("cutoff_mins = [10]\ngrid_spacing = 0.0").unwrap_err();
        assert!(matches!(err, IsochroneError::Configuration(_)));
    }

    #[test]
    fn test_rejects_small_k() {
        let err = PipelineConfig::from_toml_str(
            "cutoff_mins = [10]\n[hull]\ntype = \"concave\"\nk = 2",
        )
        .unwrap_err();
        assert!(matches!(err, IsochroneError::Configuration(_)));
    }

    #[test]
    fn test_epsilon_follows_lattice() {
        let config = PipelineConfig::from_toml_str(
            "cutoff_mins = [10]\n[lattice]\ntype = \"local\"\norigin_lat = 0.0\norigin_lng = 0.0\nn = 5",
        )
        .unwrap();
        assert_relative_eq!(config.epsilon().unwrap(), 0.003f64.hypot(0.002), epsilon = 1e-12);
        assert_eq!(config.data_name(), "transit_localmap_N5");
    }

    #[test]
    fn test_explicit_epsilon_wins() {
        let mut config = PipelineConfig::new(vec![10], 0.01);
        config.epsilon = Some(0.5);
        assert_relative_eq!(config.epsilon().unwrap(), 0.5);
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cutoff_mins = [0, 15, 30]").unwrap();
        writeln!(file, "travel_mode = \"walking\"").unwrap();
        writeln!(file, "seed = 7").unwrap();
        let config = PipelineConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.travel_mode, TravelMode::Walking);
        assert_eq!(config.seed, 7);
        assert_eq!(config.data_name(), "walking_samples");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = PipelineConfig::from_toml_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, IsochroneError::Io(_)));
    }
}
