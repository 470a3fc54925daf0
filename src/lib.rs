pub mod binning;
pub mod boundary;
pub mod cluster;
pub mod config;
pub mod error;
pub mod grid;
pub mod hull;
pub mod isochrone;
pub mod sample;
pub mod schedule;
pub mod utils;

pub use config::PipelineConfig;
pub use error::IsochroneError;
pub use isochrone::{IslandPipeline, PipelineResult};
pub use sample::{Coordinate, Sample};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Calculates island boundaries for each travel time cutoff
///
/// `samples` holds `(lng, lat, travel_time_seconds)` tuples. Returns one list
/// per band with a GeoJSON string per island, `None` where the hull failed.
#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(signature = (samples, cutoff_mins, grid_spacing, hull_type = "FastConcave", seed = config::DEFAULT_SEED, max_bands = None))]
fn calc_islands(
    samples: Vec<(f64, f64, f64)>,
    cutoff_mins: Vec<u32>,
    grid_spacing: f64,
    hull_type: &str,
    seed: u64,
    max_bands: Option<usize>,
) -> PyResult<Vec<Vec<Option<String>>>> {
    let to_py_err = |err: IsochroneError| pyo3::exceptions::PyValueError::new_err(err.to_string());

    let mut config = PipelineConfig::new(cutoff_mins, grid_spacing);
    config.hull = hull_type.parse().map_err(to_py_err)?;
    config.seed = seed;

    let samples: Vec<Sample> = samples
        .into_iter()
        .map(|(lng, lat, travel_time_seconds)| Sample::new(lng, lat, travel_time_seconds))
        .collect();

    let pipeline = IslandPipeline::new(&config).map_err(to_py_err)?;
    let result = pipeline.run(&samples, max_bands).map_err(to_py_err)?;

    // Convert each island boundary to a GeoJSON string
    let converted = result
        .bands
        .iter()
        .map(|band| {
            band.islands
                .iter()
                .map(|island| island.polygon().map(utils::polygon_to_geojson_string))
                .collect()
        })
        .collect();

    Ok(converted)
}

/// Python module for turning travel time samples into isochrone islands
#[cfg(feature = "python")]
#[pymodule]
fn isochrone_islands(_py: Python, m: &PyModule) -> pyo3::PyResult<()> {
    m.add_function(wrap_pyfunction!(calc_islands, m)?)?;
    Ok(())
}
