use crate::binning::{self, BandIndex, BandMap, CutoffSummary};
use crate::boundary::{self, BoundaryPolygon};
use crate::cluster::{self, IslandLabel};
use crate::config::PipelineConfig;
use crate::error::IsochroneError;
use crate::hull::{GeoHullSolver, HullError, HullSolver};
use crate::sample::{self, Coordinate, Sample};
use crate::schedule::CutoffSchedule;
use std::collections::BTreeSet;

/// Boundary outcome for one island.
#[derive(Debug, Clone, PartialEq)]
pub struct IslandBoundary {
    pub label: IslandLabel,
    pub point_count: usize,
    pub outcome: Result<BoundaryPolygon, HullError>,
}

impl IslandBoundary {
    /// The polygon, or `None` when the hull could not be computed.
    pub fn polygon(&self) -> Option<&BoundaryPolygon> {
        self.outcome.as_ref().ok()
    }

    /// Islands padded with synthetic points only get a marker-sized outline.
    pub fn is_degenerate(&self) -> bool {
        self.point_count < boundary::MIN_HULL_POINTS
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BandBoundaries {
    pub band: BandIndex,
    pub cutoff_minutes: u32,
    pub islands: Vec<IslandBoundary>,
}

/// Island outlines for every processed band, in ascending band order.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResult {
    pub bands: Vec<BandBoundaries>,
    pub cutoff_summary: Vec<CutoffSummary>,
}

impl PipelineResult {
    pub fn failed_islands(&self) -> usize {
        self.bands
            .iter()
            .flat_map(|band| &band.islands)
            .filter(|island| island.outcome.is_err())
            .count()
    }
}

/// Runs binning, island clustering and boundary synthesis over a batch of
/// travel-time samples.
pub struct IslandPipeline {
    schedule: CutoffSchedule,
    epsilon: f64,
    seed: u64,
    max_bands: Option<usize>,
    solver: Box<dyn HullSolver>,
}

impl IslandPipeline {
    pub fn new(config: &PipelineConfig) -> Result<Self, IsochroneError> {
        config.validate()?;
        Ok(IslandPipeline {
            schedule: config.schedule()?,
            epsilon: config.epsilon()?,
            seed: config.seed,
            max_bands: config.max_bands,
            solver: Box::new(GeoHullSolver::new(config.hull)),
        })
    }

    pub fn with_solver(mut self, solver: Box<dyn HullSolver>) -> Self {
        self.solver = solver;
        self
    }

    pub fn schedule(&self) -> &CutoffSchedule {
        &self.schedule
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Processes the bands one after another.
    ///
    /// `max_bands` limits the run to the lowest bands and falls back to the
    /// configured limit when `None`.
    pub fn run(
        &self,
        samples: &[Sample],
        max_bands: Option<usize>,
    ) -> Result<PipelineResult, IsochroneError> {
        let bands = self.bin(samples)?;
        let cutoff_summary = self.summarize(&bands);
        let boundaries = self
            .working_bands(&bands, max_bands)
            .into_iter()
            .map(|(band, points)| self.process_band(band, points))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PipelineResult {
            bands: boundaries,
            cutoff_summary,
        })
    }

    /// Same output as [`IslandPipeline::run`], with one thread per band.
    pub fn run_concurrently(
        &self,
        samples: &[Sample],
        max_bands: Option<usize>,
    ) -> Result<PipelineResult, IsochroneError> {
        let bands = self.bin(samples)?;
        let cutoff_summary = self.summarize(&bands);
        let work = self.working_bands(&bands, max_bands);

        let boundaries = std::thread::scope(|scope| {
            let handles: Vec<_> = work
                .into_iter()
                .map(|(band, points)| scope.spawn(move || self.process_band(band, points)))
                .collect();

            // Wait for all bands and keep them in schedule order
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
                })
                .collect::<Result<Vec<_>, _>>()
        })?;

        Ok(PipelineResult {
            bands: boundaries,
            cutoff_summary,
        })
    }

    fn bin(&self, samples: &[Sample]) -> Result<BandMap, IsochroneError> {
        sample::validate_samples(samples)?;
        let bands = binning::assign(samples, &self.schedule);
        log::info!(
            "binned {} samples into {} bands",
            samples.len(),
            bands.len()
        );
        Ok(bands)
    }

    fn summarize(&self, bands: &BandMap) -> Vec<CutoffSummary> {
        let summary = binning::describe_cutoffs(&self.schedule, bands);
        binning::log_cutoff_summary(&summary);
        summary
    }

    /// Bands that get boundaries: real cutoff bands only, lowest first.
    ///
    /// The band past the last cutoff holds every sample and is kept for
    /// counting only.
    fn working_bands<'a>(
        &self,
        bands: &'a BandMap,
        max_bands: Option<usize>,
    ) -> Vec<(BandIndex, &'a BTreeSet<Coordinate>)> {
        let limit = max_bands.or(self.max_bands).unwrap_or(usize::MAX);
        bands
            .iter()
            .filter(|(band, _)| band.0 >= 1 && band.as_usize() < self.schedule.len())
            .take(limit)
            .collect()
    }

    fn process_band(
        &self,
        band: BandIndex,
        points: &BTreeSet<Coordinate>,
    ) -> Result<BandBoundaries, IsochroneError> {
        let cutoff_minutes = self.schedule.cutoff(band.as_usize()).ok_or_else(|| {
            IsochroneError::Configuration(format!("band {} has no cutoff in the schedule", band))
        })?;

        let points: Vec<Coordinate> = points.iter().copied().collect();
        let labels = cluster::label_points(&points, self.epsilon);
        if let Some(index) = labels
            .iter()
            .position(|label| *label == IslandLabel::UNASSIGNED)
        {
            return Err(IsochroneError::ClusteringInvariantViolation {
                band,
                point: points[index],
            });
        }
        let islands = cluster::group_islands(&points, &labels);
        log::info!(
            "band {} (< {} min): {} points in {} islands",
            band,
            cutoff_minutes,
            points.len(),
            islands.len()
        );

        let islands = islands
            .into_iter()
            .map(|island| {
                let seed = boundary::derive_seed(self.seed, band, island.label);
                let outcome = boundary::synthesize(&island.points, seed, self.solver.as_ref());
                match &outcome {
                    Ok(polygon) => log::debug!(
                        "band {} island {}: {} points, {} boundary vertices",
                        band,
                        island.label,
                        island.len(),
                        polygon.len()
                    ),
                    Err(err) => log::warn!(
                        "band {} island {}: no boundary for {} points: {}",
                        band,
                        island.label,
                        island.len(),
                        err
                    ),
                }
                IslandBoundary {
                    label: island.label,
                    point_count: island.len(),
                    outcome,
                }
            })
            .collect();

        Ok(BandBoundaries {
            band,
            cutoff_minutes,
            islands,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hull::HullType;
    use approx::assert_relative_eq;

    fn grid_samples(travel_time_seconds: f64) -> Vec<Sample> {
        let mut samples = Vec::new();
        for i in 0..3 {
            for j in 0..3 {
                samples.push(Sample::new(
                    2.35 + 0.01 * i as f64,
                    48.86 + 0.01 * j as f64,
                    travel_time_seconds,
                ));
            }
        }
        samples
    }

    fn pipeline(cutoffs: Vec<u32>, spacing: f64, hull: HullType) -> IslandPipeline {
        let mut config = PipelineConfig::new(cutoffs, spacing);
        config.hull = hull;
        IslandPipeline::new(&config).unwrap()
    }

    struct AlwaysFails;

    impl HullSolver for AlwaysFails {
        fn compute(&self, points: &[Coordinate]) -> Result<BoundaryPolygon, HullError> {
            Err(HullError::Degenerate {
                vertices: points.len(),
            })
        }
    }

    #[test]
    fn test_three_by_three_grid_is_one_island() {
        let pipeline = pipeline(vec![0, 10, 20], 0.01, HullType::Convex);
        let result = pipeline.run(&grid_samples(300.0), None).unwrap();

        assert_eq!(result.bands.len(), 1);
        let band = &result.bands[0];
        assert_eq!(band.band, BandIndex(1));
        assert_eq!(band.cutoff_minutes, 10);
        assert_eq!(band.islands.len(), 1);
        assert_eq!(band.islands[0].point_count, 9);

        let polygon = band.islands[0].polygon().unwrap();
        assert!(polygon.len() >= 3);
        let lngs = polygon.vertices().iter().map(|c| c.lng);
        let lats = polygon.vertices().iter().map(|c| c.lat);
        assert_relative_eq!(lngs.clone().fold(f64::INFINITY, f64::min), 2.35);
        assert_relative_eq!(lngs.fold(f64::NEG_INFINITY, f64::max), 2.37, epsilon = 1e-12);
        assert_relative_eq!(lats.clone().fold(f64::INFINITY, f64::min), 48.86);
        assert_relative_eq!(lats.fold(f64::NEG_INFINITY, f64::max), 48.88, epsilon = 1e-12);
    }

    #[test]
    fn test_grid_with_default_hull() {
        let pipeline = pipeline(vec![0, 10, 20], 0.01, HullType::default());
        let result = pipeline.run(&grid_samples(300.0), None).unwrap();
        assert_eq!(result.bands[0].islands.len(), 1);
        assert!(result.bands[0].islands[0].polygon().map_or(0, BoundaryPolygon::len) >= 3);
    }

    #[test]
    fn test_two_isolated_points_are_two_islands() {
        let samples = vec![Sample::new(0.0, 0.0, 300.0), Sample::new(1.0, 1.0, 300.0)];
        let pipeline = pipeline(vec![0, 10], 0.01, HullType::Convex);
        let result = pipeline.run(&samples, None).unwrap();

        assert_eq!(result.bands.len(), 1);
        let islands = &result.bands[0].islands;
        assert_eq!(islands.len(), 2);
        for island in islands {
            assert_eq!(island.point_count, 1);
            assert!(island.is_degenerate());
            // padded to three points, the boundary is a tiny triangle
            let polygon = island.polygon().unwrap();
            assert_eq!(polygon.len(), 3);
        }
    }

    #[test]
    fn test_catch_all_band_is_skipped() {
        let mut samples = grid_samples(300.0);
        samples.push(Sample::new(5.0, 5.0, 4000.0));
        let pipeline = pipeline(vec![0, 10, 20], 0.01, HullType::Convex);
        let result = pipeline.run(&samples, None).unwrap();

        assert_eq!(
            result.bands.iter().map(|b| b.band).collect::<Vec<_>>(),
            vec![BandIndex(1)]
        );
        let all = result.cutoff_summary.last().unwrap();
        assert_eq!(all.cutoff_minutes, None);
        assert_eq!(all.point_count, 10);
    }

    #[test]
    fn test_bands_grow_and_respect_max_bands() {
        let samples = vec![
            Sample::new(0.0, 0.0, 60.0),
            Sample::new(0.01, 0.0, 700.0),
            Sample::new(0.02, 0.0, 1300.0),
        ];
        let pipeline = pipeline(vec![0, 10, 20, 30], 0.01, HullType::Convex);

        let result = pipeline.run(&samples, None).unwrap();
        let sizes: Vec<_> = result
            .bands
            .iter()
            .map(|band| band.islands.iter().map(|i| i.point_count).sum::<usize>())
            .collect();
        assert_eq!(sizes, vec![1, 2, 3]);

        let limited = pipeline.run(&samples, Some(2)).unwrap();
        assert_eq!(
            limited.bands.iter().map(|b| b.cutoff_minutes).collect::<Vec<_>>(),
            vec![10, 20]
        );
    }

    #[test]
    fn test_hull_failures_do_not_stop_the_run() {
        let samples = vec![Sample::new(0.0, 0.0, 60.0), Sample::new(1.0, 1.0, 700.0)];
        let pipeline =
            pipeline(vec![0, 10, 20, 30], 0.01, HullType::Convex).with_solver(Box::new(AlwaysFails));
        let result = pipeline.run(&samples, None).unwrap();
        assert_eq!(result.bands.len(), 2);
        assert_eq!(result.failed_islands(), 3);
        assert!(result.bands[1].islands.iter().all(|i| i.polygon().is_none()));
    }

    #[test]
    fn test_rejects_malformed_samples() {
        let samples = vec![Sample::new(0.0, 0.0, f64::NAN)];
        let pipeline = pipeline(vec![0, 10], 0.01, HullType::Convex);
        assert!(matches!(
            pipeline.run(&samples, None),
            Err(IsochroneError::UpstreamData(_))
        ));
    }

    #[test]
    fn test_empty_samples_give_empty_result() {
        let pipeline = pipeline(vec![0, 10], 0.01, HullType::Convex);
        let result = pipeline.run(&[], None).unwrap();
        assert!(result.bands.is_empty());
    }

    #[test]
    fn test_runs_are_reproducible() {
        let samples = vec![
            Sample::new(0.0, 0.0, 60.0),
            Sample::new(0.5, 0.5, 60.0),
            Sample::new(0.51, 0.5, 700.0),
            Sample::new(3.0, 3.0, 1300.0),
        ];
        let pipeline = pipeline(vec![0, 10, 20, 30], 0.02, HullType::Convex);
        let first = pipeline.run(&samples, None).unwrap();
        let second = pipeline.run(&samples, None).unwrap();
        let concurrent = pipeline.run_concurrently(&samples, None).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, concurrent);
    }

    #[test]
    fn test_invalid_schedule_fails_before_running() {
        let config = PipelineConfig::new(vec![30, 10], 0.01);
        assert!(matches!(
            IslandPipeline::new(&config),
            Err(IsochroneError::Configuration(_))
        ));
    }
}
