use crate::sample::{Coordinate, Sample};
use crate::schedule::CutoffSchedule;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Travel times are compared against cutoffs after rounding minutes to this
/// many decimal places.
pub const MINUTES_PRECISION: i32 = 1;

/// 1-based position of a band in the normalized cutoff schedule.
///
/// Band `k` holds every point reachable in less than `schedule[k]` minutes.
/// The band one past the last cutoff is the catch-all band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BandIndex(pub u32);

impl BandIndex {
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BandIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cumulative bands keyed by index, iterated in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BandMap {
    bands: BTreeMap<BandIndex, BTreeSet<Coordinate>>,
}

impl BandMap {
    pub fn get(&self, band: BandIndex) -> Option<&BTreeSet<Coordinate>> {
        self.bands.get(&band)
    }

    pub fn iter(&self) -> impl Iterator<Item = (BandIndex, &BTreeSet<Coordinate>)> {
        self.bands.iter().map(|(band, points)| (*band, points))
    }

    pub fn keys(&self) -> impl Iterator<Item = BandIndex> + '_ {
        self.bands.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}

/// Rounds a travel time in seconds to minutes at [`MINUTES_PRECISION`].
pub fn round_minutes(seconds: f64) -> f64 {
    let scale = 10f64.powi(MINUTES_PRECISION);
    (seconds / 60.0 * scale).round() / scale
}

/// Bins samples into cumulative travel-time bands.
///
/// Each sample lands in the bucket of the first cutoff strictly greater than
/// its rounded travel time. Only buckets that received samples appear in the
/// output, and every bucket then absorbs all lower buckets that exist. A
/// missing bucket in between is skipped rather than filled in.
pub fn assign(samples: &[Sample], schedule: &CutoffSchedule) -> BandMap {
    let mut raw: BTreeMap<BandIndex, BTreeSet<Coordinate>> = BTreeMap::new();
    for sample in samples {
        let minutes = round_minutes(sample.travel_time_seconds);
        let band = BandIndex(schedule.bucket_of(minutes) as u32);
        raw.entry(band).or_default().insert(sample.coordinate);
    }

    let mut bands = BTreeMap::new();
    let mut reached = BTreeSet::new();
    for (band, points) in raw {
        reached.extend(points);
        bands.insert(band, reached.clone());
    }

    BandMap { bands }
}

/// Cumulative number of points reachable within one cutoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CutoffSummary {
    pub band: BandIndex,
    /// `None` for the catch-all band past the last cutoff.
    pub cutoff_minutes: Option<u32>,
    pub point_count: usize,
}

/// Counts points per cutoff, including cutoffs whose band received no samples
/// of its own (they report the count of the nearest lower band).
pub fn describe_cutoffs(schedule: &CutoffSchedule, bands: &BandMap) -> Vec<CutoffSummary> {
    (1..=schedule.len())
        .map(|index| {
            let band = BandIndex(index as u32);
            let point_count = bands
                .bands
                .range(..=band)
                .next_back()
                .map_or(0, |(_, points)| points.len());
            CutoffSummary {
                band,
                cutoff_minutes: schedule.cutoff(index),
                point_count,
            }
        })
        .collect()
}

pub fn log_cutoff_summary(summary: &[CutoffSummary]) {
    log::info!("number of points reachable within each cutoff:");
    for row in summary {
        match row.cutoff_minutes {
            Some(minutes) => log::info!("  cutoff {} min: {} points", minutes, row.point_count),
            None => log::info!("  all samples: {} points", row.point_count),
        }
    }
}
