use crate::sample::Coordinate;
use petgraph::unionfind::UnionFind;
use rstar::primitives::GeomWithData;
use rstar::RTree;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Island identifier, stable within a single clustering run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct IslandLabel(pub i32);

impl IslandLabel {
    /// Reserved label for a point that no island claimed.
    pub const UNASSIGNED: IslandLabel = IslandLabel(-1);
}

impl fmt::Display for IslandLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A spatially connected group of points inside one band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Island {
    pub label: IslandLabel,
    pub points: Vec<Coordinate>,
}

impl Island {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Diagonal of one lattice cell with equal sides of `spacing`.
///
/// Used as the clustering radius so that only cells touching each other,
/// including corner to corner, end up in the same island.
pub fn default_epsilon(spacing: f64) -> f64 {
    (2.0 * spacing.powi(2)).sqrt()
}

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Labels every point with the island it belongs to.
///
/// Two points share an island when a chain of hops, each no longer than
/// `epsilon`, links them. Labels are handed out in the order islands are
/// first met while walking `points` from the front, so equal input always
/// gives equal labels.
pub fn label_points(points: &[Coordinate], epsilon: f64) -> Vec<IslandLabel> {
    let tree = RTree::bulk_load(
        points
            .iter()
            .enumerate()
            .map(|(index, point)| IndexedPoint::new(point.to_array(), index))
            .collect(),
    );
    let max_distance_2 = epsilon * epsilon;

    let mut components = UnionFind::<usize>::new(points.len());
    for (index, point) in points.iter().enumerate() {
        for neighbor in tree.locate_within_distance(point.to_array(), max_distance_2) {
            if neighbor.data != index
                && point.distance_squared(&points[neighbor.data]) <= max_distance_2
            {
                components.union(index, neighbor.data);
            }
        }
    }

    let mut labels = vec![IslandLabel::UNASSIGNED; points.len()];
    let mut root_labels: HashMap<usize, IslandLabel> = HashMap::new();
    for (index, label) in labels.iter_mut().enumerate() {
        let root = components.find_mut(index);
        let next = IslandLabel(root_labels.len() as i32);
        *label = *root_labels.entry(root).or_insert(next);
    }
    labels
}

/// Groups points by label, islands ordered by label.
///
/// Points carrying [`IslandLabel::UNASSIGNED`] are left out.
pub fn group_islands(points: &[Coordinate], labels: &[IslandLabel]) -> Vec<Island> {
    let mut islands: Vec<Island> = Vec::new();
    for (point, label) in points.iter().zip(labels) {
        if *label == IslandLabel::UNASSIGNED {
            continue;
        }
        let slot = label.0 as usize;
        if islands.len() <= slot {
            islands.resize_with(slot + 1, || Island {
                label: IslandLabel::UNASSIGNED,
                points: Vec::new(),
            });
        }
        islands[slot].label = *label;
        islands[slot].points.push(*point);
    }
    islands.retain(|island| !island.is_empty());
    islands
}

/// Splits a band's points into islands using `epsilon` as the linking radius.
pub fn cluster(points: &BTreeSet<Coordinate>, epsilon: f64) -> Vec<Island> {
    let points: Vec<Coordinate> = points.iter().copied().collect();
    let labels = label_points(&points, epsilon);
    group_islands(&points, &labels)
}
