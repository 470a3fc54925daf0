use crate::error::IsochroneError;

/// Ascending travel-time cutoffs in whole minutes, always starting at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutoffSchedule {
    cutoffs: Vec<u32>,
}

impl CutoffSchedule {
    /// Builds a schedule, inserting the leading zero when it is missing.
    ///
    /// Fails when the cutoffs are empty or not strictly increasing.
    pub fn new(cutoff_mins: Vec<u32>) -> Result<Self, IsochroneError> {
        let mut cutoffs = cutoff_mins;
        if cutoffs.is_empty() {
            return Err(IsochroneError::Configuration(
                "cutoff schedule must not be empty".to_string(),
            ));
        }
        if cutoffs[0] != 0 {
            cutoffs.insert(0, 0);
        }
        if let Some(pair) = cutoffs.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(IsochroneError::Configuration(format!(
                "cutoff schedule must be strictly increasing, found {} followed by {}",
                pair[0], pair[1]
            )));
        }
        if cutoffs.len() < 2 {
            return Err(IsochroneError::Configuration(
                "cutoff schedule needs at least one cutoff after zero".to_string(),
            ));
        }
        Ok(CutoffSchedule { cutoffs })
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.cutoffs
    }

    pub fn len(&self) -> usize {
        self.cutoffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cutoffs.is_empty()
    }

    /// Upper cutoff of the band at `index`, `None` for the catch-all band.
    pub fn cutoff(&self, index: usize) -> Option<u32> {
        self.cutoffs.get(index).copied()
    }

    /// Position of the first cutoff strictly greater than `minutes`.
    pub fn bucket_of(&self, minutes: f64) -> usize {
        self.cutoffs.partition_point(|&cutoff| f64::from(cutoff) <= minutes)
    }
}
