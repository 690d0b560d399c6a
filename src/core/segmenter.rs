use itertools::Itertools;

use crate::{
    core::{
        clustering::Clusterer,
        series::{PowerSeries, StateSeries},
        state::ApplianceState,
    },
    error::InvalidInput,
    prelude::*,
};

pub const DEFAULT_WINDOW_SIZE: usize = 99;

/// Turns a power series into ON/OFF states.
///
/// The threshold is the midpoint between the two cluster centroids over the whole series.
/// The series is then scanned at every `window_size - 1` samples, and each sample above the
/// threshold switches ON the entire window starting at it.
#[must_use]
pub struct Segmenter<C> {
    clusterer: C,
}

impl<C: Clusterer> Segmenter<C> {
    pub const fn new(clusterer: C) -> Self {
        Self { clusterer }
    }

    #[instrument(skip_all, fields(len = series.len(), window_size = window_size))]
    pub fn segment(&self, series: &PowerSeries, window_size: usize) -> Result<StateSeries> {
        if series.is_empty() {
            return Err(InvalidInput::EmptySeries.into());
        }
        if window_size < 1 {
            return Err(InvalidInput::WindowSize(window_size).into());
        }
        let values = series.values().map(|power| power.0).collect_vec();
        let threshold = self.threshold(&values)?;
        let states = label_windows(&values, threshold, window_size);
        debug!(threshold, n_on = states.iter().filter(|state| state.is_on()).count(), "segmented");
        Ok(series.with_values(states))
    }

    /// Midpoint between the two cluster centroids.
    pub fn threshold(&self, values: &[f64]) -> Result<f64> {
        let [lhs, rhs] = self.clusterer.two_centroids(values)?;
        Ok(f64::midpoint(lhs, rhs))
    }
}

/// Label the samples given the threshold.
///
/// Only the samples at multiples of `window_size - 1` are inspected. Windows are written in scan
/// order, so a later window overwrites whatever an earlier one left in the overlapping positions.
/// `window_size` of 1 inspects every sample.
#[must_use]
pub fn label_windows(values: &[f64], threshold: f64, window_size: usize) -> Vec<ApplianceState> {
    let mut states = vec![ApplianceState::Off; values.len()];
    let stride = window_size.saturating_sub(1).max(1);
    for index in (0..values.len()).step_by(stride) {
        if values[index] > threshold {
            let end = index.saturating_add(window_size).min(values.len());
            states[index..end].fill(ApplianceState::On);
        }
    }
    states
}
